//! Ordered test session against one site: prepare the store, warm up, compare

use crate::admin::{self, QUERY_STORE_CLEAR, QUERY_STORE_ON};
use crate::compare::{compare_datasets, CompareOptions, ComparisonReport};
use crate::config::TestInfo;
use crate::data::DataProcessor;
use crate::dataset::{Dataset, SchemaCheck, StatVariant};
use crate::error::Result;
use crate::warmup::SiteWarmer;
use crate::workspace::QuerydiffWorkspace;
use std::fmt;

/// One step of a test session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    EnableQueryStore,
    ClearQueryStore,
    CreateView(StatVariant),
    WarmUp,
    Compare(StatVariant),
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EnableQueryStore => f.write_str("enable query store"),
            Self::ClearQueryStore => f.write_str("clear query store"),
            Self::CreateView(variant) => write!(f, "create {} view", variant),
            Self::WarmUp => f.write_str("warm up"),
            Self::Compare(variant) => write!(f, "compare {}", variant),
        }
    }
}

/// What a stage produced
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutcome {
    Completed(Stage),
    /// Warm-up requested but no warmer was configured
    Skipped(Stage),
    Compared {
        variant: StatVariant,
        report: ComparisonReport,
    },
}

impl StageOutcome {
    pub fn report(&self) -> Option<&ComparisonReport> {
        match self {
            Self::Compared { report, .. } => Some(report),
            _ => None,
        }
    }
}

/// Everything a pipeline needs to talk to one test target
pub struct Session<'a> {
    workspace: &'a QuerydiffWorkspace,
    target: TestInfo,
    warmer: Option<&'a dyn SiteWarmer>,
    options: CompareOptions,
    schema_check: SchemaCheck,
}

impl<'a> Session<'a> {
    /// Resolve `site_name` from the workspace's test targets
    pub fn open(workspace: &'a QuerydiffWorkspace, site_name: &str) -> Result<Self> {
        let targets = workspace.load_targets()?;
        let target = targets.find(site_name)?.clone();
        Ok(Self::new(workspace, target))
    }

    pub fn new(workspace: &'a QuerydiffWorkspace, target: TestInfo) -> Self {
        Self {
            workspace,
            target,
            warmer: None,
            options: workspace.settings.compare_options(),
            schema_check: workspace.settings.schema_check,
        }
    }

    pub fn with_warmer(mut self, warmer: &'a dyn SiteWarmer) -> Self {
        self.warmer = Some(warmer);
        self
    }

    pub fn with_options(mut self, options: CompareOptions) -> Self {
        self.options = options;
        self
    }

    pub fn target(&self) -> &TestInfo {
        &self.target
    }

    fn run_admin_script(&self, script_name: &str) -> Result<()> {
        admin::run_admin_script(
            &self.target.db_connection_string,
            &self.workspace.scripts_dir(),
            script_name,
            self.target.db_name(),
        )
    }

    fn baseline(&self, variant: StatVariant) -> Result<Dataset> {
        let processor = DataProcessor::new()?;
        processor
            .load_csv(&self.workspace.baseline_path(variant), "baseline")?
            .reconcile(variant, self.schema_check)
    }

    fn current(&self, variant: StatVariant) -> Result<Dataset> {
        let store = DataProcessor::connect(&self.target.db_connection_string)?;
        store
            .query(&variant.live_query(), "current")?
            .reconcile(variant, self.schema_check)
    }

    fn execute(&self, stage: Stage) -> Result<StageOutcome> {
        match stage {
            Stage::EnableQueryStore => self.run_admin_script(QUERY_STORE_ON)?,
            Stage::ClearQueryStore => self.run_admin_script(QUERY_STORE_CLEAR)?,
            Stage::CreateView(variant) => self.run_admin_script(admin::view_script(variant))?,
            Stage::WarmUp => match self.warmer {
                Some(warmer) => warmer.warm_up(&self.target.url)?,
                None => {
                    log::warn!("No warm-up configured for {}, skipping", self.target.site_name);
                    return Ok(StageOutcome::Skipped(stage));
                }
            },
            Stage::Compare(variant) => {
                let baseline = self.baseline(variant)?;
                let current = self.current(variant)?;
                let report = compare_datasets(&baseline, &current, variant, &self.options)?;
                return Ok(StageOutcome::Compared { variant, report });
            }
        }
        Ok(StageOutcome::Completed(stage))
    }
}

/// Immutable, ordered list of stages
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage, returning the extended pipeline
    pub fn then(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    /// Enable and clear the store, create the view, warm up, then compare
    pub fn standard(variant: StatVariant) -> Self {
        Self::new()
            .then(Stage::EnableQueryStore)
            .then(Stage::ClearQueryStore)
            .then(Stage::CreateView(variant))
            .then(Stage::WarmUp)
            .then(Stage::Compare(variant))
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Run every stage in order, stopping at the first failure
    pub fn run(&self, session: &Session<'_>) -> Result<Vec<StageOutcome>> {
        session.target.validate()?;

        let mut outcomes = Vec::with_capacity(self.stages.len());
        for (index, stage) in self.stages.iter().enumerate() {
            log::info!(
                "[{}/{}] {} on {}",
                index + 1,
                self.stages.len(),
                stage,
                session.target.site_name
            );
            outcomes.push(session.execute(*stage)?);
        }
        Ok(outcomes)
    }
}
