//! Command implementations for querydiff CLI

use crate::cli::{Commands, OutputFormat};
use crate::compare::{compare_datasets, ComparisonReport, DuplicatePolicy, SortOrder};
use crate::data::DataProcessor;
use crate::dataset::{Dataset, SchemaCheck, StatVariant};
use crate::error::{QuerydiffError, Result};
use crate::fingerprint::fingerprint;
use crate::output::{JsonFormatter, PrettyPrinter};
use crate::pipeline::{Pipeline, Session, Stage};
use crate::report;
use crate::sql::read_sql_file;
use crate::warmup::CommandWarmer;
use crate::workspace::QuerydiffWorkspace;
use std::path::{Path, PathBuf};

/// Execute a command
pub fn execute_command(command: Commands, workspace_path: Option<&Path>) -> Result<()> {
    match command {
        Commands::Init { force } => init_command(workspace_path, force),
        Commands::Fingerprint { sql, file } => fingerprint_command(&sql, file.as_deref()),
        Commands::Compare {
            variant,
            baseline,
            current,
            target,
            duplicates,
            sort,
            positional,
            format,
            compact,
            output,
        } => compare_command(
            workspace_path,
            CompareArgs {
                variant,
                baseline,
                current,
                target,
                duplicates,
                sort,
                positional,
            },
            format,
            compact,
            output.as_deref(),
        ),
        Commands::Capture {
            target,
            variant,
            output,
        } => capture_command(workspace_path, &target, variant, output.as_deref()),
        Commands::Setup {
            target,
            enable,
            clear,
            views,
        } => setup_command(workspace_path, &target, enable, clear, views),
        Commands::Run {
            target,
            variant,
            warm_up,
            output,
            compact,
        } => run_command(
            workspace_path,
            &target,
            variant,
            warm_up.as_deref(),
            output.as_deref(),
            compact,
        ),
        Commands::Targets => targets_command(workspace_path),
    }
}

/// Initialize querydiff workspace
fn init_command(workspace_path: Option<&Path>, force: bool) -> Result<()> {
    let current_dir = std::env::current_dir()?;
    let root = workspace_path.unwrap_or(&current_dir);

    // Always create in the given directory, never a parent workspace
    let workspace = QuerydiffWorkspace::create_new(root.to_path_buf(), force)?;

    println!("✅ Initialized querydiff workspace at: {}", workspace.root.display());
    println!("📁 Baselines: {}", workspace.benchmarks_dir().display());
    println!("📁 Admin scripts: {}", workspace.scripts_dir().display());
    Ok(())
}

/// Print the fingerprint of each statement
fn fingerprint_command(sql: &[String], file: Option<&Path>) -> Result<()> {
    let fingerprints = match file {
        Some(path) => vec![fingerprint(&read_sql_file(path, None)?)],
        None if sql.is_empty() => {
            return Err(QuerydiffError::invalid_input("No SQL statement found"));
        }
        None => sql.iter().map(|s| fingerprint(s)).collect(),
    };

    PrettyPrinter::print_fingerprints(&fingerprints);
    Ok(())
}

/// Where the two sides of a comparison come from
struct CompareArgs {
    variant: StatVariant,
    baseline: Option<PathBuf>,
    current: Option<PathBuf>,
    target: Option<String>,
    duplicates: Option<DuplicatePolicy>,
    sort: Option<SortOrder>,
    positional: bool,
}

/// Compare a baseline CSV with a CSV or a live query store
fn compare_command(
    workspace_path: Option<&Path>,
    args: CompareArgs,
    format: OutputFormat,
    compact: bool,
    output: Option<&Path>,
) -> Result<()> {
    let workspace = QuerydiffWorkspace::find_or_default(workspace_path)?;
    let variant = args.variant;

    let mut options = workspace.settings.compare_options();
    if let Some(duplicates) = args.duplicates {
        options.duplicates = duplicates;
    }
    if let Some(sort) = args.sort {
        options.sort = sort;
    }
    let schema_check = if args.positional {
        SchemaCheck::Positional
    } else {
        workspace.settings.schema_check
    };

    let baseline_path = match &args.baseline {
        Some(path) => workspace.input_path(path),
        None => workspace.baseline_path(variant),
    };

    let processor = DataProcessor::new()?;
    let baseline = processor
        .load_csv(&baseline_path, "baseline")?
        .reconcile(variant, schema_check)?;

    let current = match (&args.current, &args.target) {
        (Some(path), _) => processor.load_csv(&workspace.input_path(path), "current")?,
        (None, Some(target)) => load_live(&workspace, target, variant)?,
        (None, None) => {
            return Err(QuerydiffError::invalid_input(
                "Either --current or --target is required",
            ));
        }
    }
    .reconcile(variant, schema_check)?;

    let report = compare_datasets(&baseline, &current, variant, &options)?;
    let output = output.map(|path| workspace.input_path(path));
    emit_report(&report, variant, format, compact, output.as_deref())
}

/// Read the current statistics of a test target
fn load_live(workspace: &QuerydiffWorkspace, site_name: &str, variant: StatVariant) -> Result<Dataset> {
    let targets = workspace.load_targets()?;
    let target = targets.find(site_name)?;
    target.validate()?;

    let store = DataProcessor::connect(&target.db_connection_string)?;
    store.query(&variant.live_query(), "current")
}

fn emit_report(
    report: &ComparisonReport,
    variant: StatVariant,
    format: OutputFormat,
    compact: bool,
    output: Option<&Path>,
) -> Result<()> {
    if let Some(path) = output {
        report::write_report(path, &report.rows, !compact)?;
    }

    match format {
        OutputFormat::Table => PrettyPrinter::print_comparison(report, variant),
        OutputFormat::Json => println!("{}", JsonFormatter::format_rows(&report.rows, compact)?),
    }
    Ok(())
}

/// Save a target's live statistics as a baseline CSV
fn capture_command(
    workspace_path: Option<&Path>,
    site_name: &str,
    variant: StatVariant,
    output: Option<&Path>,
) -> Result<()> {
    let workspace = QuerydiffWorkspace::find_or_default(workspace_path)?;
    let targets = workspace.load_targets()?;
    let target = targets.find(site_name)?;
    target.validate()?;

    let path = match output {
        Some(path) => workspace.input_path(path),
        None => workspace.baseline_path(variant),
    };

    let store = DataProcessor::connect(&target.db_connection_string)?;
    store.export_csv(&variant.live_query(), &path)?;

    println!("✅ Captured {} baseline for {}: {}", variant, site_name, path.display());
    Ok(())
}

/// Run query store admin scripts; with no flags every script runs
fn setup_command(
    workspace_path: Option<&Path>,
    site_name: &str,
    enable: bool,
    clear: bool,
    views: bool,
) -> Result<()> {
    let workspace = QuerydiffWorkspace::find_or_default(workspace_path)?;
    let session = Session::open(&workspace, site_name)?;

    let all = !(enable || clear || views);
    let mut pipeline = Pipeline::new();
    if enable || all {
        pipeline = pipeline.then(Stage::EnableQueryStore);
    }
    if clear || all {
        pipeline = pipeline.then(Stage::ClearQueryStore);
    }
    if views || all {
        pipeline = pipeline
            .then(Stage::CreateView(StatVariant::MostFrequent))
            .then(Stage::CreateView(StatVariant::MostExpensive));
    }

    let outcomes = pipeline.run(&session)?;
    println!("✅ Ran {} admin scripts on {}", outcomes.len(), site_name);
    Ok(())
}

/// Run the standard session against a target
fn run_command(
    workspace_path: Option<&Path>,
    site_name: &str,
    variant: StatVariant,
    warm_up: Option<&str>,
    output: Option<&Path>,
    compact: bool,
) -> Result<()> {
    let workspace = QuerydiffWorkspace::find_or_default(workspace_path)?;
    let warmer = warm_up.map(CommandWarmer::parse).transpose()?;

    let mut session = Session::open(&workspace, site_name)?;
    if let Some(warmer) = &warmer {
        session = session.with_warmer(warmer);
    }

    let outcomes = Pipeline::standard(variant).run(&session)?;
    let report = outcomes
        .iter()
        .find_map(|outcome| outcome.report())
        .ok_or_else(|| QuerydiffError::invalid_input("Session produced no comparison"))?;

    let output = output.map(|path| workspace.input_path(path));
    emit_report(report, variant, OutputFormat::Table, compact, output.as_deref())
}

/// List configured test targets
fn targets_command(workspace_path: Option<&Path>) -> Result<()> {
    let workspace = QuerydiffWorkspace::find_or_default(workspace_path)?;
    let targets = workspace.load_targets()?;
    PrettyPrinter::print_targets(&targets);
    Ok(())
}
