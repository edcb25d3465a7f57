//! Workspace layout: settings, test targets, baselines and admin scripts

use crate::config::{Settings, TestTargets, SETTINGS_FILE};
use crate::dataset::StatVariant;
use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// A directory holding `querydiff.json`, `TestInfos.json`, `BenchMarks/` and `SqlScripts/`
#[derive(Debug, Clone)]
pub struct QuerydiffWorkspace {
    /// Project root directory
    pub root: PathBuf,
    pub settings: Settings,
}

impl QuerydiffWorkspace {
    /// Find an existing workspace, or use the start directory with default settings
    pub fn find_or_default(start_dir: Option<&Path>) -> Result<Self> {
        let current_dir = std::env::current_dir()?;
        let start = start_dir.unwrap_or(&current_dir);

        let root = Self::find_existing(start).unwrap_or_else(|| start.to_path_buf());
        Self::from_root(root)
    }

    /// Walk up the directory tree looking for a settings or test target file
    fn find_existing(start_dir: &Path) -> Option<PathBuf> {
        let defaults = Settings::default();
        let mut current = start_dir;

        loop {
            if current.join(SETTINGS_FILE).is_file() || current.join(&defaults.test_infos).is_file() {
                return Some(current.to_path_buf());
            }

            match current.parent() {
                Some(parent) => current = parent,
                None => return None,
            }
        }
    }

    /// Open the workspace rooted at `root`, loading its settings
    pub fn from_root(root: PathBuf) -> Result<Self> {
        let settings = Settings::load(&root.join(SETTINGS_FILE))?;
        crate::sql::load_env_file(&root)?;
        Ok(Self { root, settings })
    }

    /// Create the workspace layout; existing files are kept unless `force` is set
    pub fn create_new(root: PathBuf, force: bool) -> Result<Self> {
        fs::create_dir_all(&root)?;

        let settings_path = root.join(SETTINGS_FILE);
        if force || !settings_path.exists() {
            fs::write(&settings_path, serde_json::to_string_pretty(&Settings::default())?)?;
        }

        let workspace = Self::from_root(root)?;
        fs::create_dir_all(workspace.benchmarks_dir())?;
        fs::create_dir_all(workspace.scripts_dir())?;

        let test_infos = workspace.test_infos_path();
        if !test_infos.exists() {
            fs::write(&test_infos, "[]\n")?;
        }

        log::info!("Created querydiff workspace at: {}", workspace.root.display());
        Ok(workspace)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    pub fn test_infos_path(&self) -> PathBuf {
        self.resolve(&self.settings.test_infos)
    }

    pub fn benchmarks_dir(&self) -> PathBuf {
        self.resolve(&self.settings.benchmarks_dir)
    }

    pub fn scripts_dir(&self) -> PathBuf {
        self.resolve(&self.settings.scripts_dir)
    }

    /// Default baseline CSV for a variant
    pub fn baseline_path(&self, variant: StatVariant) -> PathBuf {
        self.benchmarks_dir()
            .join(format!("{}.csv", variant.benchmark_name()))
    }

    /// Resolve a user-supplied path against the workspace root
    pub fn input_path(&self, path: &Path) -> PathBuf {
        self.resolve(path)
    }

    pub fn load_targets(&self) -> Result<TestTargets> {
        TestTargets::load(&self.test_infos_path())
    }
}
