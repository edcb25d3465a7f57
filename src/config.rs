//! Test target metadata and project settings

use crate::compare::{CompareOptions, DuplicatePolicy, SortOrder};
use crate::dataset::SchemaCheck;
use crate::error::{QuerydiffError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the project settings file at the workspace root
pub const SETTINGS_FILE: &str = "querydiff.json";

/// Connection details for one site under test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TestInfo {
    pub site_name: String,
    #[serde(default)]
    pub db_connection_string: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub db_name: String,
}

impl TestInfo {
    /// Check the fields every query-store operation needs
    pub fn validate(&self) -> Result<()> {
        if self.db_connection_string.trim().is_empty() {
            return Err(QuerydiffError::config(format!(
                "Test target '{}' does not contain a valid database connection string",
                self.site_name
            )));
        }
        Ok(())
    }

    /// Database name substituted into admin scripts, if configured
    pub fn db_name(&self) -> Option<&str> {
        let name = self.db_name.trim();
        if name.is_empty() {
            None
        } else {
            Some(name)
        }
    }
}

/// The contents of a `TestInfos.json` file
#[derive(Debug, Clone, Default)]
pub struct TestTargets {
    targets: Vec<TestInfo>,
}

impl TestTargets {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(QuerydiffError::config(format!(
                "Test target file not found: {}",
                path.display()
            )));
        }

        let content = fs::read_to_string(path)?;
        let targets: Vec<TestInfo> = serde_json::from_str(&content).map_err(|e| {
            QuerydiffError::config(format!(
                "Test targets could not be deserialized from {}: {}",
                path.display(),
                e
            ))
        })?;

        log::debug!("Loaded {} test targets from {}", targets.len(), path.display());
        Ok(Self { targets })
    }

    /// Resolve a site by name
    pub fn find(&self, site_name: &str) -> Result<&TestInfo> {
        self.targets
            .iter()
            .find(|t| t.site_name == site_name)
            .ok_or_else(|| {
                QuerydiffError::config(format!("Test target '{}' could not be found", site_name))
            })
    }

    pub fn names(&self) -> Vec<&str> {
        self.targets.iter().map(|t| t.site_name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TestInfo> {
        self.targets.iter()
    }
}

/// Project settings stored in `querydiff.json`; every field is optional
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub test_infos: PathBuf,
    pub benchmarks_dir: PathBuf,
    pub scripts_dir: PathBuf,
    pub duplicate_policy: DuplicatePolicy,
    pub schema_check: SchemaCheck,
    pub sort: SortOrder,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            test_infos: PathBuf::from("TestInfos.json"),
            benchmarks_dir: PathBuf::from("BenchMarks"),
            scripts_dir: PathBuf::from("SqlScripts"),
            duplicate_policy: DuplicatePolicy::default(),
            schema_check: SchemaCheck::default(),
            sort: SortOrder::default(),
        }
    }
}

impl Settings {
    /// Load settings, falling back to defaults when the file does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            QuerydiffError::config(format!("Invalid settings file {}: {}", path.display(), e))
        })
    }

    pub fn compare_options(&self) -> CompareOptions {
        CompareOptions {
            duplicates: self.duplicate_policy,
            sort: self.sort,
        }
    }
}
