//! Command-line interface for querydiff

use crate::compare::{DuplicatePolicy, SortOrder};
use crate::dataset::StatVariant;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "querydiff")]
#[command(about = "Compare query-store statistics against recorded baselines")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Override workspace location
    #[arg(long, global = true)]
    pub workspace: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a querydiff workspace
    Init {
        /// Overwrite existing settings
        #[arg(long)]
        force: bool,
    },

    /// Print the fingerprint of SQL statements
    Fingerprint {
        /// SQL statements to fingerprint
        sql: Vec<String>,

        /// Read a single statement from a file
        #[arg(long, conflicts_with = "sql")]
        file: Option<PathBuf>,
    },

    /// Compare a baseline CSV with current statistics
    Compare {
        /// Statistics variant: "frequent" or "expensive"
        #[arg(long, value_parser = StatVariant::parse)]
        variant: StatVariant,

        /// Baseline CSV (defaults to the workspace benchmark for the variant)
        #[arg(long)]
        baseline: Option<PathBuf>,

        /// Current statistics from a CSV file
        #[arg(long, conflicts_with = "target", required_unless_present = "target")]
        current: Option<PathBuf>,

        /// Current statistics read live from a test target's query store
        #[arg(long)]
        target: Option<String>,

        /// Duplicate fingerprints: "aggregate", "cross-product", or "error"
        #[arg(long, value_parser = DuplicatePolicy::parse)]
        duplicates: Option<DuplicatePolicy>,

        /// Row order: "none", "executions", "duration", or "fingerprint"
        #[arg(long, value_parser = SortOrder::parse)]
        sort: Option<SortOrder>,

        /// Map columns by position without checking their names
        #[arg(long)]
        positional: bool,

        /// Output format: "table" or "json"
        #[arg(long, default_value = "table", value_parser = OutputFormat::parse)]
        format: OutputFormat,

        /// Compact JSON instead of indented
        #[arg(long)]
        compact: bool,

        /// Write the JSON result to a file
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Save a target's live statistics as a baseline CSV
    Capture {
        /// Test target name from TestInfos.json
        #[arg(long)]
        target: String,

        /// Statistics variant: "frequent" or "expensive"
        #[arg(long, value_parser = StatVariant::parse)]
        variant: StatVariant,

        /// Destination CSV (defaults to the workspace benchmark for the variant)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Run query store admin scripts against a target
    Setup {
        /// Test target name from TestInfos.json
        #[arg(long)]
        target: String,

        /// Turn query tracking on
        #[arg(long)]
        enable: bool,

        /// Clear tracked statistics
        #[arg(long)]
        clear: bool,

        /// Create the statistics views
        #[arg(long)]
        views: bool,
    },

    /// Run a full session: prepare the store, warm up, compare
    Run {
        /// Test target name from TestInfos.json
        #[arg(long)]
        target: String,

        /// Statistics variant: "frequent" or "expensive"
        #[arg(long, value_parser = StatVariant::parse)]
        variant: StatVariant,

        /// Command invoked with the site URL as its last argument
        #[arg(long)]
        warm_up: Option<String>,

        /// Write the JSON result to a file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Compact JSON instead of indented
        #[arg(long)]
        compact: bool,
    },

    /// List configured test targets
    Targets,
}

/// Parse output format string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "table" | "pretty" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid output format: {}. Use 'table' or 'json'", s)),
        }
    }
}
