//! In-memory tabular datasets and schema reconciliation

use crate::error::{QuerydiffError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single value in a loaded dataset
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

impl Cell {
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => f.write_str("NULL"),
            Cell::Int(i) => write!(f, "{}", i),
            Cell::Float(v) => write!(f, "{}", v),
            Cell::Text(s) => f.write_str(s),
        }
    }
}

/// Which query-store statistics a dataset carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatVariant {
    MostFrequent,
    MostExpensive,
}

pub const SQL_COLUMN: &str = "Sql";
pub const EXECUTIONS_COLUMN: &str = "Executions";
pub const TOTAL_DURATION_COLUMN: &str = "TotalDurationMS";
pub const AVERAGE_DURATION_COLUMN: &str = "AverageDurationMS";

impl StatVariant {
    pub fn parse(s: &str) -> std::result::Result<Self, String> {
        match s.to_lowercase().as_str() {
            "frequent" | "most-frequent" | "most_frequent" => Ok(Self::MostFrequent),
            "expensive" | "most-expensive" | "most_expensive" => Ok(Self::MostExpensive),
            _ => Err(format!("Invalid variant: {}. Use 'frequent' or 'expensive'", s)),
        }
    }

    /// Logical column names, in positional order
    pub fn target_columns(&self) -> &'static [&'static str] {
        match self {
            Self::MostFrequent => &[SQL_COLUMN, EXECUTIONS_COLUMN],
            Self::MostExpensive => &[
                SQL_COLUMN,
                EXECUTIONS_COLUMN,
                TOTAL_DURATION_COLUMN,
                AVERAGE_DURATION_COLUMN,
            ],
        }
    }

    /// Baseline file stem inside the benchmarks directory
    pub fn benchmark_name(&self) -> &'static str {
        match self {
            Self::MostFrequent => "MostFrequentQueries",
            Self::MostExpensive => "MostExpensiveQueries",
        }
    }

    /// Query-store view created by the matching admin script
    pub fn view_name(&self) -> &'static str {
        match self {
            Self::MostFrequent => "ViewQueryStoreMostFrequentQueries",
            Self::MostExpensive => "ViewQueryStoreMostExpensiveQueries",
        }
    }

    /// Query used to read the current statistics from the view
    pub fn live_query(&self) -> String {
        match self {
            Self::MostFrequent => format!(
                "SELECT query_sql_text AS \"Sql\", total_executions AS \"Executions\" FROM {}",
                self.view_name()
            ),
            Self::MostExpensive => format!(
                "SELECT query_sql_text AS \"Sql\", executions AS \"Executions\", \
                 total_duration_ms AS \"TotalDurationMS\", avg_duration_ms AS \"AverageDurationMS\" \
                 FROM {}",
                self.view_name()
            ),
        }
    }

    pub fn has_durations(&self) -> bool {
        matches!(self, Self::MostExpensive)
    }
}

impl fmt::Display for StatVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MostFrequent => f.write_str("most-frequent"),
            Self::MostExpensive => f.write_str("most-expensive"),
        }
    }
}

/// How loaded column names are checked before they are renamed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaCheck {
    /// Source names must match a known alias of the logical column at that position
    #[default]
    Strict,
    /// Rename by position only; the caller guarantees column order
    Positional,
}

/// Accepted source names for a logical column, normalized
fn column_aliases(logical: &str) -> &'static [&'static str] {
    match logical {
        SQL_COLUMN => &["sql", "querysqltext", "sqltext", "query"],
        EXECUTIONS_COLUMN => &[
            "executions",
            "excecutions",
            "totalexecutions",
            "countexecutions",
            "executioncount",
        ],
        TOTAL_DURATION_COLUMN => &["totaldurationms", "totalduration"],
        AVERAGE_DURATION_COLUMN => &[
            "averagedurationms",
            "avgdurationms",
            "averageduration",
            "avgduration",
        ],
        _ => &[],
    }
}

/// Lowercase and drop everything but letters and digits, so `[Sql]`,
/// `query_sql_text` and `TotalDurationMS` compare cleanly
fn normalize_column_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// An ordered collection of rows sharing one column schema
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    name: String,
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Dataset {
    /// Build a dataset; every row must have one cell per column
    pub fn new(name: impl Into<String>, columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Result<Self> {
        let name = name.into();
        for (idx, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(QuerydiffError::invalid_input(format!(
                    "Row {} of dataset '{}' has {} values but the schema has {} columns",
                    idx + 1,
                    name,
                    row.len(),
                    columns.len()
                )));
            }
        }
        Ok(Self { name, columns, rows })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ordered source column names (the schema descriptor)
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Rename the leading columns to the variant's logical names.
    ///
    /// With [`SchemaCheck::Positional`] the caller must guarantee that the
    /// source emits columns in the target order; mislabeled columns are not
    /// detected in that mode.
    pub fn reconcile(self, variant: StatVariant, check: SchemaCheck) -> Result<Self> {
        let target = variant.target_columns();

        if self.columns.len() < target.len() {
            return Err(QuerydiffError::schema_mismatch(format!(
                "Dataset '{}' has {} columns [{}], {} variant needs at least {} [{}]",
                self.name,
                self.columns.len(),
                self.columns.join(", "),
                variant,
                target.len(),
                target.join(", ")
            )));
        }

        if check == SchemaCheck::Strict {
            for (position, logical) in target.iter().enumerate() {
                let found = &self.columns[position];
                let normalized = normalize_column_name(found);
                if !column_aliases(logical).contains(&normalized.as_str()) {
                    return Err(QuerydiffError::schema_mismatch(format!(
                        "Dataset '{}' column {} is '{}', expected {} (accepted: {})",
                        self.name,
                        position + 1,
                        found,
                        logical,
                        column_aliases(logical).join(", ")
                    )));
                }
            }
        }

        let mut columns = self.columns;
        for (position, logical) in target.iter().enumerate() {
            if columns[position] != *logical {
                log::debug!("Renaming column '{}' to '{}'", columns[position], logical);
                columns[position] = logical.to_string();
            }
        }

        Ok(Self {
            name: self.name,
            columns,
            rows: self.rows,
        })
    }
}
