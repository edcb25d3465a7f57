//! Typed query statistics extracted from reconciled datasets

use crate::dataset::{
    Cell, Dataset, StatVariant, AVERAGE_DURATION_COLUMN, EXECUTIONS_COLUMN, SQL_COLUMN,
    TOTAL_DURATION_COLUMN,
};
use crate::error::{QuerydiffError, Result};
use crate::fingerprint::{fingerprint, Fingerprint};

/// One observed or baseline query execution record
#[derive(Debug, Clone, PartialEq)]
pub struct QueryStatRow {
    pub sql: String,
    pub executions: i64,
    pub total_duration_ms: Option<f64>,
    pub average_duration_ms: Option<f64>,
}

/// A statistics row keyed by the fingerprint of its SQL text
#[derive(Debug, Clone, PartialEq)]
pub struct FingerprintedRow {
    /// 1-based data row number in the source dataset
    pub row: usize,
    pub fingerprint: Fingerprint,
    pub stats: QueryStatRow,
}

struct ColumnLayout {
    sql: usize,
    executions: usize,
    total_duration: Option<usize>,
    average_duration: Option<usize>,
}

impl ColumnLayout {
    fn resolve(dataset: &Dataset, variant: StatVariant) -> Result<Self> {
        let require = |name: &str| {
            dataset.column_index(name).ok_or_else(|| {
                QuerydiffError::schema_mismatch(format!(
                    "Dataset '{}' has no '{}' column; reconcile it to the {} schema first (found: {})",
                    dataset.name(),
                    name,
                    variant,
                    dataset.columns().join(", ")
                ))
            })
        };

        let sql = require(SQL_COLUMN)?;
        let executions = require(EXECUTIONS_COLUMN)?;
        let (total_duration, average_duration) = if variant.has_durations() {
            (
                Some(require(TOTAL_DURATION_COLUMN)?),
                Some(require(AVERAGE_DURATION_COLUMN)?),
            )
        } else {
            (None, None)
        };

        Ok(Self {
            sql,
            executions,
            total_duration,
            average_duration,
        })
    }
}

/// Extract typed rows, failing on the first row that cannot be coerced
pub fn extract_rows(dataset: &Dataset, variant: StatVariant) -> Result<Vec<QueryStatRow>> {
    let layout = ColumnLayout::resolve(dataset, variant)?;
    let mut rows = Vec::with_capacity(dataset.row_count());

    for (idx, cells) in dataset.rows().iter().enumerate() {
        let row = idx + 1;
        let integrity =
            |field: &str, msg: String| QuerydiffError::data_integrity(dataset.name(), row, field, msg);

        let sql = match &cells[layout.sql] {
            Cell::Null => return Err(integrity(SQL_COLUMN, "No SQL statement found".to_string())),
            Cell::Text(s) => s.clone(),
            other => other.to_string(),
        };

        let executions =
            parse_count(&cells[layout.executions]).map_err(|msg| integrity(EXECUTIONS_COLUMN, msg))?;

        let total_duration_ms = match layout.total_duration {
            Some(col) => parse_duration(&cells[col]).map_err(|msg| integrity(TOTAL_DURATION_COLUMN, msg))?,
            None => None,
        };
        let average_duration_ms = match layout.average_duration {
            Some(col) => {
                parse_duration(&cells[col]).map_err(|msg| integrity(AVERAGE_DURATION_COLUMN, msg))?
            }
            None => None,
        };

        rows.push(QueryStatRow {
            sql,
            executions,
            total_duration_ms,
            average_duration_ms,
        });
    }

    Ok(rows)
}

/// Extract typed rows and fingerprint each one's SQL text
pub fn fingerprint_rows(dataset: &Dataset, variant: StatVariant) -> Result<Vec<FingerprintedRow>> {
    let rows = extract_rows(dataset, variant)?
        .into_iter()
        .enumerate()
        .map(|(idx, stats)| FingerprintedRow {
            row: idx + 1,
            fingerprint: fingerprint(&stats.sql),
            stats,
        })
        .collect::<Vec<_>>();

    log::debug!("Fingerprinted {} rows of '{}'", rows.len(), dataset.name());
    Ok(rows)
}

/// Parse an execution count
fn parse_count(cell: &Cell) -> std::result::Result<i64, String> {
    let count = match cell {
        Cell::Null => return Err("execution count is missing".to_string()),
        Cell::Int(i) => *i,
        Cell::Float(f) => {
            if f.is_finite() && f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 {
                *f as i64
            } else {
                return Err(format!("'{}' is not an integer", f));
            }
        }
        Cell::Text(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| format!("'{}' is not an integer", s))?,
    };

    if count < 0 {
        return Err(format!("execution count {} is negative", count));
    }
    Ok(count)
}

/// Parse an optional duration in milliseconds
fn parse_duration(cell: &Cell) -> std::result::Result<Option<f64>, String> {
    let value = match cell {
        Cell::Null => return Ok(None),
        Cell::Int(i) => *i as f64,
        Cell::Float(f) => *f,
        Cell::Text(s) if s.trim().is_empty() => return Ok(None),
        Cell::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("'{}' is not a number", s))?,
    };

    if !value.is_finite() {
        return Err(format!("'{}' is not a finite duration", value));
    }
    Ok(Some(value))
}
