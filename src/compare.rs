//! Fingerprint join between baseline and current query statistics

use crate::dataset::{Dataset, StatVariant};
use crate::error::{QuerydiffError, Result};
use crate::fingerprint::Fingerprint;
use crate::stats::{fingerprint_rows, FingerprintedRow};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// What to do when several rows on one side share a fingerprint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Merge duplicates: sum executions and total durations, weight averages by executions
    #[default]
    Aggregate,
    /// Plain equi-join: every baseline/current pair sharing a key is emitted
    CrossProduct,
    /// Refuse to compare
    Error,
}

impl DuplicatePolicy {
    pub fn parse(s: &str) -> std::result::Result<Self, String> {
        match s.to_lowercase().as_str() {
            "aggregate" => Ok(Self::Aggregate),
            "cross" | "cross-product" | "cross_product" => Ok(Self::CrossProduct),
            "error" => Ok(Self::Error),
            _ => Err(format!(
                "Invalid duplicate policy: {}. Use 'aggregate', 'cross-product', or 'error'",
                s
            )),
        }
    }
}

/// Result ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Baseline order
    #[default]
    None,
    /// Largest execution increase first
    ExecutionsDelta,
    /// Largest total duration increase first; rows without durations last
    DurationDelta,
    Fingerprint,
}

impl SortOrder {
    pub fn parse(s: &str) -> std::result::Result<Self, String> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "executions" | "executions-delta" => Ok(Self::ExecutionsDelta),
            "duration" | "duration-delta" => Ok(Self::DurationDelta),
            "fingerprint" => Ok(Self::Fingerprint),
            _ => Err(format!(
                "Invalid sort order: {}. Use 'none', 'executions', 'duration', or 'fingerprint'",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CompareOptions {
    pub duplicates: DuplicatePolicy,
    pub sort: SortOrder,
}

/// One matched baseline/current pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonRow {
    pub fingerprint: Fingerprint,
    pub baseline_executions: i64,
    pub current_executions: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline_duration_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_duration_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline_average_duration_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_average_duration_ms: Option<f64>,
}

impl ComparisonRow {
    pub fn executions_delta(&self) -> i64 {
        self.current_executions.saturating_sub(self.baseline_executions)
    }

    pub fn duration_delta(&self) -> Option<f64> {
        match (self.baseline_duration_ms, self.current_duration_ms) {
            (Some(base), Some(current)) => Some(current - base),
            _ => None,
        }
    }
}

/// A row that found no partner on the other side
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnmatchedRow {
    pub row: usize,
    pub fingerprint: Fingerprint,
}

/// Rows dropped by the inner join
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct JoinDiagnostics {
    pub unmatched_baseline: Vec<UnmatchedRow>,
    pub unmatched_current: Vec<UnmatchedRow>,
}

impl JoinDiagnostics {
    pub fn is_clean(&self) -> bool {
        self.unmatched_baseline.is_empty() && self.unmatched_current.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComparisonReport {
    pub rows: Vec<ComparisonRow>,
    pub diagnostics: JoinDiagnostics,
}

/// Statistics of every row sharing one fingerprint on one side
struct Group<'a> {
    rows: Vec<&'a FingerprintedRow>,
}

struct Merged {
    executions: i64,
    total_duration_ms: Option<f64>,
    average_duration_ms: Option<f64>,
}

impl From<&FingerprintedRow> for Merged {
    fn from(row: &FingerprintedRow) -> Self {
        Self {
            executions: row.stats.executions,
            total_duration_ms: row.stats.total_duration_ms,
            average_duration_ms: row.stats.average_duration_ms,
        }
    }
}

impl<'a> Group<'a> {
    fn merged(&self) -> Merged {
        if let [only] = self.rows.as_slice() {
            return Merged::from(*only);
        }

        let executions = self
            .rows
            .iter()
            .fold(0i64, |acc, r| acc.saturating_add(r.stats.executions));

        let totals: Vec<f64> = self.rows.iter().filter_map(|r| r.stats.total_duration_ms).collect();
        let total_duration_ms = if totals.is_empty() {
            None
        } else {
            Some(totals.iter().sum())
        };

        let averages: Vec<(f64, i64)> = self
            .rows
            .iter()
            .filter_map(|r| r.stats.average_duration_ms.map(|avg| (avg, r.stats.executions)))
            .collect();
        let weight = averages
            .iter()
            .fold(0i64, |acc, (_, execs)| acc.saturating_add(*execs));
        let average_duration_ms = if averages.is_empty() {
            None
        } else if weight > 0 {
            let weighted: f64 = averages.iter().map(|(avg, execs)| avg * *execs as f64).sum();
            Some(weighted / weight as f64)
        } else {
            Some(averages.iter().map(|(avg, _)| avg).sum::<f64>() / averages.len() as f64)
        };

        Merged {
            executions,
            total_duration_ms,
            average_duration_ms,
        }
    }
}

/// Group rows by fingerprint, keeping first-occurrence order
fn group_rows(rows: &[FingerprintedRow]) -> IndexMap<&Fingerprint, Group<'_>> {
    let mut groups: IndexMap<&Fingerprint, Group<'_>> = IndexMap::new();
    for row in rows {
        groups
            .entry(&row.fingerprint)
            .or_insert_with(|| Group { rows: Vec::new() })
            .rows
            .push(row);
    }
    groups
}

fn ensure_unique(groups: &IndexMap<&Fingerprint, Group<'_>>, dataset: &str) -> Result<()> {
    for (fingerprint, group) in groups {
        if let [first, second, ..] = group.rows.as_slice() {
            return Err(QuerydiffError::DuplicateFingerprint {
                dataset: dataset.to_string(),
                fingerprint: fingerprint.to_string(),
                first_row: first.row,
                second_row: second.row,
            });
        }
    }
    Ok(())
}

fn pair(fingerprint: &Fingerprint, baseline: Merged, current: Merged) -> ComparisonRow {
    ComparisonRow {
        fingerprint: fingerprint.clone(),
        baseline_executions: baseline.executions,
        current_executions: current.executions,
        baseline_duration_ms: baseline.total_duration_ms,
        current_duration_ms: current.total_duration_ms,
        baseline_average_duration_ms: baseline.average_duration_ms,
        current_average_duration_ms: current.average_duration_ms,
    }
}

fn unmatched(rows: &[FingerprintedRow], other: &IndexSet<&Fingerprint>) -> Vec<UnmatchedRow> {
    rows.iter()
        .filter(|r| !other.contains(&r.fingerprint))
        .map(|r| UnmatchedRow {
            row: r.row,
            fingerprint: r.fingerprint.clone(),
        })
        .collect()
}

/// Inner-join baseline and current rows on fingerprint.
///
/// Rows without a partner are reported in the diagnostics, not as errors.
/// Output follows baseline order unless `options.sort` says otherwise.
pub fn compare(
    baseline: &[FingerprintedRow],
    current: &[FingerprintedRow],
    options: &CompareOptions,
) -> Result<ComparisonReport> {
    let baseline_groups = group_rows(baseline);
    let current_groups = group_rows(current);

    let mut rows = match options.duplicates {
        DuplicatePolicy::Aggregate | DuplicatePolicy::Error => {
            if options.duplicates == DuplicatePolicy::Error {
                ensure_unique(&baseline_groups, "baseline")?;
                ensure_unique(&current_groups, "current")?;
            }
            baseline_groups
                .iter()
                .filter_map(|(fingerprint, base)| {
                    current_groups
                        .get(*fingerprint)
                        .map(|cur| pair(fingerprint, base.merged(), cur.merged()))
                })
                .collect::<Vec<_>>()
        }
        DuplicatePolicy::CrossProduct => {
            let mut rows = Vec::new();
            for base in baseline {
                if let Some(cur) = current_groups.get(&base.fingerprint) {
                    for matched in &cur.rows {
                        rows.push(pair(&base.fingerprint, Merged::from(base), Merged::from(*matched)));
                    }
                }
            }
            rows
        }
    };

    let baseline_keys: IndexSet<&Fingerprint> = baseline_groups.keys().copied().collect();
    let current_keys: IndexSet<&Fingerprint> = current_groups.keys().copied().collect();
    let diagnostics = JoinDiagnostics {
        unmatched_baseline: unmatched(baseline, &current_keys),
        unmatched_current: unmatched(current, &baseline_keys),
    };

    sort_rows(&mut rows, options.sort);

    log::info!(
        "Matched {} queries ({} baseline rows, {} current rows)",
        rows.len(),
        baseline.len(),
        current.len()
    );
    if !diagnostics.is_clean() {
        log::warn!(
            "{} baseline rows and {} current rows had no match and were left out",
            diagnostics.unmatched_baseline.len(),
            diagnostics.unmatched_current.len()
        );
        for missing in &diagnostics.unmatched_baseline {
            log::debug!("Unmatched baseline row {}: {}", missing.row, missing.fingerprint);
        }
        for missing in &diagnostics.unmatched_current {
            log::debug!("Unmatched current row {}: {}", missing.row, missing.fingerprint);
        }
    }

    Ok(ComparisonReport { rows, diagnostics })
}

/// Fingerprint two reconciled datasets and compare them
pub fn compare_datasets(
    baseline: &Dataset,
    current: &Dataset,
    variant: StatVariant,
    options: &CompareOptions,
) -> Result<ComparisonReport> {
    let baseline_rows = fingerprint_rows(baseline, variant)?;
    let current_rows = fingerprint_rows(current, variant)?;
    compare(&baseline_rows, &current_rows, options)
}

fn sort_rows(rows: &mut [ComparisonRow], order: SortOrder) {
    match order {
        SortOrder::None => {}
        SortOrder::ExecutionsDelta => {
            rows.sort_by(|a, b| b.executions_delta().cmp(&a.executions_delta()));
        }
        SortOrder::DurationDelta => {
            rows.sort_by(|a, b| match (a.duration_delta(), b.duration_delta()) {
                (Some(x), Some(y)) => y.total_cmp(&x),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            });
        }
        SortOrder::Fingerprint => {
            rows.sort_by(|a, b| a.fingerprint.cmp(&b.fingerprint));
        }
    }
}
