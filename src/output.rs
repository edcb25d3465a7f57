//! Output formatting utilities

use crate::compare::{ComparisonReport, ComparisonRow};
use crate::config::TestTargets;
use crate::dataset::StatVariant;
use crate::error::Result;
use crate::fingerprint::Fingerprint;
use crate::report;

/// Rows shown in the summary tree
const TOP_ROWS: usize = 10;

/// Pretty printer for querydiff output
pub struct PrettyPrinter;

impl PrettyPrinter {
    /// Print a comparison summary
    pub fn print_comparison(report: &ComparisonReport, variant: StatVariant) {
        print!("{}", Self::format_comparison(report, variant));
    }

    /// Render a comparison summary as a tree
    pub fn format_comparison(report: &ComparisonReport, variant: StatVariant) -> String {
        let mut out = String::new();
        let diagnostics = &report.diagnostics;

        out.push_str(&format!("🔍 Query comparison ({})\n", variant));
        out.push_str(&format!("├─ Matched queries: {}\n", report.rows.len()));

        if diagnostics.is_clean() {
            out.push_str("├─ ✅ Every query matched\n");
        } else {
            out.push_str(&format!(
                "├─ ⚠️  Only in baseline: {}\n",
                diagnostics.unmatched_baseline.len()
            ));
            out.push_str(&format!(
                "├─ ⚠️  Only in current: {}\n",
                diagnostics.unmatched_current.len()
            ));
        }

        if report.rows.is_empty() {
            out.push_str("└─ No matching queries\n");
            return out;
        }

        let shown = report.rows.len().min(TOP_ROWS);
        out.push_str("└─ Queries:\n");
        for (i, row) in report.rows.iter().take(shown).enumerate() {
            let is_last = i == shown - 1 && report.rows.len() <= TOP_ROWS;
            let prefix = if is_last { "   └─" } else { "   ├─" };
            out.push_str(&format!("{} {}\n", prefix, format_row(row)));
        }

        if report.rows.len() > TOP_ROWS {
            out.push_str(&format!(
                "   └─ ... and {} more\n",
                report.rows.len() - TOP_ROWS
            ));
        }
        out
    }

    /// Print the configured test targets
    pub fn print_targets(targets: &TestTargets) {
        let names = targets.names();
        if names.is_empty() {
            println!("No test targets configured.");
            return;
        }

        println!("🎯 Test Targets:");
        for (i, target) in targets.iter().enumerate() {
            let prefix = if i == names.len() - 1 { "└─" } else { "├─" };
            println!("{} {} ({})", prefix, target.site_name, target.url);
        }
    }

    /// Print one fingerprint per statement
    pub fn print_fingerprints(fingerprints: &[Fingerprint]) {
        for fingerprint in fingerprints {
            println!("{}", fingerprint);
        }
    }
}

fn format_row(row: &ComparisonRow) -> String {
    let mut line = format!(
        "{}  executions {} → {} ({})",
        row.fingerprint.short(),
        row.baseline_executions,
        row.current_executions,
        format_signed(row.executions_delta() as f64, 0)
    );

    if let (Some(before), Some(after)) = (row.baseline_duration_ms, row.current_duration_ms) {
        line.push_str(&format!(
            ", duration {:.2} → {:.2} ms ({})",
            before,
            after,
            format_signed(after - before, 2)
        ));
    }
    line
}

fn format_signed(value: f64, precision: usize) -> String {
    if value > 0.0 {
        format!("+{:.*}", precision, value)
    } else {
        format!("{:.*}", precision, value)
    }
}

/// JSON formatter for machine-readable output
pub struct JsonFormatter;

impl JsonFormatter {
    /// Format comparison rows
    pub fn format_rows(rows: &[ComparisonRow], compact: bool) -> Result<String> {
        report::serialize(rows, !compact)
    }
}
