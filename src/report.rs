//! JSON rendering of comparison results

use crate::compare::ComparisonRow;
use crate::error::Result;
use std::path::Path;

/// Render rows as a JSON array of flat objects.
///
/// `pretty` only changes indentation; field order and values are identical.
pub fn serialize(rows: &[ComparisonRow], pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(rows)?
    } else {
        serde_json::to_string(rows)?
    };
    Ok(json)
}

/// Parse rows previously produced by [`serialize`]
pub fn deserialize(json: &str) -> Result<Vec<ComparisonRow>> {
    Ok(serde_json::from_str(json)?)
}

/// Serialize rows into `path`, creating parent directories as needed
pub fn write_report(path: &Path, rows: &[ComparisonRow], pretty: bool) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    std::fs::write(path, serialize(rows, pretty)?)?;
    log::info!("Wrote {} comparison rows to {}", rows.len(), path.display());
    Ok(())
}
