//! Administrative scripts against the query-tracking store

use crate::data::DataProcessor;
use crate::dataset::StatVariant;
use crate::error::{QuerydiffError, Result};
use crate::sql::read_sql_file;
use std::path::Path;

/// Turns query tracking on for the target database
pub const QUERY_STORE_ON: &str = "QueryStoreOn";
/// Clears previously tracked statistics
pub const QUERY_STORE_CLEAR: &str = "QueryStoreClear";

/// Script that (re)creates the statistics view a variant reads from
pub fn view_script(variant: StatVariant) -> &'static str {
    variant.view_name()
}

/// Run `<scripts_dir>/<script_name>.sql` against the store.
///
/// Every `XXDBNameXX` in the script is replaced by `db_name` when given.
pub fn run_admin_script(
    connection_string: &str,
    scripts_dir: &Path,
    script_name: &str,
    db_name: Option<&str>,
) -> Result<()> {
    if connection_string.trim().is_empty() {
        return Err(QuerydiffError::config(
            "Test target does not contain a valid database connection string",
        ));
    }

    let script_path = scripts_dir.join(format!("{}.sql", script_name));
    let script = read_sql_file(&script_path, db_name)?;

    let store = DataProcessor::connect(connection_string)?;
    store.execute_batch(&script).map_err(|e| {
        QuerydiffError::invalid_input(format!("Admin script '{}' failed: {}", script_name, e))
    })?;

    log::info!("Executed admin script {}", script_name);
    Ok(())
}
