//! SQL script files and connection string handling

use crate::error::{QuerydiffError, Result};
use std::env;
use std::fs;
use std::path::Path;

/// Placeholder replaced by the target database name in admin scripts
pub const DB_NAME_PLACEHOLDER: &str = "XXDBNameXX";

/// Read a SQL script, replacing [`DB_NAME_PLACEHOLDER`] when a database name is given
pub fn read_sql_file(file_path: &Path, db_name: Option<&str>) -> Result<String> {
    if !file_path.exists() {
        return Err(QuerydiffError::source_not_found(file_path));
    }

    let content = fs::read_to_string(file_path).map_err(|e| {
        QuerydiffError::invalid_input(format!(
            "Failed to read SQL file '{}': {}",
            file_path.display(),
            e
        ))
    })?;

    Ok(match db_name {
        Some(name) => content.replace(DB_NAME_PLACEHOLDER, name),
        None => content,
    })
}

/// Substitute environment variables in a connection string
pub fn substitute_env_vars(connection_string: &str) -> Result<String> {
    let mut result = connection_string.to_string();

    // Placeholders look like {VAR_NAME}
    let mut start = 0;
    while let Some(open_pos) = result[start..].find('{') {
        let open_pos = start + open_pos;
        if let Some(close_pos) = result[open_pos..].find('}') {
            let close_pos = open_pos + close_pos;
            let var_name = &result[open_pos + 1..close_pos];

            let var_value = env::var(var_name).map_err(|_| {
                QuerydiffError::config(format!(
                    "Environment variable '{}' not found. Make sure it's set in your .env file or environment.",
                    var_name
                ))
            })?;

            result.replace_range(open_pos..=close_pos, &var_value);
            start = open_pos + var_value.len();
        } else {
            start = open_pos + 1;
        }
    }

    Ok(result)
}

/// Load environment variables from a .env file in `dir` if it exists
pub fn load_env_file(dir: &Path) -> Result<()> {
    let env_path = dir.join(".env");
    if env_path.exists() {
        dotenvy::from_path(&env_path).map_err(|e| {
            QuerydiffError::config(format!("Failed to load {}: {}", env_path.display(), e))
        })?;
        log::debug!("Loaded environment from {}", env_path.display());
    }

    Ok(())
}
