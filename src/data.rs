//! Data loading utilities using DuckDB

use crate::dataset::{Cell, Dataset};
use crate::error::{QuerydiffError, Result};
use crate::sql::substitute_env_vars;
use duckdb::types::ValueRef;
use duckdb::Connection;
use std::path::Path;

/// Temporary view every load goes through
const SOURCE_VIEW: &str = "querydiff_source";

/// DuckDB-backed loader for CSV files and query results
pub struct DataProcessor {
    connection: Connection,
}

impl DataProcessor {
    /// Create a processor on a private in-memory database
    pub fn new() -> Result<Self> {
        let connection = Connection::open_in_memory()?;
        connection.execute("SET enable_progress_bar=false", [])?;
        Ok(Self { connection })
    }

    /// Connect to a query-tracking store.
    ///
    /// Accepts a DuckDB database path, `:memory:`, or a DuckDB `ATTACH ...`
    /// statement which is executed verbatim on an in-memory database.
    /// `{VAR}` placeholders are resolved from the environment first.
    pub fn connect(connection_string: &str) -> Result<Self> {
        if connection_string.trim().is_empty() {
            return Err(QuerydiffError::config(
                "Test target does not contain a valid database connection string",
            ));
        }

        let resolved = substitute_env_vars(connection_string.trim())?;

        let connection = if resolved.to_uppercase().starts_with("ATTACH") {
            let connection = Connection::open_in_memory()?;
            connection.execute_batch(&resolved).map_err(|e| {
                QuerydiffError::config(format!("Failed to attach query store: {}", e))
            })?;
            connection
        } else if resolved == ":memory:" {
            Connection::open_in_memory()?
        } else {
            let path = Path::new(&resolved);
            if !path.exists() {
                return Err(QuerydiffError::source_not_found(path));
            }
            Connection::open(path)?
        };

        log::debug!("Connected to query store");
        Ok(Self { connection })
    }

    /// Load a CSV file whose first row names the columns.
    ///
    /// Every value is read as text; quoted fields may contain commas, doubled
    /// quotes and newlines.
    pub fn load_csv(&self, file_path: &Path, name: &str) -> Result<Dataset> {
        if !file_path.exists() {
            return Err(QuerydiffError::source_not_found(file_path));
        }

        if !file_path.is_file() {
            return Err(QuerydiffError::invalid_input(format!(
                "Path is not a file: {}",
                file_path.display()
            )));
        }

        let create_view_sql = format!(
            "CREATE OR REPLACE TEMP VIEW {} AS SELECT * FROM read_csv('{}', header = true, delim = ',', quote = '\"', escape = '\"', all_varchar = true)",
            SOURCE_VIEW,
            escape_literal(&file_path.to_string_lossy())
        );

        self.connection
            .execute(&create_view_sql, [])
            .map_err(|e| self.convert_duckdb_error(e, file_path))?;

        let dataset = self
            .materialize(name)
            .map_err(|e| match e {
                QuerydiffError::DuckDb(inner) => self.convert_duckdb_error(inner, file_path),
                other => other,
            })?;

        log::info!(
            "Loaded {} rows x {} columns from {}",
            dataset.row_count(),
            dataset.column_count(),
            file_path.display()
        );
        Ok(dataset)
    }

    /// Run a read-only query and materialize the full result set
    pub fn query(&self, sql: &str, name: &str) -> Result<Dataset> {
        let body = sql.trim().trim_end_matches(';');
        if body.is_empty() {
            return Err(QuerydiffError::invalid_input("Query text is empty"));
        }

        let create_view_sql = format!("CREATE OR REPLACE TEMP VIEW {} AS {}", SOURCE_VIEW, body);
        self.connection.execute(&create_view_sql, []).map_err(|e| {
            QuerydiffError::invalid_input(format!("Failed to run query for '{}': {}", name, e))
        })?;

        let dataset = self.materialize(name)?;
        log::info!(
            "Query for '{}' returned {} rows x {} columns",
            name,
            dataset.row_count(),
            dataset.column_count()
        );
        Ok(dataset)
    }

    /// Execute a batch of statements, discarding any results
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.connection.execute_batch(sql)?;
        Ok(())
    }

    /// Write the result of a query to a CSV file with a header row
    pub fn export_csv(&self, sql: &str, file_path: &Path) -> Result<()> {
        if let Some(parent) = file_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let body = sql.trim().trim_end_matches(';');
        let copy_sql = format!(
            "COPY ({}) TO '{}' (HEADER, DELIMITER ',')",
            body,
            escape_literal(&file_path.to_string_lossy())
        );
        self.connection.execute_batch(&copy_sql)?;
        log::info!("Wrote query results to {}", file_path.display());
        Ok(())
    }

    /// Convert DuckDB errors to appropriate QuerydiffError types
    fn convert_duckdb_error(&self, error: duckdb::Error, file_path: &Path) -> QuerydiffError {
        let error_msg = error.to_string();

        if error_msg.contains("No files found") || error_msg.contains("does not exist") {
            QuerydiffError::source_not_found(file_path)
        } else if error_msg.contains("CSV Error")
            || error_msg.contains("Invalid CSV")
            || error_msg.contains("Unterminated quoted field")
            || error_msg.contains("quote")
        {
            QuerydiffError::invalid_input(format!(
                "Malformed CSV file '{}': {}",
                file_path.display(),
                error_msg
            ))
        } else if error_msg.contains("UTF-8") || error_msg.contains("encoding") {
            QuerydiffError::invalid_input(format!(
                "File encoding error '{}': {}",
                file_path.display(),
                error_msg
            ))
        } else {
            QuerydiffError::DuckDb(error)
        }
    }

    /// Column names of the source view, in order
    fn column_names(&self) -> Result<Vec<String>> {
        let mut stmt = self.connection.prepare(&format!("DESCRIBE {}", SOURCE_VIEW))?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut columns = Vec::new();
        for row in rows {
            columns.push(row?);
        }
        Ok(columns)
    }

    /// Read the whole source view into a dataset
    fn materialize(&self, name: &str) -> Result<Dataset> {
        let columns = self.column_names()?;
        let column_count = columns.len();

        let mut stmt = self.connection.prepare(&format!("SELECT * FROM {}", SOURCE_VIEW))?;
        let rows = stmt.query_map([], |row| {
            let mut cells = Vec::with_capacity(column_count);
            for i in 0..column_count {
                cells.push(cell_from_value(row.get_ref(i)?));
            }
            Ok(cells)
        })?;

        let mut data = Vec::new();
        for row in rows {
            data.push(row?);
        }

        Dataset::new(name, columns, data)
    }
}

/// Map a DuckDB value onto a dataset cell
fn cell_from_value(value: ValueRef<'_>) -> Cell {
    match value {
        ValueRef::Null => Cell::Null,
        ValueRef::Boolean(b) => Cell::Text(b.to_string()),
        ValueRef::TinyInt(i) => Cell::Int(i as i64),
        ValueRef::SmallInt(i) => Cell::Int(i as i64),
        ValueRef::Int(i) => Cell::Int(i as i64),
        ValueRef::BigInt(i) => Cell::Int(i),
        ValueRef::HugeInt(i) => match i64::try_from(i) {
            Ok(v) => Cell::Int(v),
            Err(_) => Cell::Text(i.to_string()),
        },
        ValueRef::UTinyInt(i) => Cell::Int(i as i64),
        ValueRef::USmallInt(i) => Cell::Int(i as i64),
        ValueRef::UInt(i) => Cell::Int(i as i64),
        ValueRef::UBigInt(i) => match i64::try_from(i) {
            Ok(v) => Cell::Int(v),
            Err(_) => Cell::Text(i.to_string()),
        },
        ValueRef::Float(f) => Cell::Float(f as f64),
        ValueRef::Double(f) => Cell::Float(f),
        ValueRef::Decimal(d) => Cell::Text(d.to_string()),
        ValueRef::Text(s) => Cell::Text(String::from_utf8_lossy(s).to_string()),
        ValueRef::Blob(b) => Cell::Text(format!("<blob:{} bytes>", b.len())),
        other => Cell::Text(format!("{:?}", other)),
    }
}

/// Escape a value for use inside a single-quoted SQL literal
fn escape_literal(value: &str) -> String {
    value.replace('\'', "''")
}
