use std::collections::HashMap;

use crate::error::{DbError, Result};

/// Driver-agnostic raw result from a database query.
/// All values are converted to text by the driver; SQL NULL is `None`.
#[derive(Debug, Clone, Default)]
pub struct RawQueryResult {
    /// Column names in order
    pub columns: Vec<String>,
    /// Rows, where each row is a vector of values in column order
    pub rows: Vec<Vec<Option<String>>>,
    /// Rows changed by a statement that returns no result set
    pub affected_rows: u64,
}

impl RawQueryResult {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        Self {
            columns,
            rows,
            affected_rows: 0,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn affected(affected_rows: u64) -> Self {
        Self {
            affected_rows,
            ..Self::default()
        }
    }
}

/// A single row result from a query.
/// Values are stored as text and accessed by column name.
#[derive(Debug, Clone)]
pub struct Row {
    values: HashMap<String, Option<String>>,
}

impl Row {
    pub(crate) fn new(columns: &[String], values: Vec<Option<String>>) -> Self {
        let values = columns
            .iter()
            .zip(values)
            .map(|(col, val)| (col.clone(), val))
            .collect();
        Self { values }
    }

    /// Gets a value by column name. `Ok(None)` means the column holds NULL.
    pub fn get(&self, column: &str) -> Result<Option<&str>> {
        self.values
            .get(column)
            .map(|v| v.as_deref())
            .ok_or_else(|| DbError::ColumnNotFound(column.to_string()))
    }

    /// Returns all column names in this row.
    pub fn columns(&self) -> Vec<&str> {
        self.values.keys().map(|s| s.as_str()).collect()
    }

    /// Returns the number of columns in this row.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if this row has no columns.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Outcome of one query execution.
///
/// Built once by a driver and never mutated afterwards. A backend rejection
/// is carried as an error-flagged result rather than an `Err`, so the facade
/// can keep it alongside successful results.
#[derive(Debug, Clone)]
pub struct QueryResult {
    sql: String,
    error: Option<String>,
    columns: Vec<String>,
    rows: Vec<Row>,
    count: u64,
}

impl QueryResult {
    /// Creates a successful result for `sql` from a driver's raw output.
    pub fn from_raw(sql: impl Into<String>, raw: RawQueryResult) -> Self {
        let rows: Vec<Row> = raw
            .rows
            .into_iter()
            .map(|values| Row::new(&raw.columns, values))
            .collect();
        let count = if raw.columns.is_empty() && rows.is_empty() {
            raw.affected_rows
        } else {
            rows.len() as u64
        };
        Self {
            sql: sql.into(),
            error: None,
            columns: raw.columns,
            rows,
            count,
        }
    }

    /// Creates a result recording that the backend rejected `sql`.
    pub fn failed(sql: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            error: Some(message.into()),
            columns: Vec::new(),
            rows: Vec::new(),
            count: 0,
        }
    }

    /// The SQL text that was actually sent to the backend.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Backend error text, empty when the query succeeded.
    pub fn error(&self) -> &str {
        self.error.as_deref().unwrap_or("")
    }

    /// Returned rows for a result set, affected rows otherwise.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Converts an error-flagged result into `DbError::QueryExecution`.
    pub fn check(&self) -> Result<&Self> {
        match &self.error {
            Some(message) => Err(DbError::QueryExecution {
                sql: self.sql.clone(),
                message: message.clone(),
            }),
            None => Ok(self),
        }
    }

    /// Extracts a single row from the result.
    /// Returns an error if the result contains zero or more than one row.
    pub fn single_row(&self) -> Result<&Row> {
        match self.rows.as_slice() {
            [row] => Ok(row),
            rows => Err(DbError::UnexpectedRowCount {
                expected: 1,
                actual: rows.len(),
            }),
        }
    }

    pub fn first_row(&self) -> Option<&Row> {
        self.rows.first()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Returns the column names from this result.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the number of rows in this result.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if this result contains no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
