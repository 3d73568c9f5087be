use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Which registry a failed lookup went to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveKind {
    Driver,
    Builder,
}

impl fmt::Display for ResolveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveKind::Driver => f.write_str("driver"),
            ResolveKind::Builder => f.write_str("builder"),
        }
    }
}

/// Error type for sqlfacade operations
#[derive(Debug, Error)]
pub enum DbError {
    #[error("No driver is used at the moment")]
    NoDriver,

    #[error("No {kind} registered under the name '{name}'")]
    DriverNotFound { kind: ResolveKind, name: String },

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Database selection failed: {0}")]
    Select(String),

    #[error("Driver has no live connection")]
    NotConnected,

    #[error("Template has {markers} placeholder(s) but only {supplied} value(s) were supplied")]
    BindArity { markers: usize, supplied: usize },

    #[error("No value supplied for named placeholder ':{0}'")]
    BindKey(String),

    #[error("Query '{sql}' failed: {message}")]
    QueryExecution { sql: String, message: String },

    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("Query builder: {0}")]
    Builder(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Expected {expected} row(s), got {actual}")]
    UnexpectedRowCount { expected: usize, actual: usize },
}

/// Result type alias for sqlfacade operations
pub type Result<T> = std::result::Result<T, DbError>;
