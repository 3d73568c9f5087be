//! sqlfacade - a small database facade with pluggable drivers and safe
//! textual parameter binding
//!
//! # Example
//! ```ignore
//! use std::sync::Arc;
//! use sqlfacade::{Database, Registry, SqlValue, TracingLogger};
//!
//! let mut db = Database::new(Registry::with_defaults(), Arc::new(TracingLogger));
//! db.select_driver("mysql")?;
//! db.connect("localhost:3306", "app", "secret").await?;
//! db.database("shop", false).await?;
//!
//! // `?` markers are replaced, in order, by escaped literals
//! let result = db
//!     .query(
//!         "SELECT * FROM t WHERE a = ? AND b = ?",
//!         &[SqlValue::from("x"), SqlValue::from("y")],
//!     )
//!     .await?;
//! println!("{} row(s)", result.count());
//! ```

pub mod binding;
pub mod builders;
pub mod clauses;
pub mod config;
pub mod drivers;
pub mod error;
pub mod querier;
pub mod registry;
pub mod traits;
pub mod types;

mod database;

// Re-export main types for convenient access
pub use clauses::WhereClause;
pub use config::{DbConfig, Timeouts};
pub use database::{ConnectionState, Database};
pub use error::{DbError, ResolveKind, Result};
pub use querier::Querier;
pub use registry::Registry;
pub use traits::{Driver, Logger, QueryBuilder, Severity, SharedDriver, TracingLogger};
pub use types::{QueryResult, RawQueryResult, Row, SqlValue};
