use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::binding::{bind_named, bind_positional, Escaper};
use crate::error::Result;
use crate::types::{QueryResult, SqlValue};

/// A driver shared between the facade and its query builder.
/// The mutex serializes every call into the backend session.
pub type SharedDriver = Arc<Mutex<Box<dyn Driver>>>;

/// Trait for database driver implementations.
/// Drivers are responsible for:
/// - Owning at most one live backend session
/// - Supplying the escaping rules of their SQL dialect
/// - Executing SQL text and converting results to `QueryResult`
#[async_trait]
pub trait Driver: Send {
    /// Registry name of this driver.
    fn name(&self) -> &str;

    /// Literal escaping rules for this backend.
    fn escaper(&self) -> &dyn Escaper;

    /// Opens the backend session. May be retried after a failure.
    /// `host` is either `host` or `host:port`.
    async fn connect(&mut self, host: &str, user: &str, password: &str) -> Result<()>;

    /// Switches the active database, creating it first when `force_create`
    /// is set and it does not exist.
    async fn select_database(&mut self, name: &str, force_create: bool) -> Result<()>;

    /// Executes `sql` exactly as given.
    ///
    /// **Never pass untrusted input here.** Nothing is escaped; use
    /// [`Driver::bind_and_execute`] or [`Driver::bind_named_and_execute`]
    /// for user-supplied values.
    ///
    /// A statement the backend rejects comes back as an error-flagged
    /// `QueryResult`; `Err` is reserved for failures where nothing ran.
    async fn execute_raw(&mut self, sql: &str) -> Result<QueryResult>;

    /// Substitutes `?` placeholders with escaped `data`, then executes.
    /// Values beyond the placeholder count are ignored.
    async fn bind_and_execute(&mut self, sql: &str, data: &[SqlValue]) -> Result<QueryResult> {
        let bound = bind_positional(sql, data, self.escaper())?;
        self.execute_raw(&bound).await
    }

    /// Substitutes `:name` placeholders with escaped `data`, then executes.
    async fn bind_named_and_execute(
        &mut self,
        sql: &str,
        data: &HashMap<String, SqlValue>,
    ) -> Result<QueryResult> {
        let bound = bind_named(sql, data, self.escaper())?;
        self.execute_raw(&bound).await
    }

    /// Most recent backend error text, empty if none.
    fn last_error(&self) -> String;

    fn is_connected(&self) -> bool;

    /// Closes the backend session gracefully.
    async fn disconnect(&mut self) -> Result<()> {
        Ok(())
    }
}
