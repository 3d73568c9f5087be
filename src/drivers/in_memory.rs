use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::binding::{Escaper, StandardEscaper};
use crate::error::{DbError, Result};
use crate::traits::Driver;
use crate::types::{QueryResult, RawQueryResult};

#[derive(Default)]
struct State {
    responses: VecDeque<RawQueryResult>,
    default_response: RawQueryResult,
    recorded_queries: Vec<String>,
    credentials: Option<(String, String)>,
    databases: HashSet<String>,
    rejections: Vec<(String, String)>,
    delay: Option<Duration>,
    connected: bool,
    database: Option<String>,
    last_error: String,
}

/// An in-memory database driver for testing.
///
/// Allows configuring expected responses and failures, and verifying the
/// SQL that reached the "backend" after binding. Clones share state, so a
/// clone can be registered in a [`Registry`](crate::Registry) while the
/// test keeps the original for assertions.
///
/// # Example
/// ```
/// use sqlfacade::drivers::{InMemoryDriver, InMemoryResponseBuilder};
///
/// let driver = InMemoryDriver::new().with_response(
///     InMemoryResponseBuilder::new()
///         .columns(&["id", "name"])
///         .row(&["1", "Alice"])
///         .build(),
/// );
/// ```
#[derive(Clone, Default)]
pub struct InMemoryDriver {
    state: Arc<Mutex<State>>,
    escaper: StandardEscaper,
}

impl InMemoryDriver {
    pub const NAME: &'static str = "memory";

    /// Create a new in-memory test driver with no pre-configured responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a response to be returned by the next query.
    /// Responses are returned in FIFO order.
    pub fn with_response(self, response: RawQueryResult) -> Self {
        self.state.lock().unwrap().responses.push_back(response);
        self
    }

    /// Add multiple responses to be returned by subsequent queries.
    pub fn with_responses(self, responses: impl IntoIterator<Item = RawQueryResult>) -> Self {
        self.state.lock().unwrap().responses.extend(responses);
        self
    }

    /// Set a default response to use when no queued responses remain.
    pub fn with_default_response(self, response: RawQueryResult) -> Self {
        self.state.lock().unwrap().default_response = response;
        self
    }

    /// Only accept this user/password pair in `connect`.
    pub fn with_credentials(self, user: &str, password: &str) -> Self {
        self.state.lock().unwrap().credentials = Some((user.to_string(), password.to_string()));
        self
    }

    /// Declare an existing database. With none declared, any name is accepted.
    pub fn with_database(self, name: &str) -> Self {
        self.state.lock().unwrap().databases.insert(name.to_string());
        self
    }

    /// Reject any statement containing `fragment` with `message`.
    pub fn reject_containing(self, fragment: &str, message: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .rejections
            .push((fragment.to_string(), message.to_string()));
        self
    }

    /// Sleep this long inside every `execute_raw` call.
    pub fn with_delay(self, delay: Duration) -> Self {
        self.state.lock().unwrap().delay = Some(delay);
        self
    }

    /// Get all SQL statements that have been executed, after binding.
    pub fn recorded_queries(&self) -> Vec<String> {
        self.state.lock().unwrap().recorded_queries.clone()
    }

    /// Get the last executed statement, if any.
    pub fn last_query(&self) -> Option<String> {
        self.state.lock().unwrap().recorded_queries.last().cloned()
    }

    /// Clear all recorded queries.
    pub fn clear_recorded_queries(&self) {
        self.state.lock().unwrap().recorded_queries.clear();
    }

    /// Currently selected database, if any.
    pub fn current_database(&self) -> Option<String> {
        self.state.lock().unwrap().database.clone()
    }

    /// Assert that the last executed statement matches the expected SQL.
    pub fn assert_last_query(&self, expected_sql: &str) {
        let last = self.last_query().expect("No queries were recorded");
        assert_eq!(
            last, expected_sql,
            "SQL mismatch.\nExpected: {}\nActual: {}",
            expected_sql, last
        );
    }

    /// Assert that exactly n queries were executed.
    pub fn assert_query_count(&self, expected: usize) {
        let actual = self.state.lock().unwrap().recorded_queries.len();
        assert_eq!(
            actual, expected,
            "Query count mismatch. Expected: {}, Actual: {}",
            expected, actual
        );
    }

    fn fail(&self, message: String) -> String {
        self.state.lock().unwrap().last_error = message.clone();
        message
    }
}

#[async_trait]
impl Driver for InMemoryDriver {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn escaper(&self) -> &dyn Escaper {
        &self.escaper
    }

    async fn connect(&mut self, host: &str, user: &str, password: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let accepted = match &state.credentials {
            Some((expected_user, expected_password)) => {
                user == expected_user.as_str() && password == expected_password.as_str()
            }
            None => true,
        };
        if !accepted {
            let message = format!("Access denied for user '{}'@'{}'", user, host);
            state.connected = false;
            state.last_error = message.clone();
            return Err(DbError::Connect(message));
        }
        state.connected = true;
        state.last_error.clear();
        Ok(())
    }

    async fn select_database(&mut self, name: &str, force_create: bool) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if !state.connected {
            drop(state);
            return Err(DbError::Select(self.fail("no live connection".to_string())));
        }

        let known = state.databases.is_empty() || state.databases.contains(name);
        if !known && !force_create {
            drop(state);
            return Err(DbError::Select(self.fail(format!("Unknown database '{}'", name))));
        }

        if !known {
            state.databases.insert(name.to_string());
        }
        state.database = Some(name.to_string());
        state.last_error.clear();
        Ok(())
    }

    async fn execute_raw(&mut self, sql: &str) -> Result<QueryResult> {
        let delay = {
            let mut state = self.state.lock().unwrap();
            if !state.connected {
                return Err(DbError::NotConnected);
            }
            state.recorded_queries.push(sql.to_string());
            state.delay
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock().unwrap();
        let rejection = state
            .rejections
            .iter()
            .find(|(fragment, _)| sql.contains(fragment.as_str()))
            .map(|(_, message)| message.clone());
        if let Some(message) = rejection {
            state.last_error = message.clone();
            return Ok(QueryResult::failed(sql, message));
        }

        // Return next queued response or default
        let response = state
            .responses
            .pop_front()
            .unwrap_or_else(|| state.default_response.clone());
        state.last_error.clear();
        Ok(QueryResult::from_raw(sql, response))
    }

    fn last_error(&self) -> String {
        self.state.lock().unwrap().last_error.clone()
    }

    fn is_connected(&self) -> bool {
        self.state.lock().unwrap().connected
    }

    async fn disconnect(&mut self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.connected = false;
        state.database = None;
        Ok(())
    }
}

/// Builder for creating test responses easily.
#[derive(Default)]
pub struct InMemoryResponseBuilder {
    columns: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
    affected_rows: u64,
}

impl InMemoryResponseBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the column names for the response.
    pub fn columns(mut self, cols: &[&str]) -> Self {
        self.columns = cols.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Add a row of non-NULL values.
    pub fn row(mut self, values: &[&str]) -> Self {
        self.rows
            .push(values.iter().map(|s| Some(s.to_string())).collect());
        self
    }

    /// Add a row where `None` stands for SQL NULL.
    pub fn row_with_nulls(mut self, values: &[Option<&str>]) -> Self {
        self.rows
            .push(values.iter().map(|v| v.map(str::to_string)).collect());
        self
    }

    /// Rows affected by a statement with no result set.
    pub fn affected(mut self, n: u64) -> Self {
        self.affected_rows = n;
        self
    }

    /// Build the RawQueryResult.
    pub fn build(self) -> RawQueryResult {
        RawQueryResult {
            columns: self.columns,
            rows: self.rows,
            affected_rows: self.affected_rows,
        }
    }
}
