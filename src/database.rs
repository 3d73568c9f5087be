use std::collections::HashMap;
use std::sync::{Arc, PoisonError};

use tokio::sync::Mutex;

use crate::config::{DbConfig, Timeouts};
use crate::error::{DbError, Result};
use crate::querier::{bounded, Querier, ResultMemo};
use crate::registry::Registry;
use crate::traits::{Logger, QueryBuilder, Severity};
use crate::types::{QueryResult, SqlValue};

/// Lifecycle of a [`Database`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Uninitialized,
    DriverSelected,
    Connected,
    DatabaseSelected,
}

/// Main entry point for sqlfacade.
///
/// Owns the active driver and its optional query builder. Queries from
/// both go through one [`Querier`], which binds them, logs each outcome and
/// keeps the latest result for each SQL template.
///
/// # Example
/// ```ignore
/// let mut db = Database::new(Registry::with_defaults(), Arc::new(TracingLogger));
/// db.select_driver("mysql")?;
/// db.connect("localhost", "app", "secret").await?;
/// db.database("shop", false).await?;
///
/// let users = db
///     .query("SELECT * FROM users WHERE email = ?", &["a@example.com".into()])
///     .await?;
/// ```
pub struct Database {
    registry: Registry,
    logger: Arc<dyn Logger>,
    timeouts: Timeouts,
    querier: Option<Querier>,
    builder: Option<Box<dyn QueryBuilder>>,
    state: ConnectionState,
    results: ResultMemo,
    database_error: String,
}

impl Database {
    /// An uninitialized facade; select a driver before anything else.
    pub fn new(registry: Registry, logger: Arc<dyn Logger>) -> Self {
        Self {
            registry,
            logger,
            timeouts: Timeouts::default(),
            querier: None,
            builder: None,
            state: ConnectionState::Uninitialized,
            results: ResultMemo::default(),
            database_error: String::new(),
        }
    }

    /// Limits applied to drivers selected from now on.
    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Builds a facade and applies `config`: driver, then connection, then
    /// database. Without a config (or without a driver in it) the facade
    /// stays uninitialized.
    pub async fn from_config(
        config: Option<DbConfig>,
        registry: Registry,
        logger: Arc<dyn Logger>,
    ) -> Result<Self> {
        let mut db = Self::new(registry, logger);
        let Some(config) = config else {
            return Ok(db);
        };
        db.timeouts = config.timeouts();

        let Some(driver) = config.driver.as_deref() else {
            db.logger
                .log(Severity::Warn, "Database configuration names no driver.");
            return Ok(db);
        };

        db.select_driver(driver)?;
        db.connect(&config.host, &config.username, &config.password)
            .await?;
        if let Some(name) = config.database.as_deref() {
            db.database(name, config.force_create).await?;
        }
        Ok(db)
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Name of the active driver, if one is selected.
    pub async fn driver_name(&self) -> Option<String> {
        match &self.querier {
            Some(querier) => Some(querier.driver().lock().await.name().to_string()),
            None => None,
        }
    }

    /// Makes `name` the active driver and attaches its builder, if any.
    /// Any previous driver and its connection are dropped.
    pub fn select_driver(&mut self, name: &str) -> Result<()> {
        let driver = match self.registry.resolve_driver(name) {
            Ok(driver) => driver,
            Err(e) => {
                self.logger.log(Severity::Error, &e.to_string());
                return Err(e);
            }
        };
        let querier = Querier::new(
            Arc::new(Mutex::new(driver)),
            Arc::clone(&self.logger),
            self.timeouts,
            Arc::clone(&self.results),
        );

        self.builder = self.registry.resolve_builder(name).map(|mut builder| {
            builder.attach(querier.clone());
            builder
        });
        if self.builder.is_none() {
            self.logger.log(
                Severity::Debug,
                &format!("No query builder registered for driver '{}'.", name),
            );
        }

        self.querier = Some(querier);
        self.state = ConnectionState::DriverSelected;
        self.logger
            .log(Severity::Info, &format!("Driver '{}' selected.", name));
        Ok(())
    }

    /// Connects the active driver. On failure the state is unchanged and
    /// [`Database::last_error`] carries the backend's message.
    pub async fn connect(&mut self, host: &str, user: &str, password: &str) -> Result<()> {
        let querier = self.active_querier()?.clone();
        let outcome = {
            let mut driver = querier.driver().lock().await;
            bounded(
                querier.timeouts().connect,
                "connect",
                driver.connect(host, user, password),
            )
            .await
        };

        match outcome {
            Ok(()) => {
                self.state = ConnectionState::Connected;
                self.logger.log(
                    Severity::Info,
                    &format!("Connected to '{}' as '{}'.", host, user),
                );
                Ok(())
            }
            Err(e) => {
                self.logger.log(
                    Severity::Error,
                    &format!("Cannot connect to '{}' as '{}': {}", host, user, e),
                );
                Err(e)
            }
        }
    }

    /// Selects database `name`, creating it first if `force_create` is set.
    pub async fn database(&mut self, name: &str, force_create: bool) -> Result<()> {
        let querier = self.active_querier()?.clone();
        let outcome = {
            let mut driver = querier.driver().lock().await;
            bounded(
                querier.timeouts().query,
                "select database",
                driver.select_database(name, force_create),
            )
            .await
        };

        match outcome {
            Ok(()) => {
                self.database_error.clear();
                self.state = ConnectionState::DatabaseSelected;
                self.logger
                    .log(Severity::Info, &format!("Database '{}' selected.", name));
                Ok(())
            }
            Err(e) => {
                self.database_error = e.to_string();
                self.logger.log(
                    Severity::Error,
                    &format!("Cannot select database '{}': {}", name, e),
                );
                Err(e)
            }
        }
    }

    /// Error from the last failed [`Database::database`] call, empty if the
    /// last selection succeeded.
    pub fn database_error(&self) -> &str {
        &self.database_error
    }

    /// Runs `sql`. Without `data` it is executed as-is, so it must not embed
    /// untrusted input; with `data`, each `?` is replaced by an escaped value.
    ///
    /// The result is kept under the literal `sql` text (see
    /// [`Database::result`]). A statement the backend rejects is kept too and
    /// reported as `DbError::QueryExecution`.
    pub async fn query(&self, sql: &str, data: &[SqlValue]) -> Result<Arc<QueryResult>> {
        self.active_querier()?.query(sql, data).await
    }

    /// Runs `sql` with `:name` placeholders replaced from `data`. Always goes
    /// through named binding, even when `data` is empty.
    pub async fn bind(
        &self,
        sql: &str,
        data: &HashMap<String, SqlValue>,
    ) -> Result<Arc<QueryResult>> {
        self.active_querier()?.bind(sql, data).await
    }

    /// Latest result stored for the literal template `sql`.
    pub fn result(&self, sql: &str) -> Option<Arc<QueryResult>> {
        self.results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(sql)
            .cloned()
    }

    /// The active driver's last backend error; empty without a driver.
    pub async fn last_error(&self) -> String {
        match &self.querier {
            Some(querier) => querier.driver().lock().await.last_error(),
            None => String::new(),
        }
    }

    /// Resets the attached builder and starts a query on `tables`.
    /// `Ok(None)` means the active driver has no builder.
    ///
    /// The builder runs its queries through the same [`Querier`] as
    /// [`Database::query`], so they reach the logger and the result memo.
    pub fn table(&mut self, tables: &[&str]) -> Result<Option<&mut dyn QueryBuilder>> {
        if self.querier.is_none() {
            self.logger.log(Severity::Error, &DbError::NoDriver.to_string());
            return Err(DbError::NoDriver);
        }

        match self.builder.as_mut() {
            Some(builder) => {
                builder.reset();
                Ok(Some(builder.table(tables)))
            }
            None => Ok(None),
        }
    }

    /// Closes the backend session gracefully. Dropping the facade also
    /// releases it, without waiting for the server.
    pub async fn close(mut self) -> Result<()> {
        self.builder = None;
        if let Some(querier) = self.querier.take() {
            querier.driver().lock().await.disconnect().await?;
        }
        Ok(())
    }

    fn active_querier(&self) -> Result<&Querier> {
        match &self.querier {
            Some(querier) => Ok(querier),
            None => {
                self.logger.log(Severity::Error, &DbError::NoDriver.to_string());
                Err(DbError::NoDriver)
            }
        }
    }
}
