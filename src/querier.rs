use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::binding::count_markers;
use crate::config::Timeouts;
use crate::error::{DbError, Result};
use crate::traits::{Logger, Severity, SharedDriver};
use crate::types::{QueryResult, SqlValue};

/// Latest result per SQL template, shared by the facade and its builder.
pub(crate) type ResultMemo = Arc<Mutex<HashMap<String, Arc<QueryResult>>>>;

/// Runs queries on the active driver for the facade and its query builder.
///
/// Every execution goes through the same path: optional timeout, the
/// driver's binding, the result memo and the injected logger.
#[derive(Clone)]
pub struct Querier {
    driver: SharedDriver,
    logger: Arc<dyn Logger>,
    timeouts: Timeouts,
    results: ResultMemo,
}

impl Querier {
    pub(crate) fn new(
        driver: SharedDriver,
        logger: Arc<dyn Logger>,
        timeouts: Timeouts,
        results: ResultMemo,
    ) -> Self {
        Self {
            driver,
            logger,
            timeouts,
            results,
        }
    }

    pub fn driver(&self) -> &SharedDriver {
        &self.driver
    }

    pub fn timeouts(&self) -> Timeouts {
        self.timeouts
    }

    /// Runs `sql`, verbatim when `data` is empty and through `?` binding
    /// otherwise, and keeps the result under the literal `sql`.
    pub async fn query(&self, sql: &str, data: &[SqlValue]) -> Result<Arc<QueryResult>> {
        let markers = count_markers(sql);
        if !data.is_empty() && data.len() > markers {
            self.logger.log(
                Severity::Warn,
                &format!(
                    "Ignoring {} bound value(s) without a placeholder in '{}'",
                    data.len() - markers,
                    sql
                ),
            );
        }

        let outcome = {
            let mut driver = self.driver.lock().await;
            let run = async {
                if data.is_empty() {
                    driver.execute_raw(sql).await
                } else {
                    driver.bind_and_execute(sql, data).await
                }
            };
            bounded(self.timeouts.query, "query", run).await
        };
        self.record(sql, outcome)
    }

    /// Runs `sql` with `:name` placeholders replaced from `data`.
    pub async fn bind(
        &self,
        sql: &str,
        data: &HashMap<String, SqlValue>,
    ) -> Result<Arc<QueryResult>> {
        let outcome = {
            let mut driver = self.driver.lock().await;
            bounded(
                self.timeouts.query,
                "query",
                driver.bind_named_and_execute(sql, data),
            )
            .await
        };
        self.record(sql, outcome)
    }

    fn record(&self, sql: &str, outcome: Result<QueryResult>) -> Result<Arc<QueryResult>> {
        let result = match outcome {
            Ok(result) => Arc::new(result),
            Err(e) => {
                self.logger.log(
                    Severity::Error,
                    &format!("Execute query '{}' failed: {}", sql, e),
                );
                return Err(e);
            }
        };

        self.results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(sql.to_string(), Arc::clone(&result));

        if let Err(e) = result.check() {
            self.logger.log(
                Severity::Error,
                &format!(
                    "Execute query '{}' with error {}",
                    result.sql(),
                    result.error()
                ),
            );
            return Err(e);
        }

        self.logger.log(
            Severity::Debug,
            &format!(
                "Execute query '{}' successfully, return {} result",
                result.sql(),
                result.count()
            ),
        );
        Ok(result)
    }
}

/// Applies an optional time limit to a driver call.
pub(crate) async fn bounded<T, F>(
    limit: Option<Duration>,
    operation: &'static str,
    call: F,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match limit {
        Some(after) => tokio::time::timeout(after, call)
            .await
            .map_err(|_| DbError::Timeout { operation, after })?,
        None => call.await,
    }
}
