//! MySQL driver.
//!
//! Runs every statement over a single sqlx `MySqlConnection` using the text
//! protocol (`sqlx::raw_sql`), which matches the textual binding done in
//! [`crate::binding`].

use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlRow};
use sqlx::{Column, ConnectOptions, Connection, Either, Row, ValueRef};

use super::split_host;
use crate::binding::{quote_identifier, Escaper, MySqlEscaper};
use crate::error::{DbError, Result};
use crate::traits::Driver;
use crate::types::{QueryResult, RawQueryResult};

/// Drops `NO_BACKSLASH_ESCAPES` from the session's `sql_mode`;
/// [`MySqlEscaper`] output is only a single literal with backslash escapes on.
const ENABLE_BACKSLASH_ESCAPES: &str = "SET SESSION sql_mode = TRIM(BOTH ',' FROM \
     REPLACE(CONCAT(',', @@SESSION.sql_mode, ','), ',NO_BACKSLASH_ESCAPES,', ','))";

/// MySQL (and protocol-compatible servers such as MariaDB) driver.
#[derive(Default)]
pub struct MySqlDriver {
    conn: Option<MySqlConnection>,
    escaper: MySqlEscaper,
    last_error: String,
}

impl MySqlDriver {
    pub const NAME: &'static str = "mysql";

    pub fn new() -> Self {
        Self::default()
    }

    /// Boxed constructor for registry use.
    pub fn boxed() -> Box<dyn Driver> {
        Box::new(Self::new())
    }

    fn connect_options(host: &str, user: &str, password: &str) -> MySqlConnectOptions {
        let (hostname, port) = split_host(host);
        let options = MySqlConnectOptions::new()
            .host(hostname)
            .username(user)
            .password(password);
        match port {
            Some(port) => options.port(port),
            None => options,
        }
    }
}

impl std::fmt::Debug for MySqlDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlDriver")
            .field("connected", &self.conn.is_some())
            .field("last_error", &self.last_error)
            .finish()
    }
}

#[async_trait]
impl Driver for MySqlDriver {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn escaper(&self) -> &dyn Escaper {
        &self.escaper
    }

    async fn connect(&mut self, host: &str, user: &str, password: &str) -> Result<()> {
        let options = Self::connect_options(host, user, password);
        let opened = match options.connect().await {
            Ok(mut conn) => run(&mut conn, ENABLE_BACKSLASH_ESCAPES).await.map(|()| conn),
            Err(e) => Err(e),
        };
        match opened {
            Ok(conn) => {
                self.conn = Some(conn);
                self.last_error.clear();
                tracing::debug!(host, user, "mysql session opened");
                Ok(())
            }
            Err(e) => {
                self.last_error = e.to_string();
                Err(DbError::Connect(self.last_error.clone()))
            }
        }
    }

    async fn select_database(&mut self, name: &str, force_create: bool) -> Result<()> {
        let Some(conn) = self.conn.as_mut() else {
            self.last_error = "no live connection".to_string();
            return Err(DbError::Select(self.last_error.clone()));
        };

        let database = quote_identifier(name, '`');
        let mut outcome = Ok(());
        if force_create {
            outcome = run(conn, &format!("CREATE DATABASE IF NOT EXISTS {}", database)).await;
        }
        if outcome.is_ok() {
            outcome = run(conn, &format!("USE {}", database)).await;
        }

        match outcome {
            Ok(()) => {
                self.last_error.clear();
                Ok(())
            }
            Err(e) => {
                self.last_error = e.to_string();
                Err(DbError::Select(self.last_error.clone()))
            }
        }
    }

    async fn execute_raw(&mut self, sql: &str) -> Result<QueryResult> {
        let conn = self.conn.as_mut().ok_or(DbError::NotConnected)?;
        match fetch(conn, sql).await {
            Ok(raw) => {
                self.last_error.clear();
                Ok(QueryResult::from_raw(sql, raw))
            }
            Err(e) => {
                self.last_error = e.to_string();
                Ok(QueryResult::failed(sql, self.last_error.clone()))
            }
        }
    }

    fn last_error(&self) -> String {
        self.last_error.clone()
    }

    fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    async fn disconnect(&mut self) -> Result<()> {
        if let Some(conn) = self.conn.take() {
            conn.close()
                .await
                .map_err(|e| DbError::Connect(e.to_string()))?;
        }
        Ok(())
    }
}

async fn run(conn: &mut MySqlConnection, sql: &str) -> std::result::Result<(), sqlx::Error> {
    fetch(conn, sql).await.map(|_| ())
}

/// Collects every result set row and affected-row count produced by `sql`.
async fn fetch(conn: &mut MySqlConnection, sql: &str) -> std::result::Result<RawQueryResult, sqlx::Error> {
    let mut raw = RawQueryResult::empty();
    let mut stream = sqlx::raw_sql(sql).fetch_many(&mut *conn);

    while let Some(item) = stream.try_next().await? {
        match item {
            Either::Left(done) => raw.affected_rows += done.rows_affected(),
            Either::Right(row) => {
                if raw.columns.is_empty() {
                    raw.columns = row.columns().iter().map(|c| c.name().to_string()).collect();
                }
                raw.rows.push(row_values(&row));
            }
        }
    }

    Ok(raw)
}

/// Text-protocol values arrive as bytes; decode them without type checks.
fn row_values(row: &MySqlRow) -> Vec<Option<String>> {
    (0..row.len())
        .map(|index| {
            match row.try_get_raw(index) {
                Ok(raw) if !raw.is_null() => {}
                _ => return None,
            }
            row.try_get_unchecked::<String, _>(index)
                .ok()
                .or_else(|| {
                    row.try_get_unchecked::<Vec<u8>, _>(index)
                        .ok()
                        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
                })
        })
        .collect()
}
