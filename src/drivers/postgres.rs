use async_trait::async_trait;
use tokio_postgres::{Client, Config, NoTls, SimpleQueryMessage};

use super::split_host;
use crate::binding::{quote_identifier, Escaper, StandardEscaper};
use crate::error::{DbError, Result};
use crate::traits::Driver;
use crate::types::{QueryResult, RawQueryResult};

const SESSION_OPTIONS: &str = "-c standard_conforming_strings=on";

/// Credentials kept from `connect`; PostgreSQL can only change database by
/// opening a new session.
#[derive(Clone)]
struct Session {
    host: String,
    port: Option<u16>,
    user: String,
    password: String,
}

/// PostgreSQL driver implementation using tokio-postgres.
///
/// Statements run over the simple query protocol, so bound SQL text is sent
/// exactly as produced by the binder.
#[derive(Default)]
pub struct PostgresDriver {
    client: Option<Client>,
    session: Option<Session>,
    escaper: StandardEscaper,
    last_error: String,
}

impl PostgresDriver {
    pub const NAME: &'static str = "postgres";

    pub fn new() -> Self {
        Self::default()
    }

    /// Boxed constructor for registry use.
    pub fn boxed() -> Box<dyn Driver> {
        Box::new(Self::new())
    }

    /// Session settings; `standard_conforming_strings` is forced on because
    /// [`StandardEscaper`] leaves backslashes unescaped.
    fn config(session: &Session, dbname: Option<&str>) -> Config {
        let mut config = Config::new();
        config
            .host(&session.host)
            .user(&session.user)
            .password(&session.password)
            .options(SESSION_OPTIONS);
        if let Some(port) = session.port {
            config.port(port);
        }
        if let Some(dbname) = dbname {
            config.dbname(dbname);
        }
        config
    }

    async fn open(session: &Session, dbname: Option<&str>) -> std::result::Result<Client, tokio_postgres::Error> {
        let (client, connection) = Self::config(session, dbname).connect(NoTls).await?;

        // Spawn the connection handler; it exits once the client is dropped
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!(error = %e, "PostgreSQL connection error");
            }
        });

        Ok(client)
    }

    async fn database_exists(&self, client: &Client, name: &str) -> std::result::Result<bool, tokio_postgres::Error> {
        let sql = format!(
            "SELECT 1 FROM pg_database WHERE datname = {}",
            self.escaper.quote(name)
        );
        let messages = client.simple_query(&sql).await?;
        Ok(messages
            .iter()
            .any(|m| matches!(m, SimpleQueryMessage::Row(_))))
    }

    fn record_error(&mut self, e: &tokio_postgres::Error) -> String {
        self.last_error = error_text(e);
        self.last_error.clone()
    }
}

#[async_trait]
impl Driver for PostgresDriver {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn escaper(&self) -> &dyn Escaper {
        &self.escaper
    }

    async fn connect(&mut self, host: &str, user: &str, password: &str) -> Result<()> {
        let (hostname, port) = split_host(host);
        let session = Session {
            host: hostname.to_string(),
            port,
            user: user.to_string(),
            password: password.to_string(),
        };

        match Self::open(&session, None).await {
            Ok(client) => {
                self.client = Some(client);
                self.session = Some(session);
                self.last_error.clear();
                tracing::debug!(host, user, "postgres session opened");
                Ok(())
            }
            Err(e) => Err(DbError::Connect(self.record_error(&e))),
        }
    }

    async fn select_database(&mut self, name: &str, force_create: bool) -> Result<()> {
        let (Some(client), Some(session)) = (self.client.as_ref(), self.session.clone()) else {
            self.last_error = "no live connection".to_string();
            return Err(DbError::Select(self.last_error.clone()));
        };

        if force_create {
            let exists = match self.database_exists(client, name).await {
                Ok(exists) => exists,
                Err(e) => return Err(DbError::Select(self.record_error(&e))),
            };
            if !exists {
                let sql = format!("CREATE DATABASE {}", quote_identifier(name, '"'));
                if let Err(e) = client.simple_query(&sql).await {
                    return Err(DbError::Select(self.record_error(&e)));
                }
            }
        }

        match Self::open(&session, Some(name)).await {
            Ok(client) => {
                // Dropping the old client ends its connection task
                self.client = Some(client);
                self.last_error.clear();
                Ok(())
            }
            Err(e) => Err(DbError::Select(self.record_error(&e))),
        }
    }

    async fn execute_raw(&mut self, sql: &str) -> Result<QueryResult> {
        let client = self.client.as_ref().ok_or(DbError::NotConnected)?;
        let messages = match client.simple_query(sql).await {
            Ok(messages) => messages,
            Err(e) => {
                let message = self.record_error(&e);
                return Ok(QueryResult::failed(sql, message));
            }
        };

        let mut raw = RawQueryResult::empty();
        for message in messages {
            match message {
                SimpleQueryMessage::Row(row) => {
                    if raw.columns.is_empty() {
                        raw.columns = row.columns().iter().map(|c| c.name().to_string()).collect();
                    }
                    raw.rows
                        .push((0..row.len()).map(|i| row.get(i).map(str::to_string)).collect());
                }
                SimpleQueryMessage::CommandComplete(n) => raw.affected_rows += n,
                _ => {}
            }
        }

        self.last_error.clear();
        Ok(QueryResult::from_raw(sql, raw))
    }

    fn last_error(&self) -> String {
        self.last_error.clone()
    }

    fn is_connected(&self) -> bool {
        self.client.as_ref().is_some_and(|c| !c.is_closed())
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.client = None;
        self.session = None;
        Ok(())
    }
}

/// Prefers the server's own message over the generic "db error" wrapper.
fn error_text(e: &tokio_postgres::Error) -> String {
    match e.as_db_error() {
        Some(db) => db.message().to_string(),
        None => e.to_string(),
    }
}
