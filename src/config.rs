//! Connection settings loaded from JSON.
//!
//! ```json
//! {
//!   "driver": "mysql",
//!   "host": "localhost:3306",
//!   "username": "app",
//!   "password": "secret",
//!   "database": "shop",
//!   "query_timeout_secs": 30
//! }
//! ```

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{DbError, Result};

/// Optional limits applied around driver calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timeouts {
    pub connect: Option<Duration>,
    pub query: Option<Duration>,
}

/// Settings the facade applies at startup.
#[derive(Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DbConfig {
    /// Registry name of the driver to select.
    pub driver: Option<String>,
    /// `host` or `host:port`.
    pub host: String,
    #[serde(alias = "user")]
    pub username: String,
    pub password: String,
    pub database: Option<String>,
    /// Create `database` when it does not exist.
    pub force_create: bool,
    pub connect_timeout_secs: Option<u64>,
    pub query_timeout_secs: Option<u64>,
}

impl DbConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| DbError::Config(e.to_string()))
    }

    /// Reads `path`. A missing file is `Ok(None)`, not an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Option<Self>> {
        let path = path.as_ref();
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(DbError::Config(format!("{}: {}", path.display(), e))),
        };

        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|e| DbError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Returns the first config found among `paths`, tried in order.
    pub fn load_first<P: AsRef<Path>>(paths: &[P]) -> Result<Option<Self>> {
        for path in paths {
            if let Some(config) = Self::load(path)? {
                return Ok(Some(config));
            }
        }
        Ok(None)
    }

    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            connect: self.connect_timeout_secs.map(Duration::from_secs),
            query: self.query_timeout_secs.map(Duration::from_secs),
        }
    }
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("driver", &self.driver)
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("force_create", &self.force_create)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("query_timeout_secs", &self.query_timeout_secs)
            .finish()
    }
}
