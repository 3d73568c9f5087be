use std::collections::HashMap;
use std::sync::Arc;

use crate::builders::SelectBuilder;
use crate::drivers::{MySqlDriver, PostgresDriver};
use crate::error::{DbError, ResolveKind, Result};
use crate::traits::{Driver, QueryBuilder};

/// Creates a fresh, unconnected driver.
pub type DriverFactory = Arc<dyn Fn() -> Box<dyn Driver> + Send + Sync>;

/// Creates a fresh builder; the facade attaches it to its querier.
pub type BuilderFactory = Arc<dyn Fn() -> Box<dyn QueryBuilder> + Send + Sync>;

/// Name → factory lookup for drivers and their optional query builders.
///
/// Names are matched case-insensitively.
#[derive(Clone, Default)]
pub struct Registry {
    drivers: HashMap<String, DriverFactory>,
    builders: HashMap<String, BuilderFactory>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// MySQL (`mysql`, `mysqli`) and PostgreSQL (`postgres`, `pgsql`) drivers,
    /// each with a [`SelectBuilder`].
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for name in [MySqlDriver::NAME, "mysqli"] {
            registry.register_driver(name, MySqlDriver::boxed);
            registry.register_builder(name, SelectBuilder::boxed);
        }
        for name in [PostgresDriver::NAME, "pgsql"] {
            registry.register_driver(name, PostgresDriver::boxed);
            registry.register_builder(name, SelectBuilder::boxed);
        }
        registry
    }

    pub fn register_driver<F>(&mut self, name: &str, factory: F) -> &mut Self
    where
        F: Fn() -> Box<dyn Driver> + Send + Sync + 'static,
    {
        self.drivers.insert(key(name), Arc::new(factory));
        self
    }

    pub fn register_builder<F>(&mut self, name: &str, factory: F) -> &mut Self
    where
        F: Fn() -> Box<dyn QueryBuilder> + Send + Sync + 'static,
    {
        self.builders.insert(key(name), Arc::new(factory));
        self
    }

    /// Consuming form of [`Registry::register_driver`].
    pub fn with_driver<F>(mut self, name: &str, factory: F) -> Self
    where
        F: Fn() -> Box<dyn Driver> + Send + Sync + 'static,
    {
        self.register_driver(name, factory);
        self
    }

    /// Consuming form of [`Registry::register_builder`].
    pub fn with_builder<F>(mut self, name: &str, factory: F) -> Self
    where
        F: Fn() -> Box<dyn QueryBuilder> + Send + Sync + 'static,
    {
        self.register_builder(name, factory);
        self
    }

    pub fn resolve_driver(&self, name: &str) -> Result<Box<dyn Driver>> {
        self.drivers
            .get(&key(name))
            .map(|factory| factory())
            .ok_or_else(|| DbError::DriverNotFound {
                kind: ResolveKind::Driver,
                name: name.to_string(),
            })
    }

    /// A missing builder only means the feature is unavailable.
    pub fn resolve_builder(&self, name: &str) -> Option<Box<dyn QueryBuilder>> {
        self.builders.get(&key(name)).map(|factory| factory())
    }

    pub fn has_driver(&self, name: &str) -> bool {
        self.drivers.contains_key(&key(name))
    }

    /// Registered driver names, sorted.
    pub fn driver_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.drivers.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

fn key(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}
