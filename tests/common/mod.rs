#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use sqlfacade::builders::SelectBuilder;
use sqlfacade::drivers::InMemoryDriver;
use sqlfacade::{Database, Logger, Registry, Severity};

/// Logger that keeps every message for later assertions.
#[derive(Default)]
pub struct RecordingLogger {
    entries: Mutex<Vec<(Severity, String)>>,
}

impl RecordingLogger {
    pub fn entries(&self) -> Vec<(Severity, String)> {
        self.entries.lock().unwrap().clone()
    }

    pub fn has(&self, severity: Severity, fragment: &str) -> bool {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .any(|(s, m)| *s == severity && m.contains(fragment))
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|(s, _)| *s == severity)
            .count()
    }
}

impl Logger for RecordingLogger {
    fn log(&self, severity: Severity, message: &str) {
        self.entries
            .lock()
            .unwrap()
            .push((severity, message.to_string()));
    }
}

/// Registry exposing `driver` under the name "memory", optionally with a
/// select builder.
pub fn registry_for(driver: &InMemoryDriver, with_builder: bool) -> Registry {
    let shared = driver.clone();
    let registry = Registry::new().with_driver("memory", move || Box::new(shared.clone()));
    if with_builder {
        registry.with_builder("memory", SelectBuilder::boxed)
    } else {
        registry
    }
}

/// A facade over `driver` with a recording logger.
pub fn facade(driver: &InMemoryDriver, with_builder: bool) -> (Database, Arc<RecordingLogger>) {
    let logger = Arc::new(RecordingLogger::default());
    let db = Database::new(registry_for(driver, with_builder), logger.clone());
    (db, logger)
}

/// A facade that already has the "memory" driver selected and connected.
pub async fn connected(driver: &InMemoryDriver, with_builder: bool) -> (Database, Arc<RecordingLogger>) {
    let (mut db, logger) = facade(driver, with_builder);
    db.select_driver("memory").unwrap();
    db.connect("localhost", "app", "secret").await.unwrap();
    (db, logger)
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
