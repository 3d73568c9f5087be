use std::fmt;

/// Importance of a logged message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Warn => "warn",
            Severity::Error => "error",
        };
        f.write_str(label)
    }
}

/// Sink for the facade's outcome messages.
pub trait Logger: Send + Sync {
    fn log(&self, severity: Severity, message: &str);
}

/// Forwards messages to `tracing` under the `sqlfacade` target.
/// Install a subscriber (e.g. `tracing-subscriber`) to see them.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Debug => tracing::debug!(target: "sqlfacade", "{message}"),
            Severity::Info => tracing::info!(target: "sqlfacade", "{message}"),
            Severity::Warn => tracing::warn!(target: "sqlfacade", "{message}"),
            Severity::Error => tracing::error!(target: "sqlfacade", "{message}"),
        }
    }
}
