mod builder;
mod driver;
mod logger;

pub use builder::QueryBuilder;
pub use driver::{Driver, SharedDriver};
pub use logger::{Logger, Severity, TracingLogger};
