mod in_memory;
mod mysql;
mod postgres;

pub use self::in_memory::{InMemoryDriver, InMemoryResponseBuilder};
pub use self::mysql::MySqlDriver;
pub use self::postgres::PostgresDriver;

/// Splits `host:port` into its parts. A bare host, an unparsable port or an
/// unbracketed IPv6 address yields no port.
pub(crate) fn split_host(host: &str) -> (&str, Option<u16>) {
    if let Some(rest) = host.strip_prefix('[') {
        if let Some((addr, tail)) = rest.split_once(']') {
            let port = tail.strip_prefix(':').and_then(|p| p.parse().ok());
            return (addr, port);
        }
    }

    match host.rsplit_once(':') {
        Some((name, port)) if !name.contains(':') => match port.parse() {
            Ok(port) => (name, Some(port)),
            Err(_) => (host, None),
        },
        _ => (host, None),
    }
}
