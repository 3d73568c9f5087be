//! Textual parameter binding: escaping values and substituting placeholders.

mod escape;
mod substitute;

pub use escape::{quote_identifier, Escaper, MySqlEscaper, StandardEscaper};
pub use substitute::{bind_named, bind_positional, count_markers, POSITIONAL_MARKER};
