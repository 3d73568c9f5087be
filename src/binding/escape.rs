use crate::types::SqlValue;

/// Backend-specific rules for spelling data as SQL literals.
///
/// Implementations are pure and never need a live connection, but each one
/// assumes a session mode: [`MySqlEscaper`] needs backslash escapes enabled
/// (no `NO_BACKSLASH_ESCAPES` in `sql_mode`) and [`StandardEscaper`] needs
/// `standard_conforming_strings = on`. The bundled drivers set these when
/// they open a session.
pub trait Escaper: Send + Sync {
    /// Escapes `value` so it can sit between single quotes.
    fn escape(&self, value: &str) -> String;

    /// Spelling of a boolean in this dialect.
    fn boolean(&self, value: bool) -> &'static str;

    /// Whether a backslash escapes the next character inside a quoted
    /// string in this dialect.
    fn backslash_escapes(&self) -> bool {
        false
    }

    /// Escapes `value` and wraps it in single quotes.
    fn quote(&self, value: &str) -> String {
        let escaped = self.escape(value);
        let mut out = String::with_capacity(escaped.len() + 2);
        out.push('\'');
        out.push_str(&escaped);
        out.push('\'');
        out
    }

    /// Renders a bound value as a complete SQL literal.
    ///
    /// Negative numbers are parenthesized so a marker written after `-`
    /// can never produce a `--` comment.
    fn literal(&self, value: &SqlValue) -> String {
        match value {
            SqlValue::Null => "NULL".to_string(),
            SqlValue::Text(s) => self.quote(s),
            SqlValue::Int32(i) => number(i.to_string()),
            SqlValue::Int64(i) => number(i.to_string()),
            SqlValue::Float(f) if f.is_finite() => number(f.to_string()),
            SqlValue::Float(f) => self.quote(&f.to_string()),
            SqlValue::Bool(b) => self.boolean(*b).to_string(),
        }
    }
}

fn number(text: String) -> String {
    if text.starts_with('-') {
        format!("({})", text)
    } else {
        text
    }
}

/// MySQL escaping, matching the character set of `mysql_real_escape_string`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlEscaper;

impl Escaper for MySqlEscaper {
    fn escape(&self, value: &str) -> String {
        let mut out = String::with_capacity(value.len());
        for c in value.chars() {
            match c {
                '\0' => out.push_str("\\0"),
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\\' => out.push_str("\\\\"),
                '\'' => out.push_str("\\'"),
                '"' => out.push_str("\\\""),
                '\x1a' => out.push_str("\\Z"),
                _ => out.push(c),
            }
        }
        out
    }

    fn boolean(&self, value: bool) -> &'static str {
        if value {
            "1"
        } else {
            "0"
        }
    }

    fn backslash_escapes(&self) -> bool {
        true
    }
}

/// SQL-standard escaping: quotes are doubled and backslashes are literal.
///
/// Correct for PostgreSQL with `standard_conforming_strings = on` (the default
/// since 9.1). NUL cannot appear in PostgreSQL text and is dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardEscaper;

impl Escaper for StandardEscaper {
    fn escape(&self, value: &str) -> String {
        let mut out = String::with_capacity(value.len());
        for c in value.chars() {
            match c {
                '\'' => out.push_str("''"),
                '\0' => {}
                _ => out.push(c),
            }
        }
        out
    }

    fn boolean(&self, value: bool) -> &'static str {
        if value {
            "TRUE"
        } else {
            "FALSE"
        }
    }
}

/// Quotes an identifier (database or table name) with `quote` as delimiter,
/// doubling any embedded delimiter.
pub fn quote_identifier(name: &str, quote: char) -> String {
    let mut out = String::with_capacity(name.len() + 2);
    out.push(quote);
    for c in name.chars() {
        if c == quote {
            out.push(quote);
        }
        out.push(c);
    }
    out.push(quote);
    out
}
