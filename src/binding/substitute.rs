use std::collections::HashMap;

use crate::binding::Escaper;
use crate::error::{DbError, Result};
use crate::types::SqlValue;

/// The positional placeholder character.
pub const POSITIONAL_MARKER: char = '?';

/// Number of positional placeholders in `template`.
pub fn count_markers(template: &str) -> usize {
    template.matches(POSITIONAL_MARKER).count()
}

/// Replaces each `?` in `template`, left to right, with the literal for the
/// next value in `data`.
///
/// Output goes to a fresh buffer, so substituted text is never scanned for
/// markers again. Values beyond the marker count are ignored; too few values
/// is a `BindArity` error and nothing is returned.
pub fn bind_positional(template: &str, data: &[SqlValue], escaper: &dyn Escaper) -> Result<String> {
    let markers = count_markers(template);
    if data.len() < markers {
        return Err(DbError::BindArity {
            markers,
            supplied: data.len(),
        });
    }

    let mut pieces = template.split(POSITIONAL_MARKER);
    let mut sql = String::with_capacity(template.len() + 16 * markers);
    // split always yields at least one piece
    sql.push_str(pieces.next().unwrap_or_default());
    for (piece, value) in pieces.zip(data) {
        sql.push_str(&escaper.literal(value));
        sql.push_str(piece);
    }
    Ok(sql)
}

/// Replaces each `:name` placeholder with the literal for `data[name]`.
///
/// Names match `[A-Za-z_][A-Za-z0-9_]*`. A colon next to another colon is
/// never a marker, so `value::text` casts pass through untouched, and
/// anything between `'`, `"` or backtick quotes is copied as written. The
/// same name may appear any number of times; unused keys are ignored.
pub fn bind_named(
    template: &str,
    data: &HashMap<String, SqlValue>,
    escaper: &dyn Escaper,
) -> Result<String> {
    let bytes = template.as_bytes();
    let mut sql = String::with_capacity(template.len() + 16 * data.len());
    let mut copied = 0;
    let mut i = 0;

    while i < bytes.len() {
        if matches!(bytes[i], b'\'' | b'"' | b'`') {
            i = skip_quoted(bytes, i, escaper.backslash_escapes());
            continue;
        }
        if !starts_named_marker(bytes, i) {
            i += 1;
            continue;
        }

        let start = i + 1;
        let len = bytes[start..]
            .iter()
            .take_while(|b| b.is_ascii_alphanumeric() || **b == b'_')
            .count();
        let end = start + len;
        let name = &template[start..end];
        let value = data
            .get(name)
            .ok_or_else(|| DbError::BindKey(name.to_string()))?;

        sql.push_str(&template[copied..i]);
        sql.push_str(&escaper.literal(value));
        copied = end;
        i = end;
    }

    sql.push_str(&template[copied..]);
    Ok(sql)
}

/// Index just past the quoted section opening at `start`, or the end of
/// input when it is never closed. A doubled quote reads as close then reopen.
fn skip_quoted(bytes: &[u8], start: usize, backslash_escapes: bool) -> usize {
    let quote = bytes[start];
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if backslash_escapes => i += 2,
            b if b == quote => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

fn starts_named_marker(bytes: &[u8], i: usize) -> bool {
    if bytes[i] != b':' {
        return false;
    }
    if i > 0 && bytes[i - 1] == b':' {
        return false;
    }
    matches!(bytes.get(i + 1), Some(b) if b.is_ascii_alphabetic() || *b == b'_')
}
