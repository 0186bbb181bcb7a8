//! Column and token helpers for fixed-width and whitespace-separated records.

use std::str::FromStr;

/// Returns the columns `start..end` of `line`, clamped to its length.
///
/// Slices that would split a multi-byte character yield an empty string rather than
/// panicking.
pub fn column(line: &str, start: usize, end: usize) -> &str {
    let end = end.min(line.len());
    if start >= end {
        return "";
    }
    line.get(start..end).unwrap_or("")
}

/// Returns everything from `start` to the end of `line`.
pub fn column_from(line: &str, start: usize) -> &str {
    column(line, start, line.len())
}

/// Returns the byte at `index` as a character, or a space past the end.
pub fn char_at(line: &str, index: usize) -> char {
    line.as_bytes()
        .get(index)
        .map(|&b| if b.is_ascii() { b as char } else { ' ' })
        .unwrap_or(' ')
}

/// Parses a trimmed column.
pub fn parse_column<T: FromStr>(line: &str, start: usize, end: usize) -> Option<T> {
    column(line, start, end).trim().parse().ok()
}

/// Parses the first `N` whitespace-separated tokens of `text`.
pub fn scan<T: FromStr + Copy + Default, const N: usize>(text: &str) -> Option<[T; N]> {
    let mut values = [T::default(); N];
    let mut tokens = text.split_whitespace();
    for value in &mut values {
        *value = tokens.next()?.parse().ok()?;
    }
    Some(values)
}
