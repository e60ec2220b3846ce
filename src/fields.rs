//! Field parsers for the vendor's loosely-typed JSON
//!
//! Every parser here is total: a malformed value maps to `None` (or an
//! empty vec in array position), never a panic or an error. Absent scalars
//! stay `None`; absent arrays become empty, not null.

use chrono::NaiveDate;
use serde_json::Value;

use crate::catalog::TimeOfDay;

/// Accept a non-empty JSON string, otherwise `None`.
pub fn parse_string(value: &Value) -> Option<String> {
    match value.as_str() {
        Some(s) if !s.is_empty() => Some(s.to_string()),
        _ => None,
    }
}

/// Accept a JSON number (truncated toward zero) or a string with a leading
/// integer prefix. Zero parses as `Some(0)`.
pub fn parse_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(i),
            None => n.as_f64().map(|f| f.trunc() as i64),
        },
        Value::String(s) => integer_prefix(s),
        _ => None,
    }
}

/// Parse the leading `[+-]?digits` prefix of a string.
fn integer_prefix(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let mut end = usize::from(matches!(bytes.first(), Some(b'+') | Some(b'-')));
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    text[..end].parse().ok()
}

/// Apply `parser` to each element of an array, dropping nulls before and
/// failed parses after. Anything that is not an array yields an empty vec.
pub fn parse_array<T>(value: &Value, parser: impl Fn(&Value) -> Option<T>) -> Vec<T> {
    match value.as_array() {
        Some(items) => items
            .iter()
            .filter(|item| !item.is_null())
            .filter_map(|item| parser(item))
            .collect(),
        None => Vec::new(),
    }
}

/// Unwrap a single-element array.
///
/// Non-arrays and empty arrays yield `None`. Only the first element is ever
/// handed to `parser`; the vendor's contract is one element per record, so
/// anything beyond index 0 is discarded.
pub fn parse_single_element_array<T>(
    value: &Value,
    parser: impl Fn(&Value) -> Option<T>,
) -> Option<T> {
    value
        .as_array()
        .and_then(|items| items.first())
        .and_then(|item| parser(item))
}

/// Parse a `YYYY-MM-DD` calendar date.
///
/// The string must split into exactly three integer parts, each non-zero
/// (the vendor emits zeroed dates as an absent-value sentinel), forming a
/// real calendar date.
pub fn parse_date(value: &Value) -> Option<NaiveDate> {
    let text = value.as_str()?;
    let parts: Vec<&str> = text.split('-').collect();
    if parts.len() != 3 {
        return None;
    }
    let year = integer_prefix(parts[0])?;
    let month = integer_prefix(parts[1])?;
    let day = integer_prefix(parts[2])?;
    if year == 0 || month == 0 || day == 0 {
        return None;
    }
    NaiveDate::from_ymd_opt(
        i32::try_from(year).ok()?,
        u32::try_from(month).ok()?,
        u32::try_from(day).ok()?,
    )
}

/// Parse a 4-character `HHMM` time of day.
///
/// Midnight (`"0000"`) is a valid time; only a string of the wrong length,
/// a half without an integer prefix, or an out-of-range value is rejected.
pub fn parse_time(value: &Value) -> Option<TimeOfDay> {
    let text = value.as_str()?;
    if text.len() != 4 || !text.is_ascii() {
        return None;
    }
    let hour = integer_prefix(&text[..2])?;
    let minute = integer_prefix(&text[2..])?;
    if !(0..24).contains(&hour) || !(0..60).contains(&minute) {
        return None;
    }
    Some(TimeOfDay {
        hour: hour as u8,
        minute: minute as u8,
    })
}

/// Parse a 7-character days-of-week flag string, Sunday first.
///
/// A character other than `-` at positions 1-5 marks class on that weekday
/// (1-5 = Monday-Friday). Weekend flags are read but discarded. A string of
/// any other length yields `None`, which is distinct from an all-`-` string
/// (no class days, an empty vec).
pub fn parse_days(value: &Value) -> Option<Vec<u8>> {
    let text = value.as_str()?;
    let flags: Vec<char> = text.chars().collect();
    if flags.len() != 7 {
        return None;
    }
    Some(
        (1..6)
            .filter(|&day| flags[day] != '-')
            .map(|day| day as u8)
            .collect(),
    )
}
