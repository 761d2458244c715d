//! Parsing of scalar variable values.
//!
//! Booleans accept the same spellings as Go's `strconv.ParseBool`; numbers
//! are trimmed before parsing. Strings are taken verbatim.

use std::str::FromStr;

/// Parses a boolean: `1 t T TRUE true True` or `0 f F FALSE false False`.
pub fn parse_bool(text: &str) -> Result<bool, String> {
    match text.trim() {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err("expected a boolean such as true, false, 1 or 0".to_string()),
    }
}

/// Parses a number after trimming surrounding whitespace.
pub fn parse_number<T>(text: &str) -> Result<T, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    text.trim().parse().map_err(|err: T::Err| err.to_string())
}

/// Parses a single character. Surrounding whitespace is significant.
pub fn parse_char(text: &str) -> Result<char, String> {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err("expected exactly one character".to_string()),
    }
}
