//! Field naming rules.
//!
//! A field's serde name (after `#[serde(rename = "...")]`) decides both the
//! name it contributes to a path and how it is treated:
//!
//! | serde name | meaning |
//! |---|---|
//! | `port` | named `port` |
//! | `port,omitempty` | named `port`, skipped when nothing lives under it |
//! | `-` | never read or written |
//! | `,squash` / `,inline` | embedded: its own fields live at the parent's path |
//! | `yaml:"port" json:"p"` | struct tags: the first configured tag key present wins |
//!
//! ```rust
//! use serde_envpath::tags::{resolve_field, FieldRule};
//!
//! let tags = vec!["yaml".to_string(), "json".to_string()];
//! assert_eq!(
//!     resolve_field("json:\"p\" yaml:\"port,omitempty\"", &tags).unwrap(),
//!     FieldRule::Named { name: "port", omit_empty: true }
//! );
//! assert_eq!(resolve_field(",inline", &tags).unwrap(), FieldRule::Squash);
//! ```

use crate::{Error, Result};

/// How a single struct field maps onto the namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule<'a> {
    /// Excluded with `-`.
    Skip,
    /// Embedded with `,squash` or `,inline`.
    Squash,
    /// Contributes `name` to the path.
    Named { name: &'a str, omit_empty: bool },
}

impl<'a> FieldRule<'a> {
    /// Returns the contributed name, if any.
    pub fn name(&self) -> Option<&'a str> {
        match self {
            FieldRule::Named { name, .. } => Some(name),
            _ => None,
        }
    }
}

/// Resolves a serde field name into its [`FieldRule`], consulting `tags` in
/// order when the name is written as struct tags.
pub fn resolve_field<'a>(field: &'a str, tags: &[String]) -> Result<FieldRule<'a>> {
    let value = if is_struct_tag(field) {
        tags.iter()
            .find_map(|tag| lookup_tag(field, tag))
            .ok_or_else(|| Error::unresolved_field_name(field, tags))?
    } else {
        field
    };
    parse_tag_value(field, value, tags)
}

fn parse_tag_value<'a>(field: &str, value: &'a str, tags: &[String]) -> Result<FieldRule<'a>> {
    let mut parts = value.split(',');
    let name = parts.next().unwrap_or_default().trim();
    let mut omit_empty = false;
    let mut squash = false;
    for option in parts {
        match option.trim() {
            "squash" | "inline" => squash = true,
            "omitempty" => omit_empty = true,
            _ => {}
        }
    }

    if squash {
        Ok(FieldRule::Squash)
    } else if name == "-" {
        Ok(FieldRule::Skip)
    } else if name.is_empty() {
        Err(Error::unresolved_field_name(field, tags))
    } else {
        Ok(FieldRule::Named { name, omit_empty })
    }
}

fn is_struct_tag(field: &str) -> bool {
    field.contains(":\"")
}

/// Finds the value of `key` in a struct-tag string such as
/// `yaml:"port,omitempty" json:"port"`.
///
/// Escaped quotes inside values are skipped over but left escaped.
pub fn lookup_tag<'a>(tag: &'a str, key: &str) -> Option<&'a str> {
    let mut rest = tag;
    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            return None;
        }
        let colon = rest.find(':')?;
        let name = &rest[..colon];
        let after = &rest[colon + 1..];
        if !after.starts_with('"') || name.contains(|c: char| c == ' ' || c == '"') {
            return None;
        }
        let body = &after[1..];
        let end = closing_quote(body)?;
        if name == key {
            return Some(&body[..end]);
        }
        rest = &body[end + 1..];
    }
}

fn closing_quote(body: &str) -> Option<usize> {
    let mut escaped = false;
    for (i, c) in body.char_indices() {
        match c {
            '\\' if !escaped => escaped = true,
            '"' if !escaped => return Some(i),
            _ => escaped = false,
        }
    }
    None
}
