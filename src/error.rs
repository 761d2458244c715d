//! Error types for environment namespace decoding and encoding.
//!
//! ## Error Categories
//!
//! - **Configuration errors**: the target type cannot be mapped onto a flat
//!   namespace at all (non-string map keys, maps of maps, cyclic types,
//!   fields without a usable name). They are raised before the namespace is
//!   scanned and abort the whole call.
//! - **Conversion errors**: a value exists in the namespace but does not parse
//!   as the declared kind. They carry the canonical variable name and the raw
//!   text.
//! - **Custom errors**: messages raised by `Deserialize`/`Serialize`
//!   implementations themselves.
//!
//! A variable that is simply absent is never an error: the destination keeps
//! its zero value.
//!
//! ## Examples
//!
//! ```rust
//! use serde_envpath::{envmap, from_namespace, Error};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize, Debug)]
//! struct Server { port: u16 }
//!
//! let env = envmap! { "APP_PORT" => "eighty" };
//! let err = from_namespace::<Server, _>(&env, &["app"]).unwrap_err();
//! assert!(err.is_conversion());
//! assert!(err.to_string().contains("APP_PORT"));
//! ```

use std::fmt;
use thiserror::Error;

/// Represents all possible errors raised while decoding from or encoding to a
/// namespace.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A map whose key type does not deserialize from a string.
    #[error("cannot map `{name}`: map keys must be strings")]
    NonStringMapKey { name: String },

    /// A map whose value type is itself a map or an untyped value; the
    /// boundary between key and suffix cannot be decided.
    #[error("cannot map `{name}`: the map value is a map or an untyped value, so key boundaries are undecidable")]
    UndecidableMapValue { name: String },

    /// A type that contains itself.
    ///
    /// Detected when one struct or enum nests inside itself more than four
    /// times, so a generic struct wrapped in itself five times is reported too.
    #[error("type `{0}` is recursive; cyclic types cannot be mapped onto a flat namespace")]
    CyclicType(String),

    /// A field written as struct tags where none of the configured tag keys is present.
    #[error("field `{field}` has no tag among [{tags}] and no plain name to fall back on")]
    UnresolvedFieldName { field: String, tags: String },

    /// A value present in the namespace that does not parse as its declared kind.
    #[error("invalid value {raw:?} for `{name}`: {reason}")]
    Conversion {
        name: String,
        raw: String,
        reason: String,
    },

    /// Unsupported type for a flat namespace
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    /// Custom error
    #[error("Error: {0}")]
    Custom(String),
}

impl Error {
    /// Creates a conversion error for the variable `name` holding `raw`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_envpath::Error;
    ///
    /// let err = Error::conversion("APP_PORT", "eighty", "invalid digit found in string");
    /// assert!(err.to_string().contains("APP_PORT"));
    /// ```
    pub fn conversion<R: fmt::Display>(name: &str, raw: &str, reason: R) -> Self {
        Error::Conversion {
            name: name.to_string(),
            raw: raw.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn non_string_map_key(name: &str) -> Self {
        Error::NonStringMapKey {
            name: name.to_string(),
        }
    }

    pub fn undecidable_map_value(name: &str) -> Self {
        Error::UndecidableMapValue {
            name: name.to_string(),
        }
    }

    pub fn cyclic_type(name: &str) -> Self {
        Error::CyclicType(name.to_string())
    }

    pub fn unresolved_field_name(field: &str, tags: &[String]) -> Self {
        Error::UnresolvedFieldName {
            field: field.to_string(),
            tags: tags.join(", "),
        }
    }

    /// Creates an unsupported type error for values a flat namespace cannot hold.
    pub fn unsupported_type(msg: &str) -> Self {
        Error::UnsupportedType(msg.to_string())
    }

    /// Creates a custom error with a display message.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_envpath::Error;
    ///
    /// let err = Error::custom("something went wrong");
    /// assert!(err.to_string().contains("something went wrong"));
    /// ```
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    /// Returns `true` for errors caused by the shape of the target type rather
    /// than by namespace content.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::NonStringMapKey { .. }
                | Error::UndecidableMapValue { .. }
                | Error::CyclicType(_)
                | Error::UnresolvedFieldName { .. }
                | Error::UnsupportedType(_)
        )
    }

    /// Returns `true` for errors caused by a value that failed to parse.
    #[must_use]
    pub fn is_conversion(&self) -> bool {
        matches!(self, Error::Conversion { .. })
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(Error::non_string_map_key("MAP").is_configuration());
        assert!(Error::undecidable_map_value("MAP").is_configuration());
        assert!(Error::cyclic_type("Node").is_configuration());
        assert!(!Error::custom("boom").is_configuration());

        let err = Error::conversion("PORT", "x", "invalid digit found in string");
        assert!(err.is_conversion());
        assert!(!err.is_configuration());
    }

    #[test]
    fn test_unresolved_field_lists_tags() {
        let tags = vec!["yaml".to_string(), "json".to_string()];
        let err = Error::unresolved_field_name("toml:\"port\"", &tags);
        assert!(err.to_string().contains("yaml, json"));
    }
}
