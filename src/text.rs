//! Types with their own textual form.
//!
//! `#[serde(with = "serde_envpath::text")]` stores any `FromStr + Display`
//! type as its text. An empty value decodes to `Default::default()`, so an
//! unset variable is never an error.
//!
//! ```rust
//! use serde::Deserialize;
//! use serde_envpath::{envmap, from_namespace};
//!
//! #[derive(Deserialize, Debug)]
//! struct Bind {
//!     #[serde(with = "serde_envpath::text")]
//!     port: u16,
//!     #[serde(with = "serde_envpath::text")]
//!     workers: u16,
//! }
//!
//! let env = envmap! { "PORT" => "8080", "WORKERS" => "" };
//! let bind: Bind = from_namespace(&env, &[]).unwrap();
//! assert_eq!(bind.port, 8080);
//! assert_eq!(bind.workers, 0);
//! ```

use serde::{de, Deserializer, Serializer};
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

pub fn serialize<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    T: fmt::Display,
    S: Serializer,
{
    serializer.collect_str(value)
}

pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
where
    T: FromStr + Default,
    T::Err: fmt::Display,
    D: Deserializer<'de>,
{
    deserializer.deserialize_str(TextVisitor(PhantomData))
}

struct TextVisitor<T>(PhantomData<T>);

impl<T> de::Visitor<'_> for TextVisitor<T>
where
    T: FromStr + Default,
    T::Err: fmt::Display,
{
    type Value = T;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "the text form of {}", std::any::type_name::<T>())
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<T, E> {
        if value.is_empty() {
            return Ok(T::default());
        }
        value.parse().map_err(E::custom)
    }
}

#[cfg(test)]
mod tests {
    use crate::{envmap, from_namespace, to_env_map};
    use serde::{Deserialize, Serialize};
    use std::fmt;
    use std::str::FromStr;

    /// Replaces "foo" with "bar" when parsed, and "bar" with "foo" when printed.
    #[derive(Debug, Default, PartialEq)]
    struct Swapped(String);

    impl FromStr for Swapped {
        type Err = std::convert::Infallible;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            Ok(Swapped(s.replace("foo", "bar")))
        }
    }

    impl fmt::Display for Swapped {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(&self.0.replace("bar", "foo"))
        }
    }

    #[derive(Debug, Default, PartialEq)]
    enum Level {
        #[default]
        Info,
        Debug,
    }

    impl FromStr for Level {
        type Err = String;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            match s {
                "info" => Ok(Level::Info),
                "debug" => Ok(Level::Debug),
                other => Err(format!("unknown level {other:?}")),
            }
        }
    }

    impl fmt::Display for Level {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(match self {
                Level::Info => "info",
                Level::Debug => "debug",
            })
        }
    }

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Holder {
        #[serde(with = "super")]
        a: Swapped,
        #[serde(with = "super")]
        level: Level,
    }

    #[test]
    fn test_custom_text() {
        let env = envmap! { "A" => "foofoofoo", "LEVEL" => "debug" };
        let holder: Holder = from_namespace(&env, &[]).unwrap();
        assert_eq!(holder.a, Swapped("barbarbar".to_string()));
        assert_eq!(holder.level, Level::Debug);

        let back = to_env_map(&holder, &[]).unwrap();
        assert_eq!(back.get("A"), Some("foofoofoo"));
        assert_eq!(back.get("LEVEL"), Some("debug"));
    }

    #[test]
    fn test_absent_text_is_default() {
        let holder: Holder = from_namespace(&envmap! {}, &[]).unwrap();
        assert_eq!(holder.a, Swapped::default());
        assert_eq!(holder.level, Level::Info);
    }

    #[test]
    fn test_invalid_text_names_the_variable() {
        let env = envmap! { "LEVEL" => "loud" };
        let err = from_namespace::<Holder, _>(&env, &[]).unwrap_err();
        assert!(err.is_conversion());
        assert!(err.to_string().contains("LEVEL"));
    }
}
