//! # serde_envpath
//!
//! A Serde data format that maps nested values onto a flat namespace of
//! `NAME=value` pairs, such as the process environment.
//!
//! ## How it works
//!
//! Every leaf of a value lives in one variable named after its path, segments
//! upper-cased and joined with `_`. A field `port` of a struct stored under
//! the prefix `["app", "http"]` is the variable `APP_HTTP_PORT`.
//!
//! ## Key Features
//!
//! - **Serde Compatible**: Works with existing types via `#[derive(Serialize, Deserialize)]`
//! - **Maps with free-form keys**: `MAP_EU_WEST_HOST` resolves to the key
//!   `eu_west` by matching the tail against the value type's fields
//! - **Two list forms**: `PORTS=80,443` or `PORTS_0=80`, `PORTS_1=443`
//! - **Go-style struct tags**: field names such as `yaml:"port,omitempty"`
//!   are understood, with a configurable tag priority
//! - **Absence is never an error**: missing variables decode to zero values
//!
//! ## Quick Start
//!
//! Add this to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! serde_envpath = "0.1"
//! serde = { version = "1.0", features = ["derive"] }
//! ```
//!
//! ### Decoding and encoding
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use serde_envpath::{envmap, from_namespace, to_env_map};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct Server {
//!     host: String,
//!     port: u16,
//!     debug: bool,
//! }
//!
//! let env = envmap! {
//!     "SERVER_HOST" => "localhost",
//!     "SERVER_PORT" => "8080",
//! };
//! let server: Server = from_namespace(&env, &["server"]).unwrap();
//! assert_eq!(server, Server { host: "localhost".into(), port: 8080, debug: false });
//!
//! let back = to_env_map(&server, &["server"]).unwrap();
//! assert_eq!(back.get("SERVER_DEBUG"), Some("false"));
//! ```
//!
//! ### Maps whose keys contain the separator
//!
//! ```rust
//! use serde::Deserialize;
//! use serde_envpath::{envmap, from_namespace};
//! use std::collections::BTreeMap;
//!
//! #[derive(Deserialize, Debug)]
//! struct Backend { url: String }
//!
//! let env = envmap! { "BACKENDS_BILLING_API_URL" => "http://billing" };
//! let backends: BTreeMap<String, Backend> = from_namespace(&env, &["backends"]).unwrap();
//! assert_eq!(backends["billing_api"].url, "http://billing");
//! ```
//!
//! ### Reading the process environment
//!
//! ```rust,no_run
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Config { database_url: String }
//!
//! let config: Config = serde_envpath::from_env(&["myapp"]).unwrap();
//! ```
//!
//! ## Logging
//!
//! The crate reports through the [`log`] facade: `trace` for decode dispatch,
//! `debug` for resolved map keys and `warn` for ambiguous map entries. No
//! logger is installed.
//!
//! ## Naming reference
//!
//! See the [`format`] module for the complete naming rules.
//!
//! ## Examples
//!
//! See the `demos/` directory:
//!
//! - **`simple.rs`** - Decoding a configuration and writing it back
//! - **`map_keys.rs`** - Map keys that contain `_`, and ambiguity warnings
//! - **`custom_options.rs`** - Tag priority and list separators
//!
//! Run any example with: `cargo run --example <name>`

pub mod de;
pub mod duration;
pub mod error;
pub mod format;
pub mod macros;
pub mod map;
pub mod namespace;
pub mod options;
pub mod resolve;
pub mod ring;
pub mod scalar;
pub mod schema;
pub mod ser;
pub mod tags;
pub mod text;

pub use error::{Error, Result};
pub use map::EnvMap;
pub use namespace::{Namespace, Overlay, ProcessEnv, Sink};
pub use options::{EnvOptions, DEFAULT_TAGS};
pub use ser::Serializer;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Deserialize an instance of type `T` from the variables of `namespace`
/// under `prefix`.
///
/// # Examples
///
/// ```rust
/// use serde_envpath::{envmap, from_namespace};
/// use serde::Deserialize;
///
/// #[derive(Deserialize, PartialEq, Debug)]
/// struct Point { x: i32, y: i32 }
///
/// let env = envmap! { "POINT_X" => "1", "POINT_Y" => "2" };
/// let point: Point = from_namespace(&env, &["point"]).unwrap();
/// assert_eq!(point, Point { x: 1, y: 2 });
/// ```
///
/// # Errors
///
/// Returns a configuration error if `T` cannot be laid out in a flat
/// namespace, or a conversion error naming the variable whose value does not
/// parse. Missing variables are not errors.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_namespace<'de, T, N>(namespace: &'de N, prefix: &[&str]) -> Result<T>
where
    T: Deserialize<'de>,
    N: Namespace + ?Sized,
{
    from_namespace_with_options(namespace, prefix, &EnvOptions::default())
}

/// Deserialize an instance of type `T` with custom options.
///
/// # Examples
///
/// ```rust
/// use serde_envpath::{envmap, from_namespace_with_options, EnvOptions};
///
/// let env = envmap! { "HOSTS" => "a;b;c" };
/// let options = EnvOptions::new().with_list_separator(';');
/// let hosts: Vec<String> = from_namespace_with_options(&env, &["hosts"], &options).unwrap();
/// assert_eq!(hosts, vec!["a", "b", "c"]);
/// ```
///
/// # Errors
///
/// Same as [`from_namespace`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_namespace_with_options<'de, T, N>(
    namespace: &'de N,
    prefix: &[&str],
    options: &EnvOptions,
) -> Result<T>
where
    T: Deserialize<'de>,
    N: Namespace + ?Sized,
{
    de::decode(namespace, prefix, options)
}

/// Deserialize an instance of type `T` from a snapshot of the process
/// environment.
///
/// Variables whose name or value is not valid UTF-8 are invisible.
///
/// # Errors
///
/// Same as [`from_namespace`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_env<T>(prefix: &[&str]) -> Result<T>
where
    T: DeserializeOwned,
{
    from_env_with_options(prefix, &EnvOptions::default())
}

/// Deserialize an instance of type `T` from the process environment with
/// custom options.
///
/// # Errors
///
/// Same as [`from_namespace`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_env_with_options<T>(prefix: &[&str], options: &EnvOptions) -> Result<T>
where
    T: DeserializeOwned,
{
    let env = EnvMap::from_process();
    from_namespace_with_options(&env, prefix, options)
}

/// Overwrite `value` with whatever `namespace` sets under `prefix`, keeping
/// the rest of its current content.
///
/// The current value is encoded, shadowed by `namespace`, and decoded again.
///
/// # Examples
///
/// ```rust
/// use serde::{Deserialize, Serialize};
/// use serde_envpath::{envmap, update_from_namespace};
///
/// #[derive(Serialize, Deserialize, Debug, PartialEq)]
/// struct Limits { max_conns: u32, timeout_secs: u32 }
///
/// let mut limits = Limits { max_conns: 100, timeout_secs: 30 };
/// let env = envmap! { "LIMITS_TIMEOUT_SECS" => "5" };
/// update_from_namespace(&mut limits, &env, &["limits"]).unwrap();
/// assert_eq!(limits, Limits { max_conns: 100, timeout_secs: 5 });
/// ```
///
/// # Errors
///
/// Fails if the current value cannot be encoded or the merged namespace
/// cannot be decoded. `value` is left untouched on error.
pub fn update_from_namespace<T, N>(value: &mut T, namespace: &N, prefix: &[&str]) -> Result<()>
where
    T: Serialize + DeserializeOwned,
    N: Namespace + ?Sized,
{
    update_from_namespace_with_options(value, namespace, prefix, &EnvOptions::default())
}

/// [`update_from_namespace`] with custom options.
///
/// # Errors
///
/// Same as [`update_from_namespace`].
pub fn update_from_namespace_with_options<T, N>(
    value: &mut T,
    namespace: &N,
    prefix: &[&str],
    options: &EnvOptions,
) -> Result<()>
where
    T: Serialize + DeserializeOwned,
    N: Namespace + ?Sized,
{
    let mut current = EnvMap::new();
    to_namespace_with_options(&*value, prefix, &mut current, options)?;
    let merged = Overlay::new(namespace, &current);
    *value = from_namespace_with_options(&merged, prefix, options)?;
    Ok(())
}

/// Serialize `value` into `sink` under `prefix`.
///
/// # Examples
///
/// ```rust
/// use serde_envpath::to_namespace;
/// use std::collections::HashMap;
///
/// let mut sink = HashMap::new();
/// to_namespace(&vec![true, false], &["flags"], &mut sink).unwrap();
/// assert_eq!(sink["FLAGS_1"], "false");
/// ```
///
/// # Errors
///
/// Returns an error for map keys that are not strings, maps whose values are
/// maps, enum variants carrying data, non-UTF-8 bytes and scalars without a
/// prefix.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_namespace<T, S>(value: &T, prefix: &[&str], sink: &mut S) -> Result<()>
where
    T: ?Sized + Serialize,
    S: Sink + ?Sized,
{
    to_namespace_with_options(value, prefix, sink, &EnvOptions::default())
}

/// Serialize `value` into `sink` with custom options.
///
/// # Errors
///
/// Same as [`to_namespace`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_namespace_with_options<T, S>(
    value: &T,
    prefix: &[&str],
    sink: &mut S,
    options: &EnvOptions,
) -> Result<()>
where
    T: ?Sized + Serialize,
    S: Sink + ?Sized,
{
    let mut sink = sink;
    let mut serializer = Serializer::new(&mut sink, options.clone(), prefix);
    value.serialize(&mut serializer)
}

/// Serialize `value` into a fresh [`EnvMap`].
///
/// # Examples
///
/// ```rust
/// use serde_envpath::to_env_map;
/// use std::collections::BTreeMap;
///
/// let mut weights = BTreeMap::new();
/// weights.insert("eu_west", 3);
/// let env = to_env_map(&weights, &["weights"]).unwrap();
/// assert_eq!(env.to_string(), "WEIGHTS_EU_WEST=3\n");
/// ```
///
/// # Errors
///
/// Same as [`to_namespace`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_env_map<T>(value: &T, prefix: &[&str]) -> Result<EnvMap>
where
    T: ?Sized + Serialize,
{
    let mut env = EnvMap::new();
    to_namespace(value, prefix, &mut env)?;
    Ok(env)
}

/// Serialize `value` straight into the environment of the current process.
///
/// Setting variables is not thread-safe on every platform; call this before
/// spawning threads that read the environment.
///
/// # Errors
///
/// Same as [`to_namespace`]. Variables written before the error stay set.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_env<T>(value: &T, prefix: &[&str]) -> Result<()>
where
    T: ?Sized + Serialize,
{
    to_namespace(value, prefix, &mut ProcessEnv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
    struct Endpoint {
        url: String,
        retries: u8,
    }

    #[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
    struct Service {
        name: String,
        enabled: bool,
        ratio: f64,
        tags: Vec<String>,
        endpoints: HashMap<String, Endpoint>,
        #[serde(rename = "fallback,omitempty")]
        fallback: Option<Endpoint>,
    }

    fn sample() -> Service {
        let mut endpoints = HashMap::new();
        endpoints.insert(
            "eu_west".to_string(),
            Endpoint {
                url: "https://eu.example.org".to_string(),
                retries: 3,
            },
        );
        Service {
            name: "billing".to_string(),
            enabled: true,
            ratio: 0.25,
            tags: vec!["a".to_string(), "b".to_string()],
            endpoints,
            fallback: None,
        }
    }

    #[test]
    fn test_roundtrip() {
        let service = sample();
        let env = to_env_map(&service, &["svc"]).unwrap();
        assert_eq!(env.get("SVC_ENDPOINTS_EU_WEST_RETRIES"), Some("3"));
        assert_eq!(env.get("SVC_TAGS_0"), Some("a"));
        assert!(!env.contains_key("SVC_FALLBACK_URL"));

        let back: Service = from_namespace(&env, &["svc"]).unwrap();
        assert_eq!(back, service);
    }

    #[test]
    fn test_roundtrip_with_present_option() {
        let mut service = sample();
        service.fallback = Some(Endpoint {
            url: "https://backup".to_string(),
            retries: 0,
        });
        let env = to_env_map(&service, &["svc"]).unwrap();
        let back: Service = from_namespace(&env, &["svc"]).unwrap();
        assert_eq!(back, service);
    }

    #[test]
    fn test_update_keeps_unset_values() {
        let mut service = sample();
        let env = envmap! {
            "SVC_ENABLED" => "false",
            "SVC_ENDPOINTS_US_EAST_URL" => "https://us.example.org",
        };
        update_from_namespace(&mut service, &env, &["svc"]).unwrap();

        assert!(!service.enabled);
        assert_eq!(service.name, "billing");
        assert_eq!(service.endpoints.len(), 2);
        assert_eq!(service.endpoints["eu_west"].retries, 3);
        assert_eq!(service.endpoints["us_east"].retries, 0);
    }

    #[test]
    fn test_update_leaves_value_on_error() {
        let mut service = sample();
        let env = envmap! { "SVC_RATIO" => "half" };
        assert!(update_from_namespace(&mut service, &env, &["svc"]).is_err());
        assert_eq!(service, sample());
    }
}
