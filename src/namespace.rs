//! Flat namespaces: where variables are read from and written to.
//!
//! A [`Namespace`] is any read-only mapping from canonical names to raw text.
//! A [`Sink`] is anything encoded variables can be written into. The
//! [`Accessor`] turns path segments into canonical names and answers the two
//! questions decoding asks: "what is the value at this path?" and "does
//! anything live under this path?".
//!
//! ## Naming
//!
//! A path `["app", "db", "port"]` is named `APP_DB_PORT`: every segment is
//! upper-cased and the segments are joined with `_`.
//!
//! ```rust
//! use serde_envpath::namespace::name;
//!
//! assert_eq!(name(&["app", "db", "port"]), "APP_DB_PORT");
//! assert_eq!(name(&["map", "my_key"]), "MAP_MY_KEY");
//! ```

use crate::EnvMap;
use indexmap::IndexMap;
use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

/// Renders path segments as a canonical variable name.
pub fn name<S: AsRef<str>>(segments: &[S]) -> String {
    let mut out = String::new();
    for (i, segment) in segments.iter().enumerate() {
        if i > 0 {
            out.push('_');
        }
        out.push_str(&segment.as_ref().to_uppercase());
    }
    out
}

/// A read-only source of variables.
///
/// # Examples
///
/// ```rust
/// use serde_envpath::Namespace;
/// use std::collections::HashMap;
///
/// let mut vars = HashMap::new();
/// vars.insert("PORT".to_string(), "80".to_string());
/// assert_eq!(vars.get("PORT").map(String::as_str), Some("80"));
/// assert_eq!(Namespace::get(&vars, "PORT"), Some("80"));
/// ```
pub trait Namespace {
    /// Returns the raw value of the variable `name`.
    fn get(&self, name: &str) -> Option<&str>;

    /// Iterates over every variable name.
    fn names(&self) -> Box<dyn Iterator<Item = &str> + '_>;
}

/// A writable destination for encoded variables.
pub trait Sink {
    fn set(&mut self, name: String, value: String);
}

impl<N: Namespace + ?Sized> Namespace for &N {
    fn get(&self, name: &str) -> Option<&str> {
        (**self).get(name)
    }

    fn names(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        (**self).names()
    }
}

impl<N: Namespace + ?Sized> Namespace for Box<N> {
    fn get(&self, name: &str) -> Option<&str> {
        (**self).get(name)
    }

    fn names(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        (**self).names()
    }
}

impl Namespace for EnvMap {
    fn get(&self, name: &str) -> Option<&str> {
        EnvMap::get(self, name)
    }

    fn names(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        Box::new(self.keys().map(String::as_str))
    }
}

impl<S: BuildHasher> Namespace for HashMap<String, String, S> {
    fn get(&self, name: &str) -> Option<&str> {
        HashMap::get(self, name).map(String::as_str)
    }

    fn names(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        Box::new(self.keys().map(String::as_str))
    }
}

impl Namespace for BTreeMap<String, String> {
    fn get(&self, name: &str) -> Option<&str> {
        BTreeMap::get(self, name).map(String::as_str)
    }

    fn names(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        Box::new(self.keys().map(String::as_str))
    }
}

impl<S: BuildHasher> Namespace for IndexMap<String, String, S> {
    fn get(&self, name: &str) -> Option<&str> {
        IndexMap::get(self, name).map(String::as_str)
    }

    fn names(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        Box::new(self.keys().map(String::as_str))
    }
}

/// Two namespaces stacked: variables of `upper` shadow those of `lower`.
///
/// # Examples
///
/// ```rust
/// use serde_envpath::{envmap, Namespace, Overlay};
///
/// let defaults = envmap! { "HOST" => "localhost", "PORT" => "80" };
/// let env = envmap! { "PORT" => "8080" };
/// let merged = Overlay::new(&env, &defaults);
///
/// assert_eq!(merged.get("PORT"), Some("8080"));
/// assert_eq!(merged.get("HOST"), Some("localhost"));
/// assert_eq!(merged.names().count(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct Overlay<U, L> {
    upper: U,
    lower: L,
}

impl<U: Namespace, L: Namespace> Overlay<U, L> {
    pub fn new(upper: U, lower: L) -> Self {
        Overlay { upper, lower }
    }
}

impl<U: Namespace, L: Namespace> Namespace for Overlay<U, L> {
    fn get(&self, name: &str) -> Option<&str> {
        self.upper.get(name).or_else(|| self.lower.get(name))
    }

    fn names(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        let shadowed = self
            .lower
            .names()
            .filter(move |name| self.upper.get(name).is_none());
        Box::new(self.upper.names().chain(shadowed))
    }
}

impl Sink for EnvMap {
    fn set(&mut self, name: String, value: String) {
        self.insert(name, value);
    }
}

impl<S: BuildHasher> Sink for HashMap<String, String, S> {
    fn set(&mut self, name: String, value: String) {
        self.insert(name, value);
    }
}

impl Sink for BTreeMap<String, String> {
    fn set(&mut self, name: String, value: String) {
        self.insert(name, value);
    }
}

impl<S: BuildHasher> Sink for IndexMap<String, String, S> {
    fn set(&mut self, name: String, value: String) {
        self.insert(name, value);
    }
}

impl<T: Sink + ?Sized> Sink for &mut T {
    fn set(&mut self, name: String, value: String) {
        (**self).set(name, value);
    }
}

/// The live process environment, as a [`Sink`].
///
/// Writing mutates global process state; callers running tests in parallel
/// should prefer an [`EnvMap`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl Sink for ProcessEnv {
    fn set(&mut self, name: String, value: String) {
        std::env::set_var(name, value);
    }
}

/// Path-based queries over a namespace.
pub struct Accessor<'de, N: ?Sized> {
    namespace: &'de N,
}

impl<'de, N: Namespace + ?Sized> Accessor<'de, N> {
    pub fn new(namespace: &'de N) -> Self {
        Accessor { namespace }
    }

    /// Returns the value stored exactly at `segments`.
    pub fn lookup<S: AsRef<str>>(&self, segments: &[S]) -> Option<&'de str> {
        self.namespace.get(&name(segments))
    }

    /// Returns `true` if a variable is named `segments` or lives below it.
    ///
    /// The empty path is a prefix of every variable.
    pub fn has_prefix<S: AsRef<str>>(&self, segments: &[S]) -> bool {
        let exact = name(segments);
        if exact.is_empty() {
            return self.namespace.names().next().is_some();
        }
        if self.namespace.get(&exact).is_some() {
            return true;
        }
        let nested = format!("{exact}_");
        self.namespace
            .names()
            .any(|candidate| candidate.starts_with(&nested))
    }

    /// Iterates over every variable name of the namespace.
    pub fn names(&self) -> Box<dyn Iterator<Item = &'de str> + 'de> {
        self.namespace.names()
    }
}

impl<N: ?Sized> Clone for Accessor<'_, N> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<N: ?Sized> Copy for Accessor<'_, N> {}
