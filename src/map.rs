//! Ordered namespace container.
//!
//! This module provides [`EnvMap`], a wrapper around [`IndexMap`] holding
//! canonical variable names and their raw text. It is both a readable
//! [`Namespace`](crate::Namespace) and a writable [`Sink`](crate::Sink), so it
//! is the usual source in tests and the usual target of encoding.
//!
//! ## Why IndexMap?
//!
//! Encoding writes variables in field declaration order, and an `EnvMap`
//! keeps that order when iterated or printed. Lookups stay O(1).
//!
//! ## Examples
//!
//! ```rust
//! use serde_envpath::EnvMap;
//!
//! let mut env = EnvMap::new();
//! env.insert("APP_PORT", "8080");
//! env.insert("APP_HOST", "localhost");
//!
//! assert_eq!(env.len(), 2);
//! assert_eq!(env.get("APP_PORT"), Some("8080"));
//! ```

use indexmap::IndexMap;
use std::collections::HashMap;
use std::fmt;

/// An ordered map of variable names to raw values.
///
/// # Examples
///
/// ```rust
/// use serde_envpath::EnvMap;
///
/// let mut env = EnvMap::new();
/// env.insert("FIRST", "1");
/// env.insert("SECOND", "2");
///
/// let names: Vec<_> = env.keys().cloned().collect();
/// assert_eq!(names, vec!["FIRST", "SECOND"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvMap(IndexMap<String, String>);

impl EnvMap {
    /// Creates an empty `EnvMap`.
    #[must_use]
    pub fn new() -> Self {
        EnvMap(IndexMap::new())
    }

    /// Creates an empty `EnvMap` with the specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        EnvMap(IndexMap::with_capacity(capacity))
    }

    /// Snapshots the current process environment.
    ///
    /// Variables whose name or value is not valid Unicode are left out.
    #[must_use]
    pub fn from_process() -> Self {
        std::env::vars_os()
            .filter_map(|(name, value)| Some((name.into_string().ok()?, value.into_string().ok()?)))
            .collect()
    }

    /// Inserts a variable, returning the previous value if there was one.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_envpath::EnvMap;
    ///
    /// let mut env = EnvMap::new();
    /// assert!(env.insert("KEY", "1").is_none());
    /// assert_eq!(env.insert("KEY", "2"), Some("1".to_string()));
    /// ```
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(name.into(), value.into())
    }

    /// Returns the raw value of a variable.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Removes a variable, keeping the order of the others.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.0.shift_remove(name)
    }

    /// Returns `true` if the variable is present.
    #[must_use]
    pub fn contains_key(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Returns the number of variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the map holds no variables.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns an iterator over the names, in insertion order.
    pub fn keys(&self) -> indexmap::map::Keys<'_, String, String> {
        self.0.keys()
    }

    /// Returns an iterator over `(name, value)` pairs, in insertion order.
    pub fn iter(&self) -> indexmap::map::Iter<'_, String, String> {
        self.0.iter()
    }

    /// Sorts the variables by name.
    pub fn sort_keys(&mut self) {
        self.0.sort_keys();
    }

    /// Consumes the map, returning the underlying [`IndexMap`].
    #[must_use]
    pub fn into_inner(self) -> IndexMap<String, String> {
        self.0
    }
}

impl fmt::Display for EnvMap {
    /// Renders the map as `NAME=value` lines, like a dotenv file.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.0 {
            writeln!(f, "{name}={value}")?;
        }
        Ok(())
    }
}

impl From<IndexMap<String, String>> for EnvMap {
    fn from(map: IndexMap<String, String>) -> Self {
        EnvMap(map)
    }
}

impl From<HashMap<String, String>> for EnvMap {
    fn from(map: HashMap<String, String>) -> Self {
        let mut env: EnvMap = map.into_iter().collect();
        env.sort_keys();
        env
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for EnvMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        EnvMap(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for EnvMap {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.0
            .extend(iter.into_iter().map(|(k, v)| (k.into(), v.into())));
    }
}

impl IntoIterator for EnvMap {
    type Item = (String, String);
    type IntoIter = indexmap::map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a EnvMap {
    type Item = (&'a String, &'a String);
    type IntoIter = indexmap::map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
