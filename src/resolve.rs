//! Map-key resolution.
//!
//! A map field at path `MAP` owns every variable named `MAP_<key>_<suffix>`,
//! where the key may itself contain `_` and the suffix is a path through the
//! map value's [`Ring`]. For each variable the resolver tries suffix lengths
//! `0, 1, 2, …` and keeps the first one the ring accepts, so keys are as long
//! as possible.
//!
//! ```text
//! MAP_MY_KEY_MY_KEY                         -> key "my_key",   suffix MY_KEY
//! MAP_MY_MY_MY_INNER_NODE_0_MAP_INNER_NODE  -> key "my_my",    suffix MY_INNER_NODE_0_MAP_INNER_NODE
//! MAP_MY_MY_MY_MY_KEY                       -> key "my_my_my", suffix MY_KEY
//! ```

use crate::namespace::{self, Accessor, Namespace};
use crate::ring::Ring;
use crate::schema::{ScalarKind, Shape};
use crate::{EnvOptions, Error, Result};
use indexmap::IndexMap;
use log::{debug, warn};

/// A map key found in the namespace, with the suffixes seen after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEntry {
    pub key: String,
    pub suffixes: Vec<Vec<String>>,
}

/// Checks that a map with these key and value shapes can be stored in a flat
/// namespace at all.
pub fn check_map(path: &[String], key: &Shape, value: &Ring) -> Result<()> {
    if !matches!(key.strip_option(), Shape::Scalar(ScalarKind::Str)) {
        return Err(Error::non_string_map_key(&display_path(path)));
    }
    if value.is_dynamic() {
        return Err(Error::undecidable_map_value(&display_path(path)));
    }
    Ok(())
}

/// Names a map in configuration errors; the root map is `<root>`.
pub(crate) fn display_path<S: AsRef<str>>(path: &[S]) -> String {
    let name = namespace::name(path);
    if name.is_empty() {
        "<root>".to_string()
    } else {
        name
    }
}

/// Enumerates the keys of the map stored at `path`.
///
/// # Errors
///
/// Fails before looking at the namespace when the key is not a string or the
/// value is itself a map or untyped.
pub fn resolve_map<N: Namespace + ?Sized>(
    accessor: &Accessor<'_, N>,
    path: &[String],
    key: &Shape,
    value: &Ring,
    options: &EnvOptions,
) -> Result<Vec<ResolvedEntry>> {
    check_map(path, key, value)?;

    let map_name = namespace::name(path);
    let prefix = if map_name.is_empty() {
        String::new()
    } else {
        format!("{map_name}_")
    };

    let mut names: Vec<&str> = accessor
        .names()
        .filter(|name| name.len() > prefix.len() && name.starts_with(&prefix))
        .collect();
    names.sort_unstable();
    names.dedup();

    let mut entries: IndexMap<String, ResolvedEntry> = IndexMap::new();
    for name in names {
        let rest = &name[prefix.len()..];
        if rest.chars().any(char::is_lowercase) {
            debug!("`{name}` is not an upper-case name; ignored by map `{map_name}`");
            continue;
        }
        let tokens: Vec<&str> = rest.split('_').collect();
        let count = tokens.len();
        let Some(suffix_len) = (0..count).find(|&len| value.matches(&tokens[count - len..])) else {
            debug!("`{name}` does not fit map `{map_name}`; ignored");
            continue;
        };
        let split = count - suffix_len;

        if options.warn_on_ambiguity {
            report_ambiguity(name, &tokens, split, value);
        }

        let key = tokens[..split].join("_").to_lowercase();
        let suffix: Vec<String> = tokens[split..].iter().map(|t| t.to_string()).collect();
        debug!("`{name}` resolved to key {key:?} of map `{map_name}`");
        entries
            .entry(key.clone())
            .or_insert_with(|| ResolvedEntry {
                key,
                suffixes: Vec::new(),
            })
            .suffixes
            .push(suffix);
    }
    Ok(entries.into_values().collect())
}

fn report_ambiguity(name: &str, tokens: &[&str], split: usize, value: &Ring) {
    let alternatives: Vec<String> = (1..split)
        .filter(|&other| value.matches(&tokens[other..]))
        .map(|other| tokens[..other].join("_").to_lowercase())
        .collect();
    if !alternatives.is_empty() {
        warn!(
            "`{name}` could also be read with key(s) {alternatives:?}; using the longest key {:?}",
            tokens[..split].join("_").to_lowercase()
        );
    }
    let paths = value.possibilities(&tokens[split..]);
    if paths > 1 {
        warn!("`{name}` matches {paths} fields of the map value; all of them will read it");
    }
}
