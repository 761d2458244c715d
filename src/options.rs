//! Configuration options for namespace decoding and encoding.
//!
//! - [`EnvOptions`]: main configuration struct
//! - [`DEFAULT_TAGS`]: the tag keys consulted when a field name is written as
//!   struct tags
//!
//! ## Examples
//!
//! ```rust
//! use serde_envpath::{envmap, from_namespace_with_options, EnvOptions};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize, Debug, PartialEq)]
//! struct Config {
//!     #[serde(rename = "env:\"http_port\" yaml:\"port\"")]
//!     port: u16,
//! }
//!
//! let env = envmap! { "HTTP_PORT" => "8080" };
//! let options = EnvOptions::new().with_tags(["env"]);
//! let config: Config = from_namespace_with_options(&env, &[], &options).unwrap();
//! assert_eq!(config.port, 8080);
//! ```

/// Tag keys consulted by default, in priority order.
pub const DEFAULT_TAGS: [&str; 3] = ["yaml", "json", "mapstructure"];

/// Configuration options for decoding and encoding.
///
/// # Examples
///
/// ```rust
/// use serde_envpath::EnvOptions;
///
/// let options = EnvOptions::new()
///     .with_tag("env")
///     .with_list_separator(';')
///     .with_ambiguity_warnings(false);
/// assert_eq!(options.tags.last().map(String::as_str), Some("env"));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct EnvOptions {
    /// Ordered tag keys; the first one present on a field names it.
    pub tags: Vec<String>,
    /// Separator of the flat list form (`SLICE=1,2,3`).
    pub list_separator: char,
    /// Log a warning when a map entry could be split in more than one way.
    pub warn_on_ambiguity: bool,
}

impl Default for EnvOptions {
    fn default() -> Self {
        EnvOptions {
            tags: DEFAULT_TAGS.iter().map(|tag| tag.to_string()).collect(),
            list_separator: ',',
            warn_on_ambiguity: true,
        }
    }
}

impl EnvOptions {
    /// Creates default options (`yaml`, `json`, `mapstructure` tags, comma lists).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_envpath::EnvOptions;
    ///
    /// let options = EnvOptions::new();
    /// assert_eq!(options.tags, vec!["yaml", "json", "mapstructure"]);
    /// assert_eq!(options.list_separator, ',');
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a tag key after the existing ones.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.add_tag_support(tag);
        self
    }

    /// Replaces the tag keys.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_envpath::EnvOptions;
    ///
    /// let options = EnvOptions::new().with_tags(["env"]);
    /// assert_eq!(options.tags, vec!["env"]);
    /// ```
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.override_tag_support(tags);
        self
    }

    /// Sets the separator used by the flat list form.
    #[must_use]
    pub fn with_list_separator(mut self, separator: char) -> Self {
        self.list_separator = separator;
        self
    }

    /// Enables or disables the warning logged for ambiguous map entries.
    #[must_use]
    pub fn with_ambiguity_warnings(mut self, enabled: bool) -> Self {
        self.warn_on_ambiguity = enabled;
        self
    }

    /// Appends a tag key in place.
    pub fn add_tag_support(&mut self, tag: impl Into<String>) {
        self.tags.push(tag.into());
    }

    /// Replaces the tag keys in place.
    pub fn override_tag_support<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_tag_support() {
        let mut options = EnvOptions::new();
        options.add_tag_support("env");
        assert_eq!(options.tags, vec!["yaml", "json", "mapstructure", "env"]);
    }

    #[test]
    fn test_override_tag_support() {
        let mut options = EnvOptions::new();
        options.override_tag_support(["env"]);
        assert_eq!(options.tags, vec!["env"]);
    }
}
