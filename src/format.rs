//! Namespace Naming Reference
//!
//! This module documents how nested values are laid out in a flat namespace
//! of `NAME=value` pairs, as implemented by this library.
//!
//! # Overview
//!
//! Every leaf of a value is stored in one variable. Its name is the path from
//! the root to the leaf, each segment upper-cased and joined with `_`:
//!
//! ```text
//! prefix ["app"] + field "http" + field "port"   ->   APP_HTTP_PORT
//! ```
//!
//! Names are matched case-sensitively. Decoding is read-only and never fails
//! because a variable is missing: absent leaves take their zero value.
//!
//! # Field Names
//!
//! A field contributes its serde name. The name may carry directives:
//!
//! | Serde name | Effect |
//! |------------|--------|
//! | `port` | segment `PORT` |
//! | `port,omitempty` | segment `PORT`; skipped when nothing lives under it (decode) or when the value is zero (encode) |
//! | `-` | field ignored |
//! | `,squash` or `,inline` | no segment; the field's own fields sit at the parent's level |
//!
//! A serde name containing `:"` is read as Go-style struct tags. The first
//! configured tag key present wins (default order `yaml`, `json`,
//! `mapstructure`):
//!
//! ```text
//! #[serde(rename = "yaml:\"http_port,omitempty\" json:\"port\"")]   ->   HTTP_PORT, omitempty
//! ```
//!
//! # Scalars
//!
//! | Kind | Decoded from | Encoded as |
//! |------|--------------|------------|
//! | Boolean | `1 t T TRUE true True` / `0 f F FALSE false False` | `true` / `false` |
//! | Integer | decimal, surrounding whitespace ignored | decimal |
//! | Float | decimal or exponent form, whitespace ignored | shortest round-trip form |
//! | String | verbatim | verbatim |
//! | Unit enum variant | variant name, whitespace ignored | variant name |
//! | Duration (`duration` module) | `1h30m`, `1.5s`, `300ms` | `1h30m0s`, `1.5s`, `300ms` |
//! | `FromStr` type (`text` module) | its text form | its `Display` form |
//!
//! # Options
//!
//! An `Option` is always decoded as `Some`, even when nothing is set below it.
//! The exception is an `omitempty` field with no variable under its path,
//! which stays `None`. Encoding `None` writes nothing.
//!
//! # Sequences
//!
//! Two forms are accepted when decoding:
//!
//! ```text
//! PORTS=80,443           comma form, only for scalar elements, checked first
//! PORTS_0=80             indexed form, read up to the first missing index
//! PORTS_1=443
//! ```
//!
//! Elements of the comma form are not trimmed for strings. The separator is
//! configurable. Encoding always writes the indexed form. Tuples and arrays
//! read exactly their arity.
//!
//! # Maps
//!
//! A map key becomes one segment of the path, so keys may themselves contain
//! `_`. Given a variable below the map, the decoder splits its remainder on
//! `_` and keeps the shortest tail that is a valid path through the value
//! type; everything before it is the key, lower-cased:
//!
//! ```text
//! MAP_LOL=5                    Map<String, u32>             {"lol": 5}
//! MAP_SUPER_FUN_0=1            Map<String, Vec<u32>>        {"super_fun": [1]}
//! MAP_MY_KEY_MY_KEY=lol        Map<String, {my: {key}}>     {"my_key": {my: {key: "lol"}}}
//! ```
//!
//! Restrictions:
//!
//! - Keys must be strings.
//! - Values may not be maps or untyped values; such a map is rejected before
//!   the namespace is read, since no boundary between key and suffix exists.
//! - A variable whose remainder fits no path of the value type is ignored.
//!
//! When more than one split fits, the longest key is chosen and a warning is
//! logged through the `log` facade.
//!
//! # Untyped Values
//!
//! A field typed as a self-describing value (such as `serde_json::Value`)
//! decodes to the variable's text when it exists, otherwise to a map of every
//! variable below it keyed by its lower-cased remainder, otherwise to unit.
