//! Decoding from a flat namespace.
//!
//! This module provides the serde [`Deserializer`](serde::Deserializer) that
//! assembles nested values from variables.
//!
//! ## Overview
//!
//! Decoding starts by tracing the target type into a [`Shape`]. The
//! deserializer then walks the value by kind:
//!
//! - **Scalars** read the variable named after the current path; an absent
//!   variable yields the zero value (`false`, `0`, `""`, first enum variant)
//! - **Options** are always `Some`, unless the owning field is `omitempty` and
//!   nothing lives under its path
//! - **Structs** visit their fields in declaration order; squashed fields stay
//!   at the parent's path
//! - **Sequences** read `PATH=a,b,c` for scalar elements, else `PATH_0`,
//!   `PATH_1`, … up to the first missing index
//! - **Maps** enumerate their keys through the map-key resolver
//!
//! ## Usage
//!
//! ```rust
//! use serde_envpath::{envmap, from_namespace};
//! use serde::Deserialize;
//! use std::collections::HashMap;
//!
//! #[derive(Deserialize, Debug, PartialEq)]
//! struct Upstream { host: String, weight: u8 }
//!
//! #[derive(Deserialize, Debug, PartialEq)]
//! struct Config {
//!     ports: Vec<u16>,
//!     upstreams: HashMap<String, Upstream>,
//! }
//!
//! let env = envmap! {
//!     "APP_PORTS" => "80,443",
//!     "APP_UPSTREAMS_EU_WEST_HOST" => "10.0.0.1",
//!     "APP_UPSTREAMS_EU_WEST_WEIGHT" => "3",
//! };
//! let config: Config = from_namespace(&env, &["app"]).unwrap();
//! assert_eq!(config.ports, vec![80, 443]);
//! assert_eq!(config.upstreams["eu_west"].weight, 3);
//! ```

use crate::namespace::{self, Accessor, Namespace};
use crate::resolve::{check_map, resolve_map, ResolvedEntry};
use crate::ring::Ring;
use crate::scalar;
use crate::schema::{ScalarKind, Shape};
use crate::tags::{resolve_field, FieldRule};
use crate::{EnvOptions, Error, Result};
use log::trace;
use serde::de::{self, DeserializeSeed, IntoDeserializer, Visitor};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

static ANY: Shape = Shape::Any;
static STR: Shape = Shape::Scalar(ScalarKind::Str);

/// Traces `T` and decodes it from `namespace` under `prefix`.
pub(crate) fn decode<'de, T, N>(namespace: &'de N, prefix: &[&str], options: &EnvOptions) -> Result<T>
where
    T: de::Deserialize<'de>,
    N: Namespace + ?Sized,
{
    let shape = Shape::of::<T>()?;
    trace!("traced {}: {shape:?}", std::any::type_name::<T>());
    Decoder::new(namespace, shape, options.clone()).decode(prefix)
}

/// State shared by one decode call.
struct Decoder<'de, N: ?Sized> {
    accessor: Accessor<'de, N>,
    shape: Shape,
    options: EnvOptions,
    rings: RefCell<HashMap<usize, Rc<Ring>>>,
}

impl<'de, N: Namespace + ?Sized> Decoder<'de, N> {
    fn new(namespace: &'de N, shape: Shape, options: EnvOptions) -> Self {
        Decoder {
            accessor: Accessor::new(namespace),
            shape,
            options,
            rings: RefCell::new(HashMap::new()),
        }
    }

    fn decode<T: de::Deserialize<'de>>(&self, prefix: &[&str]) -> Result<T> {
        let path: Vec<String> = prefix.iter().map(|segment| segment.to_string()).collect();
        self.check_maps(&self.shape, &mut path.clone())?;
        T::deserialize(Deserializer {
            decoder: self,
            shape: &self.shape,
            path,
            inline: None,
        })
    }

    /// Rejects unstorable maps anywhere in the type before the namespace is
    /// read, whether or not decoding would reach them.
    ///
    /// Map keys and sequence indices are unknown here, so they appear as
    /// `<KEY>` and `<N>` in error names.
    fn check_maps(&self, shape: &Shape, path: &mut Vec<String>) -> Result<()> {
        match shape {
            Shape::Option(inner) => self.check_maps(inner, path),
            Shape::Seq(element) => self.check_below(element, path, "<N>"),
            Shape::Tuple(elements) => {
                for (index, element) in elements.iter().enumerate() {
                    self.check_below(element, path, index.to_string())?;
                }
                Ok(())
            }
            Shape::Map { key, value } => {
                check_map(path, key, &*self.ring(value)?)?;
                self.check_below(value, path, "<KEY>")
            }
            Shape::Struct(structure) => {
                for field in &structure.shapes {
                    match resolve_field(field.name, &self.options.tags)? {
                        FieldRule::Skip => {}
                        FieldRule::Squash => self.check_maps(&field.shape, path)?,
                        FieldRule::Named { name, .. } => {
                            self.check_below(&field.shape, path, name)?;
                        }
                    }
                }
                Ok(())
            }
            Shape::Scalar(_) | Shape::Enum { .. } | Shape::Any => Ok(()),
        }
    }

    fn check_below(
        &self,
        shape: &Shape,
        path: &mut Vec<String>,
        segment: impl Into<String>,
    ) -> Result<()> {
        path.push(segment.into());
        let result = self.check_maps(shape, path);
        path.pop();
        result
    }

    /// Returns the shape tree of a map value, building it on first use.
    fn ring(&self, shape: &Shape) -> Result<Rc<Ring>> {
        let id = shape as *const Shape as usize;
        if let Some(ring) = self.rings.borrow().get(&id) {
            return Ok(Rc::clone(ring));
        }
        let ring = Rc::new(Ring::build(shape, &self.options.tags)?);
        self.rings.borrow_mut().insert(id, Rc::clone(&ring));
        Ok(ring)
    }
}

fn extend(path: &[String], segment: impl Into<String>) -> Vec<String> {
    let mut next = Vec::with_capacity(path.len() + 1);
    next.extend_from_slice(path);
    next.push(segment.into());
    next
}

fn split_list(raw: &str, separator: char) -> Vec<&str> {
    if raw.is_empty() {
        Vec::new()
    } else {
        raw.split(separator).collect()
    }
}

/// Deserializer for the value at one path.
struct Deserializer<'c, 'de, N: ?Sized> {
    decoder: &'c Decoder<'de, N>,
    shape: &'c Shape,
    path: Vec<String>,
    /// One piece of a separator-delimited list, read instead of the namespace.
    inline: Option<&'de str>,
}

impl<'c, 'de, N: Namespace + ?Sized> Deserializer<'c, 'de, N> {
    fn name(&self) -> String {
        namespace::name(&self.path)
    }

    fn raw(&self) -> Option<&'de str> {
        self.inline
            .or_else(|| self.decoder.accessor.lookup(&self.path))
    }

    fn conversion(&self, raw: &str, reason: impl fmt::Display) -> Error {
        Error::conversion(&self.name(), raw, reason)
    }

    /// Attributes a visitor's error to the variable it was reading.
    fn annotate(&self, raw: &str, err: Error) -> Error {
        match err {
            Error::Custom(reason) => self.conversion(raw, reason),
            other => other,
        }
    }

    fn visit_text<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        let raw = self.raw().unwrap_or_default();
        visitor
            .visit_borrowed_str(raw)
            .map_err(|err| self.annotate(raw, err))
    }

    fn visit_untyped<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        if let Some(raw) = self.raw() {
            return visitor.visit_borrowed_str(raw);
        }
        if !self.decoder.accessor.has_prefix(&self.path) {
            return visitor.visit_unit();
        }
        let own = self.name();
        let prefix = if own.is_empty() { own } else { format!("{own}_") };
        let mut entries: Vec<(String, &'de str)> = self
            .decoder
            .accessor
            .names()
            .filter(|name| name.len() > prefix.len() && name.starts_with(&prefix))
            .filter_map(|name| {
                let value = self.decoder.accessor.lookup(&[name])?;
                Some((name[prefix.len()..].to_lowercase(), value))
            })
            .collect();
        entries.sort_unstable();
        entries.dedup_by(|a, b| a.0 == b.0);
        visitor.visit_map(UntypedEntries {
            entries: entries.into_iter(),
            pending: None,
        })
    }
}

macro_rules! decode_scalar {
    ($method:ident, $visit:ident, $parse:expr, $zero:expr) => {
        fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
            match self.raw() {
                None => visitor.$visit($zero),
                Some(raw) => {
                    let value = $parse(raw).map_err(|reason| self.conversion(raw, reason))?;
                    visitor.$visit(value).map_err(|err| self.annotate(raw, err))
                }
            }
        }
    };
}

impl<'c, 'de, N: Namespace + ?Sized> de::Deserializer<'de> for Deserializer<'c, 'de, N> {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        let shape = self.shape;
        match shape {
            Shape::Scalar(ScalarKind::Bool) => self.deserialize_bool(visitor),
            Shape::Scalar(ScalarKind::Int) => self.deserialize_i64(visitor),
            Shape::Scalar(ScalarKind::Uint) => self.deserialize_u64(visitor),
            Shape::Scalar(ScalarKind::Float) => self.deserialize_f64(visitor),
            Shape::Scalar(ScalarKind::Char) => self.deserialize_char(visitor),
            Shape::Scalar(ScalarKind::Str) => self.deserialize_str(visitor),
            Shape::Scalar(ScalarKind::Bytes) => self.deserialize_bytes(visitor),
            Shape::Scalar(ScalarKind::Unit) => self.deserialize_unit(visitor),
            Shape::Enum { name, variants } => self.deserialize_enum(name, variants, visitor),
            Shape::Option(_) => self.deserialize_option(visitor),
            Shape::Seq(_) => self.deserialize_seq(visitor),
            Shape::Tuple(elements) => self.deserialize_tuple(elements.len(), visitor),
            Shape::Map { .. } => self.deserialize_map(visitor),
            Shape::Struct(structure) => {
                self.deserialize_struct(structure.name, structure.fields, visitor)
            }
            Shape::Any => self.visit_untyped(visitor),
        }
    }

    decode_scalar!(deserialize_bool, visit_bool, scalar::parse_bool, false);
    decode_scalar!(deserialize_i8, visit_i8, scalar::parse_number, 0);
    decode_scalar!(deserialize_i16, visit_i16, scalar::parse_number, 0);
    decode_scalar!(deserialize_i32, visit_i32, scalar::parse_number, 0);
    decode_scalar!(deserialize_i64, visit_i64, scalar::parse_number, 0);
    decode_scalar!(deserialize_i128, visit_i128, scalar::parse_number, 0);
    decode_scalar!(deserialize_u8, visit_u8, scalar::parse_number, 0);
    decode_scalar!(deserialize_u16, visit_u16, scalar::parse_number, 0);
    decode_scalar!(deserialize_u32, visit_u32, scalar::parse_number, 0);
    decode_scalar!(deserialize_u64, visit_u64, scalar::parse_number, 0);
    decode_scalar!(deserialize_u128, visit_u128, scalar::parse_number, 0);
    decode_scalar!(deserialize_f32, visit_f32, scalar::parse_number, 0.0);
    decode_scalar!(deserialize_f64, visit_f64, scalar::parse_number, 0.0);
    decode_scalar!(deserialize_char, visit_char, scalar::parse_char, '\0');

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.visit_text(visitor)
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.visit_text(visitor)
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        let raw = self.raw().unwrap_or_default();
        visitor
            .visit_borrowed_bytes(raw.as_bytes())
            .map_err(|err| self.annotate(raw, err))
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_bytes(visitor)
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        let inner = match self.shape {
            Shape::Option(inner) => &**inner,
            other => other,
        };
        visitor.visit_some(Deserializer {
            shape: inner,
            ..self
        })
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_unit()
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        let element = match self.shape {
            Shape::Seq(element) => &**element,
            _ => &ANY,
        };
        if self.inline.is_none() && element.is_scalar() {
            if let Some(raw) = self.decoder.accessor.lookup(&self.path) {
                let separator = self.decoder.options.list_separator;
                trace!("decoding `{}` as a {separator:?}-separated list", self.name());
                let items: Vec<_> = split_list(raw, separator)
                    .into_iter()
                    .map(|piece| (element, Some(piece)))
                    .collect();
                return visitor.visit_seq(Positions {
                    decoder: self.decoder,
                    path: self.path,
                    items: items.into_iter(),
                    index: 0,
                });
            }
        }
        trace!("decoding `{}` as an indexed sequence", self.name());
        visitor.visit_seq(Indexed {
            decoder: self.decoder,
            element,
            path: self.path,
            next: 0,
        })
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, len: usize, visitor: V) -> Result<V::Value> {
        let elements: Vec<&'c Shape> = match self.shape {
            Shape::Tuple(elements) => elements.iter().collect(),
            _ => vec![&ANY; len],
        };
        let scalar = elements.iter().all(|element| element.is_scalar());
        let list = if self.inline.is_none() && scalar {
            self.decoder.accessor.lookup(&self.path)
        } else {
            None
        };
        let items: Vec<(&'c Shape, Option<&'de str>)> = match list {
            Some(raw) => {
                let pieces = split_list(raw, self.decoder.options.list_separator);
                if pieces.len() != elements.len() {
                    return Err(self.conversion(
                        raw,
                        format!("expected {} separated values", elements.len()),
                    ));
                }
                elements.into_iter().zip(pieces.into_iter().map(Some)).collect()
            }
            None => elements.into_iter().map(|element| (element, None)).collect(),
        };
        visitor.visit_seq(Positions {
            decoder: self.decoder,
            path: self.path,
            items: items.into_iter(),
            index: 0,
        })
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        len: usize,
        visitor: V,
    ) -> Result<V::Value> {
        self.deserialize_tuple(len, visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        let (key, value) = match self.shape {
            Shape::Map { key, value } => (&**key, &**value),
            _ => (&STR, &ANY),
        };
        let ring = self.decoder.ring(value)?;
        let entries = resolve_map(
            &self.decoder.accessor,
            &self.path,
            key,
            &ring,
            &self.decoder.options,
        )?;
        trace!("decoding map `{}` with {} key(s)", self.name(), entries.len());
        visitor.visit_map(MapEntries {
            decoder: self.decoder,
            value,
            path: self.path,
            entries: entries.into_iter(),
            pending: None,
        })
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        trace!("decoding struct {name} at `{}`", self.name());
        let structure = match self.shape {
            Shape::Struct(structure) => Some(structure),
            _ => None,
        };
        let mut plan = Vec::with_capacity(fields.len());
        for &key in fields {
            let shape = structure
                .and_then(|structure| structure.field(key))
                .unwrap_or(&ANY);
            match resolve_field(key, &self.decoder.options.tags)? {
                FieldRule::Skip => {}
                FieldRule::Squash => plan.push(PlannedField {
                    key,
                    shape,
                    path: self.path.clone(),
                }),
                FieldRule::Named { name, omit_empty } => {
                    let path = extend(&self.path, name);
                    if omit_empty && !self.decoder.accessor.has_prefix(&path) {
                        trace!("omitting `{}`: nothing set", namespace::name(&path));
                        continue;
                    }
                    plan.push(PlannedField { key, shape, path });
                }
            }
        }
        visitor.visit_map(StructFields {
            decoder: self.decoder,
            fields: plan.into_iter(),
            pending: None,
        })
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        let variant = match self.raw() {
            Some(raw) => raw.trim(),
            None => variants
                .first()
                .copied()
                .ok_or_else(|| Error::unsupported_type(&format!("enum {name} has no variants")))?,
        };
        let access: de::value::StrDeserializer<'_, Error> = variant.into_deserializer();
        visitor
            .visit_enum(access)
            .map_err(|err| self.annotate(variant, err))
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.visit_text(visitor)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_unit()
    }
}

/// Elements read at `PATH_0`, `PATH_1`, … while something lives there.
struct Indexed<'c, 'de, N: ?Sized> {
    decoder: &'c Decoder<'de, N>,
    element: &'c Shape,
    path: Vec<String>,
    next: usize,
}

impl<'c, 'de, N: Namespace + ?Sized> Indexed<'c, 'de, N> {
    /// A scalar element only ever reads `PATH_i` itself, so variables below
    /// it (a sibling map key such as `X_1_0`) do not extend the sequence.
    fn present(&self, path: &[String]) -> bool {
        if self.element.is_scalar() {
            self.decoder.accessor.lookup(path).is_some()
        } else {
            self.decoder.accessor.has_prefix(path)
        }
    }
}

impl<'c, 'de, N: Namespace + ?Sized> de::SeqAccess<'de> for Indexed<'c, 'de, N> {
    type Error = Error;

    fn next_element_seed<T: DeserializeSeed<'de>>(&mut self, seed: T) -> Result<Option<T::Value>> {
        let path = extend(&self.path, self.next.to_string());
        if !self.present(&path) {
            return Ok(None);
        }
        self.next += 1;
        seed.deserialize(Deserializer {
            decoder: self.decoder,
            shape: self.element,
            path,
            inline: None,
        })
        .map(Some)
    }
}

/// A fixed list of elements, each either a list piece or an indexed path.
struct Positions<'c, 'de, N: ?Sized> {
    decoder: &'c Decoder<'de, N>,
    path: Vec<String>,
    items: std::vec::IntoIter<(&'c Shape, Option<&'de str>)>,
    index: usize,
}

impl<'c, 'de, N: Namespace + ?Sized> de::SeqAccess<'de> for Positions<'c, 'de, N> {
    type Error = Error;

    fn next_element_seed<T: DeserializeSeed<'de>>(&mut self, seed: T) -> Result<Option<T::Value>> {
        let Some((shape, inline)) = self.items.next() else {
            return Ok(None);
        };
        let path = match inline {
            Some(_) => self.path.clone(),
            None => extend(&self.path, self.index.to_string()),
        };
        self.index += 1;
        seed.deserialize(Deserializer {
            decoder: self.decoder,
            shape,
            path,
            inline,
        })
        .map(Some)
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.items.len())
    }
}

struct MapEntries<'c, 'de, N: ?Sized> {
    decoder: &'c Decoder<'de, N>,
    value: &'c Shape,
    path: Vec<String>,
    entries: std::vec::IntoIter<ResolvedEntry>,
    pending: Option<String>,
}

impl<'c, 'de, N: Namespace + ?Sized> de::MapAccess<'de> for MapEntries<'c, 'de, N> {
    type Error = Error;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>> {
        let Some(entry) = self.entries.next() else {
            return Ok(None);
        };
        let key: de::value::StringDeserializer<Error> = entry.key.clone().into_deserializer();
        self.pending = Some(entry.key);
        seed.deserialize(key).map(Some)
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value> {
        let key = self
            .pending
            .take()
            .ok_or_else(|| Error::custom("map value requested before its key"))?;
        seed.deserialize(Deserializer {
            decoder: self.decoder,
            shape: self.value,
            path: extend(&self.path, key),
            inline: None,
        })
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.entries.len())
    }
}

struct PlannedField<'c> {
    key: &'static str,
    shape: &'c Shape,
    path: Vec<String>,
}

struct StructFields<'c, 'de, N: ?Sized> {
    decoder: &'c Decoder<'de, N>,
    fields: std::vec::IntoIter<PlannedField<'c>>,
    pending: Option<PlannedField<'c>>,
}

impl<'c, 'de, N: Namespace + ?Sized> de::MapAccess<'de> for StructFields<'c, 'de, N> {
    type Error = Error;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>> {
        let Some(field) = self.fields.next() else {
            return Ok(None);
        };
        let key: de::value::StrDeserializer<'_, Error> = field.key.into_deserializer();
        self.pending = Some(field);
        seed.deserialize(key).map(Some)
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value> {
        let field = self
            .pending
            .take()
            .ok_or_else(|| Error::custom("struct value requested before its key"))?;
        seed.deserialize(Deserializer {
            decoder: self.decoder,
            shape: field.shape,
            path: field.path,
            inline: None,
        })
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.fields.len())
    }
}

/// Variables below an untyped value, keyed by their lower-cased remainder.
struct UntypedEntries<'de> {
    entries: std::vec::IntoIter<(String, &'de str)>,
    pending: Option<&'de str>,
}

impl<'de> de::MapAccess<'de> for UntypedEntries<'de> {
    type Error = Error;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>> {
        let Some((key, value)) = self.entries.next() else {
            return Ok(None);
        };
        self.pending = Some(value);
        let key: de::value::StringDeserializer<Error> = key.into_deserializer();
        seed.deserialize(key).map(Some)
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value> {
        let value = self
            .pending
            .take()
            .ok_or_else(|| Error::custom("map value requested before its key"))?;
        seed.deserialize(de::value::BorrowedStrDeserializer::<Error>::new(value))
    }
}
