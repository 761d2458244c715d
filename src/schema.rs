//! Type descriptors obtained by tracing `Deserialize` implementations.
//!
//! Map keys cannot be split from their suffixes without knowing the full
//! static structure of the map's value type, and serde exposes that structure
//! only while a value is being deserialized. [`Shape::of`] drives a type's
//! `Deserialize` impl with a tracing deserializer that answers every request
//! with a zero value (`false`, `0`, `""`, one sequence element, one map entry,
//! the first enum variant) and records what was asked for.
//!
//! Some types reject zero values (a timestamp parsed from `""`, say). The
//! field holding such a type is remembered together with the shape recorded
//! before the failure, and the next pass skips it so later fields can be
//! reached. Passes repeat until the trace succeeds or stops making progress.
//!
//! ```rust
//! use serde_envpath::schema::{ScalarKind, Shape};
//! use serde::Deserialize;
//! use std::collections::HashMap;
//!
//! #[derive(Deserialize)]
//! struct Config {
//!     port: u16,
//!     labels: HashMap<String, String>,
//! }
//!
//! let shape = Shape::of::<Config>().unwrap();
//! let Shape::Struct(config) = &shape else { panic!("not a struct") };
//! assert_eq!(config.field("port"), Some(&Shape::Scalar(ScalarKind::Uint)));
//! assert!(matches!(config.field("labels"), Some(Shape::Map { .. })));
//! ```

use crate::{Error, Result};
use log::trace;
use serde::de::{self, DeserializeSeed, IntoDeserializer, Visitor};
use serde::Deserialize;
use std::collections::HashMap;

/// How many times a struct or enum may appear inside itself before the type is
/// reported as cyclic.
///
/// serde exposes no type identity, so instantiations of one generic struct
/// share an id: `Wrapper<Wrapper<Wrapper<Wrapper<u8>>>>` is accepted while a
/// fifth level of the same wrapper is reported as cyclic.
const SELF_NESTING_LIMIT: usize = 4;

const MAX_PASSES: usize = 1024;

/// Leaf kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Bool,
    Int,
    Uint,
    Float,
    Char,
    Str,
    Bytes,
    Unit,
}

/// Static structure of a type, as seen through serde.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Scalar(ScalarKind),
    Enum {
        name: &'static str,
        variants: &'static [&'static str],
    },
    Option(Box<Shape>),
    Seq(Box<Shape>),
    Tuple(Vec<Shape>),
    Map {
        key: Box<Shape>,
        value: Box<Shape>,
    },
    Struct(StructShape),
    /// Self-describing or untyped content (`deserialize_any`).
    Any,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructShape {
    pub name: &'static str,
    pub fields: &'static [&'static str],
    pub shapes: Vec<FieldShape>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldShape {
    pub name: &'static str,
    pub shape: Shape,
}

impl Shape {
    /// Traces the shape of `T`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CyclicType`] when `T` contains itself.
    pub fn of<'de, T: Deserialize<'de>>() -> Result<Shape> {
        trace::<T>()
    }

    /// Looks through any number of `Option` layers.
    pub fn strip_option(&self) -> &Shape {
        let mut shape = self;
        while let Shape::Option(inner) = shape {
            shape = inner;
        }
        shape
    }

    /// Returns `true` for shapes stored in a single variable.
    pub fn is_scalar(&self) -> bool {
        matches!(self.strip_option(), Shape::Scalar(_) | Shape::Enum { .. })
    }
}

impl StructShape {
    /// Returns the shape of the field with the given serde name.
    pub fn field(&self, name: &str) -> Option<&Shape> {
        self.shapes
            .iter()
            .find(|field| field.name == name)
            .map(|field| &field.shape)
    }
}

/// Position of a value inside the traced type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Step {
    Field(&'static str),
    Element,
    Index(usize),
    MapKey,
    MapValue,
    Variant,
}

#[derive(Default)]
struct TraceState {
    /// Fields whose type rejects zero values, with the shape recorded for them.
    failed: HashMap<Vec<Step>, Shape>,
    nesting: Vec<(&'static str, usize)>,
    fatal: Option<Error>,
}

impl TraceState {
    fn enter(&mut self, name: &'static str, id: usize) -> Result<()> {
        let depth = self
            .nesting
            .iter()
            .filter(|&&entry| entry == (name, id))
            .count();
        if depth >= SELF_NESTING_LIMIT {
            let err = Error::cyclic_type(name);
            self.fatal = Some(err.clone());
            return Err(err);
        }
        self.nesting.push((name, id));
        Ok(())
    }
}

fn trace<'de, T: Deserialize<'de>>() -> Result<Shape> {
    let type_name = std::any::type_name::<T>();
    let mut state = TraceState::default();
    let mut pass = 0;
    loop {
        pass += 1;
        state.nesting.clear();
        let poisoned = state.failed.len();
        let mut shape = Shape::Any;
        let tracer = Tracer {
            state: &mut state,
            slot: &mut shape,
            trail: Vec::new(),
        };
        match T::deserialize(tracer) {
            Ok(_) => {
                trace!("traced {type_name} in {pass} pass(es)");
                return Ok(shape);
            }
            Err(err) => {
                if let Some(fatal) = state.fatal.take() {
                    return Err(fatal);
                }
                if state.failed.len() == poisoned || pass >= MAX_PASSES {
                    trace!("trace of {type_name} settled after {pass} pass(es): {err}");
                    return Ok(shape);
                }
                trace!("trace pass {pass} of {type_name} failed: {err}; retrying");
            }
        }
    }
}

fn extend(trail: &[Step], step: Step) -> Vec<Step> {
    let mut next = Vec::with_capacity(trail.len() + 1);
    next.extend_from_slice(trail);
    next.push(step);
    next
}

struct Tracer<'a> {
    state: &'a mut TraceState,
    slot: &'a mut Shape,
    trail: Vec<Step>,
}

macro_rules! trace_scalar {
    ($method:ident, $kind:ident, $visit:ident, $zero:expr) => {
        fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
            *self.slot = Shape::Scalar(ScalarKind::$kind);
            visitor.$visit($zero)
        }
    };
}

impl<'de> de::Deserializer<'de> for Tracer<'_> {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        *self.slot = Shape::Any;
        visitor.visit_unit()
    }

    trace_scalar!(deserialize_bool, Bool, visit_bool, false);
    trace_scalar!(deserialize_i8, Int, visit_i8, 0);
    trace_scalar!(deserialize_i16, Int, visit_i16, 0);
    trace_scalar!(deserialize_i32, Int, visit_i32, 0);
    trace_scalar!(deserialize_i64, Int, visit_i64, 0);
    trace_scalar!(deserialize_i128, Int, visit_i128, 0);
    trace_scalar!(deserialize_u8, Uint, visit_u8, 0);
    trace_scalar!(deserialize_u16, Uint, visit_u16, 0);
    trace_scalar!(deserialize_u32, Uint, visit_u32, 0);
    trace_scalar!(deserialize_u64, Uint, visit_u64, 0);
    trace_scalar!(deserialize_u128, Uint, visit_u128, 0);
    trace_scalar!(deserialize_f32, Float, visit_f32, 0.0);
    trace_scalar!(deserialize_f64, Float, visit_f64, 0.0);
    trace_scalar!(deserialize_char, Char, visit_char, '\0');
    trace_scalar!(deserialize_str, Str, visit_borrowed_str, "");
    trace_scalar!(deserialize_string, Str, visit_borrowed_str, "");
    trace_scalar!(deserialize_identifier, Str, visit_borrowed_str, "");
    trace_scalar!(deserialize_bytes, Bytes, visit_borrowed_bytes, b"");
    trace_scalar!(deserialize_byte_buf, Bytes, visit_borrowed_bytes, b"");

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        *self.slot = Shape::Scalar(ScalarKind::Unit);
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        self.deserialize_unit(visitor)
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        let Tracer { state, slot, trail } = self;
        let mut inner = Shape::Any;
        let result = visitor.visit_some(Tracer {
            state,
            slot: &mut inner,
            trail,
        });
        *slot = Shape::Option(Box::new(inner));
        result
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        let Tracer { state, slot, trail } = self;
        let mut element = [Shape::Any];
        let result = visitor.visit_seq(SeqTracer {
            state,
            slots: element.iter_mut(),
            trail,
            index: 0,
            positional: false,
        });
        let [element] = element;
        *slot = Shape::Seq(Box::new(element));
        result
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, len: usize, visitor: V) -> Result<V::Value> {
        let Tracer { state, slot, trail } = self;
        let mut elements = vec![Shape::Any; len];
        let result = visitor.visit_seq(SeqTracer {
            state,
            slots: elements.iter_mut(),
            trail,
            index: 0,
            positional: true,
        });
        *slot = Shape::Tuple(elements);
        result
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
        let Tracer { state, slot, trail } = self;
        let mut key = Shape::Any;
        let mut value = Shape::Any;
        let result = visitor.visit_map(MapTracer {
            state,
            key: Some(&mut key),
            value: Some(&mut value),
            trail,
        });
        *slot = Shape::Map {
            key: Box::new(key),
            value: Box::new(value),
        };
        result
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        let Tracer { state, slot, trail } = self;
        state.enter(name, fields.as_ptr() as usize)?;
        let mut shapes = Vec::with_capacity(fields.len());
        let result = visitor.visit_map(StructTracer {
            state: &mut *state,
            shapes: &mut shapes,
            names: fields,
            next: 0,
            pending: None,
            trail,
        });
        state.nesting.pop();
        *slot = Shape::Struct(StructShape {
            name,
            fields,
            shapes,
        });
        result
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        let Tracer { state, slot, trail } = self;
        *slot = Shape::Enum { name, variants };
        state.enter(name, variants.as_ptr() as usize)?;
        let result = visitor.visit_enum(EnumTracer {
            state: &mut *state,
            variant: variants.first().copied(),
            trail,
        });
        state.nesting.pop();
        result
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        *self.slot = Shape::Any;
        visitor.visit_unit()
    }
}

struct SeqTracer<'a> {
    state: &'a mut TraceState,
    slots: std::slice::IterMut<'a, Shape>,
    trail: Vec<Step>,
    index: usize,
    positional: bool,
}

impl<'de> de::SeqAccess<'de> for SeqTracer<'_> {
    type Error = Error;

    fn next_element_seed<T: DeserializeSeed<'de>>(&mut self, seed: T) -> Result<Option<T::Value>> {
        let Some(slot) = self.slots.next() else {
            return Ok(None);
        };
        let step = if self.positional {
            Step::Index(self.index)
        } else {
            Step::Element
        };
        self.index += 1;
        seed.deserialize(Tracer {
            state: &mut *self.state,
            slot,
            trail: extend(&self.trail, step),
        })
        .map(Some)
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.slots.len())
    }
}

struct MapTracer<'a> {
    state: &'a mut TraceState,
    key: Option<&'a mut Shape>,
    value: Option<&'a mut Shape>,
    trail: Vec<Step>,
}

impl<'de> de::MapAccess<'de> for MapTracer<'_> {
    type Error = Error;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>> {
        let Some(slot) = self.key.take() else {
            return Ok(None);
        };
        seed.deserialize(Tracer {
            state: &mut *self.state,
            slot,
            trail: extend(&self.trail, Step::MapKey),
        })
        .map(Some)
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value> {
        let slot = self
            .value
            .take()
            .ok_or_else(|| Error::custom("map value requested twice"))?;
        seed.deserialize(Tracer {
            state: &mut *self.state,
            slot,
            trail: extend(&self.trail, Step::MapValue),
        })
    }

    fn size_hint(&self) -> Option<usize> {
        Some(usize::from(self.key.is_some()))
    }
}

struct StructTracer<'a> {
    state: &'a mut TraceState,
    shapes: &'a mut Vec<FieldShape>,
    names: &'static [&'static str],
    next: usize,
    pending: Option<(&'static str, Vec<Step>)>,
    trail: Vec<Step>,
}

impl<'de> de::MapAccess<'de> for StructTracer<'_> {
    type Error = Error;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>> {
        while let Some(&name) = self.names.get(self.next) {
            self.next += 1;
            let trail = extend(&self.trail, Step::Field(name));
            if let Some(shape) = self.state.failed.get(&trail) {
                self.shapes.push(FieldShape {
                    name,
                    shape: shape.clone(),
                });
                continue;
            }
            self.pending = Some((name, trail));
            let key: de::value::StrDeserializer<'_, Error> = name.into_deserializer();
            return seed.deserialize(key).map(Some);
        }
        Ok(None)
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value> {
        let (name, trail) = self
            .pending
            .take()
            .ok_or_else(|| Error::custom("struct value requested before its key"))?;
        let poisoned = self.state.failed.len();
        let mut shape = Shape::Any;
        let result = seed.deserialize(Tracer {
            state: &mut *self.state,
            slot: &mut shape,
            trail: trail.clone(),
        });
        if result.is_err() && self.state.fatal.is_none() && self.state.failed.len() == poisoned {
            trace!("field `{name}` rejects zero values; skipping it in later passes");
            self.state.failed.insert(trail, shape.clone());
        }
        self.shapes.push(FieldShape { name, shape });
        result
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.names.len().saturating_sub(self.next))
    }
}

struct EnumTracer<'a> {
    state: &'a mut TraceState,
    variant: Option<&'static str>,
    trail: Vec<Step>,
}

impl<'de, 'a> de::EnumAccess<'de> for EnumTracer<'a> {
    type Error = Error;
    type Variant = Self;

    fn variant_seed<V: DeserializeSeed<'de>>(self, seed: V) -> Result<(V::Value, Self)> {
        let variant = self
            .variant
            .ok_or_else(|| Error::unsupported_type("enum without variants"))?;
        let name: de::value::StrDeserializer<'_, Error> = variant.into_deserializer();
        let value = seed.deserialize(name)?;
        Ok((value, self))
    }
}

impl<'de> de::VariantAccess<'de> for EnumTracer<'_> {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        Ok(())
    }

    fn newtype_variant_seed<T: DeserializeSeed<'de>>(self, seed: T) -> Result<T::Value> {
        let mut scratch = Shape::Any;
        seed.deserialize(Tracer {
            state: self.state,
            slot: &mut scratch,
            trail: extend(&self.trail, Step::Variant),
        })
    }

    fn tuple_variant<V: Visitor<'de>>(self, len: usize, visitor: V) -> Result<V::Value> {
        let mut scratch = vec![Shape::Any; len];
        visitor.visit_seq(SeqTracer {
            state: self.state,
            slots: scratch.iter_mut(),
            trail: extend(&self.trail, Step::Variant),
            index: 0,
            positional: true,
        })
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        let mut scratch = Vec::new();
        visitor.visit_map(StructTracer {
            state: self.state,
            shapes: &mut scratch,
            names: fields,
            next: 0,
            pending: None,
            trail: extend(&self.trail, Step::Variant),
        })
    }
}
