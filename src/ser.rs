//! Encoding into a flat namespace.
//!
//! This module provides the [`Serializer`] that flattens a value into
//! `NAME=value` pairs written to a [`Sink`].
//!
//! ## Overview
//!
//! - **Scalars** are written with their `Display` form at the current path
//! - **Structs** add one path segment per field; `-` skips a field, squashed
//!   fields stay at the parent's path and `omitempty` drops zero values
//! - **Sequences and tuples** always use the indexed form (`PATH_0`, `PATH_1`, …)
//! - **Maps** add one segment per key; keys must be strings and values may
//!   not be maps themselves
//! - **`None`** and unit values write nothing
//!
//! ## Usage
//!
//! ```rust
//! use serde_envpath::to_env_map;
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Listener { host: String, ports: Vec<u16> }
//!
//! let listener = Listener { host: "0.0.0.0".into(), ports: vec![80, 443] };
//! let env = to_env_map(&listener, &["http"]).unwrap();
//! assert_eq!(env.get("HTTP_HOST"), Some("0.0.0.0"));
//! assert_eq!(env.get("HTTP_PORTS_1"), Some("443"));
//! ```
//!
//! ## Direct Serializer Usage
//!
//! ```rust
//! use serde_envpath::{EnvMap, EnvOptions, Serializer};
//! use serde::Serialize;
//!
//! let mut env = EnvMap::new();
//! let mut serializer = Serializer::new(&mut env, EnvOptions::new(), &["retries"]);
//! vec![1, 2, 3].serialize(&mut serializer).unwrap();
//! assert_eq!(env.get("RETRIES_2"), Some("3"));
//! ```

use crate::namespace::{self, Sink};
use crate::resolve::display_path;
use crate::tags::{resolve_field, FieldRule};
use crate::{EnvOptions, Error, Result};
use log::trace;
use serde::ser::{self, Impossible, Serialize};
use std::fmt;

/// The namespace serializer.
///
/// Created via [`Serializer::new`] with a sink, options and a name prefix.
pub struct Serializer<'s> {
    sink: &'s mut dyn Sink,
    options: EnvOptions,
    path: Vec<String>,
    /// Name of the map whose entry value is being serialized.
    map_value: Option<String>,
}

impl<'s> Serializer<'s> {
    pub fn new(sink: &'s mut dyn Sink, options: EnvOptions, prefix: &[&str]) -> Self {
        Serializer {
            sink,
            options,
            path: prefix.iter().map(|segment| segment.to_string()).collect(),
            map_value: None,
        }
    }

    fn name(&self) -> String {
        namespace::name(&self.path)
    }

    fn write(&mut self, value: impl fmt::Display) -> Result<()> {
        let name = self.name();
        if name.is_empty() {
            return Err(Error::unsupported_type(
                "a scalar value needs a non-empty prefix",
            ));
        }
        self.sink.set(name, value.to_string());
        Ok(())
    }

    fn nested<T: ?Sized + Serialize>(&mut self, segment: String, value: &T) -> Result<()> {
        self.path.push(segment);
        let result = value.serialize(&mut *self);
        self.path.pop();
        result
    }
}

impl<'a, 's> ser::Serializer for &'a mut Serializer<'s> {
    type Ok = ();
    type Error = Error;

    type SerializeSeq = Elements<'a, 's>;
    type SerializeTuple = Elements<'a, 's>;
    type SerializeTupleStruct = Elements<'a, 's>;
    type SerializeTupleVariant = Impossible<(), Error>;
    type SerializeMap = Entries<'a, 's>;
    type SerializeStruct = Fields<'a, 's>;
    type SerializeStructVariant = Impossible<(), Error>;

    fn serialize_bool(self, v: bool) -> Result<()> {
        self.write(v)
    }

    fn serialize_i8(self, v: i8) -> Result<()> {
        self.write(v)
    }

    fn serialize_i16(self, v: i16) -> Result<()> {
        self.write(v)
    }

    fn serialize_i32(self, v: i32) -> Result<()> {
        self.write(v)
    }

    fn serialize_i64(self, v: i64) -> Result<()> {
        self.write(v)
    }

    fn serialize_i128(self, v: i128) -> Result<()> {
        self.write(v)
    }

    fn serialize_u8(self, v: u8) -> Result<()> {
        self.write(v)
    }

    fn serialize_u16(self, v: u16) -> Result<()> {
        self.write(v)
    }

    fn serialize_u32(self, v: u32) -> Result<()> {
        self.write(v)
    }

    fn serialize_u64(self, v: u64) -> Result<()> {
        self.write(v)
    }

    fn serialize_u128(self, v: u128) -> Result<()> {
        self.write(v)
    }

    fn serialize_f32(self, v: f32) -> Result<()> {
        self.write(v)
    }

    fn serialize_f64(self, v: f64) -> Result<()> {
        self.write(v)
    }

    fn serialize_char(self, v: char) -> Result<()> {
        self.write(v)
    }

    fn serialize_str(self, v: &str) -> Result<()> {
        self.write(v)
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<()> {
        let text = std::str::from_utf8(v).map_err(|_| {
            Error::unsupported_type(&format!("bytes at `{}` are not valid UTF-8", self.name()))
        })?;
        self.write(text)
    }

    fn serialize_none(self) -> Result<()> {
        Ok(())
    }

    fn serialize_some<T>(self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<()> {
        Ok(())
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<()> {
        Ok(())
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<()> {
        self.write(variant)
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _value: &T,
    ) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        Err(data_variant(name, variant))
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq> {
        Ok(Elements {
            ser: self,
            index: 0,
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<Self::SerializeTuple> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Err(data_variant(name, variant))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        if let Some(owner) = &self.map_value {
            return Err(Error::undecidable_map_value(owner));
        }
        Ok(Entries {
            ser: self,
            key: None,
        })
    }

    fn serialize_struct(self, name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        trace!("encoding struct {name} at `{}`", self.name());
        Ok(Fields { ser: self })
    }

    fn serialize_struct_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Err(data_variant(name, variant))
    }
}

fn data_variant(name: &str, variant: &str) -> Error {
    Error::unsupported_type(&format!(
        "enum variant {name}::{variant} carries data; only unit variants fit in a variable"
    ))
}

pub struct Elements<'a, 's> {
    ser: &'a mut Serializer<'s>,
    index: usize,
}

impl Elements<'_, '_> {
    fn push<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.ser.map_value = None;
        let segment = self.index.to_string();
        self.index += 1;
        self.ser.nested(segment, value)
    }
}

impl ser::SerializeSeq for Elements<'_, '_> {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl ser::SerializeTuple for Elements<'_, '_> {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl ser::SerializeTupleStruct for Elements<'_, '_> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

pub struct Entries<'a, 's> {
    ser: &'a mut Serializer<'s>,
    key: Option<String>,
}

impl ser::SerializeMap for Entries<'_, '_> {
    type Ok = ();
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let map = display_path(&self.ser.path);
        self.key = Some(key.serialize(KeySerializer { map: &map })?);
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = self
            .key
            .take()
            .ok_or_else(|| Error::custom("serialize_value called without serialize_key"))?;
        self.ser.map_value = Some(display_path(&self.ser.path));
        let result = self.ser.nested(key, value);
        self.ser.map_value = None;
        result
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

pub struct Fields<'a, 's> {
    ser: &'a mut Serializer<'s>,
}

impl ser::SerializeStruct for Fields<'_, '_> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.ser.map_value = None;
        match resolve_field(key, &self.ser.options.tags)? {
            FieldRule::Skip => Ok(()),
            FieldRule::Squash => value.serialize(&mut *self.ser),
            FieldRule::Named { name, omit_empty } => {
                if omit_empty && value.serialize(ZeroProbe)? {
                    return Ok(());
                }
                self.ser.nested(name.to_string(), value)
            }
        }
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

/// Renders a map key to text.
struct KeySerializer<'k> {
    map: &'k str,
}

impl KeySerializer<'_> {
    fn reject(&self) -> Error {
        Error::non_string_map_key(self.map)
    }
}

macro_rules! reject_key {
    ($($method:ident($ty:ty)),* $(,)?) => {
        $(
            fn $method(self, _v: $ty) -> Result<String> {
                Err(self.reject())
            }
        )*
    };
}

impl ser::Serializer for KeySerializer<'_> {
    type Ok = String;
    type Error = Error;

    type SerializeSeq = Impossible<String, Error>;
    type SerializeTuple = Impossible<String, Error>;
    type SerializeTupleStruct = Impossible<String, Error>;
    type SerializeTupleVariant = Impossible<String, Error>;
    type SerializeMap = Impossible<String, Error>;
    type SerializeStruct = Impossible<String, Error>;
    type SerializeStructVariant = Impossible<String, Error>;

    reject_key! {
        serialize_bool(bool),
        serialize_i8(i8),
        serialize_i16(i16),
        serialize_i32(i32),
        serialize_i64(i64),
        serialize_u8(u8),
        serialize_u16(u16),
        serialize_u32(u32),
        serialize_u64(u64),
        serialize_f32(f32),
        serialize_f64(f64),
        serialize_bytes(&[u8]),
    }

    fn serialize_char(self, v: char) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_str(self, v: &str) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_none(self) -> Result<String> {
        Err(self.reject())
    }

    fn serialize_some<T>(self, value: &T) -> Result<String>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<String> {
        Err(self.reject())
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<String> {
        Err(self.reject())
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<String> {
        Ok(variant.to_string())
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<String>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<String>
    where
        T: ?Sized + Serialize,
    {
        Err(self.reject())
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq> {
        Err(self.reject())
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple> {
        Err(self.reject())
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        Err(self.reject())
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Err(self.reject())
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        Err(self.reject())
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        Err(self.reject())
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Err(self.reject())
    }

    fn collect_str<T>(self, value: &T) -> Result<String>
    where
        T: ?Sized + fmt::Display,
    {
        Ok(value.to_string())
    }
}

/// Answers whether a value is empty for `omitempty`.
///
/// `None`, empty strings, zero numbers, `false`, unit and empty collections
/// are empty. `Some(_)`, structs and enum variants never are.
struct ZeroProbe;

macro_rules! probe_zero {
    ($($method:ident($ty:ty) => $zero:expr),* $(,)?) => {
        $(
            fn $method(self, v: $ty) -> Result<bool> {
                Ok(v == $zero)
            }
        )*
    };
}

impl ser::Serializer for ZeroProbe {
    type Ok = bool;
    type Error = Error;

    type SerializeSeq = Probe;
    type SerializeTuple = Probe;
    type SerializeTupleStruct = Probe;
    type SerializeTupleVariant = Probe;
    type SerializeMap = Probe;
    type SerializeStruct = Probe;
    type SerializeStructVariant = Probe;

    probe_zero! {
        serialize_bool(bool) => false,
        serialize_i8(i8) => 0,
        serialize_i16(i16) => 0,
        serialize_i32(i32) => 0,
        serialize_i64(i64) => 0,
        serialize_i128(i128) => 0,
        serialize_u8(u8) => 0,
        serialize_u16(u16) => 0,
        serialize_u32(u32) => 0,
        serialize_u64(u64) => 0,
        serialize_u128(u128) => 0,
        serialize_f32(f32) => 0.0,
        serialize_f64(f64) => 0.0,
        serialize_char(char) => '\0',
    }

    fn serialize_str(self, v: &str) -> Result<bool> {
        Ok(v.is_empty())
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<bool> {
        Ok(v.is_empty())
    }

    fn serialize_none(self) -> Result<bool> {
        Ok(true)
    }

    fn serialize_some<T>(self, _value: &T) -> Result<bool>
    where
        T: ?Sized + Serialize,
    {
        Ok(false)
    }

    fn serialize_unit(self) -> Result<bool> {
        Ok(true)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<bool> {
        Ok(true)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
    ) -> Result<bool> {
        Ok(false)
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<bool>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<bool>
    where
        T: ?Sized + Serialize,
    {
        Ok(false)
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Probe> {
        Ok(Probe { empty: true })
    }

    fn serialize_tuple(self, _len: usize) -> Result<Probe> {
        Ok(Probe { empty: true })
    }

    fn serialize_tuple_struct(self, _name: &'static str, _len: usize) -> Result<Probe> {
        Ok(Probe { empty: true })
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Probe> {
        Ok(Probe { empty: false })
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Probe> {
        Ok(Probe { empty: true })
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Probe> {
        Ok(Probe { empty: false })
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Probe> {
        Ok(Probe { empty: false })
    }

    fn collect_str<T>(self, value: &T) -> Result<bool>
    where
        T: ?Sized + fmt::Display,
    {
        Ok(value.to_string().is_empty())
    }
}

/// Compound state of [`ZeroProbe`]; any element makes a collection non-empty.
struct Probe {
    empty: bool,
}

impl ser::SerializeSeq for Probe {
    type Ok = bool;
    type Error = Error;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, _value: &T) -> Result<()> {
        self.empty = false;
        Ok(())
    }

    fn end(self) -> Result<bool> {
        Ok(self.empty)
    }
}

impl ser::SerializeTuple for Probe {
    type Ok = bool;
    type Error = Error;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, _value: &T) -> Result<()> {
        self.empty = false;
        Ok(())
    }

    fn end(self) -> Result<bool> {
        Ok(self.empty)
    }
}

impl ser::SerializeTupleStruct for Probe {
    type Ok = bool;
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, _value: &T) -> Result<()> {
        self.empty = false;
        Ok(())
    }

    fn end(self) -> Result<bool> {
        Ok(self.empty)
    }
}

impl ser::SerializeTupleVariant for Probe {
    type Ok = bool;
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, _value: &T) -> Result<()> {
        Ok(())
    }

    fn end(self) -> Result<bool> {
        Ok(self.empty)
    }
}

impl ser::SerializeMap for Probe {
    type Ok = bool;
    type Error = Error;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, _key: &T) -> Result<()> {
        self.empty = false;
        Ok(())
    }

    fn serialize_value<T: ?Sized + Serialize>(&mut self, _value: &T) -> Result<()> {
        Ok(())
    }

    fn end(self) -> Result<bool> {
        Ok(self.empty)
    }
}

impl ser::SerializeStruct for Probe {
    type Ok = bool;
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        _key: &'static str,
        _value: &T,
    ) -> Result<()> {
        Ok(())
    }

    fn end(self) -> Result<bool> {
        Ok(self.empty)
    }
}

impl ser::SerializeStructVariant for Probe {
    type Ok = bool;
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        _key: &'static str,
        _value: &T,
    ) -> Result<()> {
        Ok(())
    }

    fn end(self) -> Result<bool> {
        Ok(self.empty)
    }
}
