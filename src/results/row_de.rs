//! Serde view of a result row.
//!
//! Cells are converted with the same [`FromRowValue`] rules as `fetch`, so an INTEGER 0/1
//! column fills a `bool` field and `SQLite` timestamp text fills a chrono field.

use chrono::NaiveDateTime;
use serde::de::value::{SeqDeserializer, StrDeserializer, StringDeserializer};
use serde::de::{self, DeserializeSeed, Deserializer, MapAccess, Visitor};
use serde::forward_to_deserialize_any;
use serde_json::Value as JsonValue;

use super::CustomDbRow;
use crate::conversion::{FromRowValue, parse_date, parse_timestamp};
use crate::types::RowValues;

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub(crate) struct RowDeError(String);

impl de::Error for RowDeError {
    fn custom<T: std::fmt::Display>(msg: T) -> Self {
        RowDeError(msg.to_string())
    }
}

fn json_error(e: &serde_json::Error) -> RowDeError {
    RowDeError(e.to_string())
}

fn iso(dt: &NaiveDateTime) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string()
}

/// Value behind one map key: a result cell, or a field value kept from the target.
pub(crate) enum Field<'a> {
    Cell(&'a RowValues),
    Kept(JsonValue),
}

/// Presents a row as a map from column name to cell.
pub(crate) struct RowDeserializer<'a> {
    entries: std::vec::IntoIter<(String, Field<'a>)>,
    pending: Option<Field<'a>>,
}

impl<'a> RowDeserializer<'a> {
    pub(crate) fn new(entries: Vec<(String, Field<'a>)>) -> Self {
        Self {
            entries: entries.into_iter(),
            pending: None,
        }
    }

    /// Every column of `row`; a repeated column name keeps its first cell.
    pub(crate) fn from_row(row: &'a CustomDbRow) -> Self {
        let mut entries: Vec<(String, Field<'a>)> = Vec::with_capacity(row.rows.len());
        for (name, value) in row.column_names.iter().zip(&row.rows) {
            if !entries.iter().any(|(seen, _)| seen == name) {
                entries.push((name.clone(), Field::Cell(value)));
            }
        }
        Self::new(entries)
    }
}

impl<'de> Deserializer<'de> for RowDeserializer<'_> {
    type Error = RowDeError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_map(self)
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf option unit unit_struct newtype_struct seq tuple
        tuple_struct map struct enum identifier ignored_any
    }
}

impl<'de> MapAccess<'de> for RowDeserializer<'_> {
    type Error = RowDeError;

    fn next_key_seed<K: DeserializeSeed<'de>>(
        &mut self,
        seed: K,
    ) -> Result<Option<K::Value>, Self::Error> {
        match self.entries.next() {
            Some((name, field)) => {
                self.pending = Some(field);
                seed.deserialize(StringDeserializer::<RowDeError>::new(name))
                    .map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value, Self::Error> {
        match self.pending.take() {
            Some(Field::Cell(value)) => seed.deserialize(CellDeserializer { value }),
            Some(Field::Kept(json)) => seed.deserialize(json).map_err(|e| json_error(&e)),
            None => Err(RowDeError("row value requested before its column".into())),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.entries.len())
    }
}

/// One cell, converted on demand to whatever the target field asks for.
struct CellDeserializer<'a> {
    value: &'a RowValues,
}

impl CellDeserializer<'_> {
    fn convert<T: FromRowValue>(&self, expected: &str) -> Result<T, RowDeError> {
        T::from_row_value(self.value)
            .ok_or_else(|| RowDeError(format!("{:?} cannot be read as {expected}", self.value)))
    }
}

impl<'de> Deserializer<'de> for CellDeserializer<'_> {
    type Error = RowDeError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.value {
            RowValues::Int(i) => visitor.visit_i64(*i),
            RowValues::Float(f) => visitor.visit_f64(*f),
            RowValues::Bool(b) => visitor.visit_bool(*b),
            RowValues::Text(s) => visitor.visit_str(s),
            RowValues::Timestamp(dt) => visitor.visit_string(iso(dt)),
            RowValues::Null => visitor.visit_unit(),
            RowValues::JSON(json) => json
                .clone()
                .deserialize_any(visitor)
                .map_err(|e| json_error(&e)),
            RowValues::Blob(bytes) => visitor.visit_bytes(bytes),
        }
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_bool(self.convert("a boolean")?)
    }

    fn deserialize_i8<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.deserialize_i64(visitor)
    }

    fn deserialize_i16<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.deserialize_i64(visitor)
    }

    fn deserialize_i32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.deserialize_i64(visitor)
    }

    fn deserialize_i64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_i64(self.convert("an integer")?)
    }

    fn deserialize_u8<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.deserialize_i64(visitor)
    }

    fn deserialize_u16<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.deserialize_i64(visitor)
    }

    fn deserialize_u32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.deserialize_i64(visitor)
    }

    fn deserialize_u64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.deserialize_i64(visitor)
    }

    fn deserialize_f32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.deserialize_f64(visitor)
    }

    fn deserialize_f64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_f64(self.convert("a number")?)
    }

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.deserialize_string(visitor)
    }

    // chrono's types ask for `str`; hand them timestamps in the `T`-separated form they parse.
    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.value {
            RowValues::Text(s) if parse_date(s).is_none() => match parse_timestamp(s) {
                Some(dt) => visitor.visit_string(iso(&dt)),
                None => visitor.visit_str(s),
            },
            _ => self.deserialize_string(visitor),
        }
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_string(self.convert("a string")?)
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.deserialize_byte_buf(visitor)
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_byte_buf(self.convert("bytes")?)
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        if self.value.is_null() {
            visitor.visit_none()
        } else {
            visitor.visit_some(self)
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_unit()
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.value {
            RowValues::Blob(bytes) => {
                visitor.visit_seq(SeqDeserializer::<_, RowDeError>::new(bytes.iter().copied()))
            }
            _ => self.deserialize_any(visitor),
        }
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        match self.value {
            RowValues::Text(s) => visitor.visit_enum(StrDeserializer::<RowDeError>::new(s)),
            RowValues::JSON(json) => json
                .clone()
                .deserialize_enum(name, variants, visitor)
                .map_err(|e| json_error(&e)),
            _ => self.deserialize_any(visitor),
        }
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_unit()
    }

    forward_to_deserialize_any! {
        i128 u128 tuple tuple_struct map struct identifier
    }
}
