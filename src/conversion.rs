//! Lenient conversion of result cells into Rust types.
//!
//! The rules follow what callers expect from a dynamically typed row: numbers parse out of
//! text, text is truthy unless it reads as zero/false, and NULL becomes the zero value of the
//! target type.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value as JsonValue;

use crate::error::EasySqlError;
use crate::types::RowValues;

const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

const TIME_FORMATS: &[&str] = &["%H:%M:%S", "%H:%M:%S%.f", "%H:%M"];

/// Parse an ISO-like timestamp string.
#[must_use]
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| parse_date(text).and_then(|d| d.and_hms_opt(0, 0, 0)))
}

pub(crate) fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").ok()
}

fn parse_time(text: &str) -> Option<NaiveTime> {
    let text = text.trim();
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(text, fmt).ok())
}

/// Parse an integer written in `base` (2..=36). Base 16 also accepts a `0x` prefix.
///
/// # Errors
/// Returns `EasySqlError::ParameterError` when `base` is out of range.
pub fn parse_int(text: &str, base: u32) -> Result<Option<i64>, EasySqlError> {
    check_base(base)?;
    let trimmed = text.trim();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let digits = if base == 16 {
        digits
            .strip_prefix("0x")
            .or_else(|| digits.strip_prefix("0X"))
            .unwrap_or(digits)
    } else {
        digits
    };
    if digits.is_empty() || digits.starts_with(['+', '-']) {
        return Ok(None);
    }
    Ok(i64::from_str_radix(digits, base)
        .ok()
        .map(|v| if negative { -v } else { v }))
}

pub(crate) fn check_base(base: u32) -> Result<(), EasySqlError> {
    if (2..=36).contains(&base) {
        Ok(())
    } else {
        Err(EasySqlError::ParameterError(format!(
            "integer base must be between 2 and 36, got {base}"
        )))
    }
}

fn text_to_bool(text: &str) -> bool {
    let t = text.trim();
    !(t.is_empty() || t == "0" || t.eq_ignore_ascii_case("false"))
}

fn float_to_int(f: f64) -> Option<i64> {
    // 2^63: i64::MIN is exact, i64::MAX is not representable.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    let rounded = f.round();
    if (-LIMIT..LIMIT).contains(&rounded) {
        #[allow(clippy::cast_possible_truncation)]
        Some(rounded as i64)
    } else {
        None
    }
}

/// Conversion from a result cell. `None` means the cell cannot be represented as `Self`.
pub trait FromRowValue: Sized {
    fn from_row_value(value: &RowValues) -> Option<Self>;
}

impl FromRowValue for RowValues {
    fn from_row_value(value: &RowValues) -> Option<Self> {
        Some(value.clone())
    }
}

impl FromRowValue for i64 {
    fn from_row_value(value: &RowValues) -> Option<Self> {
        match value {
            RowValues::Int(i) => Some(*i),
            RowValues::Float(f) => float_to_int(*f),
            RowValues::Bool(b) => Some(i64::from(*b)),
            RowValues::Text(s) => {
                let s = s.trim();
                s.parse::<i64>().ok()
            }
            RowValues::Null => Some(0),
            RowValues::JSON(JsonValue::Number(n)) => n.as_i64(),
            RowValues::Timestamp(_) | RowValues::JSON(_) | RowValues::Blob(_) => None,
        }
    }
}

impl FromRowValue for i32 {
    fn from_row_value(value: &RowValues) -> Option<Self> {
        i64::from_row_value(value).and_then(|v| i32::try_from(v).ok())
    }
}

impl FromRowValue for u32 {
    fn from_row_value(value: &RowValues) -> Option<Self> {
        i64::from_row_value(value).and_then(|v| u32::try_from(v).ok())
    }
}

impl FromRowValue for f64 {
    fn from_row_value(value: &RowValues) -> Option<Self> {
        match value {
            #[allow(clippy::cast_precision_loss)]
            RowValues::Int(i) => Some(*i as f64),
            RowValues::Float(f) => Some(*f),
            RowValues::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            RowValues::Text(s) => s.trim().parse::<f64>().ok(),
            RowValues::Null => Some(0.0),
            RowValues::JSON(JsonValue::Number(n)) => n.as_f64(),
            RowValues::Timestamp(_) | RowValues::JSON(_) | RowValues::Blob(_) => None,
        }
    }
}

impl FromRowValue for bool {
    fn from_row_value(value: &RowValues) -> Option<Self> {
        match value {
            RowValues::Int(i) => Some(*i != 0),
            RowValues::Float(f) => Some(*f != 0.0),
            RowValues::Bool(b) => Some(*b),
            RowValues::Text(s) => Some(text_to_bool(s)),
            RowValues::Null => Some(false),
            RowValues::JSON(JsonValue::Bool(b)) => Some(*b),
            RowValues::Blob(bytes) => Some(text_to_bool(&String::from_utf8_lossy(bytes))),
            RowValues::Timestamp(_) | RowValues::JSON(_) => None,
        }
    }
}

impl FromRowValue for String {
    fn from_row_value(value: &RowValues) -> Option<Self> {
        Some(match value {
            RowValues::Int(i) => i.to_string(),
            RowValues::Float(f) => f.to_string(),
            RowValues::Bool(b) => b.to_string(),
            RowValues::Text(s) => s.clone(),
            RowValues::Timestamp(dt) => dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string(),
            RowValues::Null => String::new(),
            RowValues::JSON(JsonValue::String(s)) => s.clone(),
            RowValues::JSON(v) => v.to_string(),
            RowValues::Blob(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        })
    }
}

impl FromRowValue for Vec<u8> {
    fn from_row_value(value: &RowValues) -> Option<Self> {
        match value {
            RowValues::Blob(bytes) => Some(bytes.clone()),
            RowValues::Null => Some(Vec::new()),
            other => String::from_row_value(other).map(String::into_bytes),
        }
    }
}

impl FromRowValue for NaiveDateTime {
    fn from_row_value(value: &RowValues) -> Option<Self> {
        match value {
            RowValues::Timestamp(dt) => Some(*dt),
            RowValues::Text(s) => parse_timestamp(s),
            _ => None,
        }
    }
}

impl FromRowValue for NaiveDate {
    fn from_row_value(value: &RowValues) -> Option<Self> {
        match value {
            RowValues::Timestamp(dt) => Some(dt.date()),
            RowValues::Text(s) => parse_date(s).or_else(|| parse_timestamp(s).map(|dt| dt.date())),
            _ => None,
        }
    }
}

impl FromRowValue for NaiveTime {
    fn from_row_value(value: &RowValues) -> Option<Self> {
        match value {
            RowValues::Timestamp(dt) => Some(dt.time()),
            RowValues::Text(s) => parse_time(s).or_else(|| parse_timestamp(s).map(|dt| dt.time())),
            _ => None,
        }
    }
}

impl FromRowValue for JsonValue {
    fn from_row_value(value: &RowValues) -> Option<Self> {
        Some(value.to_json())
    }
}

impl<T: FromRowValue> FromRowValue for Option<T> {
    fn from_row_value(value: &RowValues) -> Option<Self> {
        if value.is_null() {
            Some(None)
        } else {
            T::from_row_value(value).map(Some)
        }
    }
}

/// Convert the cell at `index`, naming the column in the error.
pub(crate) fn convert_cell<T: FromRowValue>(
    values: &[RowValues],
    index: usize,
) -> Result<T, EasySqlError> {
    let value = values.get(index).ok_or_else(|| {
        EasySqlError::ParameterError(format!(
            "row has {} columns, column {index} requested",
            values.len()
        ))
    })?;
    T::from_row_value(value).ok_or_else(|| {
        EasySqlError::ConversionError(format!(
            "column {index} ({value:?}) cannot be converted to {}",
            std::any::type_name::<T>()
        ))
    })
}

/// Positional extraction of several cells at once.
///
/// ```rust
/// use easy_sql::conversion::FromRow;
/// use easy_sql::row_values;
///
/// let row = row_values![1, "true", "c"];
/// let (a, b, c) = <(i64, bool, String)>::from_row(&row).unwrap();
/// assert_eq!((a, b, c.as_str()), (1, true, "c"));
/// ```
pub trait FromRow: Sized {
    /// Build `Self` from the leading cells of `values`.
    ///
    /// # Errors
    /// Returns `EasySqlError` when the row is too short or a cell does not convert.
    fn from_row(values: &[RowValues]) -> Result<Self, EasySqlError>;
}

macro_rules! impl_from_row_tuple {
    ($($idx:tt => $name:ident),+) => {
        impl<$($name: FromRowValue),+> FromRow for ($($name,)+) {
            fn from_row(values: &[RowValues]) -> Result<Self, EasySqlError> {
                Ok(($(convert_cell::<$name>(values, $idx)?,)+))
            }
        }
    };
}

impl_from_row_tuple!(0 => A);
impl_from_row_tuple!(0 => A, 1 => B);
impl_from_row_tuple!(0 => A, 1 => B, 2 => C);
impl_from_row_tuple!(0 => A, 1 => B, 2 => C, 3 => D);
impl_from_row_tuple!(0 => A, 1 => B, 2 => C, 3 => D, 4 => E);
impl_from_row_tuple!(0 => A, 1 => B, 2 => C, 3 => D, 4 => E, 5 => F);
impl_from_row_tuple!(0 => A, 1 => B, 2 => C, 3 => D, 4 => E, 5 => F, 6 => G);
impl_from_row_tuple!(0 => A, 1 => B, 2 => C, 3 => D, 4 => E, 5 => F, 6 => G, 7 => H);
impl_from_row_tuple!(0 => A, 1 => B, 2 => C, 3 => D, 4 => E, 5 => F, 6 => G, 7 => H, 8 => I);
impl_from_row_tuple!(
    0 => A, 1 => B, 2 => C, 3 => D, 4 => E, 5 => F, 6 => G, 7 => H, 8 => I, 9 => J
);
impl_from_row_tuple!(
    0 => A, 1 => B, 2 => C, 3 => D, 4 => E, 5 => F, 6 => G, 7 => H, 8 => I, 9 => J, 10 => K
);
impl_from_row_tuple!(
    0 => A, 1 => B, 2 => C, 3 => D, 4 => E, 5 => F, 6 => G, 7 => H, 8 => I, 9 => J, 10 => K,
    11 => L
);
