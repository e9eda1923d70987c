//! Parameter direction markers for prepared statement binding.
//!
//! Plain values bind as input parameters. Wrap a value in [`In`], [`Out`] or [`InOut`] to give
//! it a direction and an alias that can be used to read the bound value back from the
//! [`QueryResult`](crate::QueryResult):
//!
//! ```rust,no_run
//! use easy_sql::prelude::*;
//!
//! # async fn demo(db: &Database) -> Result<(), EasySqlError> {
//! let query = db.prepare("SELECT ?, ?").await?;
//! let res = query.exec(params![In::aliased(5, "Count"), Out::new("result")]).await?;
//! assert_eq!(res.bound_value_by_alias(" count "), Some(&RowValues::Int(5)));
//! # Ok(()) }
//! ```
//!
//! `SQLite` has no output parameters, so `Out` binds NULL and `InOut` binds its input value.

use crate::types::RowValues;

/// Direction of a bound parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParamDirection {
    #[default]
    In,
    Out,
    InOut,
}

/// A positional parameter with its direction and optional alias.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundParam {
    pub value: RowValues,
    pub direction: ParamDirection,
    /// Normalized (trimmed, lower-case) alias; `None` when unnamed.
    pub alias: Option<String>,
}

impl BoundParam {
    fn new(value: RowValues, direction: ParamDirection, alias: Option<&str>) -> Self {
        Self {
            value,
            direction,
            alias: alias.and_then(normalize_alias),
        }
    }
}

impl<T: Into<RowValues>> From<T> for BoundParam {
    fn from(value: T) -> Self {
        BoundParam::new(value.into(), ParamDirection::In, None)
    }
}

/// Normalize an alias for lookup. Blank aliases are treated as absent.
#[must_use]
pub fn normalize_alias(alias: &str) -> Option<String> {
    let trimmed = alias.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Input parameter marker.
#[derive(Debug, Clone, PartialEq)]
pub struct In(BoundParam);

impl In {
    #[must_use]
    pub fn new(value: impl Into<RowValues>) -> Self {
        Self(BoundParam::new(value.into(), ParamDirection::In, None))
    }

    #[must_use]
    pub fn aliased(value: impl Into<RowValues>, alias: &str) -> Self {
        Self(BoundParam::new(value.into(), ParamDirection::In, Some(alias)))
    }
}

/// Output parameter marker; binds NULL.
#[derive(Debug, Clone, PartialEq)]
pub struct Out(BoundParam);

impl Out {
    #[must_use]
    pub fn new(alias: &str) -> Self {
        Self(BoundParam::new(RowValues::Null, ParamDirection::Out, Some(alias)))
    }
}

/// Input/output parameter marker.
#[derive(Debug, Clone, PartialEq)]
pub struct InOut(BoundParam);

impl InOut {
    #[must_use]
    pub fn new(value: impl Into<RowValues>, alias: &str) -> Self {
        Self(BoundParam::new(value.into(), ParamDirection::InOut, Some(alias)))
    }
}

impl From<In> for BoundParam {
    fn from(marker: In) -> Self {
        marker.0
    }
}

impl From<Out> for BoundParam {
    fn from(marker: Out) -> Self {
        marker.0
    }
}

impl From<InOut> for BoundParam {
    fn from(marker: InOut) -> Self {
        marker.0
    }
}

/// Build a `Vec<BoundParam>` from plain values and direction markers.
#[macro_export]
macro_rules! params {
    () => {
        ::std::vec::Vec::<$crate::BoundParam>::new()
    };
    ($($param:expr),+ $(,)?) => {
        ::std::vec![$($crate::BoundParam::from($param)),+]
    };
}
