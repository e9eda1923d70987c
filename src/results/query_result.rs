use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value as JsonValue};

use super::row_de::{Field, RowDeError, RowDeserializer};
use super::{CustomDbRow, ResultSet};
use crate::conversion::{FromRow, FromRowValue, check_base, parse_int};
use crate::error::EasySqlError;
use crate::params::{BoundParam, normalize_alias};
use crate::sqlite::connection::Execution;
use crate::types::RowValues;

/// Position of a [`QueryResult`] cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorPosition {
    BeforeFirst,
    Row(usize),
    AfterLast,
}

/// Cursor over the rows of an executed query.
///
/// A fresh result sits before the first row; call [`next`](QueryResult::next) to move onto it.
///
/// ```rust,no_run
/// use easy_sql::prelude::*;
///
/// # async fn demo(db: &Database) -> Result<(), EasySqlError> {
/// let mut res = db.exec_query("SELECT id, name FROM users").await?;
/// while res.next() {
///     let (id, name) = res.fetch::<(i64, String)>()?;
///     println!("{id}: {name}");
/// }
/// # Ok(()) }
/// ```
#[derive(Debug, Clone)]
pub struct QueryResult {
    result_set: ResultSet,
    position: CursorPosition,
    forward_only: bool,
    active: bool,
    bound_values: Vec<RowValues>,
    bound_aliases: HashMap<String, usize>,
    last_query: String,
    executed_query: String,
    last_insert_id: Option<i64>,
}

impl QueryResult {
    pub(crate) fn from_execution(
        sql: &str,
        execution: Execution,
        forward_only: bool,
        params: &[BoundParam],
    ) -> Self {
        let bound_aliases = params
            .iter()
            .enumerate()
            .filter_map(|(idx, p)| p.alias.clone().map(|alias| (alias, idx)))
            .collect();
        Self {
            result_set: execution.result_set,
            position: CursorPosition::BeforeFirst,
            forward_only,
            active: true,
            bound_values: params.iter().map(|p| p.value.clone()).collect(),
            bound_aliases,
            last_query: sql.to_string(),
            executed_query: execution.executed_query,
            last_insert_id: execution.last_insert_id,
        }
    }

    fn row_count(&self) -> usize {
        self.result_set.len()
    }

    /// Index of the cursor on the signed axis used by relative seeks.
    fn signed_position(&self) -> i64 {
        match self.position {
            CursorPosition::BeforeFirst => -1,
            CursorPosition::Row(idx) => i64::try_from(idx).unwrap_or(i64::MAX),
            CursorPosition::AfterLast => i64::try_from(self.row_count()).unwrap_or(i64::MAX),
        }
    }

    /// Move to the next row. Returns `false` (and sits after the last row) when none is left.
    pub fn next(&mut self) -> bool {
        if !self.active {
            return false;
        }
        let target = match self.position {
            CursorPosition::BeforeFirst => 0,
            CursorPosition::Row(idx) => idx + 1,
            CursorPosition::AfterLast => return false,
        };
        if target < self.row_count() {
            self.position = CursorPosition::Row(target);
            true
        } else {
            self.position = CursorPosition::AfterLast;
            false
        }
    }

    /// Move to the previous row. Always `false` for forward-only results.
    pub fn previous(&mut self) -> bool {
        if !self.active || self.forward_only {
            return false;
        }
        match self.position {
            CursorPosition::BeforeFirst => false,
            CursorPosition::Row(0) => {
                self.position = CursorPosition::BeforeFirst;
                false
            }
            CursorPosition::Row(idx) => {
                self.position = CursorPosition::Row(idx - 1);
                true
            }
            CursorPosition::AfterLast => match self.row_count() {
                0 => false,
                len => {
                    self.position = CursorPosition::Row(len - 1);
                    true
                }
            },
        }
    }

    /// Move to the first row. Forward-only results refuse once past it.
    pub fn first(&mut self) -> bool {
        if !self.active || self.row_count() == 0 {
            return false;
        }
        let past_first = matches!(
            self.position,
            CursorPosition::Row(idx) if idx > 0
        ) || self.position == CursorPosition::AfterLast;
        if self.forward_only && past_first {
            return false;
        }
        self.position = CursorPosition::Row(0);
        true
    }

    /// Move to the last row.
    pub fn last(&mut self) -> bool {
        if !self.active || self.row_count() == 0 {
            return false;
        }
        if self.forward_only && self.position == CursorPosition::AfterLast {
            return false;
        }
        self.position = CursorPosition::Row(self.row_count() - 1);
        true
    }

    /// Move to row `index`, or by `index` rows from the current position when `relative`.
    ///
    /// Landing outside the result leaves the cursor before the first or after the last row
    /// and returns `false`. Forward-only results refuse to move backwards.
    pub fn seek(&mut self, index: i64, relative: bool) -> bool {
        if !self.active {
            return false;
        }
        let current = self.signed_position();
        let target = if relative {
            current.saturating_add(index)
        } else {
            index
        };
        if self.forward_only && target < current {
            return false;
        }
        if target < 0 {
            self.position = CursorPosition::BeforeFirst;
            return false;
        }
        match usize::try_from(target) {
            Ok(idx) if idx < self.row_count() => {
                self.position = CursorPosition::Row(idx);
                true
            }
            _ => {
                self.position = CursorPosition::AfterLast;
                false
            }
        }
    }

    /// Discard this result and move to the next one. `SQLite` returns a single result per
    /// statement, so this always deactivates the cursor and returns `false`.
    pub fn next_result(&mut self) -> bool {
        self.active = false;
        self.position = CursorPosition::BeforeFirst;
        false
    }

    #[must_use]
    pub fn at(&self) -> CursorPosition {
        self.position
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// True when the cursor sits on a row.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.active && matches!(self.position, CursorPosition::Row(_))
    }

    #[must_use]
    pub fn is_forward_only(&self) -> bool {
        self.forward_only
    }

    /// Number of rows returned, or `None` for statements without result columns.
    #[must_use]
    pub fn size(&self) -> Option<usize> {
        (self.result_set.column_count() > 0).then(|| self.result_set.len())
    }

    #[must_use]
    pub fn num_rows_affected(&self) -> usize {
        self.result_set.rows_affected
    }

    /// Rowid of the last INSERT when the statement changed rows.
    #[must_use]
    pub fn last_insert_id(&self) -> Option<i64> {
        self.last_insert_id
    }

    #[must_use]
    pub fn last_query(&self) -> &str {
        &self.last_query
    }

    #[must_use]
    pub fn executed_query(&self) -> &str {
        &self.executed_query
    }

    #[must_use]
    pub fn column_names(&self) -> &[String] {
        self.result_set
            .get_column_names()
            .map_or(&[], |names| names.as_slice())
    }

    /// The row under the cursor.
    #[must_use]
    pub fn current_row(&self) -> Option<&CustomDbRow> {
        match self.position {
            CursorPosition::Row(idx) if self.active => self.result_set.results.get(idx),
            _ => None,
        }
    }

    fn current_values(&self) -> &[RowValues] {
        self.current_row().map_or(&[], |row| row.rows.as_slice())
    }

    fn require_row(&self) -> Result<&CustomDbRow, EasySqlError> {
        self.current_row().ok_or_else(|| {
            EasySqlError::ExecutionError(format!(
                "result of '{}' is not positioned on a row",
                self.last_query
            ))
        })
    }

    /// Value of column `index` in the current row.
    #[must_use]
    pub fn value(&self, index: usize) -> Option<&RowValues> {
        self.current_row().and_then(|row| row.get_by_index(index))
    }

    /// Value of the column called `name` in the current row.
    #[must_use]
    pub fn value_by_name(&self, name: &str) -> Option<&RowValues> {
        self.current_row().and_then(|row| row.get(name))
    }

    /// First column of the current row.
    #[must_use]
    pub fn scalar_value(&self) -> Option<&RowValues> {
        self.value(0)
    }

    /// First column of the current row, converted to `T`.
    #[must_use]
    pub fn scalar<T: FromRowValue>(&self) -> Option<T> {
        self.scalar_value().and_then(T::from_row_value)
    }

    /// Value bound to placeholder `index` for this execution.
    #[must_use]
    pub fn bound_value(&self, index: usize) -> Option<&RowValues> {
        self.bound_values.get(index)
    }

    /// Value bound under `alias`; lookup trims and ignores case.
    #[must_use]
    pub fn bound_value_by_alias(&self, alias: &str) -> Option<&RowValues> {
        let key = normalize_alias(alias)?;
        self.bound_aliases
            .get(&key)
            .and_then(|&idx| self.bound_value(idx))
    }

    #[must_use]
    pub fn bound_values(&self) -> &[RowValues] {
        &self.bound_values
    }

    /// Current row as column name → value. Empty when not on a row.
    #[must_use]
    pub fn to_map(&self) -> BTreeMap<String, RowValues> {
        let mut map = BTreeMap::new();
        self.fetch_map(&mut map);
        map
    }

    #[must_use]
    pub fn to_list(&self) -> Vec<RowValues> {
        let mut list = Vec::new();
        self.fetch_list(&mut list);
        list
    }

    /// Current row with every value rendered as text (NULL as an empty string).
    #[must_use]
    pub fn to_string_list(&self) -> Vec<String> {
        let mut list = Vec::new();
        self.fetch_string_list(&mut list);
        list
    }

    /// Current row converted to `T`, skipping cells that do not convert.
    ///
    /// NULL cells are skipped when `skip_nulls` is set; otherwise they convert to `T`'s zero
    /// value (or are skipped if `T` has none).
    #[must_use]
    pub fn to_vector<T: FromRowValue>(&self, skip_nulls: bool) -> Vec<T> {
        self.current_values()
            .iter()
            .filter(|value| !(skip_nulls && value.is_null()))
            .filter_map(T::from_row_value)
            .collect()
    }

    /// Current row as integers, parsing text cells in `base`.
    ///
    /// Cells that do not parse are skipped. NULL becomes 0 unless `skip_nulls` is set.
    ///
    /// # Errors
    /// Returns `EasySqlError::ParameterError` if `base` is outside 2..=36.
    pub fn parse_to_int_vector(
        &self,
        base: u32,
        skip_nulls: bool,
    ) -> Result<Vec<i64>, EasySqlError> {
        check_base(base)?;
        let mut out = Vec::with_capacity(self.current_values().len());
        for value in self.current_values() {
            let parsed = match value {
                RowValues::Null if skip_nulls => continue,
                RowValues::Text(text) => parse_int(text, base)?,
                RowValues::Blob(bytes) => parse_int(&String::from_utf8_lossy(bytes), base)?,
                other => i64::from_row_value(other),
            };
            if let Some(v) = parsed {
                out.push(v);
            }
        }
        Ok(out)
    }

    /// Convert the leading cells of the current row into a tuple.
    ///
    /// # Errors
    /// Returns an error when the cursor is not on a row, the row is too short, or a cell does
    /// not convert.
    pub fn fetch<T: FromRow>(&self) -> Result<T, EasySqlError> {
        T::from_row(&self.require_row()?.rows)
    }

    /// Fill `map` with the current row, reusing its allocation.
    pub fn fetch_map(&self, map: &mut BTreeMap<String, RowValues>) {
        map.clear();
        if let Some(row) = self.current_row() {
            for (name, value) in row.column_names.iter().zip(&row.rows) {
                map.entry(name.clone()).or_insert_with(|| value.clone());
            }
        }
    }

    pub fn fetch_list(&self, list: &mut Vec<RowValues>) {
        list.clear();
        list.extend_from_slice(self.current_values());
    }

    pub fn fetch_string_list(&self, list: &mut Vec<String>) {
        list.clear();
        list.extend(
            self.current_values()
                .iter()
                .map(|v| String::from_row_value(v).unwrap_or_default()),
        );
    }

    /// Current row as a JSON object keyed by column name. `Null` when not on a row.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        match self.current_row() {
            Some(row) => JsonValue::Object(row_to_json(row)),
            None => JsonValue::Null,
        }
    }

    /// Deserialize the current row into `T`, matching fields to column names.
    ///
    /// # Errors
    /// Returns `EasySqlError::ConversionError` when the row does not fit `T`.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, EasySqlError> {
        let row = self.require_row()?;
        T::deserialize(RowDeserializer::from_row(row)).map_err(|e| misfit(&e))
    }

    /// Overwrite the fields of `target` whose names match a result column.
    ///
    /// Fields without a matching column keep their current values.
    ///
    /// # Errors
    /// Returns `EasySqlError::ConversionError` when `target` does not serialize to an object
    /// or a column value does not fit its field.
    pub fn fetch_object<T>(&self, target: &mut T) -> Result<(), EasySqlError>
    where
        T: Serialize + DeserializeOwned,
    {
        let row = self.require_row()?;
        let fields = match serde_json::to_value(&*target) {
            Ok(JsonValue::Object(fields)) => fields,
            Ok(other) => {
                return Err(EasySqlError::ConversionError(format!(
                    "fetch_object target must serialize to an object, got {other}"
                )));
            }
            Err(e) => return Err(EasySqlError::ConversionError(e.to_string())),
        };
        let entries = fields
            .into_iter()
            .map(|(name, kept)| {
                let cell = row
                    .column_names
                    .iter()
                    .position(|column| *column == name)
                    .and_then(|idx| row.rows.get(idx));
                let field = match cell {
                    Some(value) => Field::Cell(value),
                    None => Field::Kept(kept),
                };
                (name, field)
            })
            .collect();
        *target = T::deserialize(RowDeserializer::new(entries)).map_err(|e| misfit(&e))?;
        Ok(())
    }
}

fn misfit(e: &RowDeError) -> EasySqlError {
    EasySqlError::ConversionError(format!("row does not fit target: {e}"))
}

fn row_to_json(row: &CustomDbRow) -> Map<String, JsonValue> {
    let mut map = Map::with_capacity(row.rows.len());
    for (name, value) in row.column_names.iter().zip(&row.rows) {
        if !map.contains_key(name) {
            map.insert(name.clone(), value.to_json());
        }
    }
    map
}
