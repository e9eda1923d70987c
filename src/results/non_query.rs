/// Outcome of a statement that does not produce rows (DDL, INSERT, UPDATE, DELETE).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NonQueryResult {
    pub(crate) num_rows_affected: usize,
    pub(crate) last_insert_id: Option<i64>,
    pub(crate) last_query: String,
    pub(crate) executed_query: String,
}

impl NonQueryResult {
    pub(crate) fn new(
        num_rows_affected: usize,
        last_insert_id: Option<i64>,
        last_query: impl Into<String>,
        executed_query: impl Into<String>,
    ) -> Self {
        Self {
            num_rows_affected,
            last_insert_id,
            last_query: last_query.into(),
            executed_query: executed_query.into(),
        }
    }

    /// Rows changed by the statement.
    #[must_use]
    pub fn num_rows_affected(&self) -> usize {
        self.num_rows_affected
    }

    /// Rowid of the most recent successful INSERT, when the statement changed rows.
    #[must_use]
    pub fn last_insert_id(&self) -> Option<i64> {
        self.last_insert_id
    }

    /// SQL text as submitted.
    #[must_use]
    pub fn last_query(&self) -> &str {
        &self.last_query
    }

    /// SQL text with the last bound parameters expanded.
    #[must_use]
    pub fn executed_query(&self) -> &str {
        &self.executed_query
    }
}
