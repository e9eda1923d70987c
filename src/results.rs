//! Materialized rows and the result types returned to callers.

pub mod non_query;
pub mod query_result;
pub mod result_set;
pub mod row;
mod row_de;

pub use non_query::NonQueryResult;
pub use query_result::{CursorPosition, QueryResult};
pub use result_set::ResultSet;
pub use row::CustomDbRow;
