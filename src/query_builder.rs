//! Fluent wrappers for INSERT, UPDATE, DELETE and prepared statements.

pub mod delete;
pub mod insert;
pub mod prepared;
pub mod update;

pub use delete::DeleteQuery;
pub use insert::InsertQuery;
pub use prepared::PreparedQuery;
pub use update::UpdateQuery;
