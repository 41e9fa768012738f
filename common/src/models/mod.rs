//! Shared data models.

pub mod connection;
pub mod query;
pub mod schema;

// Re-export commonly used types
pub use connection::{ConnectionConfig, DbType, Qualifier};
pub use query::{Direction, FindRequest, FindResult, Filter, ModelSummary, Record, MAX_LIMIT};
pub use schema::{ColumnDescriptor, ColumnType, ForeignKeyRef, KeyRole, SchemaDescriptor};
