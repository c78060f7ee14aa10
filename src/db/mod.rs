//! Database access layer.
//!
//! - Connection pool creation (one pool per gateway process)
//! - Execution of the fixed read
//! - Row to JSON type mappings

pub mod executor;
pub mod pool;
pub mod types;

pub use executor::QueryExecutor;
pub use pool::DbPool;
pub use types::RowToJson;
