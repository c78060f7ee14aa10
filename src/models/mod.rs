//! Data models for the gateway and client.
//!
//! This module re-exports all model types used throughout the application.

pub mod connection;
pub mod record;

// Re-export commonly used types
pub use connection::{
    ConnectionConfig, ConnectionConfigError, ConnectionInfo, DatabaseType, TableName,
};
pub use record::{ErrorBody, ErrorDetail, Record};
