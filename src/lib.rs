//! Data Gateway Library
//!
//! A read-only HTTP gateway that serves the rows of one SQL table as a JSON
//! array (SQLite, PostgreSQL, MySQL), and a client that fetches and renders
//! them.

pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod format;
pub mod gateway;
pub mod logging;
pub mod models;

pub use client::{DataClient, FetchHandle, RecordView};
pub use config::{ClientConfig, GatewayConfig};
pub use error::{ClientError, GatewayError};
pub use gateway::{GatewayState, QueryGateway};
pub use models::Record;
