//! Error types for the gateway and the client.
//!
//! Both sides use `thiserror` enums. Gateway errors carry an actionable
//! suggestion and know how to turn themselves into an HTTP response; client
//! errors describe what went wrong on the way to (or back from) the gateway.

use crate::models::{ConnectionConfigError, ErrorBody, ErrorDetail};
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use sqlx::sqlite::SqliteError;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GatewayError {
    /// Store unreachable or credentials rejected. Only raised while connecting.
    #[error("Connection failed: {message}")]
    Connect { message: String, suggestion: String },

    /// Query failed on an otherwise healthy connection.
    #[error("Store error: {message}")]
    Store {
        message: String,
        /// e.g., "42P01" for undefined table
        sql_state: Option<String>,
        suggestion: String,
    },

    #[error("Timeout: {operation} exceeded {limit:?}")]
    Timeout { operation: String, limit: Duration },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl GatewayError {
    /// Create a connection error with a helpful suggestion.
    pub fn connect(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::Connect {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Create a store error with optional SQL state.
    pub fn store(
        message: impl Into<String>,
        sql_state: Option<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self::Store {
            message: message.into(),
            sql_state,
            suggestion: suggestion.into(),
        }
    }

    pub fn timeout(operation: impl Into<String>, limit: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            limit,
        }
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get the suggestion for this error, if available.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Connect { suggestion, .. } => Some(suggestion),
            Self::Store { suggestion, .. } => Some(suggestion),
            Self::Timeout { .. } => Some("Consider increasing the query timeout"),
            _ => None,
        }
    }

    /// Stable machine-readable code used in HTTP error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Connect { .. } => "connect_error",
            Self::Store { .. } => "store_error",
            Self::Timeout { .. } => "timeout",
            Self::InvalidConfig { .. } => "invalid_config",
            Self::Internal { .. } => "internal_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Connect { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            Self::Store { .. } | Self::InvalidConfig { .. } | Self::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Build the JSON body sent to clients for this error.
    pub fn to_body(&self) -> ErrorBody {
        let message = match self {
            Self::Store {
                message,
                sql_state: Some(code),
                ..
            } => format!("{} (SQLSTATE: {})", message, code),
            _ => self.to_string(),
        };
        ErrorBody {
            error: ErrorDetail {
                code: self.code().to_string(),
                message,
                suggestion: self.suggestion().map(String::from),
            },
        }
    }
}

/// Classify sqlx errors raised while serving requests.
///
/// Failures while establishing the pool are mapped to `Connect` explicitly
/// by the pool module; anything reaching this conversion happened on a
/// connection that was already up.
impl From<sqlx::Error> for GatewayError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                // SQLite reports numeric result codes, not SQLSTATE
                let code = if db_err.try_downcast_ref::<SqliteError>().is_some() {
                    None
                } else {
                    db_err.code().map(|c| c.to_string())
                };
                GatewayError::store(
                    db_err.message(),
                    code,
                    "Check that the configured table exists and is readable",
                )
            }
            sqlx::Error::PoolTimedOut => GatewayError::store(
                "Timed out waiting for a free database connection",
                None,
                "Increase max_connections or reduce request concurrency",
            ),
            sqlx::Error::PoolClosed => GatewayError::store(
                "Connection pool is closed",
                None,
                "The gateway is shutting down",
            ),
            sqlx::Error::Io(io_err) => GatewayError::store(
                format!("I/O error: {}", io_err),
                None,
                "Check network connectivity and database server status",
            ),
            sqlx::Error::Tls(tls_err) => GatewayError::store(
                format!("TLS error: {}", tls_err),
                None,
                "Verify TLS configuration and certificates",
            ),
            sqlx::Error::Protocol(msg) => GatewayError::store(
                format!("Protocol error: {}", msg),
                None,
                "Check database server compatibility",
            ),
            sqlx::Error::ColumnNotFound(col) => GatewayError::store(
                format!("Column not found: {}", col),
                None,
                "Check the table definition",
            ),
            sqlx::Error::ColumnDecode { index, source } => {
                GatewayError::internal(format!("Failed to decode column {}: {}", index, source))
            }
            sqlx::Error::Decode(source) => {
                GatewayError::internal(format!("Decode error: {}", source))
            }
            sqlx::Error::WorkerCrashed => GatewayError::internal("Database worker crashed"),
            _ => GatewayError::internal(format!("Unknown database error: {}", err)),
        }
    }
}

impl From<ConnectionConfigError> for GatewayError {
    fn from(err: ConnectionConfigError) -> Self {
        GatewayError::invalid_config(err.to_string())
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.to_body())).into_response()
    }
}

/// Result type alias for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Failures observed by the data client.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Could not reach the gateway or the connection dropped mid-response.
    #[error("Request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request to {url} timed out after {elapsed_secs}s")]
    Timeout { url: String, elapsed_secs: u64 },

    /// The gateway answered with a non-2xx status.
    #[error("Gateway responded with HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The body was not a JSON array of objects.
    #[error("Malformed response body: {message}")]
    Decode { message: String },

    /// The spawned fetch task panicked or was aborted.
    #[error("Fetch task failed: {message}")]
    Task { message: String },

    #[error("Invalid client configuration: {message}")]
    InvalidConfig { message: String },
}

impl ClientError {
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GatewayError::connect("Failed to connect", "Check credentials");
        assert!(err.to_string().contains("Connection failed"));
    }

    #[test]
    fn test_error_suggestion() {
        let err = GatewayError::store("no such table: items", None, "Check the table");
        assert_eq!(err.suggestion(), Some("Check the table"));
        assert_eq!(GatewayError::internal("x").suggestion(), None);
    }

    #[test]
    fn test_store_error_maps_to_500() {
        let err = GatewayError::store("boom", None, "retry");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code(), "store_error");
    }

    #[test]
    fn test_timeout_maps_to_504() {
        let err = GatewayError::timeout("query execution", Duration::from_secs(30));
        assert_eq!(err.status_code(), StatusCode::GATEWAY_TIMEOUT);
        assert!(err.to_string().contains("30s"));

        let short = GatewayError::timeout("query execution", Duration::from_millis(50));
        assert!(short.to_string().ends_with("exceeded 50ms"));
    }

    #[test]
    fn test_body_includes_sql_state() {
        let err = GatewayError::store("relation does not exist", Some("42P01".into()), "hint");
        let body = err.to_body();
        assert_eq!(body.error.code, "store_error");
        assert!(body.error.message.contains("42P01"));
        assert_eq!(body.error.suggestion.as_deref(), Some("hint"));
    }

    #[test]
    fn test_pool_timed_out_is_store_error() {
        let err: GatewayError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, GatewayError::Store { .. }));
    }

    #[test]
    fn test_client_status_display() {
        let err = ClientError::status(500, "Store error: no such table");
        assert_eq!(
            err.to_string(),
            "Gateway responded with HTTP 500: Store error: no such table"
        );
    }
}
