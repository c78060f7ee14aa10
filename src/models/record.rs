//! Wire-level data models shared by the gateway and the client.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// One row from the store: column name to value, in column order.
///
/// No schema is imposed; the gateway passes through whatever columns the
/// table has and the client accepts them as-is.
pub type Record = serde_json::Map<String, JsonValue>;

/// Body returned with every non-2xx response from the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Stable code, e.g. "store_error" or "timeout"
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}
