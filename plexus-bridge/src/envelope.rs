//! Bridge request/response wire types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error codes the response envelope carries in its `code` field.
pub const MODULE_NOT_FOUND: &str = "MODULE_NOT_FOUND";
pub const COMMAND_NOT_FOUND: &str = "COMMAND_NOT_FOUND";
pub const ACCESS_DENIED: &str = "ACCESS_DENIED";
pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
pub const TIMEOUT: &str = "TIMEOUT";

/// The signed request body posted to `<target-base>/__internal/bridge` (or
/// passed as the `args-as-json` argv entry to a subprocess bridge).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeRequest {
    pub caller: String,
    pub module: String,
    pub command: String,
    pub args: Vec<Value>,
    pub timestamp: i64,
    pub nonce: String,
    pub signature: String,
}

/// `{ success, source, result?, error?, code?, timestamp }` — the only
/// shape either transport ever returns, success or failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeEnvelope {
    pub success: bool,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub timestamp: i64,
}

impl BridgeEnvelope {
    pub fn ok(source: impl Into<String>, result: Value, timestamp: i64) -> Self {
        Self {
            success: true,
            source: source.into(),
            result: Some(result),
            error: None,
            code: None,
            timestamp,
        }
    }

    pub fn error(source: impl Into<String>, code: &str, message: impl Into<String>, timestamp: i64) -> Self {
        Self {
            success: false,
            source: source.into(),
            result: None,
            error: Some(message.into()),
            code: Some(code.to_string()),
            timestamp,
        }
    }

    /// A bare `{success:false, code:"TIMEOUT"}` envelope — no source is
    /// known once a call has timed out, so only `code` is populated.
    pub fn timeout() -> Self {
        Self {
            success: false,
            source: String::new(),
            result: None,
            error: None,
            code: Some(TIMEOUT.to_string()),
            timestamp: 0,
        }
    }
}
