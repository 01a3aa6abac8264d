use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error body returned by the ledger's REST API.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct LedgerApiError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vm_error_code: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentErrorCode {
    UserRejected,
    Unauthorized,
    Unavailable,
    Internal,
}

/// Error body returned by the signing agent bridge.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{code:?}: {message}")]
pub struct AgentApiError {
    pub code: AgentErrorCode,
    pub message: String,
}

impl AgentApiError {
    pub fn new(code: AgentErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}
