use std::time::Duration;

use shared::domain::TxHash;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AgentError {
    #[error("no signing agent available; install a wallet or configure the agent bridge")]
    Unavailable,
    #[error("request rejected in the wallet")]
    Rejected,
    #[error("{0}")]
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("resource not found")]
    NotFound,
    #[error("transaction {hash} not finalized after {waited:?}")]
    FinalityTimeout { hash: TxHash, waited: Duration },
    #[error("transaction {hash} aborted: {vm_status}")]
    ExecutionAborted { hash: TxHash, vm_status: String },
    #[error("ledger request failed: {0}")]
    Transport(String),
}

/// Every failure an orchestrator entry point can report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LendingError {
    #[error("Invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
    #[error("no signing agent available; install a wallet or configure the agent bridge")]
    AgentUnavailable,
    #[error("request rejected in the wallet")]
    UserRejected,
    #[error("signing agent error: {0}")]
    AgentError(String),
    #[error("transaction {hash} not confirmed: {detail}")]
    FinalityTimeout { hash: TxHash, detail: String },
    #[error("{detail}")]
    ExecutionAborted { hash: TxHash, detail: String },
    #[error("no vehicles found at this address")]
    NotFound,
    #[error("Another operation is still in progress; wait for it to finish")]
    Busy,
    #[error("Connect wallet first!")]
    NotConnected,
    #[error("ledger request failed: {0}")]
    Ledger(String),
}

impl LendingError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }

    /// Hash of the submitted transaction, when the failure happened after submission.
    pub fn transaction_hash(&self) -> Option<&TxHash> {
        match self {
            Self::FinalityTimeout { hash, .. } | Self::ExecutionAborted { hash, .. } => Some(hash),
            _ => None,
        }
    }
}

impl From<AgentError> for LendingError {
    fn from(value: AgentError) -> Self {
        match value {
            AgentError::Unavailable => Self::AgentUnavailable,
            AgentError::Rejected => Self::UserRejected,
            AgentError::Failed(detail) => Self::AgentError(detail),
        }
    }
}

impl From<LedgerError> for LendingError {
    fn from(value: LedgerError) -> Self {
        match value {
            LedgerError::NotFound => Self::NotFound,
            LedgerError::FinalityTimeout { hash, waited } => Self::FinalityTimeout {
                hash,
                detail: format!("no commit observed after {waited:?}"),
            },
            LedgerError::ExecutionAborted { hash, vm_status } => Self::ExecutionAborted {
                hash,
                detail: vm_status,
            },
            LedgerError::Transport(detail) => Self::Ledger(detail),
        }
    }
}
