use std::sync::Arc;

use chrono::{DateTime, Utc};
use shared::domain::TxHash;
use tracing::{info, warn};

use crate::{
    agent::SigningAgent,
    catalog::Command,
    error::{LedgerError, LendingError},
    ledger::LedgerClient,
};

/// A committed transaction. Only finalized commits are returned; every failure,
/// including those after submission, is the `Err` side of `submit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionOutcome {
    pub hash: TxHash,
    pub version: Option<u64>,
    pub committed_at: Option<DateTime<Utc>>,
}

/// Sign, submit, and wait for finality. One remote mutation attempt per call, never retried.
pub struct TransactionPipeline {
    agent: Arc<dyn SigningAgent>,
    ledger: Arc<dyn LedgerClient>,
}

impl TransactionPipeline {
    pub fn new(agent: Arc<dyn SigningAgent>, ledger: Arc<dyn LedgerClient>) -> Self {
        Self { agent, ledger }
    }

    pub async fn submit(&self, command: Command) -> Result<TransactionOutcome, LendingError> {
        let payload = command.to_payload();
        info!(
            command = command.name(),
            function = %payload.function,
            "pipeline: requesting signature"
        );

        let hash = self
            .agent
            .sign_and_submit_transaction(&payload)
            .await
            .map_err(|err| {
                warn!(command = command.name(), "pipeline: signing agent failed: {err}");
                LendingError::from(err)
            })?;
        info!(command = command.name(), hash = %hash, "pipeline: submitted, awaiting finality");

        let committed = self
            .ledger
            .wait_for_transaction(&hash)
            .await
            .map_err(|err| {
                warn!(command = command.name(), hash = %hash, "pipeline: not finalized: {err}");
                finality_error(&hash, err)
            })?;
        info!(
            command = command.name(),
            hash = %hash,
            version = committed.version,
            "pipeline: transaction finalized"
        );

        Ok(TransactionOutcome {
            committed_at: committed.committed_at(),
            version: Some(committed.version),
            hash,
        })
    }
}

// Any failure after submission leaves the commit unconfirmed for this call.
fn finality_error(hash: &TxHash, err: LedgerError) -> LendingError {
    match err {
        LedgerError::ExecutionAborted { .. } | LedgerError::FinalityTimeout { .. } => err.into(),
        LedgerError::NotFound => LendingError::FinalityTimeout {
            hash: hash.clone(),
            detail: "transaction unknown to the ledger".into(),
        },
        LedgerError::Transport(detail) => LendingError::FinalityTimeout {
            hash: hash.clone(),
            detail,
        },
    }
}
