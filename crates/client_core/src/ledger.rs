use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use shared::{
    domain::{AccountAddress, TxHash},
    error::LedgerApiError,
    protocol::{AccountResource, CommittedTransaction, TransactionResponse},
};
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};
use url::Url;

use crate::{config::Settings, error::LedgerError};

#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Resolves once the transaction is committed; aborted transactions are errors.
    async fn wait_for_transaction(&self, hash: &TxHash)
        -> Result<CommittedTransaction, LedgerError>;
    async fn get_account_resource(
        &self,
        address: &AccountAddress,
        resource_type: &str,
    ) -> Result<AccountResource, LedgerError>;
    async fn get_account_resources(
        &self,
        address: &AccountAddress,
    ) -> Result<Vec<AccountResource>, LedgerError>;
}

pub struct RestLedgerClient {
    http: Client,
    base_url: Url,
    finality_timeout: Duration,
    poll_interval: Duration,
}

impl RestLedgerClient {
    pub fn new(
        base_url: &str,
        finality_timeout: Duration,
        poll_interval: Duration,
    ) -> anyhow::Result<Self> {
        let base_url =
            Url::parse(base_url).with_context(|| format!("invalid ledger url '{base_url}'"))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("ledger url '{base_url}' cannot carry a path");
        }
        Ok(Self {
            http: Client::new(),
            base_url,
            finality_timeout,
            poll_interval,
        })
    }

    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        Self::new(
            &settings.ledger_url,
            settings.finality_timeout(),
            settings.finality_poll_interval(),
        )
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("v1").extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, LedgerError> {
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|err| LedgerError::Transport(format!("GET {url}: {err}")))?;
        decode(response).await
    }

    async fn fetch_transaction(&self, hash: &TxHash) -> Result<TransactionResponse, LedgerError> {
        self.get_json(self.endpoint(&["transactions", "by_hash", hash.as_str()]))
            .await
    }
}

#[async_trait]
impl LedgerClient for RestLedgerClient {
    async fn wait_for_transaction(
        &self,
        hash: &TxHash,
    ) -> Result<CommittedTransaction, LedgerError> {
        let started = Instant::now();
        // A timeout too large to represent means no deadline.
        let deadline = started.checked_add(self.finality_timeout);

        loop {
            match self.fetch_transaction(hash).await {
                Ok(TransactionResponse::UserTransaction(txn)) if txn.success => return Ok(txn),
                Ok(TransactionResponse::UserTransaction(txn)) => {
                    return Err(LedgerError::ExecutionAborted {
                        hash: hash.clone(),
                        vm_status: txn.vm_status,
                    })
                }
                Ok(TransactionResponse::PendingTransaction { .. }) => {
                    debug!(hash = %hash, "ledger: transaction pending");
                }
                Ok(TransactionResponse::Other) => {
                    return Err(LedgerError::Transport(format!(
                        "transaction {hash} is not a user transaction"
                    )))
                }
                // Not yet indexed by the node.
                Err(LedgerError::NotFound) => {
                    debug!(hash = %hash, "ledger: transaction not visible yet");
                }
                Err(err) => {
                    warn!(hash = %hash, "ledger: finality poll failed: {err}");
                }
            }

            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                return Err(LedgerError::FinalityTimeout {
                    hash: hash.clone(),
                    waited: started.elapsed(),
                });
            }
            sleep(self.poll_interval).await;
        }
    }

    async fn get_account_resource(
        &self,
        address: &AccountAddress,
        resource_type: &str,
    ) -> Result<AccountResource, LedgerError> {
        self.get_json(self.endpoint(&["accounts", address.as_str(), "resource", resource_type]))
            .await
    }

    async fn get_account_resources(
        &self,
        address: &AccountAddress,
    ) -> Result<Vec<AccountResource>, LedgerError> {
        self.get_json(self.endpoint(&["accounts", address.as_str(), "resources"]))
            .await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, LedgerError> {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(LedgerError::NotFound);
    }
    if status.is_success() {
        return response
            .json()
            .await
            .map_err(|err| LedgerError::Transport(format!("invalid ledger response: {err}")));
    }

    let body = response.text().await.unwrap_or_default();
    let detail = match serde_json::from_str::<LedgerApiError>(&body) {
        Ok(api_error) => api_error.to_string(),
        Err(_) => body.trim().to_string(),
    };
    Err(LedgerError::Transport(format!("ledger returned {status}: {detail}")))
}

#[cfg(test)]
#[path = "tests/ledger_tests.rs"]
mod tests;
