use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use shared::{
    domain::{AccountAddress, TxHash},
    error::{AgentApiError, AgentErrorCode},
    protocol::{AgentAccountResponse, EntryFunctionPayload, PendingTransactionResponse},
};
use tracing::debug;

use crate::error::AgentError;

/// The user-held wallet that owns the keys and prompts for every signature.
#[async_trait]
pub trait SigningAgent: Send + Sync {
    async fn connect(&self) -> Result<AccountAddress, AgentError>;
    /// The account of an already-approved session, if any.
    async fn account(&self) -> Result<Option<AccountAddress>, AgentError>;
    async fn sign_and_submit_transaction(
        &self,
        payload: &EntryFunctionPayload,
    ) -> Result<TxHash, AgentError>;
}

pub struct MissingSigningAgent;

#[async_trait]
impl SigningAgent for MissingSigningAgent {
    async fn connect(&self) -> Result<AccountAddress, AgentError> {
        Err(AgentError::Unavailable)
    }

    async fn account(&self) -> Result<Option<AccountAddress>, AgentError> {
        Err(AgentError::Unavailable)
    }

    async fn sign_and_submit_transaction(
        &self,
        _payload: &EntryFunctionPayload,
    ) -> Result<TxHash, AgentError> {
        Err(AgentError::Unavailable)
    }
}

/// Talks to a local wallet bridge over HTTP.
pub struct HttpSigningAgent {
    http: Client,
    base_url: String,
}

impl HttpSigningAgent {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl SigningAgent for HttpSigningAgent {
    async fn connect(&self) -> Result<AccountAddress, AgentError> {
        let response = self
            .http
            .post(format!("{}/connect", self.base_url))
            .send()
            .await
            .map_err(map_send_error)?;
        let account: AgentAccountResponse = decode(response).await?;
        Ok(account.address)
    }

    async fn account(&self) -> Result<Option<AccountAddress>, AgentError> {
        let response = self
            .http
            .get(format!("{}/account", self.base_url))
            .send()
            .await
            .map_err(map_send_error)?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!("agent: no active account");
            return Ok(None);
        }
        let account: AgentAccountResponse = decode(response).await?;
        Ok(Some(account.address))
    }

    async fn sign_and_submit_transaction(
        &self,
        payload: &EntryFunctionPayload,
    ) -> Result<TxHash, AgentError> {
        let response = self
            .http
            .post(format!("{}/sign_and_submit", self.base_url))
            .json(payload)
            .send()
            .await
            .map_err(map_send_error)?;
        let pending: PendingTransactionResponse = decode(response).await?;
        Ok(pending.hash)
    }
}

fn map_send_error(err: reqwest::Error) -> AgentError {
    if err.is_connect() {
        AgentError::Unavailable
    } else {
        AgentError::Failed(format!("agent request failed: {err}"))
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, AgentError> {
    let status = response.status();
    if status.is_success() {
        return response
            .json()
            .await
            .map_err(|err| AgentError::Failed(format!("invalid agent response: {err}")));
    }

    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<AgentApiError>(&body) {
        Ok(api_error) => Err(match api_error.code {
            AgentErrorCode::UserRejected => AgentError::Rejected,
            AgentErrorCode::Unavailable => AgentError::Unavailable,
            AgentErrorCode::Unauthorized | AgentErrorCode::Internal => {
                AgentError::Failed(api_error.message)
            }
        }),
        Err(_) if body.trim().is_empty() => {
            Err(AgentError::Failed(format!("agent returned {status}")))
        }
        Err(_) => Err(AgentError::Failed(format!(
            "agent returned {status}: {}",
            body.trim()
        ))),
    }
}

#[cfg(test)]
#[path = "tests/agent_tests.rs"]
mod tests;
