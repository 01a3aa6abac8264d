use std::sync::Arc;

use shared::domain::AccountAddress;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::{
    agent::SigningAgent,
    catalog::{CommandCatalog, RegisterFundingCapability, FUNDING_CAPABILITY_RESOURCE},
    error::{AgentError, LedgerError, LendingError},
    ledger::LedgerClient,
    pipeline::{TransactionOutcome, TransactionPipeline},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FundingCheck {
    AlreadyRegistered,
    Registered(TransactionOutcome),
}

/// Owns the connected identity and the coin-store precondition.
pub struct SessionManager {
    agent: Arc<dyn SigningAgent>,
    ledger: Arc<dyn LedgerClient>,
    pipeline: Arc<TransactionPipeline>,
    catalog: CommandCatalog,
    identity: RwLock<Option<AccountAddress>>,
}

impl SessionManager {
    pub fn new(
        agent: Arc<dyn SigningAgent>,
        ledger: Arc<dyn LedgerClient>,
        pipeline: Arc<TransactionPipeline>,
        catalog: CommandCatalog,
    ) -> Self {
        Self {
            agent,
            ledger,
            pipeline,
            catalog,
            identity: RwLock::new(None),
        }
    }

    pub async fn identity(&self) -> Option<AccountAddress> {
        self.identity.read().await.clone()
    }

    pub async fn require_identity(&self) -> Result<AccountAddress, LendingError> {
        self.identity().await.ok_or(LendingError::NotConnected)
    }

    pub async fn connect(&self) -> Result<AccountAddress, LendingError> {
        let address = self.agent.connect().await?;
        info!(address = %address, "session: connected");
        *self.identity.write().await = Some(address.clone());
        Ok(address)
    }

    /// Picks up a session the agent already approved; absence is not an error.
    pub async fn restore(&self) -> Option<AccountAddress> {
        let address = match self.agent.account().await {
            Ok(Some(address)) => address,
            Ok(None) => {
                debug!("session: no active agent session");
                return None;
            }
            Err(AgentError::Unavailable) => {
                debug!("session: no signing agent available at startup");
                return None;
            }
            Err(err) => {
                debug!("session: not connected yet: {err}");
                return None;
            }
        };
        info!(address = %address, "session: restored existing agent session");
        *self.identity.write().await = Some(address.clone());
        Some(address)
    }

    pub async fn disconnect(&self) -> Option<AccountAddress> {
        let previous = self.identity.write().await.take();
        if let Some(address) = &previous {
            info!(address = %address, "session: disconnected");
        }
        previous
    }

    /// Registers the native coin store when the account lacks one.
    ///
    /// Two overlapping calls may both register; the ledger rejects the second.
    pub async fn ensure_funding_capability(
        &self,
        address: &AccountAddress,
    ) -> Result<FundingCheck, LendingError> {
        let resources = match self.ledger.get_account_resources(address).await {
            Ok(resources) => resources,
            // The account has no on-ledger state yet.
            Err(LedgerError::NotFound) => Vec::new(),
            Err(err) => return Err(err.into()),
        };
        if resources
            .iter()
            .any(|resource| resource.resource_type == FUNDING_CAPABILITY_RESOURCE)
        {
            debug!(address = %address, "session: funding capability present");
            return Ok(FundingCheck::AlreadyRegistered);
        }

        info!(address = %address, "session: registering funding capability");
        let outcome = self
            .pipeline
            .submit(self.catalog.command(&RegisterFundingCapability))
            .await?;
        Ok(FundingCheck::Registered(outcome))
    }
}
