use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Result;
use shared::domain::{AccountAddress, TxHash, Vehicle};
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

pub mod agent;
pub mod catalog;
pub mod config;
pub mod error;
pub mod ledger;
pub mod pipeline;
pub mod query;
pub mod reconciler;
pub mod session;
pub mod validation;

use agent::{HttpSigningAgent, MissingSigningAgent, SigningAgent};
use catalog::{CommandArgs, CommandCatalog, CommandKind, Initialize};
use config::Settings;
use error::LendingError;
use ledger::{LedgerClient, RestLedgerClient};
use pipeline::{TransactionOutcome, TransactionPipeline};
use query::ResourceQueryService;
use reconciler::ViewState;
use session::{FundingCheck, SessionManager};
use validation::{ListVehicleForm, LoanApplicationForm, LoanOfferForm, RepaymentForm};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Success,
    /// The action went through but a follow-up step failed.
    Warning,
    Failure,
}

/// One entry on the user-facing status channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub level: StatusLevel,
    pub message: String,
    pub hash: Option<TxHash>,
    pub error: Option<LendingError>,
}

impl StatusReport {
    fn info(message: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Info,
            message: message.into(),
            hash: None,
            error: None,
        }
    }

    fn success(message: impl Into<String>, hash: Option<TxHash>) -> Self {
        Self {
            level: StatusLevel::Success,
            message: message.into(),
            hash,
            error: None,
        }
    }

    fn failure(context: &str, error: LendingError) -> Self {
        let message = match &error {
            LendingError::InvalidField { .. } | LendingError::Busy | LendingError::NotConnected => {
                error.to_string()
            }
            _ => format!("{context}: {error}"),
        };
        Self {
            level: StatusLevel::Failure,
            message,
            hash: error.transaction_hash().cloned(),
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.level, StatusLevel::Info | StatusLevel::Success)
    }

    pub fn is_failure(&self) -> bool {
        self.level == StatusLevel::Failure
    }
}

#[derive(Debug, Clone)]
pub enum ClientEvent {
    Status(StatusReport),
    SessionChanged(Option<AccountAddress>),
    VehiclesUpdated {
        dealer: AccountAddress,
        vehicles: Vec<Vehicle>,
    },
}

/// Held for the whole of one operation; at most one exists at a time.
struct BusyGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, LendingError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| Self { flag })
            .map_err(|_| LendingError::Busy)
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Turns user intent into signed ledger commands and keeps the vehicle view in step.
pub struct LendingClient {
    catalog: CommandCatalog,
    session: SessionManager,
    pipeline: Arc<TransactionPipeline>,
    queries: ResourceQueryService,
    view: Mutex<ViewState>,
    busy: AtomicBool,
    events: broadcast::Sender<ClientEvent>,
}

impl LendingClient {
    pub fn new(settings: &Settings) -> Result<Arc<Self>> {
        let agent: Arc<dyn SigningAgent> = match &settings.agent_url {
            Some(url) => Arc::new(HttpSigningAgent::new(url.clone())),
            None => {
                warn!("no signing agent configured; signed commands will be unavailable");
                Arc::new(MissingSigningAgent)
            }
        };
        let ledger = Arc::new(RestLedgerClient::from_settings(settings)?);
        Ok(Self::new_with_dependencies(
            CommandCatalog::from_settings(settings),
            agent,
            ledger,
        ))
    }

    pub fn new_with_dependencies(
        catalog: CommandCatalog,
        agent: Arc<dyn SigningAgent>,
        ledger: Arc<dyn LedgerClient>,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        let pipeline = Arc::new(TransactionPipeline::new(
            Arc::clone(&agent),
            Arc::clone(&ledger),
        ));
        Arc::new(Self {
            session: SessionManager::new(
                agent,
                Arc::clone(&ledger),
                Arc::clone(&pipeline),
                catalog.clone(),
            ),
            queries: ResourceQueryService::new(ledger, catalog.vehicle_resource_type()),
            catalog,
            pipeline,
            view: Mutex::new(ViewState::default()),
            busy: AtomicBool::new(false),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub async fn account(&self) -> Option<AccountAddress> {
        self.session.identity().await
    }

    pub async fn vehicles(&self) -> Vec<Vehicle> {
        self.view.lock().await.vehicles().to_vec()
    }

    pub async fn displayed_dealer(&self) -> Option<AccountAddress> {
        self.view.lock().await.displayed_dealer().cloned()
    }

    pub async fn connect(&self) -> StatusReport {
        let result = async {
            let _busy = BusyGuard::acquire(&self.busy)?;
            let address = self.session.connect().await?;
            let _ = self
                .events
                .send(ClientEvent::SessionChanged(Some(address.clone())));
            let funding = self.session.ensure_funding_capability(&address).await;
            Ok::<_, LendingError>(funding)
        }
        .await;

        let report = match result {
            Ok(funding) => funding_report("Wallet connected successfully!", funding),
            Err(err) => StatusReport::failure("Failed to connect", err),
        };
        self.publish(report)
    }

    /// Startup detection of a session the signing agent already approved.
    pub async fn restore_session(&self) -> StatusReport {
        let result = async {
            let _busy = BusyGuard::acquire(&self.busy)?;
            let Some(address) = self.session.restore().await else {
                return Ok(None);
            };
            let _ = self
                .events
                .send(ClientEvent::SessionChanged(Some(address.clone())));
            let funding = self.session.ensure_funding_capability(&address).await;
            Ok::<_, LendingError>(Some(funding))
        }
        .await;

        let report = match result {
            Ok(Some(funding)) => funding_report("Wallet connected.", funding),
            Ok(None) => StatusReport::info("Not connected yet"),
            Err(err) => StatusReport::failure("Failed to restore session", err),
        };
        self.publish(report)
    }

    pub async fn disconnect(&self) -> StatusReport {
        let result = async {
            let _busy = BusyGuard::acquire(&self.busy)?;
            Ok::<_, LendingError>(self.session.disconnect().await)
        }
        .await;

        let report = match result {
            Ok(Some(_)) => {
                let _ = self.events.send(ClientEvent::SessionChanged(None));
                StatusReport::info("Wallet disconnected")
            }
            Ok(None) => StatusReport::info("Not connected"),
            Err(err) => StatusReport::failure("Failed to disconnect", err),
        };
        self.publish(report)
    }

    /// Re-runs the coin-store check for the connected account.
    pub async fn ensure_funding_capability(&self) -> StatusReport {
        let result = async {
            let _busy = BusyGuard::acquire(&self.busy)?;
            let address = self.session.require_identity().await?;
            self.session.ensure_funding_capability(&address).await
        }
        .await;

        let report = match result {
            Ok(FundingCheck::AlreadyRegistered) => {
                StatusReport::info("AptosCoin already registered")
            }
            Ok(FundingCheck::Registered(outcome)) => StatusReport::success(
                format!("AptosCoin registered successfully! Tx: {}", outcome.hash.short()),
                Some(outcome.hash),
            ),
            Err(err) => StatusReport::failure("Failed to register AptosCoin", err),
        };
        self.publish(report)
    }

    pub async fn initialize_module(&self) -> StatusReport {
        self.submit_command(
            "Initialization failed",
            || Ok(Initialize),
            |_, hash| format!("Module initialized successfully! Tx: {}", hash.short()),
        )
        .await
    }

    pub async fn list_vehicle(&self, form: &ListVehicleForm) -> StatusReport {
        self.submit_command(
            "Listing failed",
            || validation::validate_list_vehicle(form),
            |args, hash| {
                format!(
                    "Vehicle ID {} listed successfully! Tx: {}",
                    args.vehicle_id,
                    hash.short()
                )
            },
        )
        .await
    }

    pub async fn create_loan_offer(&self, form: &LoanOfferForm) -> StatusReport {
        self.submit_command(
            "Creating offer failed",
            || validation::validate_loan_offer(form),
            |args, hash| format!("Loan offer ID {} created! Tx: {}", args.loan_id, hash.short()),
        )
        .await
    }

    pub async fn apply_for_loan(&self, form: &LoanApplicationForm) -> StatusReport {
        self.submit_command(
            "Loan application failed",
            || validation::validate_loan_application(form),
            |_, hash| format!("Loan application successful! Tx: {}", hash.short()),
        )
        .await
    }

    pub async fn repay_loan(&self, form: &RepaymentForm) -> StatusReport {
        self.submit_command(
            "Loan repayment failed",
            || validation::validate_repayment(form),
            |args, hash| {
                format!(
                    "Loan repayment of {} APT successful! Tx: {}",
                    args.amount,
                    hash.short()
                )
            },
        )
        .await
    }

    pub async fn check_default(&self, customer: &str) -> StatusReport {
        self.submit_command(
            "Checking default failed",
            || validation::validate_default_check(customer),
            |args, hash| {
                format!(
                    "Checked default for customer {}. Tx: {}",
                    args.customer.short(),
                    hash.short()
                )
            },
        )
        .await
    }

    pub async fn fetch_vehicles(&self, dealer: &str) -> StatusReport {
        let result = async {
            let _busy = BusyGuard::acquire(&self.busy)?;
            let dealer = validation::validate_dealer_address(dealer)?;
            self.view.lock().await.show(dealer.clone());
            self.refresh_vehicles(&dealer).await
        }
        .await;

        let report = match result {
            Ok(_) => StatusReport::success("Vehicles fetched successfully!", None),
            Err(err) => StatusReport::failure("Failed to fetch vehicles", err),
        };
        self.publish(report)
    }

    async fn submit_command<A: CommandArgs>(
        &self,
        failure_context: &'static str,
        validate: impl FnOnce() -> Result<A, LendingError>,
        success_message: impl FnOnce(&A, &TxHash) -> String,
    ) -> StatusReport {
        let result = async {
            let _busy = BusyGuard::acquire(&self.busy)?;
            let args = validate()?;
            let acting = self.session.require_identity().await?;
            let command = self.catalog.command(&args);
            let kind = command.kind();
            let outcome = self.pipeline.submit(command).await?;
            self.reconcile_after(kind, &acting).await;
            Ok::<_, LendingError>((args, outcome))
        }
        .await;

        let report = match result {
            Ok((args, outcome)) => {
                let TransactionOutcome { hash, .. } = outcome;
                StatusReport::success(success_message(&args, &hash), Some(hash))
            }
            Err(err) => StatusReport::failure(failure_context, err),
        };
        self.publish(report)
    }

    async fn reconcile_after(&self, kind: CommandKind, acting: &AccountAddress) {
        let target = self.view.lock().await.refresh_target(kind, acting);
        if let Some(dealer) = target {
            info!(dealer = %dealer, command = ?kind, "reconciler: refreshing vehicle view");
            let _ = self.refresh_vehicles(&dealer).await;
        }
    }

    async fn refresh_vehicles(&self, dealer: &AccountAddress) -> Result<Vehicle, LendingError> {
        let result = self.queries.fetch_vehicle(dealer).await;
        let vehicles = {
            let mut view = self.view.lock().await;
            if !view.apply_fetch(dealer, &result) {
                return result;
            }
            view.vehicles().to_vec()
        };
        let _ = self.events.send(ClientEvent::VehiclesUpdated {
            dealer: dealer.clone(),
            vehicles,
        });
        result
    }

    fn publish(&self, report: StatusReport) -> StatusReport {
        if report.is_failure() {
            warn!(status = %report.message, "lending: operation failed");
        } else {
            info!(status = %report.message, "lending: status");
        }
        let _ = self.events.send(ClientEvent::Status(report.clone()));
        report
    }
}

fn funding_report(connected: &str, funding: Result<FundingCheck, LendingError>) -> StatusReport {
    match funding {
        Ok(FundingCheck::AlreadyRegistered) => StatusReport::success(connected, None),
        Ok(FundingCheck::Registered(outcome)) => StatusReport::success(
            format!(
                "{connected} AptosCoin registered successfully! Tx: {}",
                outcome.hash.short()
            ),
            Some(outcome.hash),
        ),
        Err(err) => StatusReport {
            level: StatusLevel::Warning,
            message: format!("{connected} Failed to register AptosCoin: {err}"),
            hash: err.transaction_hash().cloned(),
            error: Some(err),
        },
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
