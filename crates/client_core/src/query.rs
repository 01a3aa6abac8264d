use std::sync::Arc;

use shared::{
    domain::{AccountAddress, Vehicle},
    protocol::VehicleResourceData,
};
use tracing::{debug, warn};

use crate::{
    error::{LedgerError, LendingError},
    ledger::LedgerClient,
};

/// Read-only vehicle lookups; independent of the transaction pipeline.
pub struct ResourceQueryService {
    ledger: Arc<dyn LedgerClient>,
    vehicle_resource_type: String,
}

impl ResourceQueryService {
    pub fn new(ledger: Arc<dyn LedgerClient>, vehicle_resource_type: impl Into<String>) -> Self {
        Self {
            ledger,
            vehicle_resource_type: vehicle_resource_type.into(),
        }
    }

    /// Every miss or read failure folds into `NotFound`.
    pub async fn fetch_vehicle(&self, dealer: &AccountAddress) -> Result<Vehicle, LendingError> {
        let resource = match self
            .ledger
            .get_account_resource(dealer, &self.vehicle_resource_type)
            .await
        {
            Ok(resource) => resource,
            Err(LedgerError::NotFound) => {
                debug!(dealer = %dealer, "query: no vehicle resource");
                return Err(LendingError::NotFound);
            }
            Err(err) => {
                warn!(dealer = %dealer, "query: vehicle read failed: {err}");
                return Err(LendingError::NotFound);
            }
        };

        let data: VehicleResourceData = serde_json::from_value(resource.data).map_err(|err| {
            warn!(dealer = %dealer, "query: malformed vehicle resource: {err}");
            LendingError::NotFound
        })?;
        Ok(data.into())
    }
}
