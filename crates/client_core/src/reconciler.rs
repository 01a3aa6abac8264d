use shared::domain::{AccountAddress, Vehicle};

use crate::{catalog::CommandKind, error::LendingError};

/// Cached vehicle view for the dealer address currently on display.
///
/// The ledger holds at most one vehicle per dealer account, so the cache is a single slot.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ViewState {
    displayed_dealer: Option<AccountAddress>,
    vehicle: Option<Vehicle>,
}

impl ViewState {
    pub fn displayed_dealer(&self) -> Option<&AccountAddress> {
        self.displayed_dealer.as_ref()
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        self.vehicle.as_slice()
    }

    pub fn show(&mut self, dealer: AccountAddress) {
        if self.displayed_dealer.as_ref() != Some(&dealer) {
            self.vehicle = None;
        }
        self.displayed_dealer = Some(dealer);
    }

    /// Replaces the cached slot with a fresh read; reads for another address are dropped.
    pub fn apply_fetch(
        &mut self,
        dealer: &AccountAddress,
        result: &Result<Vehicle, LendingError>,
    ) -> bool {
        if self.displayed_dealer.as_ref() != Some(dealer) {
            return false;
        }
        self.vehicle = result.as_ref().ok().cloned();
        true
    }

    /// Address to re-read after a committed command, if the command can change the view.
    pub fn refresh_target(
        &self,
        kind: CommandKind,
        acting: &AccountAddress,
    ) -> Option<AccountAddress> {
        let displayed = self.displayed_dealer.as_ref()?;
        match kind {
            CommandKind::ListVehicle => (displayed == acting).then(|| displayed.clone()),
            // The selling dealer is not known locally.
            CommandKind::ApplyForLoan => Some(displayed.clone()),
            CommandKind::Initialize
            | CommandKind::CreateLoanOffer
            | CommandKind::RepayLoan
            | CommandKind::CheckDefault
            | CommandKind::RegisterFundingCapability => None,
        }
    }
}
