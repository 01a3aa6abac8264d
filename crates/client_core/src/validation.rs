//! Field checks run before any command is built. Nothing here touches the network.

use shared::{
    domain::{AccountAddress, LoanOfferId, VehicleId},
    protocol::MoveArg,
};

use crate::{
    catalog::{CommandArgs, CommandKind},
    error::LendingError,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListVehicleForm {
    pub vehicle_id: String,
    pub price: String,
}

impl Default for ListVehicleForm {
    fn default() -> Self {
        Self {
            vehicle_id: "1".into(),
            price: "100".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoanOfferForm {
    pub loan_id: String,
    pub amount: String,
    /// 500 is 5%.
    pub rate_basis_points: String,
    pub duration_seconds: String,
}

impl Default for LoanOfferForm {
    fn default() -> Self {
        Self {
            loan_id: "1".into(),
            amount: "50".into(),
            rate_basis_points: "500".into(),
            duration_seconds: "3600".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoanApplicationForm {
    pub lender: String,
    pub offer_id: String,
    pub vehicle_id: String,
}

impl Default for LoanApplicationForm {
    fn default() -> Self {
        Self {
            lender: String::new(),
            offer_id: "1".into(),
            vehicle_id: "1".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepaymentForm {
    pub lender: String,
    pub amount: String,
}

impl Default for RepaymentForm {
    fn default() -> Self {
        Self {
            lender: String::new(),
            amount: "10".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListVehicleArgs {
    pub vehicle_id: VehicleId,
    pub price: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoanOfferArgs {
    pub loan_id: LoanOfferId,
    pub amount: u64,
    pub rate_basis_points: u64,
    pub duration_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoanApplicationArgs {
    pub lender: AccountAddress,
    pub offer_id: LoanOfferId,
    pub vehicle_id: VehicleId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepaymentArgs {
    pub lender: AccountAddress,
    pub amount: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultCheckArgs {
    pub customer: AccountAddress,
}

impl CommandArgs for ListVehicleArgs {
    const KIND: CommandKind = CommandKind::ListVehicle;

    fn move_args(&self) -> Vec<MoveArg> {
        vec![MoveArg::U64(self.vehicle_id.0), MoveArg::U64(self.price)]
    }
}

impl CommandArgs for LoanOfferArgs {
    const KIND: CommandKind = CommandKind::CreateLoanOffer;

    fn move_args(&self) -> Vec<MoveArg> {
        vec![
            MoveArg::U64(self.loan_id.0),
            MoveArg::U64(self.amount),
            MoveArg::U64(self.rate_basis_points),
            MoveArg::U64(self.duration_seconds),
        ]
    }
}

impl CommandArgs for LoanApplicationArgs {
    const KIND: CommandKind = CommandKind::ApplyForLoan;

    fn move_args(&self) -> Vec<MoveArg> {
        vec![
            MoveArg::Address(self.lender.clone()),
            MoveArg::U64(self.offer_id.0),
            MoveArg::U64(self.vehicle_id.0),
        ]
    }
}

impl CommandArgs for RepaymentArgs {
    const KIND: CommandKind = CommandKind::RepayLoan;

    fn move_args(&self) -> Vec<MoveArg> {
        vec![MoveArg::Address(self.lender.clone()), MoveArg::U64(self.amount)]
    }
}

impl CommandArgs for DefaultCheckArgs {
    const KIND: CommandKind = CommandKind::CheckDefault;

    fn move_args(&self) -> Vec<MoveArg> {
        vec![MoveArg::Address(self.customer.clone())]
    }
}

pub fn validate_list_vehicle(form: &ListVehicleForm) -> Result<ListVehicleArgs, LendingError> {
    Ok(ListVehicleArgs {
        vehicle_id: VehicleId(positive_u64("vehicle_id", &form.vehicle_id)?),
        price: positive_u64("price", &form.price)?,
    })
}

pub fn validate_loan_offer(form: &LoanOfferForm) -> Result<LoanOfferArgs, LendingError> {
    Ok(LoanOfferArgs {
        loan_id: LoanOfferId(positive_u64("loan_id", &form.loan_id)?),
        amount: positive_u64("amount", &form.amount)?,
        rate_basis_points: positive_u64("rate_basis_points", &form.rate_basis_points)?,
        duration_seconds: positive_u64("duration_seconds", &form.duration_seconds)?,
    })
}

pub fn validate_loan_application(
    form: &LoanApplicationForm,
) -> Result<LoanApplicationArgs, LendingError> {
    Ok(LoanApplicationArgs {
        lender: non_empty_address("lender_address", &form.lender)?,
        offer_id: LoanOfferId(positive_u64("offer_id", &form.offer_id)?),
        vehicle_id: VehicleId(positive_u64("vehicle_id", &form.vehicle_id)?),
    })
}

pub fn validate_repayment(form: &RepaymentForm) -> Result<RepaymentArgs, LendingError> {
    Ok(RepaymentArgs {
        lender: non_empty_address("lender_address", &form.lender)?,
        amount: positive_u64("amount", &form.amount)?,
    })
}

pub fn validate_default_check(customer: &str) -> Result<DefaultCheckArgs, LendingError> {
    Ok(DefaultCheckArgs {
        customer: non_empty_address("customer_address", customer)?,
    })
}

pub fn validate_dealer_address(dealer: &str) -> Result<AccountAddress, LendingError> {
    non_empty_address("dealer_address", dealer)
}

fn positive_u64(field: &'static str, raw: &str) -> Result<u64, LendingError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(LendingError::invalid(field, "a value is required"));
    }

    let value = trimmed.parse::<i128>().map_err(|_| {
        LendingError::invalid(field, format!("'{trimmed}' is not a whole number"))
    })?;
    if value <= 0 {
        return Err(LendingError::invalid(field, "must be a positive number"));
    }

    u64::try_from(value)
        .map_err(|_| LendingError::invalid(field, format!("must not exceed {}", u64::MAX)))
}

// Format is left to the ledger, which rejects malformed addresses at submission.
fn non_empty_address(field: &'static str, raw: &str) -> Result<AccountAddress, LendingError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(LendingError::invalid(field, "an address is required"));
    }
    Ok(AccountAddress::new(trimmed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{entry, ArgRole, CommandCatalog};

    fn invalid_field(result: Result<impl std::fmt::Debug, LendingError>) -> &'static str {
        match result {
            Err(LendingError::InvalidField { field, .. }) => field,
            other => panic!("expected InvalidField, got {other:?}"),
        }
    }

    fn assert_matches_catalog<A: CommandArgs>(args: &A) {
        let roles = entry(A::KIND).arg_roles;
        let values = args.move_args();
        assert_eq!(values.len(), roles.len(), "{:?}", A::KIND);
        for (role, value) in roles.iter().zip(&values) {
            let is_address = matches!(value, MoveArg::Address(_));
            assert_eq!(role.is_address(), is_address, "{:?} {role:?}", A::KIND);
        }
    }

    #[test]
    fn default_forms_validate() {
        assert_eq!(
            validate_list_vehicle(&ListVehicleForm::default()).expect("list"),
            ListVehicleArgs {
                vehicle_id: VehicleId(1),
                price: 100
            }
        );
        let offer = validate_loan_offer(&LoanOfferForm::default()).expect("offer");
        assert_eq!(offer.rate_basis_points, 500);
        assert_eq!(offer.duration_seconds, 3600);
    }

    #[test]
    fn rejects_zero_negative_and_non_numeric_values() {
        for raw in ["0", "-3", "abc", "1.5", "12abc", "", "   "] {
            let form = ListVehicleForm {
                vehicle_id: raw.to_string(),
                price: "100".into(),
            };
            assert_eq!(invalid_field(validate_list_vehicle(&form)), "vehicle_id", "{raw:?}");
        }
    }

    #[test]
    fn rejects_values_beyond_u64() {
        let form = RepaymentForm {
            lender: "0xB2".into(),
            amount: "18446744073709551616".into(),
        };
        assert_eq!(invalid_field(validate_repayment(&form)), "amount");
    }

    #[test]
    fn trims_surrounding_whitespace() {
        let form = ListVehicleForm {
            vehicle_id: " 7 ".into(),
            price: "250\n".into(),
        };
        let args = validate_list_vehicle(&form).expect("valid");
        assert_eq!(args.vehicle_id, VehicleId(7));
        assert_eq!(args.price, 250);
    }

    #[test]
    fn zero_rate_is_rejected() {
        let form = LoanOfferForm {
            rate_basis_points: "0".into(),
            ..LoanOfferForm::default()
        };
        assert_eq!(invalid_field(validate_loan_offer(&form)), "rate_basis_points");
    }

    #[test]
    fn first_offending_field_is_reported() {
        let form = LoanOfferForm {
            loan_id: "x".into(),
            duration_seconds: "0".into(),
            ..LoanOfferForm::default()
        };
        assert_eq!(invalid_field(validate_loan_offer(&form)), "loan_id");
    }

    #[test]
    fn address_fields_must_be_non_empty() {
        assert_eq!(
            invalid_field(validate_loan_application(&LoanApplicationForm::default())),
            "lender_address"
        );
        assert_eq!(
            invalid_field(validate_repayment(&RepaymentForm::default())),
            "lender_address"
        );
        assert_eq!(invalid_field(validate_default_check("  ")), "customer_address");
        assert_eq!(invalid_field(validate_dealer_address("")), "dealer_address");
        assert_eq!(
            validate_default_check(" 0xC3 ").expect("valid").customer,
            AccountAddress::new("0xC3")
        );
    }

    #[test]
    fn validators_stay_in_lockstep_with_catalog() {
        let lender = AccountAddress::new("0xB2");
        assert_matches_catalog(&validate_list_vehicle(&ListVehicleForm::default()).expect("list"));
        assert_matches_catalog(&validate_loan_offer(&LoanOfferForm::default()).expect("offer"));
        assert_matches_catalog(&LoanApplicationArgs {
            lender: lender.clone(),
            offer_id: LoanOfferId(1),
            vehicle_id: VehicleId(1),
        });
        assert_matches_catalog(&RepaymentArgs { lender, amount: 10 });
        assert_matches_catalog(&validate_default_check("0xC3").expect("check"));
    }

    #[test]
    fn application_arguments_keep_wire_order() {
        let catalog = CommandCatalog::new("0xCAFE", "AutoLending");
        let args = validate_loan_application(&LoanApplicationForm {
            lender: "0xB2".into(),
            offer_id: "4".into(),
            vehicle_id: "9".into(),
        })
        .expect("valid");
        let command = catalog.command(&args);
        assert_eq!(command.entry_point(), "0xCAFE::AutoLending::apply_for_loan");
        assert_eq!(
            command.args(),
            [
                MoveArg::Address(AccountAddress::new("0xB2")),
                MoveArg::U64(4),
                MoveArg::U64(9),
            ]
        );
        assert_eq!(entry(CommandKind::ApplyForLoan).arg_roles[0], ArgRole::LenderAddress);
    }
}
