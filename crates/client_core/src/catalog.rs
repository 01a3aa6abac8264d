use shared::{
    domain::Role,
    protocol::{EntryFunctionPayload, MoveArg},
};

use crate::config::Settings;

pub const NATIVE_COIN_TYPE: &str = "0x1::aptos_coin::AptosCoin";
pub const FUNDING_CAPABILITY_RESOURCE: &str = "0x1::coin::CoinStore<0x1::aptos_coin::AptosCoin>";
const FRAMEWORK_COIN_MODULE: &str = "0x1::coin";
const VEHICLE_RESOURCE: &str = "Vehicle";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Initialize,
    ListVehicle,
    CreateLoanOffer,
    ApplyForLoan,
    RepayLoan,
    CheckDefault,
    RegisterFundingCapability,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgRole {
    VehicleId,
    Price,
    LoanId,
    Amount,
    RateBasisPoints,
    DurationSeconds,
    LenderAddress,
    OfferId,
    CustomerAddress,
}

impl ArgRole {
    pub fn is_address(self) -> bool {
        matches!(self, ArgRole::LenderAddress | ArgRole::CustomerAddress)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryModule {
    /// The lending contract at the configured module address.
    Contract,
    /// The ledger framework's coin module.
    FrameworkCoin,
}

#[derive(Debug)]
pub struct CatalogEntry {
    pub kind: CommandKind,
    pub module: EntryModule,
    pub function: &'static str,
    pub signer: Role,
    pub type_arguments: &'static [&'static str],
    pub arg_roles: &'static [ArgRole],
}

pub static CATALOG: [CatalogEntry; 7] = [
    CatalogEntry {
        kind: CommandKind::Initialize,
        module: EntryModule::Contract,
        function: "initialize",
        signer: Role::Any,
        type_arguments: &[],
        arg_roles: &[],
    },
    CatalogEntry {
        kind: CommandKind::ListVehicle,
        module: EntryModule::Contract,
        function: "list_vehicle",
        signer: Role::Dealer,
        type_arguments: &[],
        arg_roles: &[ArgRole::VehicleId, ArgRole::Price],
    },
    CatalogEntry {
        kind: CommandKind::CreateLoanOffer,
        module: EntryModule::Contract,
        function: "create_loan_offer",
        signer: Role::Lender,
        type_arguments: &[],
        arg_roles: &[
            ArgRole::LoanId,
            ArgRole::Amount,
            ArgRole::RateBasisPoints,
            ArgRole::DurationSeconds,
        ],
    },
    CatalogEntry {
        kind: CommandKind::ApplyForLoan,
        module: EntryModule::Contract,
        function: "apply_for_loan",
        signer: Role::Customer,
        type_arguments: &[],
        arg_roles: &[ArgRole::LenderAddress, ArgRole::OfferId, ArgRole::VehicleId],
    },
    CatalogEntry {
        kind: CommandKind::RepayLoan,
        module: EntryModule::Contract,
        function: "repay_loan",
        signer: Role::Customer,
        type_arguments: &[],
        arg_roles: &[ArgRole::LenderAddress, ArgRole::Amount],
    },
    CatalogEntry {
        kind: CommandKind::CheckDefault,
        module: EntryModule::Contract,
        function: "check_default",
        signer: Role::Any,
        type_arguments: &[],
        arg_roles: &[ArgRole::CustomerAddress],
    },
    CatalogEntry {
        kind: CommandKind::RegisterFundingCapability,
        module: EntryModule::FrameworkCoin,
        function: "register",
        signer: Role::Any,
        type_arguments: &[NATIVE_COIN_TYPE],
        arg_roles: &[],
    },
];

pub fn entry(kind: CommandKind) -> &'static CatalogEntry {
    let index = match kind {
        CommandKind::Initialize => 0,
        CommandKind::ListVehicle => 1,
        CommandKind::CreateLoanOffer => 2,
        CommandKind::ApplyForLoan => 3,
        CommandKind::RepayLoan => 4,
        CommandKind::CheckDefault => 5,
        CommandKind::RegisterFundingCapability => 6,
    };
    &CATALOG[index]
}

/// Validated arguments for one catalog command.
pub trait CommandArgs {
    const KIND: CommandKind;

    fn move_args(&self) -> Vec<MoveArg>;
}

/// Zero-argument setup call on the lending contract.
pub struct Initialize;

impl CommandArgs for Initialize {
    const KIND: CommandKind = CommandKind::Initialize;

    fn move_args(&self) -> Vec<MoveArg> {
        Vec::new()
    }
}

/// Coin-store registration for the native coin.
pub struct RegisterFundingCapability;

impl CommandArgs for RegisterFundingCapability {
    const KIND: CommandKind = CommandKind::RegisterFundingCapability;

    fn move_args(&self) -> Vec<MoveArg> {
        Vec::new()
    }
}

/// Immutable, fully resolved command ready for the transaction pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    kind: CommandKind,
    name: &'static str,
    entry_point: String,
    type_arguments: Vec<String>,
    args: Vec<MoveArg>,
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    pub fn type_arguments(&self) -> &[String] {
        &self.type_arguments
    }

    pub fn args(&self) -> &[MoveArg] {
        &self.args
    }

    pub fn to_payload(&self) -> EntryFunctionPayload {
        EntryFunctionPayload::new(
            self.entry_point.clone(),
            self.type_arguments.clone(),
            self.args.clone(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandCatalog {
    module_address: String,
    module_name: String,
}

impl CommandCatalog {
    pub fn new(module_address: impl Into<String>, module_name: impl Into<String>) -> Self {
        Self {
            module_address: module_address.into(),
            module_name: module_name.into(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.module_address.clone(), settings.module_name.clone())
    }

    pub fn qualified_function(&self, entry: &CatalogEntry) -> String {
        match entry.module {
            EntryModule::Contract => format!(
                "{}::{}::{}",
                self.module_address, self.module_name, entry.function
            ),
            EntryModule::FrameworkCoin => format!("{FRAMEWORK_COIN_MODULE}::{}", entry.function),
        }
    }

    /// Resource type of the single vehicle slot held at a dealer account.
    pub fn vehicle_resource_type(&self) -> String {
        format!(
            "{}::{}::{VEHICLE_RESOURCE}",
            self.module_address, self.module_name
        )
    }

    pub fn command<A: CommandArgs>(&self, args: &A) -> Command {
        let entry = entry(A::KIND);
        let args = args.move_args();
        debug_assert_eq!(
            args.len(),
            entry.arg_roles.len(),
            "argument count for {} must match the catalog",
            entry.function
        );
        Command {
            kind: entry.kind,
            name: entry.function,
            entry_point: self.qualified_function(entry),
            type_arguments: entry
                .type_arguments
                .iter()
                .map(|ty| ty.to_string())
                .collect(),
            args,
        }
    }
}
