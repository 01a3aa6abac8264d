use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::domain::{AccountAddress, TxHash, Vehicle, VehicleId};

pub const ENTRY_FUNCTION_PAYLOAD_TYPE: &str = "entry_function_payload";

/// Positional argument of an entry-function call.
///
/// u64 values travel as decimal strings, matching the ledger's JSON encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveArg {
    U64(u64),
    Address(AccountAddress),
}

impl Serialize for MoveArg {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MoveArg::U64(value) => serializer.serialize_str(&value.to_string()),
            MoveArg::Address(address) => serializer.serialize_str(address.as_str()),
        }
    }
}

impl<'de> Deserialize<'de> for MoveArg {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(match raw.parse::<u64>() {
            Ok(value) => MoveArg::U64(value),
            Err(_) => MoveArg::Address(AccountAddress::new(raw)),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryFunctionPayload {
    #[serde(rename = "type")]
    pub payload_type: String,
    pub function: String,
    pub type_arguments: Vec<String>,
    pub arguments: Vec<MoveArg>,
}

impl EntryFunctionPayload {
    pub fn new(
        function: impl Into<String>,
        type_arguments: Vec<String>,
        arguments: Vec<MoveArg>,
    ) -> Self {
        Self {
            payload_type: ENTRY_FUNCTION_PAYLOAD_TYPE.to_string(),
            function: function.into(),
            type_arguments,
            arguments,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentAccountResponse {
    pub address: AccountAddress,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingTransactionResponse {
    pub hash: TxHash,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountResource {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleResourceData {
    #[serde(with = "u64_string")]
    pub id: u64,
    pub dealer: AccountAddress,
    #[serde(with = "u64_string")]
    pub price: u64,
    pub is_sold: bool,
}

impl From<VehicleResourceData> for Vehicle {
    fn from(value: VehicleResourceData) -> Self {
        Self {
            id: VehicleId(value.id),
            dealer: value.dealer,
            price: value.price,
            is_sold: value.is_sold,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommittedTransaction {
    pub hash: TxHash,
    #[serde(with = "u64_string")]
    pub version: u64,
    pub success: bool,
    pub vm_status: String,
    /// Commit time in microseconds since the epoch.
    #[serde(with = "u64_string")]
    pub timestamp: u64,
}

impl CommittedTransaction {
    pub fn committed_at(&self) -> Option<DateTime<Utc>> {
        i64::try_from(self.timestamp)
            .ok()
            .and_then(DateTime::from_timestamp_micros)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransactionResponse {
    PendingTransaction { hash: TxHash },
    UserTransaction(CommittedTransaction),
    #[serde(other)]
    Other,
}

/// u64 fields encoded as decimal strings on the wire; bare numbers are accepted on read.
pub mod u64_string {
    use super::*;

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(u64),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(value) => Ok(value),
            Raw::Text(text) => text
                .parse::<u64>()
                .map_err(|err| de::Error::custom(format!("invalid u64 string '{text}': {err}"))),
        }
    }
}
