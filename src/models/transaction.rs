use serde::{Deserialize, Deserializer, Serialize};

use crate::models::TransactionType;
use crate::types::{AccountId, Monetary};

/// An inbound balance adjustment as submitted by a caller.
///
/// Callers never choose the transaction type, it is derived from the sign of `amount`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TransactionRequest {
    pub account_id: AccountId,
    pub amount: Monetary
}

/// A transaction as it travels through the queue.
///
/// This is also the persisted wire format of a queued message. Older producers did not
/// stamp `transaction_type`, so a missing, null or empty value decodes as `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The target account, also used as the partition key.
    pub account_id: AccountId,
    /// Classification stamped at admission. Kept for audit only.
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "empty_as_none")]
    pub transaction_type: Option<TransactionType>,
    /// Positive amounts credit the account, negative amounts debit it.
    pub amount: Monetary
}

impl From<TransactionRequest> for Transaction {
    fn from(request: TransactionRequest) -> Self {
        Self {
            account_id: request.account_id,
            transaction_type: None,
            amount: request.amount
        }
    }
}

impl Transaction {
    /// Encodes the transaction as a UTF-8 JSON queue payload.
    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn decode(payload: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(payload)
    }
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<TransactionType>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;

    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(name) => name.parse().map(Some).map_err(serde::de::Error::custom)
    }
}
