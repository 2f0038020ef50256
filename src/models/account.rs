use serde::{Deserialize, Serialize};

use crate::types::{AccountId, Monetary};

/// A row of the external account store.
///
/// Accounts are never created or deleted by the pipeline, only the `balance` is read and updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// The unique identifier for the account.
    pub account_id: AccountId,
    /// Current balance as last written by the application worker.
    pub balance: Monetary
}

impl Account {
    pub fn new(account_id: impl Into<AccountId>, balance: Monetary) -> Self {
        Self {
            account_id: account_id.into(),
            balance
        }
    }
}
