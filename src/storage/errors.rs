use thiserror::Error;

use crate::types::AccountId;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Account [{account_id}] does not exist")]
    NotFound {
        account_id: AccountId
    },
    #[error("Balance overflow for account [{account_id}]")]
    Overflow {
        account_id: AccountId
    },
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Account store unavailable: {0}")]
    Unavailable(String)
}

impl StoreError {
    pub fn not_found(account_id: &str) -> Self {
        Self::NotFound { account_id: account_id.to_string() }
    }

    pub fn overflow(account_id: &str) -> Self {
        Self::Overflow { account_id: account_id.to_string() }
    }
}
