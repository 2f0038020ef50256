use serde::Serialize;
use thiserror::Error;

use crate::models::{Account, Transaction};
use crate::queue::{QueueError, QueuedMessage};
use crate::storage::StoreError;
use crate::types::{AccountId, Monetary};

#[derive(Debug, Error)]
pub enum TransactionError {
    #[error("Account [{account_id}] was not found")]
    AccountNotFound {
        account_id: AccountId
    },
    #[error("Insufficient funds for account [{account_id}]: balance [{balance}] cannot cover amount [{amount}]")]
    InsufficientFunds {
        account_id: AccountId,
        balance: Monetary,
        amount: Monetary
    },
    #[error("Transaction for account [{account_id}] was not queued: {source}")]
    PublicationFailed {
        account_id: AccountId,
        #[source]
        source: QueueError
    },
    #[error("Account store is unavailable while admitting for account [{account_id}]: {source}")]
    StoreUnavailable {
        account_id: AccountId,
        #[source]
        source: StoreError
    },
    #[error("Malformed message at partition [{partition}] offset [{offset}]: {source}")]
    MalformedMessage {
        partition: usize,
        offset: u64,
        #[source]
        source: serde_json::Error
    },
    #[error("Failed to apply amount [{amount}] to account [{account_id}]: {source}")]
    ApplyFailed {
        account_id: AccountId,
        amount: Monetary,
        #[source]
        source: StoreError
    }
}

/// The stable, caller-facing name of each failure.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
pub enum ErrorKind {
    AccountNotFound,
    InsufficientFunds,
    PublicationFailed,
    StoreUnavailable,
    MalformedMessage,
    ApplyFailed
}

impl TransactionError {
    pub fn account_not_found(account_id: &str) -> Self {
        Self::AccountNotFound { account_id: account_id.to_string() }
    }

    pub fn insufficient_funds(account: &Account, tx: &Transaction) -> Self {
        Self::InsufficientFunds {
            account_id: account.account_id.clone(),
            balance: account.balance,
            amount: tx.amount
        }
    }

    pub fn publication_failed(tx: &Transaction, source: QueueError) -> Self {
        Self::PublicationFailed {
            account_id: tx.account_id.clone(),
            source
        }
    }

    pub fn malformed_message(message: &QueuedMessage, source: serde_json::Error) -> Self {
        Self::MalformedMessage {
            partition: message.partition,
            offset: message.offset,
            source
        }
    }

    /// Maps a failed account lookup during admission.
    pub fn lookup_failed(account_id: &str, source: StoreError) -> Self {
        match source {
            StoreError::NotFound { .. } => Self::account_not_found(account_id),
            source => Self::StoreUnavailable {
                account_id: account_id.to_string(),
                source
            }
        }
    }

    /// Maps a failed balance update during application.
    pub fn apply_failed(tx: &Transaction, source: StoreError) -> Self {
        match source {
            StoreError::NotFound { .. } => Self::account_not_found(&tx.account_id),
            source => Self::ApplyFailed {
                account_id: tx.account_id.clone(),
                amount: tx.amount,
                source
            }
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AccountNotFound { .. } => ErrorKind::AccountNotFound,
            Self::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            Self::PublicationFailed { .. } => ErrorKind::PublicationFailed,
            Self::StoreUnavailable { .. } => ErrorKind::StoreUnavailable,
            Self::MalformedMessage { .. } => ErrorKind::MalformedMessage,
            Self::ApplyFailed { .. } => ErrorKind::ApplyFailed
        }
    }
}
