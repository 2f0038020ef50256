use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::models::{Transaction, TransactionError, TransactionRequest};
use crate::publisher::TransactionPublisher;
use crate::queue::Queue;
use crate::storage::Storage;
use crate::validation::{classify, validate};

/// Synchronous front half of the pipeline: read balance, validate, classify and publish.
///
/// A successful `admit` means the transaction was accepted into the queue, not that the balance
/// changed. The balance check runs against the store's current value and does not see queued
/// but unapplied transactions, so it is a best-effort check. Two concurrent debits on the same
/// account can both pass and together drive the balance negative once applied.
pub struct AdmissionService<S: Storage, Q: Queue> {
    storage: Arc<S>,
    publisher: TransactionPublisher<Q>
}

impl<S: Storage, Q: Queue> AdmissionService<S, Q> {
    pub fn new(storage: Arc<S>, publisher: TransactionPublisher<Q>) -> Self {
        Self {
            storage,
            publisher
        }
    }

    /// Admits one request, returning the stamped transaction that was queued.
    ///
    /// # Errors
    /// - `AccountNotFound` if the account does not exist.
    /// - `StoreUnavailable` if the account could not be read.
    /// - `InsufficientFunds` if `balance + amount < 0`. Nothing is published.
    /// - `PublicationFailed` if the queue rejected the message. Nothing was queued.
    pub async fn admit(&self, request: TransactionRequest) -> Result<Transaction, TransactionError> {
        let account = self.storage.get_account(&request.account_id).await
            .map_err(|error| TransactionError::lookup_failed(&request.account_id, error))?;

        let mut transaction = Transaction::from(request);
        let validation = validate(&account, &transaction);

        if !validation.admissible {
            warn!(
                account_id = %account.account_id,
                balance = %account.balance,
                amount = %transaction.amount,
                reason = validation.reason,
                "Transaction rejected"
            );
            return Err(TransactionError::insufficient_funds(&account, &transaction));
        }

        let transaction_type = classify(transaction.amount);
        transaction.transaction_type = Some(transaction_type);

        debug!(
            account_id = %transaction.account_id,
            %transaction_type,
            projected_balance = ?validation.projected_balance.map(|balance| balance.to_string()),
            "Transaction validated"
        );

        self.publisher.publish(&transaction).await
            .map_err(|error| TransactionError::publication_failed(&transaction, error))?;

        info!(
            account_id = %transaction.account_id,
            amount = %transaction.amount,
            %transaction_type,
            "Transaction admitted"
        );

        Ok(transaction)
    }
}
