use std::sync::Arc;
use std::time::Duration;

use tokio::select;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::models::{Transaction, TransactionError, TransactionType};
use crate::queue::{Consumer, QueuedMessage};
use crate::storage::Storage;
use crate::types::{AccountId, Monetary};
use crate::worker::WorkerStats;

/// Terminal state of one consumed message.
#[derive(Debug)]
pub enum ApplyOutcome {
    Applied {
        account_id: AccountId,
        transaction_type: Option<TransactionType>,
        amount: Monetary,
        balance: Monetary,
        partition: usize,
        offset: u64
    },
    Failed(TransactionError)
}

impl ApplyOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, ApplyOutcome::Applied { .. })
    }
}

/// Asynchronous back half of the pipeline.
///
/// Consumes its assigned partitions in order and adds each transaction's amount to the stored
/// balance. The worker assumes it is the only writer for the accounts on its partitions.
/// Every consumed message ends as `Applied` or `Failed`: failures are logged and counted, never
/// retried or re-queued. Redelivered messages are applied again.
pub struct ApplicationWorker<S: Storage, C: Consumer> {
    id: usize,
    storage: Arc<S>,
    consumer: C,
    max_wait: Duration,
    stats: Arc<WorkerStats>
}

impl<S: Storage, C: Consumer> ApplicationWorker<S, C> {
    pub fn new(id: usize, storage: Arc<S>, consumer: C, max_wait: Duration) -> Self {
        Self {
            id,
            storage,
            consumer,
            max_wait,
            stats: Arc::new(WorkerStats::new())
        }
    }

    pub fn with_stats(mut self, stats: Arc<WorkerStats>) -> Self {
        self.stats = stats;
        self
    }

    pub fn stats(&self) -> Arc<WorkerStats> {
        self.stats.clone()
    }

    pub fn consumer_mut(&mut self) -> &mut C {
        &mut self.consumer
    }

    /// Receives and applies the next message, `None` when nothing arrived within the wait.
    pub async fn next(&mut self) -> Option<ApplyOutcome> {
        let message = self.receive().await?;
        Some(self.apply(&message).await)
    }

    /// Runs until `shutdown` is cancelled, then applies whatever is still queued on its
    /// partitions before returning.
    ///
    /// Cancellation is only observed while waiting for a message, an apply that has started
    /// always completes.
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!(worker = self.id, "Application worker started");

        loop {
            let message = select! {
                _ = shutdown.cancelled() => break,
                message = self.receive() => message
            };

            if let Some(message) = message {
                self.apply(&message).await;
            }
        }

        let drained = self.drain().await;

        info!(worker = self.id, drained, stats = ?self.stats.snapshot(), "Application worker stopped");
    }

    /// Applies every message already queued without waiting for new ones.
    async fn drain(&mut self) -> usize {
        let mut drained = 0;

        loop {
            match self.consumer.receive(Duration::ZERO).await {
                Ok(Some(message)) => {
                    self.apply(&message).await;
                    drained += 1;
                }
                Ok(None) => break,
                Err(error) => {
                    error!(worker = self.id, "Error while draining queue: {error}");
                    break;
                }
            }
        }

        drained
    }

    /// Applies one message to the store and records the outcome.
    pub async fn apply(&self, message: &QueuedMessage) -> ApplyOutcome {
        let transaction = match Transaction::decode(&message.value) {
            Ok(transaction) => transaction,
            Err(error) => return self.fail(TransactionError::malformed_message(message, error))
        };

        if message.key != transaction.account_id.as_bytes() {
            warn!(
                worker = self.id,
                partition = message.partition,
                offset = message.offset,
                account_id = %transaction.account_id,
                "Message key does not match account, per-account ordering is not guaranteed for it"
            );
        }

        match self.storage.add_to_balance(&transaction.account_id, transaction.amount).await {
            Ok(balance) => {
                self.stats.record_applied();

                debug!(
                    worker = self.id,
                    partition = message.partition,
                    offset = message.offset,
                    account_id = %transaction.account_id,
                    transaction_type = transaction.transaction_type.map(|kind| kind.as_str()).unwrap_or("UNSPECIFIED"),
                    amount = %transaction.amount,
                    %balance,
                    "Transaction applied"
                );

                ApplyOutcome::Applied {
                    account_id: transaction.account_id,
                    transaction_type: transaction.transaction_type,
                    amount: transaction.amount,
                    balance,
                    partition: message.partition,
                    offset: message.offset
                }
            }
            Err(error) => self.fail(TransactionError::apply_failed(&transaction, error))
        }
    }

    async fn receive(&mut self) -> Option<QueuedMessage> {
        match self.consumer.receive(self.max_wait).await {
            Ok(message) => message,
            Err(error) => {
                error!(worker = self.id, "Error while receiving message: {error}");
                //NOTE: Back off for one wait period so a broken consumer does not spin
                sleep(self.max_wait).await;
                None
            }
        }
    }

    fn fail(&self, error: TransactionError) -> ApplyOutcome {
        self.stats.record_failure(error.kind());
        error!(worker = self.id, kind = ?error.kind(), "{error}");
        ApplyOutcome::Failed(error)
    }
}
