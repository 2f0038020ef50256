use std::sync::Arc;

use tracing::debug;

use crate::models::Transaction;
use crate::queue::{Delivery, Queue, QueueError};

/// Serializes admitted transactions and emits them keyed by account.
///
/// Keying by `account_id` is what gives per-account FIFO order downstream. Transport errors are
/// returned as-is, retrying is left to the caller.
pub struct TransactionPublisher<Q: Queue> {
    queue: Arc<Q>
}

impl<Q: Queue> TransactionPublisher<Q> {
    pub fn new(queue: Arc<Q>) -> Self {
        Self { queue }
    }

    pub async fn publish(&self, transaction: &Transaction) -> Result<Delivery, QueueError> {
        let payload = transaction.encode()?;
        let delivery = self.queue.publish(transaction.account_id.as_bytes(), payload).await?;

        debug!(
            account_id = %transaction.account_id,
            partition = delivery.partition,
            offset = delivery.offset,
            "Transaction published"
        );

        Ok(delivery)
    }
}
