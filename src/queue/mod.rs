mod errors;
mod partitioned_queue;

use std::time::Duration;

use async_trait::async_trait;

pub use errors::QueueError;
pub use partitioned_queue::{PartitionConsumer, PartitionedQueue, DEFAULT_RETENTION};

/// A single record as stored by the queue.
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedMessage {
    /// Partition key. Every message with the same key lands on the same partition.
    pub key: Vec<u8>,
    /// Serialized payload.
    pub value: Vec<u8>,
    pub partition: usize,
    pub offset: u64
}

/// Where a published message was appended.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Delivery {
    pub partition: usize,
    pub offset: u64
}

/// Producer side of an ordered, partitioned queue.
#[async_trait]
pub trait Queue: Send + Sync + 'static {
    async fn publish(&self, key: &[u8], value: Vec<u8>) -> Result<Delivery, QueueError>;
}

/// Consumer side bound to a fixed set of partitions.
///
/// Delivery is at-least-once: seeking back to an earlier offset replays messages.
#[async_trait]
pub trait Consumer: Send + 'static {
    /// Waits at most `max_wait` for the next message, `None` when the wait elapsed.
    async fn receive(&mut self, max_wait: Duration) -> Result<Option<QueuedMessage>, QueueError>;

    /// Moves the read position of an assigned partition. Offsets that were already released
    /// cannot be replayed.
    fn seek(&mut self, partition: usize, offset: u64) -> Result<(), QueueError>;
}
