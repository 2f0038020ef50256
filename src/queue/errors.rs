use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Queue [{0}] is closed for publishing")]
    Closed(String),
    #[error("Partition [{partition}] does not exist, queue has [{partitions}] partitions")]
    UnknownPartition {
        partition: usize,
        partitions: usize
    },
    #[error("Partition [{0}] is not assigned to this consumer")]
    NotAssigned(usize),
    #[error("Offset [{offset}] of partition [{partition}] was released, earliest retained offset is [{earliest}]")]
    OffsetReleased {
        partition: usize,
        offset: u64,
        earliest: u64
    },
    #[error("Payload could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("Queue transport error: {0}")]
    Transport(String)
}
