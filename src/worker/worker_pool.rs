use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::spawn;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::queue::{PartitionedQueue, QueueError};
use crate::storage::Storage;
use crate::worker::{ApplicationWorker, StatsSnapshot, WorkerStats};

/// One application worker per queue partition.
///
/// Every account maps to exactly one partition, so each account has exactly one writer.
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
    stats: Arc<WorkerStats>,
    queue: PartitionedQueue,
    shutdown: CancellationToken
}

impl WorkerPool {
    pub fn spawn<S: Storage>(storage: Arc<S>, queue: &PartitionedQueue, max_wait: Duration) -> Result<Self, QueueError> {
        let stats = Arc::new(WorkerStats::new());
        let shutdown = CancellationToken::new();
        let mut handles = Vec::with_capacity(queue.partition_count());

        for partition in 0..queue.partition_count() {
            let consumer = queue.consumer([partition])?;
            let worker = ApplicationWorker::new(partition, storage.clone(), consumer, max_wait)
                .with_stats(stats.clone());

            handles.push(spawn(worker.run(shutdown.clone())));
        }

        Ok(Self {
            handles,
            stats,
            queue: queue.clone(),
            shutdown
        })
    }

    pub fn stats(&self) -> Arc<WorkerStats> {
        self.stats.clone()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Closes the queue, lets every worker apply what was already admitted and waits for them.
    ///
    /// Call it once nothing admits anymore. Publishing after this point fails.
    pub async fn shutdown(self) -> StatsSnapshot {
        self.queue.close();

        let backlog = self.queue.backlog();
        if backlog > 0 {
            info!(backlog, "Draining queued transactions before stopping");
        }

        self.shutdown.cancel();

        for result in join_all(self.handles).await {
            if let Err(error) = result {
                error!("An application worker did not stop gracefully: {error:?}");
            }
        }

        let remaining = self.queue.backlog();
        if remaining > 0 {
            warn!(remaining, "Queued transactions were not applied and are lost");
        }

        self.stats.snapshot()
    }
}
