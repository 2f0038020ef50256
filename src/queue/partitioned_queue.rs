use std::collections::VecDeque;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::time::{timeout_at, Instant};
use tracing::trace;

use crate::queue::{Consumer, Delivery, Queue, QueueError, QueuedMessage};

/// Consumed messages kept per partition for replay when nothing else is configured.
pub const DEFAULT_RETENTION: usize = 10_000;

/// In-process stand-in for the message broker.
///
/// Each partition is an append-only log. A message's partition is a stable hash of its key,
/// which gives FIFO order for every key while unrelated keys spread across partitions.
///
/// Messages are held in memory only. Once every consumer attached to a partition has read past
/// a message it becomes releasable, and the partition keeps at most `retention` such messages
/// for replay. Unread messages are never released.
#[derive(Clone)]
pub struct PartitionedQueue {
    inner: Arc<Inner>
}

struct Inner {
    topic: String,
    partitions: Vec<Mutex<PartitionLog>>,
    retention: usize,
    closed: AtomicBool,
    next_consumer: AtomicUsize,
    //NOTE: Counts every publish across all partitions, consumers use it only as a wake-up signal
    published: watch::Sender<u64>
}

#[derive(Default)]
struct PartitionLog {
    /// Offset of the first message still held.
    base: u64,
    messages: VecDeque<QueuedMessage>,
    /// Next offset each attached consumer will read, by consumer id.
    cursors: Vec<(usize, u64)>,
    /// One past the furthest offset any consumer has read.
    read_mark: u64
}

impl PartitionLog {
    fn end(&self) -> u64 {
        self.base + self.messages.len() as u64
    }

    fn get(&self, offset: u64) -> Option<&QueuedMessage> {
        let index = usize::try_from(offset.checked_sub(self.base)?).ok()?;
        self.messages.get(index)
    }

    fn slowest(&self) -> Option<u64> {
        self.cursors.iter().map(|(_, offset)| *offset).min()
    }

    fn unread(&self) -> u64 {
        let from = self.slowest().unwrap_or(self.read_mark).max(self.base);
        self.end().saturating_sub(from)
    }

    fn set_cursor(&mut self, consumer: usize, offset: u64) {
        match self.cursors.iter_mut().find(|(id, _)| *id == consumer) {
            Some(cursor) => cursor.1 = offset,
            None => self.cursors.push((consumer, offset))
        }
    }

    fn release(&mut self, retention: usize) {
        let Some(slowest) = self.slowest() else {
            return;
        };

        let consumed = usize::try_from(slowest.saturating_sub(self.base))
            .unwrap_or(usize::MAX)
            .min(self.messages.len());
        let excess = consumed.saturating_sub(retention);

        self.messages.drain(..excess);
        self.base += excess as u64;
    }
}

impl PartitionedQueue {
    pub fn new(topic: impl Into<String>, partitions: usize) -> Self {
        Self::with_retention(topic, partitions, DEFAULT_RETENTION)
    }

    pub fn with_retention(topic: impl Into<String>, partitions: usize, retention: usize) -> Self {
        let (published, _) = watch::channel(0);

        Self {
            inner: Arc::new(Inner {
                topic: topic.into(),
                partitions: (0..partitions.max(1)).map(|_| Mutex::new(PartitionLog::default())).collect(),
                retention,
                closed: AtomicBool::new(false),
                next_consumer: AtomicUsize::new(0),
                published
            })
        }
    }

    pub fn topic(&self) -> &str {
        &self.inner.topic
    }

    pub fn partition_count(&self) -> usize {
        self.inner.partitions.len()
    }

    pub fn partition_for(&self, key: &[u8]) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() % self.partition_count() as u64) as usize
    }

    /// Number of messages ever appended to `partition`, which is also its next offset.
    pub fn len(&self, partition: usize) -> u64 {
        self.inner.partitions.get(partition)
            .map(|log| lock(log).end())
            .unwrap_or(0)
    }

    /// Number of messages ever appended across all partitions.
    pub fn total_len(&self) -> u64 {
        (0..self.partition_count()).map(|partition| self.len(partition)).sum()
    }

    /// Number of messages of `partition` still held in memory.
    pub fn retained(&self, partition: usize) -> usize {
        self.inner.partitions.get(partition)
            .map(|log| lock(log).messages.len())
            .unwrap_or(0)
    }

    /// Messages not yet read by the slowest attached consumer, summed over all partitions. With no
    /// consumer attached it counts what nobody has read yet.
    pub fn backlog(&self) -> u64 {
        self.inner.partitions.iter()
            .map(|log| lock(log).unread())
            .sum()
    }

    /// Rejects every further publish. Already stored messages stay readable.
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
    }

    /// Creates a consumer reading `partitions` from the earliest retained offset.
    pub fn consumer(&self, partitions: impl IntoIterator<Item = usize>) -> Result<PartitionConsumer, QueueError> {
        let mut requested = Vec::new();

        for partition in partitions {
            if partition >= self.partition_count() {
                return Err(QueueError::UnknownPartition { partition, partitions: self.partition_count() });
            }

            if !requested.contains(&partition) {
                requested.push(partition);
            }
        }

        let id = self.inner.next_consumer.fetch_add(1, Ordering::Relaxed);
        let assignments = requested.into_iter()
            .map(|partition| {
                let mut log = lock(&self.inner.partitions[partition]);
                let start = log.base;
                log.set_cursor(id, start);
                (partition, start)
            })
            .collect();

        Ok(PartitionConsumer {
            queue: self.clone(),
            id,
            published: self.inner.published.subscribe(),
            assignments,
            cursor: 0
        })
    }

    fn advance(&self, consumer: usize, partition: usize, offset: u64) -> Option<QueuedMessage> {
        let mut log = lock(&self.inner.partitions[partition]);
        let message = log.get(offset).cloned()?;

        log.set_cursor(consumer, offset + 1);
        log.read_mark = log.read_mark.max(offset + 1);
        log.release(self.inner.retention);

        Some(message)
    }

    fn reposition(&self, consumer: usize, partition: usize, offset: u64) -> Result<(), QueueError> {
        let mut log = lock(&self.inner.partitions[partition]);

        if offset < log.base {
            return Err(QueueError::OffsetReleased { partition, offset, earliest: log.base });
        }

        log.set_cursor(consumer, offset);

        Ok(())
    }

    fn detach(&self, consumer: usize, partition: usize) {
        let mut log = lock(&self.inner.partitions[partition]);

        log.cursors.retain(|(id, _)| *id != consumer);
        log.release(self.inner.retention);
    }
}

#[async_trait]
impl Queue for PartitionedQueue {
    async fn publish(&self, key: &[u8], value: Vec<u8>) -> Result<Delivery, QueueError> {
        if self.inner.closed.load(Ordering::SeqCst) {
            return Err(QueueError::Closed(self.inner.topic.clone()));
        }

        let partition = self.partition_for(key);

        let offset = {
            let mut log = lock(&self.inner.partitions[partition]);
            let offset = log.end();

            log.messages.push_back(QueuedMessage {
                key: key.to_vec(),
                value,
                partition,
                offset
            });

            offset
        };

        self.inner.published.send_modify(|count| *count += 1);

        trace!(topic = %self.inner.topic, partition, offset, "Message appended");

        Ok(Delivery { partition, offset })
    }
}

/// Reads a fixed set of partitions of a [`PartitionedQueue`].
///
/// Partitions are polled round-robin so a busy partition cannot starve the others. Order within
/// a partition is always preserved. Dropping the consumer detaches it, so it no longer holds back
/// the release of messages it has not read.
pub struct PartitionConsumer {
    queue: PartitionedQueue,
    id: usize,
    published: watch::Receiver<u64>,
    assignments: Vec<(usize, u64)>,
    cursor: usize
}

impl PartitionConsumer {
    fn poll(&mut self) -> Option<QueuedMessage> {
        let count = self.assignments.len();

        for step in 0..count {
            let index = (self.cursor + step) % count;
            let (partition, offset) = self.assignments[index];

            if let Some(message) = self.queue.advance(self.id, partition, offset) {
                self.assignments[index].1 = offset + 1;
                self.cursor = (index + 1) % count;
                return Some(message);
            }
        }

        None
    }
}

#[async_trait]
impl Consumer for PartitionConsumer {
    async fn receive(&mut self, max_wait: Duration) -> Result<Option<QueuedMessage>, QueueError> {
        let deadline = Instant::now() + max_wait;

        loop {
            //NOTE: Mark the current count as seen before polling so a publish racing with the poll still wakes us
            self.published.borrow_and_update();

            if let Some(message) = self.poll() {
                return Ok(Some(message));
            }

            match timeout_at(deadline, self.published.changed()).await {
                Ok(Ok(())) => continue,
                Ok(Err(_)) => return Err(QueueError::Closed(self.queue.topic().to_string())),
                Err(_) => return Ok(None)
            }
        }
    }

    fn seek(&mut self, partition: usize, offset: u64) -> Result<(), QueueError> {
        let assignment = self.assignments.iter_mut()
            .find(|(assigned, _)| *assigned == partition)
            .ok_or(QueueError::NotAssigned(partition))?;

        self.queue.reposition(self.id, partition, offset)?;
        assignment.1 = offset;

        Ok(())
    }
}

impl Drop for PartitionConsumer {
    fn drop(&mut self) {
        for (partition, _) in &self.assignments {
            self.queue.detach(self.id, *partition);
        }
    }
}

fn lock(log: &Mutex<PartitionLog>) -> MutexGuard<'_, PartitionLog> {
    log.lock().unwrap_or_else(PoisonError::into_inner)
}
