mod application_worker;
mod stats;
mod worker_pool;

pub use application_worker::{ApplicationWorker, ApplyOutcome};
pub use stats::{StatsSnapshot, WorkerStats};
pub use worker_pool::WorkerPool;
