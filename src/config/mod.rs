#[cfg(test)]
mod tests;

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use clap::Parser;

use crate::models::Account;
use crate::queue::DEFAULT_RETENTION;
use crate::types::Monetary;

/// Admits account balance adjustments over HTTP and applies them from an ordered queue
#[derive(Parser, Debug, Clone)]
#[command(name = "transaction-pipeline")]
#[command(about = "Admits account balance adjustments over HTTP and applies them from an ordered queue", long_about = None)]
pub struct Cli {
    /// Listen address for the admission API
    #[arg(long = "listen-address", value_name = "ADDR", default_value = "0.0.0.0:9000")]
    pub listen_address: SocketAddr,

    /// Name of the transaction topic
    #[arg(long = "topic", value_name = "TOPIC", default_value = "transactions-queue")]
    pub topic: String,

    /// Number of queue partitions, one application worker runs per partition
    #[arg(long = "partitions", value_name = "COUNT", default_value_t = 4, value_parser = clap::value_parser!(u16).range(1..))]
    pub partitions: u16,

    /// Longest time a worker blocks waiting for the next message, in milliseconds
    #[arg(long = "max-wait-ms", value_name = "MILLIS", default_value_t = 1000)]
    pub max_wait_ms: u64,

    /// Already applied messages kept per partition for replay
    #[arg(long = "retained-messages", value_name = "COUNT", default_value_t = DEFAULT_RETENTION)]
    pub retained_messages: usize,

    /// PostgreSQL connection URL. Without it accounts live in memory
    #[arg(long = "database-url", value_name = "URL", env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Size of the PostgreSQL connection pool
    #[arg(long = "max-connections", value_name = "COUNT", default_value_t = 10)]
    pub max_connections: u32,

    /// Seed an in-memory account, e.g. `--seed acc-1=100.0`. May be repeated
    #[arg(long = "seed", value_name = "ID=BALANCE", value_parser = parse_seed, conflicts_with = "database_url")]
    pub seed: Vec<Account>,

    /// Log level: error, warn, info, debug or trace
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String
}

impl Cli {
    pub fn max_wait(&self) -> Duration {
        Duration::from_millis(self.max_wait_ms)
    }

    pub fn partition_count(&self) -> usize {
        usize::from(self.partitions)
    }
}

fn parse_seed(value: &str) -> Result<Account, String> {
    let (account_id, balance) = value.split_once('=')
        .ok_or_else(|| format!("expected ID=BALANCE, got '{value}'"))?;

    let account_id = account_id.trim();
    if account_id.is_empty() {
        return Err(format!("missing account id in '{value}'"));
    }

    let balance = Monetary::from_str(balance).map_err(|error| error.to_string())?;

    Ok(Account::new(account_id, balance))
}
