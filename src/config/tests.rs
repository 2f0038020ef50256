use super::Cli;

use std::str::FromStr;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;

use crate::models::Account;
use crate::types::Monetary;

#[test]
fn test_cli_defaults() -> Result<()> {
    let cli = Cli::try_parse_from(["transaction-pipeline"])?;

    assert_eq!(cli.listen_address.to_string(), "0.0.0.0:9000");
    assert_eq!(cli.topic, "transactions-queue");
    assert_eq!(cli.partition_count(), 4);
    assert_eq!(cli.max_wait(), Duration::from_secs(1));
    assert_eq!(cli.retained_messages, 10_000);
    assert_eq!(cli.log_level, "info");
    assert!(cli.seed.is_empty());

    Ok(())
}

#[test]
fn test_cli_parses_repeated_seeds() -> Result<()> {
    let cli = Cli::try_parse_from([
        "transaction-pipeline",
        "--seed", "acc-1=100.0",
        "--seed", "acc-2=0",
        "--partitions", "8",
        "--max-wait-ms", "250",
    ])?;

    assert_eq!(cli.seed, vec![
        Account::new("acc-1", Monetary::from_str("100.0")?),
        Account::new("acc-2", Monetary::from(0)),
    ]);
    assert_eq!(cli.partition_count(), 8);
    assert_eq!(cli.max_wait(), Duration::from_millis(250));

    Ok(())
}

#[test]
fn test_cli_rejects_invalid_values() {
    let invalid = [
        vec!["transaction-pipeline", "--seed", "acc-1"],
        vec!["transaction-pipeline", "--seed", "=10"],
        vec!["transaction-pipeline", "--seed", "acc-1=lots"],
        vec!["transaction-pipeline", "--partitions", "0"],
        vec!["transaction-pipeline", "--listen-address", "nowhere"],
        vec!["transaction-pipeline", "--database-url", "postgres://localhost/db", "--seed", "acc-1=1"],
    ];

    for args in invalid {
        assert!(Cli::try_parse_from(args.clone()).is_err(), "{args:?}");
    }
}
