use std::io::stderr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tokio::{select, signal, spawn};
use tokio_util::sync::CancellationToken;
use tracing::level_filters::LevelFilter;
use tracing::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, Layer};

use transaction_pipeline::admission::AdmissionService;
use transaction_pipeline::config::Cli;
use transaction_pipeline::http::{self, AppState};
use transaction_pipeline::publisher::TransactionPublisher;
use transaction_pipeline::queue::PartitionedQueue;
use transaction_pipeline::storage::{AccountStorage, PostgresStorage, Storage};
use transaction_pipeline::worker::WorkerPool;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(parse_log_level(&cli.log_level));

    let shutdown = CancellationToken::new();

    //NOTE: An unreachable store aborts startup instead of running degraded
    match cli.database_url.clone() {
        Some(url) => {
            let storage = PostgresStorage::connect(&url, cli.max_connections).await
                .context("failed to connect to the account database")?;

            run(cli, Arc::new(storage), shutdown).await
        }
        None => {
            warn!("No database configured, accounts are kept in memory and lost on exit");

            let storage = AccountStorage::with_accounts(cli.seed.clone());
            info!("Seeded {} in-memory accounts", storage.iter().count());

            run(cli, Arc::new(storage), shutdown).await
        }
    }
}

async fn run<S: Storage>(cli: Cli, storage: Arc<S>, shutdown: CancellationToken) -> Result<()> {
    let queue = Arc::new(PartitionedQueue::with_retention(cli.topic.clone(), cli.partition_count(), cli.retained_messages));
    let pool = WorkerPool::spawn(storage.clone(), &queue, cli.max_wait())?;

    info!(topic = queue.topic(), workers = pool.len(), "Application workers started");
    warn!("The transaction queue lives in process memory, admitted transactions not yet applied are lost if the process dies");

    let state = Arc::new(AppState {
        admission: AdmissionService::new(storage, TransactionPublisher::new(queue.clone())),
        stats: pool.stats()
    });

    let listener = TcpListener::bind(cli.listen_address).await
        .with_context(|| format!("failed to bind {}", cli.listen_address))?;

    let signal_shutdown = shutdown.clone();
    spawn(async move {
        select! {
            _ = shutdown_signal() => info!("Got an interrupt, exiting..."),
            _ = signal_shutdown.cancelled() => {}
        }
        signal_shutdown.cancel();
    });

    let served = http::serve(listener, http::router(state), shutdown.clone()).await;

    //NOTE: Admissions have finished at this point, workers apply what is still queued before stopping
    shutdown.cancel();
    let stats = pool.shutdown().await;

    info!(
        applied = stats.applied,
        malformed = stats.malformed,
        not_found = stats.not_found,
        failed = stats.failed,
        "Pipeline stopped"
    );

    served.context("error while running api")
}

async fn shutdown_signal() {
    let interrupt = async {
        if let Err(error) = signal::ctrl_c().await {
            error!("Unable to listen for interrupts: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
            }
            Err(error) => {
                error!("Unable to listen for SIGTERM: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    select! {
        _ = interrupt => {},
        _ = terminate => {}
    }
}

fn parse_log_level(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" => LevelFilter::INFO,
        "warn" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        _ => {
            eprintln!("Invalid log level '{}', defaulting to 'error'", level);
            LevelFilter::ERROR
        }
    }
}

fn setup_logging(level: LevelFilter) {
    let terminal_log = fmt::layer()
        .with_target(false)
        .with_writer(stderr)
        .with_filter(level);

    tracing_subscriber::registry()
        .with(terminal_log)
        .init();
}
