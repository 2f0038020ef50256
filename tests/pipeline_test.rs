use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;

use transaction_pipeline::admission::AdmissionService;
use transaction_pipeline::http::{self, AppState};
use transaction_pipeline::models::Account;
use transaction_pipeline::publisher::TransactionPublisher;
use transaction_pipeline::queue::PartitionedQueue;
use transaction_pipeline::storage::AccountStorage;
use transaction_pipeline::types::Monetary;
use transaction_pipeline::worker::{WorkerPool, WorkerStats};

struct Running {
    address: String,
    storage: AccountStorage,
    queue: Arc<PartitionedQueue>,
    stats: Arc<WorkerStats>,
    pool: WorkerPool,
    shutdown: CancellationToken
}

async fn start(accounts: &[(&str, &str)]) -> Result<Running> {
    let mut seeded = Vec::new();
    for (account_id, balance) in accounts {
        seeded.push(Account::new(*account_id, Monetary::from_str(balance)?));
    }

    let storage = AccountStorage::with_accounts(seeded);
    let queue = Arc::new(PartitionedQueue::new("transactions-queue", 4));
    let shutdown = CancellationToken::new();
    let pool = WorkerPool::spawn(Arc::new(storage.clone()), &queue, Duration::from_millis(50))?;
    let stats = pool.stats();

    let state = Arc::new(AppState {
        admission: AdmissionService::new(Arc::new(storage.clone()), TransactionPublisher::new(queue.clone())),
        stats: stats.clone()
    });

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let address = listener.local_addr()?.to_string();
    tokio::spawn(http::serve(listener, http::router(state), shutdown.clone()));

    Ok(Running { address, storage, queue, stats, pool, shutdown })
}

async fn post_json(address: &str, body: &str) -> Result<(u16, Value)> {
    let mut stream = TcpStream::connect(address).await?;
    let request = format!(
        "POST /api/v1/account HTTP/1.1\r\nHost: {address}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );

    stream.write_all(request.as_bytes()).await?;

    let mut response = String::new();
    stream.read_to_string(&mut response).await?;

    let status = response.split_whitespace().nth(1)
        .ok_or_else(|| anyhow!("no status line in {response:?}"))?
        .parse()?;

    let (_, body) = response.split_once("\r\n\r\n").ok_or_else(|| anyhow!("no body in {response:?}"))?;

    Ok((status, serde_json::from_str(body)?))
}

async fn wait_for_applied(stats: &WorkerStats, applied: u64) -> Result<()> {
    timeout(Duration::from_secs(5), async {
        while stats.snapshot().applied < applied {
            sleep(Duration::from_millis(10)).await;
        }
    }).await?;

    Ok(())
}

#[tokio::test]
async fn test_withdrawal_flows_from_http_to_balance() -> Result<()> {
    let running = start(&[("acc-1", "100.0")]).await?;

    let (status, body) = post_json(&running.address, r#"{"account_id":"acc-1","amount":-50.0}"#).await?;

    assert_eq!(status, 200);
    assert_eq!(body["data"]["transaction_type"], "WITHDRAW_TRANSACTION");

    wait_for_applied(&running.stats, 1).await?;

    assert_eq!(running.storage.balance("acc-1"), Some(Monetary::from(50)));

    running.shutdown.cancel();
    running.pool.shutdown().await;

    Ok(())
}

#[tokio::test]
async fn test_rejections_leave_queue_and_balance_untouched() -> Result<()> {
    let running = start(&[("acc-1", "10.0")]).await?;

    let (insufficient, insufficient_body) = post_json(&running.address, r#"{"account_id":"acc-1","amount":-50.0}"#).await?;
    let (missing, missing_body) = post_json(&running.address, r#"{"account_id":"acc-x","amount":5}"#).await?;

    assert_eq!(insufficient, 400);
    assert_eq!(insufficient_body["error"]["kind"], "InsufficientFunds");
    assert_eq!(missing, 400);
    assert_eq!(missing_body["error"]["kind"], "AccountNotFound");

    assert_eq!(running.queue.total_len(), 0);
    assert_eq!(running.storage.balance("acc-1"), Some(Monetary::from(10)));

    let snapshot = running.pool.shutdown().await;

    assert_eq!(snapshot.total(), 0);

    Ok(())
}

#[tokio::test]
async fn test_concurrent_requests_keep_per_account_totals() -> Result<()> {
    let running = start(&[("acc-1", "0"), ("acc-2", "0")]).await?;
    let mut requests = Vec::new();

    for index in 0..20 {
        let address = running.address.clone();
        let account_id = if index % 2 == 0 { "acc-1" } else { "acc-2" };

        requests.push(tokio::spawn(async move {
            post_json(&address, &format!(r#"{{"account_id":"{account_id}","amount":2.5}}"#)).await
        }));
    }

    for request in requests {
        let (status, _) = request.await??;
        assert_eq!(status, 200);
    }

    wait_for_applied(&running.stats, 20).await?;

    assert_eq!(running.storage.balance("acc-1"), Some(Monetary::from(25)));
    assert_eq!(running.storage.balance("acc-2"), Some(Monetary::from(25)));

    running.pool.shutdown().await;

    Ok(())
}
