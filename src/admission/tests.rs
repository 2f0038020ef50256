use super::AdmissionService;

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::models::{Account, ErrorKind, Transaction, TransactionError, TransactionRequest, TransactionType};
use crate::publisher::TransactionPublisher;
use crate::queue::{Consumer, PartitionedQueue};
use crate::storage::{AccountStorage, Storage, StoreError};
use crate::types::Monetary;

struct OfflineStorage;

#[async_trait]
impl Storage for OfflineStorage {
    async fn get_account(&self, _account_id: &str) -> Result<Account, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn set_balance(&self, _account_id: &str, _balance: Monetary) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
}

fn create_service(accounts: &[(&str, &str)]) -> Result<(AdmissionService<AccountStorage, PartitionedQueue>, AccountStorage, Arc<PartitionedQueue>)> {
    let mut seeded = Vec::new();
    for (account_id, balance) in accounts {
        seeded.push(Account::new(*account_id, Monetary::from_str(balance)?));
    }

    let storage = AccountStorage::with_accounts(seeded);
    let queue = Arc::new(PartitionedQueue::new("transactions-queue", 4));
    let service = AdmissionService::new(Arc::new(storage.clone()), TransactionPublisher::new(queue.clone()));

    Ok((service, storage, queue))
}

fn request(account_id: &str, amount: &str) -> Result<TransactionRequest> {
    Ok(TransactionRequest {
        account_id: account_id.to_string(),
        amount: Monetary::from_str(amount)?
    })
}

#[tokio::test]
async fn test_withdrawal_covered_by_balance_is_admitted_and_queued() -> Result<()> {
    let (service, storage, queue) = create_service(&[("acc-1", "100.0")])?;

    let transaction = service.admit(request("acc-1", "-50.0")?).await?;

    assert_eq!(transaction.transaction_type, Some(TransactionType::WithdrawTransaction));
    assert_eq!(transaction.amount, Monetary::from(-50));
    assert_eq!(queue.total_len(), 1);

    // Admission never touches the balance, only the worker does
    assert_eq!(storage.balance("acc-1"), Some(Monetary::from(100)));

    let mut consumer = queue.consumer([queue.partition_for(b"acc-1")])?;
    let message = consumer.receive(Duration::from_millis(50)).await?
        .ok_or_else(|| anyhow!("admitted transaction was not queued"))?;

    assert_eq!(Transaction::decode(&message.value)?, transaction);

    Ok(())
}

#[tokio::test]
async fn test_withdrawal_exceeding_balance_is_rejected_without_side_effects() -> Result<()> {
    let (service, storage, queue) = create_service(&[("acc-1", "10.0")])?;

    let result = service.admit(request("acc-1", "-50.0")?).await;

    assert!(matches!(result, Err(TransactionError::InsufficientFunds { .. })));
    assert_eq!(storage.balance("acc-1"), Some(Monetary::from(10)));
    assert_eq!(queue.total_len(), 0);

    Ok(())
}

#[tokio::test]
async fn test_unknown_account_is_rejected() -> Result<()> {
    let (service, _, queue) = create_service(&[("acc-1", "100.0")])?;

    let result = service.admit(request("acc-x", "5")?).await;

    match result {
        Err(TransactionError::AccountNotFound { account_id }) => assert_eq!(account_id, "acc-x"),
        other => return Err(anyhow!("unexpected admission result: {other:?}"))
    }

    assert_eq!(queue.total_len(), 0);

    Ok(())
}

#[tokio::test]
async fn test_admission_accepts_iff_balance_plus_amount_is_not_negative() -> Result<()> {
    let balances = ["0", "10.0", "100.0", "0.01"];
    let amounts = ["-100.0", "-10.0", "-10.01", "-0.01", "0", "0.01", "50"];

    for balance in balances {
        for amount in amounts {
            let (service, storage, queue) = create_service(&[("acc-1", balance)])?;
            let expected = Monetary::from_str(balance)?.checked_add(Monetary::from_str(amount)?)
                .is_some_and(|projected| !projected.is_negative());

            let accepted = service.admit(request("acc-1", amount)?).await.is_ok();

            assert_eq!(accepted, expected, "balance {balance} amount {amount}");
            assert_eq!(queue.total_len(), u64::from(accepted));
            assert_eq!(storage.balance("acc-1"), Some(Monetary::from_str(balance)?));
        }
    }

    Ok(())
}

#[tokio::test]
async fn test_admission_stamps_type_from_sign() -> Result<()> {
    let (service, _, _) = create_service(&[("acc-1", "100.0")])?;

    let credit = service.admit(request("acc-1", "25")?).await?;
    let zero = service.admit(request("acc-1", "0")?).await?;
    let debit = service.admit(request("acc-1", "-0.5")?).await?;

    assert_eq!(credit.transaction_type, Some(TransactionType::AdditionalTransaction));
    assert_eq!(zero.transaction_type, Some(TransactionType::AdditionalTransaction));
    assert_eq!(debit.transaction_type, Some(TransactionType::WithdrawTransaction));

    Ok(())
}

#[tokio::test]
async fn test_publication_failure_is_reported_as_not_queued() -> Result<()> {
    let (service, storage, queue) = create_service(&[("acc-1", "100.0")])?;
    queue.close();

    let result = service.admit(request("acc-1", "-10")?).await;

    assert!(matches!(result.as_ref().map_err(TransactionError::kind), Err(ErrorKind::PublicationFailed)));
    assert_eq!(queue.total_len(), 0);
    assert_eq!(storage.balance("acc-1"), Some(Monetary::from(100)));

    Ok(())
}

#[tokio::test]
async fn test_store_outage_is_not_reported_as_missing_account() -> Result<()> {
    let queue = Arc::new(PartitionedQueue::new("transactions-queue", 1));
    let service = AdmissionService::new(Arc::new(OfflineStorage), TransactionPublisher::new(queue.clone()));

    let result = service.admit(request("acc-1", "1")?).await;

    assert!(matches!(result, Err(TransactionError::StoreUnavailable { .. })));
    assert_eq!(queue.total_len(), 0);

    Ok(())
}

#[tokio::test]
async fn test_admission_does_not_see_queued_but_unapplied_debits() -> Result<()> {
    let (service, _, queue) = create_service(&[("acc-1", "100.0")])?;

    // Each check runs against the stored balance, not against what is already queued
    service.admit(request("acc-1", "-60")?).await?;
    service.admit(request("acc-1", "-60")?).await?;

    assert_eq!(queue.total_len(), 2);

    Ok(())
}
