use crate::models::Account;
use crate::storage::{Storage, StoreError};
use crate::types::{AccountId, Monetary};
use async_trait::async_trait;
use dashmap::iter::Iter;
use dashmap::DashMap;
use std::sync::Arc;

/// In-memory account store.
///
/// Serves as the test double for the pipeline and as the backend when no database is configured.
#[derive(Clone, Default)]
pub struct AccountStorage {
    cache: Arc<DashMap<AccountId, Account>>
}

impl AccountStorage {
    pub fn new() -> Self {
        Self {
            cache: Arc::new(DashMap::new())
        }
    }

    pub fn with_accounts(accounts: impl IntoIterator<Item = Account>) -> Self {
        let storage = Self::new();

        for account in accounts {
            storage.insert(account);
        }

        storage
    }

    /// Seeds a row. Only used at startup and by tests, the pipeline itself never creates accounts.
    pub fn insert(&self, account: Account) {
        self.cache.insert(account.account_id.clone(), account);
    }

    pub fn balance(&self, account_id: &str) -> Option<Monetary> {
        self.cache.get(account_id).map(|account| account.balance)
    }

    pub fn iter(&self) -> Iter<'_, AccountId, Account> {
        self.cache.iter()
    }
}

#[async_trait]
impl Storage for AccountStorage {
    async fn get_account(&self, account_id: &str) -> Result<Account, StoreError> {
        self.cache.get(account_id)
            .map(|account| account.value().clone())
            .ok_or_else(|| StoreError::not_found(account_id))
    }

    async fn set_balance(&self, account_id: &str, balance: Monetary) -> Result<(), StoreError> {
        let mut account = self.cache.get_mut(account_id)
            .ok_or_else(|| StoreError::not_found(account_id))?;

        account.balance = balance;

        Ok(())
    }
}
