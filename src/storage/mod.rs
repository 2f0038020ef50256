mod account_storage;
mod errors;
mod postgres_storage;

use async_trait::async_trait;

use crate::models::Account;
use crate::types::Monetary;

pub use account_storage::AccountStorage;
pub use errors::StoreError;
pub use postgres_storage::PostgresStorage;

/// Narrow view of the external account store used by the pipeline.
///
/// Admission only ever calls `get_account`. The application worker owns writes through
/// `add_to_balance`.
#[async_trait]
pub trait Storage: Send + Sync + 'static {
    async fn get_account(&self, account_id: &str) -> Result<Account, StoreError>;

    /// Overwrites the stored balance of an existing account.
    async fn set_balance(&self, account_id: &str, balance: Monetary) -> Result<(), StoreError>;

    /// Reads the row, adds `delta` and writes the result back, returning the new balance.
    ///
    /// There is no compare-and-swap between the read and the write. Concurrent writers to the
    /// same account would lose updates, the pipeline relies on per-account queue ordering to
    /// guarantee a single writer.
    async fn add_to_balance(&self, account_id: &str, delta: Monetary) -> Result<Monetary, StoreError> {
        let account = self.get_account(account_id).await?;

        let balance = account.balance.checked_add(delta)
            .ok_or_else(|| StoreError::overflow(account_id))?;

        self.set_balance(account_id, balance).await?;

        Ok(balance)
    }
}
