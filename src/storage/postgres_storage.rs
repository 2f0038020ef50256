//! PostgreSQL-backed account store.
//!
//! Expects a pre-provisioned table:
//!
//! ```sql
//! CREATE TABLE account (
//!     account_id TEXT PRIMARY KEY,
//!     balance    NUMERIC NOT NULL
//! );
//! ```

use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;
use tracing::info;

use crate::models::Account;
use crate::storage::{Storage, StoreError};
use crate::types::Monetary;

pub struct PostgresStorage {
    pool: PgPool
}

impl PostgresStorage {
    /// Connects and verifies the database is reachable.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;

        let storage = Self { pool };
        storage.health_check().await?;

        info!("PostgreSQL account store connected");

        Ok(storage)
    }

    pub async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl Storage for PostgresStorage {
    async fn get_account(&self, account_id: &str) -> Result<Account, StoreError> {
        let row = sqlx::query("SELECT account_id, balance FROM account WHERE account_id = $1 LIMIT 1")
            .bind(account_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found(account_id))?;

        let balance: Decimal = row.try_get("balance")?;

        Ok(Account {
            account_id: row.try_get("account_id")?,
            balance: Monetary::from(balance)
        })
    }

    async fn set_balance(&self, account_id: &str, balance: Monetary) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE account SET balance = $1 WHERE account_id = $2")
            .bind(balance.as_decimal())
            .bind(account_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(account_id));
        }

        Ok(())
    }
}
