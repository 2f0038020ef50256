mod account;
mod errors;
mod transaction;

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use account::Account;
pub use errors::{ErrorKind, TransactionError};
pub use transaction::{Transaction, TransactionRequest};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// Credit, stamped on amounts >= 0.
    AdditionalTransaction,
    /// Debit, stamped on amounts < 0.
    WithdrawTransaction
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::AdditionalTransaction => "ADDITIONAL_TRANSACTION",
            TransactionType::WithdrawTransaction => "WITHDRAW_TRANSACTION"
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "ADDITIONAL_TRANSACTION" => Ok(TransactionType::AdditionalTransaction),
            "WITHDRAW_TRANSACTION" => Ok(TransactionType::WithdrawTransaction),
            other => Err(format!("unknown transaction type '{other}'"))
        }
    }
}
