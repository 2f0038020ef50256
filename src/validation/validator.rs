use crate::models::{Account, Transaction, TransactionType};
use crate::types::Monetary;

/// Outcome of checking a transaction against a balance snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Validation {
    pub admissible: bool,
    pub reason: &'static str,
    /// Balance the account would hold once this transaction alone is applied.
    pub projected_balance: Option<Monetary>
}

/// Admits a transaction iff `balance + amount >= 0`.
///
/// No other rule applies. The snapshot does not include queued but unapplied transactions.
pub fn validate(account: &Account, transaction: &Transaction) -> Validation {
    match account.balance.checked_add(transaction.amount) {
        Some(projected) if !projected.is_negative() => Validation {
            admissible: true,
            reason: "balance covers amount",
            projected_balance: Some(projected)
        },
        Some(projected) => Validation {
            admissible: false,
            reason: "amount would drive balance negative",
            projected_balance: Some(projected)
        },
        None => Validation {
            admissible: false,
            reason: "amount overflows balance",
            projected_balance: None
        }
    }
}

pub fn classify(amount: Monetary) -> TransactionType {
    if amount.is_negative() {
        TransactionType::WithdrawTransaction
    } else {
        TransactionType::AdditionalTransaction
    }
}
