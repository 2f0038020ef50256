//! Transaction admission-and-application pipeline.
//!
//! Callers submit signed balance adjustments for an account. The [`admission`] side reads the
//! current balance, rejects anything that would drive it negative, stamps the transaction type and
//! publishes the transaction to an ordered queue keyed by account. The [`worker`] side consumes
//! the queue partition by partition and applies each amount to the account store.
//!
//! - [`types`] - Money and identifiers
//! - [`models`] - Accounts, transactions, the wire format and the error taxonomy
//! - [`validation`] - Balance check and classification
//! - [`storage`] - Account store adapters (in-memory and PostgreSQL)
//! - [`queue`] - Partitioned queue abstraction and the in-process broker
//! - [`publisher`] - Serializes and publishes admitted transactions
//! - [`admission`] - Synchronous admission of one request
//! - [`worker`] - Asynchronous application of queued transactions
//! - [`http`] - Admission API
//! - [`config`] - Command line configuration

pub mod admission;
pub mod config;
pub mod http;
pub mod models;
pub mod publisher;
pub mod queue;
pub mod storage;
pub mod types;
pub mod validation;
pub mod worker;
