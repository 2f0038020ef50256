mod transaction_publisher;

pub use transaction_publisher::TransactionPublisher;
