mod errors;
mod monetary;

pub use errors::MonetaryError;
pub use monetary::Monetary;

/// Opaque account identifier. Also used verbatim as the queue partition key.
pub type AccountId = String;
