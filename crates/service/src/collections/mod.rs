use crate::errors::ServiceError;
use async_trait::async_trait;

/// Trait abstraction for per-user coin collection storage.
/// Implementations can be file-backed, database-backed, or remote KV.
///
/// Implementations must serialize writes to the same user so that two racing
/// appends both end up in the stored sequence; their relative order is
/// unspecified. Operations on different users are independent.
#[async_trait]
pub trait CollectionStore: Send + Sync {
    /// Current sequence for the user. An absent record reads as an empty
    /// sequence, never as an error. Side-effect free.
    async fn get(&self, user_id: &str) -> Result<Vec<String>, ServiceError>;

    /// Append one coin to the user's sequence, creating the record when
    /// absent, and return the full resulting sequence. An empty coin is a
    /// validation error and leaves the store untouched.
    async fn append(&self, user_id: &str, coin: String) -> Result<Vec<String>, ServiceError>;

    /// Overwrite the user's sequence with `coins` (which may be empty),
    /// creating the record when absent, and return the stored sequence.
    async fn replace(&self, user_id: &str, coins: Vec<String>) -> Result<Vec<String>, ServiceError>;
}
