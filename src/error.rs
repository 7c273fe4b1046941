//! Error types for fsmap

use thiserror::Error;

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

/// Failures surfaced by [`FixedMap`](crate::FixedMap).
///
/// A missing key is not an error: lookups and deletes return `Option`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Construction with a capacity that is zero or negative
    #[error("capacity must be a positive integer, got {0}")]
    InvalidCapacity(i64),

    /// Every slot in the arena is occupied
    #[error("all {capacity} slots are occupied")]
    Exhausted { capacity: usize },

    /// The key's hash is already stored.
    ///
    /// Two distinct keys with the same hash also land here.
    #[error("key hash {hash} is already present")]
    DuplicateKey { hash: i32 },
}
