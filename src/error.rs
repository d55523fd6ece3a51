//! Error types for dynamic bit vector operations.

use thiserror::Error;

/// Error variants for dynamic bit vector operations.
#[derive(Debug, Error)]
pub enum Error {
    /// An index was provided that is out of the structure's bounds.
    #[error("index out of bounds: {0}")]
    IndexOutOfBounds(usize),

    /// An insertion was attempted into a vector already at capacity.
    #[error("capacity exhausted: {0} bits")]
    CapacityExhausted(usize),
}

/// A specialized Result type for dynamic bit vector operations.
pub type Result<T> = std::result::Result<T, Error>;
