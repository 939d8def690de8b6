//! Errors reported by [`OpenTable`](crate::OpenTable) operations.

use std::collections::TryReserveError;
use thiserror::Error;

/// Failure of a table operation. The table is left in its pre-call state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Every slot but the reserved free one is taken. Growth only runs once the
    /// load factor threshold is reached, so this is reported whenever the ceiling
    /// comes first.
    #[error("hash table is full ({capacity} slots)")]
    TableFull {
        /// Slot count of the table at the time of the failed insert
        capacity: usize,
    },
    /// The slot array could not be allocated.
    #[error("failed to allocate slot array: {0}")]
    Allocation(#[from] TryReserveError),
    /// Construction parameters are out of range.
    #[error("invalid table configuration: {0}")]
    InvalidConfig(&'static str),
}

/// Result alias for table operations.
pub type Result<T> = std::result::Result<T, Error>;
