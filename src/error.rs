//! Error type shared by every table operation.

use thiserror::Error;

/// Result type alias using [`TableError`].
pub type Result<T> = core::result::Result<T, TableError>;

/// Errors returned by table operations.
///
/// No operation retries internally and none leaves a partially applied
/// change behind: when an error is returned the table is byte-for-byte
/// what it was before the call.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TableError {
    /// Lookup or delete of a key that is not present.
    #[error("key not found: {key}")]
    KeyNotFound { key: u64 },

    /// A fixed-size table already holds `capacity` entries.
    #[error("table capacity exceeded: {capacity} entries")]
    CapacityExceeded { capacity: usize },

    /// Mutation attempted on a table marked read-only.
    #[error("table is read-only")]
    ReadOnly,

    /// The backing allocation could not be obtained. `bytes` is the size
    /// the allocator refused, or `None` when the size itself overflows
    /// `usize`.
    #[error("out of memory: {}", describe_request(.bytes))]
    OutOfMemory { bytes: Option<usize> },

    /// Attaching a borrowed view was refused.
    #[error("cannot attach to table at {address:#x}: {reason}")]
    Access {
        address: usize,
        reason: &'static str,
    },

    /// A raw table image or configuration is internally inconsistent.
    #[error("validation failed: {0}")]
    Validation(String),

    /// `pop_item` on a table with no entries.
    #[error("table is empty")]
    Empty,
}

fn describe_request(bytes: &Option<usize>) -> String {
    match bytes {
        Some(n) => format!("unable to allocate {} bytes", n),
        None => "requested size overflows usize".to_string(),
    }
}
