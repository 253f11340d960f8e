/// Errors from ordered-store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Write attempted on a read-only view (checkout or reader).
    #[error("store is read-only")]
    ReadOnly,

    /// Operation attempted after the store was closed.
    #[error("store is closed")]
    Closed,

    /// Checkout requested for a version the store has never reached.
    #[error("unknown version {requested} (current version is {current})")]
    UnknownVersion { requested: u64, current: u64 },

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
