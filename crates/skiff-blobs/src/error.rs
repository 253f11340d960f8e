/// Errors from content-store operations.
#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    /// Operation attempted after the store was closed.
    #[error("content store is closed")]
    Closed,

    /// A block larger than the store's block size was appended.
    #[error("block of {size} bytes exceeds the block size of {max}")]
    OversizedBlock { size: usize, max: usize },

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for content-store operations.
pub type BlobResult<T> = Result<T, BlobError>;
