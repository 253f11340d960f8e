use skiff_store::StoreError;

/// Errors from file-index operations.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// Error from the underlying ordered store, propagated unchanged.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// An entry value could not be encoded or decoded.
    #[error("entry encoding error: {0}")]
    Encoding(String),

    /// The header record exists but does not hold a valid store identity.
    #[error("corrupt content header: expected 32 identity bytes, found {found}")]
    CorruptHeader { found: usize },
}

/// Result alias for index operations.
pub type IndexResult<T> = Result<T, IndexError>;
