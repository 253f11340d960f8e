use skiff_index::IndexError;

/// Errors from diff operations.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// Error from the underlying index, propagated unchanged.
    #[error(transparent)]
    Index(#[from] IndexError),
}

/// Result alias for diff operations.
pub type DiffResult<T> = Result<T, DiffError>;
