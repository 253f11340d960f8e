use skiff_blobs::BlobError;
use skiff_diff::DiffError;
use skiff_index::IndexError;

/// Errors from drive operations.
#[derive(Debug, thiserror::Error)]
pub enum DriveError {
    /// Error from the file index, propagated unchanged.
    #[error(transparent)]
    Index(#[from] IndexError),

    /// Error from the content store, propagated unchanged.
    #[error(transparent)]
    Blob(#[from] BlobError),

    /// Error from a diff walk, propagated unchanged.
    #[error(transparent)]
    Diff(#[from] DiffError),

    /// Operation invalid for this handle's mode.
    #[error("invalid operation for this handle: {0}")]
    InvalidState(&'static str),

    /// No writer has published a content store yet.
    #[error("content store not yet available")]
    ContentUnavailable,

    /// A streaming read was requested for a path with no entry.
    #[error("no entry at {0}")]
    EntryNotFound(String),

    /// A referenced content block is not locally available.
    #[error("content block {block} is not locally available")]
    MissingContent { block: u64 },

    /// The stream was aborted and accepts no further operations.
    #[error("stream aborted")]
    StreamAborted,
}

/// Result alias for drive operations.
pub type DriveResult<T> = Result<T, DriveError>;
