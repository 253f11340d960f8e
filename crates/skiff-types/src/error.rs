/// Errors from foundation type construction.
#[derive(Debug, thiserror::Error)]
pub enum TypeError {
    /// A hex string could not be decoded.
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    /// An identity had the wrong byte length.
    #[error("invalid identity length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}
