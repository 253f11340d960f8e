//! File-index entry types.

use serde::{Deserialize, Serialize};

/// Reference to a contiguous run of blocks in the content store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobRef {
    /// Index of the first block.
    pub block_offset: u64,
    /// Number of blocks.
    pub block_length: u64,
}

impl BlobRef {
    /// Create a new blob reference.
    pub fn new(block_offset: u64, block_length: u64) -> Self {
        Self {
            block_offset,
            block_length,
        }
    }

    /// Index one past the last referenced block.
    pub fn end(&self) -> u64 {
        self.block_offset + self.block_length
    }

    /// Returns `true` if the reference covers no blocks.
    pub fn is_empty(&self) -> bool {
        self.block_length == 0
    }
}

/// A single entry in the file index.
///
/// Invariants:
/// - A symlink has `linkname` set and `blob == None`.
/// - A regular file has `linkname == None`; `blob == None` on a regular file
///   represents zero-byte content, not absence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Whether the file carries the executable bit.
    pub executable: bool,
    /// Symlink target, if this entry is a symlink.
    pub linkname: Option<String>,
    /// Content pointer into the content store, if any bytes are stored.
    pub blob: Option<BlobRef>,
    /// Opaque caller-provided metadata.
    pub metadata: Option<serde_json::Value>,
}

impl FileEntry {
    /// Create a regular-file entry pointing at the given blocks.
    ///
    /// `None` represents a zero-byte file.
    pub fn file(blob: Option<BlobRef>) -> Self {
        Self {
            executable: false,
            linkname: None,
            blob,
            metadata: None,
        }
    }

    /// Create a symlink entry targeting `linkname`.
    pub fn symlink(linkname: impl Into<String>) -> Self {
        Self {
            executable: false,
            linkname: Some(linkname.into()),
            blob: None,
            metadata: None,
        }
    }

    /// Set the executable bit.
    pub fn with_executable(mut self, executable: bool) -> Self {
        self.executable = executable;
        self
    }

    /// Attach opaque metadata.
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Returns `true` if this entry is a symlink.
    pub fn is_symlink(&self) -> bool {
        self.linkname.is_some()
    }
}
