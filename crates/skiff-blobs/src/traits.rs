use std::sync::Arc;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};

use skiff_types::{BlobRef, StoreId};

use crate::error::BlobResult;

/// Default block size: 64 KiB.
pub const DEFAULT_BLOCK_SIZE: usize = 64 * 1024;

/// A contiguous run of blocks, used for prefetch requests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockRange {
    pub start: u64,
    pub length: u64,
}

impl BlockRange {
    pub fn new(start: u64, length: u64) -> Self {
        Self { start, length }
    }
}

impl From<BlobRef> for BlockRange {
    fn from(blob: BlobRef) -> Self {
        Self {
            start: blob.block_offset,
            length: blob.block_length,
        }
    }
}

/// Result of reclaiming stored blocks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClearOutcome {
    /// Number of blocks whose bytes were actually released.
    pub blocks: u64,
}

/// Append-only, block-addressed store for payload bytes.
///
/// All implementations must satisfy these invariants:
/// - Blocks are immutable once appended; indices are assigned sequentially.
/// - Appends come from a single logical writer and are never interleaved,
///   so a multi-block payload always occupies a contiguous range.
/// - Every block is at most [`block_size`](ContentStore::block_size) bytes;
///   only the final block of a payload may be shorter.
/// - Cleared or not-yet-replicated blocks read as `None`, never as an error.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// The store's identity, as published in the index header.
    fn id(&self) -> StoreId;

    /// Maximum bytes per block.
    fn block_size(&self) -> usize;

    /// Number of blocks appended so far (including cleared ones).
    fn block_count(&self) -> u64;

    /// Append one block and return its index.
    async fn append(&self, block: &[u8]) -> BlobResult<u64>;

    /// Read one block, or `None` if out of range or cleared.
    async fn block(&self, index: u64) -> BlobResult<Option<Bytes>>;

    /// Release the bytes of every block in `blob`'s range.
    ///
    /// The indices stay allocated (the log never shrinks); reads of cleared
    /// blocks yield `None` until the content is fetched again from a peer.
    async fn clear(&self, blob: &BlobRef) -> BlobResult<ClearOutcome>;

    /// Release the bytes of every block in the store.
    async fn clear_all(&self) -> BlobResult<ClearOutcome>;

    /// Best-effort prefetch of a block range from peers.
    ///
    /// Local backends hold everything already; the default is a no-op.
    async fn download(&self, _range: &BlockRange) -> BlobResult<()> {
        Ok(())
    }

    /// Append a whole payload, chunked to the block size.
    ///
    /// Returns `None` for an empty payload: zero-byte content has no blocks
    /// and is represented in the index by a null blob reference.
    async fn put(&self, data: &[u8]) -> BlobResult<Option<BlobRef>> {
        if data.is_empty() {
            return Ok(None);
        }
        let mut offset = None;
        let mut blocks = 0u64;
        for chunk in data.chunks(self.block_size()) {
            let index = self.append(chunk).await?;
            offset.get_or_insert(index);
            blocks += 1;
        }
        Ok(offset.map(|block_offset| BlobRef::new(block_offset, blocks)))
    }

    /// Read a whole payload back. `None` if any block is missing.
    async fn get(&self, blob: &BlobRef) -> BlobResult<Option<Bytes>> {
        let mut out = BytesMut::new();
        for index in blob.block_offset..blob.end() {
            match self.block(index).await? {
                Some(block) => out.extend_from_slice(&block),
                None => return Ok(None),
            }
        }
        Ok(Some(out.freeze()))
    }

    /// Release the store's resources. Idempotent.
    async fn close(&self) -> BlobResult<()> {
        Ok(())
    }
}

/// Resolves content-store identities to live handles.
///
/// Stands in for the store collection underneath a drive: a root writer
/// [`create`](ContentProvider::create)s a store with a fresh identity, while
/// readers [`open`](ContentProvider::open) the identity they found in the
/// index header. Opening an unknown identity yields an empty store that
/// fills as replication delivers blocks; it never fails.
#[async_trait]
pub trait ContentProvider: Send + Sync {
    /// Create a store under a fresh random identity.
    async fn create(&self) -> BlobResult<Arc<dyn ContentStore>>;

    /// Open the store with the given identity.
    async fn open(&self, id: StoreId) -> BlobResult<Arc<dyn ContentStore>>;
}
