//! In-memory content store and provider.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use skiff_types::{BlobRef, StoreId};

use crate::error::{BlobError, BlobResult};
use crate::traits::{ClearOutcome, ContentProvider, ContentStore, DEFAULT_BLOCK_SIZE};

#[derive(Default)]
struct BlockLog {
    /// Appended blocks; `None` marks a cleared block.
    blocks: Vec<Option<Bytes>>,
    closed: bool,
}

/// In-memory, append-only block store for tests and embedding.
///
/// Blocks are held in a `Vec` behind a `RwLock`; clearing a block releases
/// its bytes but keeps the index allocated, mirroring an append-only log
/// whose history never renumbers.
pub struct MemoryContentStore {
    id: StoreId,
    block_size: usize,
    log: RwLock<BlockLog>,
}

impl MemoryContentStore {
    /// Create a store under a fresh random identity.
    pub fn new() -> Self {
        Self::with_id(StoreId::random())
    }

    /// Create a store under a specific identity.
    pub fn with_id(id: StoreId) -> Self {
        Self {
            id,
            block_size: DEFAULT_BLOCK_SIZE,
            log: RwLock::new(BlockLog::default()),
        }
    }

    /// Override the block size (useful to exercise chunking in tests).
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        assert!(block_size > 0, "block size must be positive");
        self.block_size = block_size;
        self
    }

    /// Total bytes currently held (cleared blocks excluded).
    pub fn total_bytes(&self) -> u64 {
        let log = self.log.read().expect("lock poisoned");
        log.blocks
            .iter()
            .flatten()
            .map(|block| block.len() as u64)
            .sum()
    }
}

impl Default for MemoryContentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryContentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryContentStore")
            .field("id", &self.id)
            .field("blocks", &self.block_count())
            .finish()
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    fn id(&self) -> StoreId {
        self.id
    }

    fn block_size(&self) -> usize {
        self.block_size
    }

    fn block_count(&self) -> u64 {
        self.log.read().expect("lock poisoned").blocks.len() as u64
    }

    async fn append(&self, block: &[u8]) -> BlobResult<u64> {
        if block.len() > self.block_size {
            return Err(BlobError::OversizedBlock {
                size: block.len(),
                max: self.block_size,
            });
        }
        let mut log = self.log.write().expect("lock poisoned");
        if log.closed {
            return Err(BlobError::Closed);
        }
        let index = log.blocks.len() as u64;
        log.blocks.push(Some(Bytes::copy_from_slice(block)));
        Ok(index)
    }

    async fn block(&self, index: u64) -> BlobResult<Option<Bytes>> {
        let log = self.log.read().expect("lock poisoned");
        if log.closed {
            return Err(BlobError::Closed);
        }
        Ok(log.blocks.get(index as usize).cloned().flatten())
    }

    async fn clear(&self, blob: &BlobRef) -> BlobResult<ClearOutcome> {
        let mut log = self.log.write().expect("lock poisoned");
        if log.closed {
            return Err(BlobError::Closed);
        }
        let end = (blob.end() as usize).min(log.blocks.len());
        let start = (blob.block_offset as usize).min(end);

        let mut cleared = 0u64;
        for slot in &mut log.blocks[start..end] {
            if slot.take().is_some() {
                cleared += 1;
            }
        }
        debug!(id = %self.id.short_hex(), blocks = cleared, "cleared blob blocks");
        Ok(ClearOutcome { blocks: cleared })
    }

    async fn clear_all(&self) -> BlobResult<ClearOutcome> {
        let count = self.block_count();
        self.clear(&BlobRef::new(0, count)).await
    }

    async fn close(&self) -> BlobResult<()> {
        let mut log = self.log.write().expect("lock poisoned");
        log.closed = true;
        log.blocks.clear();
        Ok(())
    }
}

/// In-memory content provider: a registry of stores by identity.
///
/// Opening an identity that no store carries yet yields a fresh empty store
/// under that identity, standing in for a store whose blocks replicate in
/// later. Opening the same identity twice yields the same handle.
pub struct MemoryContentProvider {
    block_size: usize,
    stores: RwLock<HashMap<StoreId, Arc<MemoryContentStore>>>,
}

impl MemoryContentProvider {
    /// Create an empty provider.
    pub fn new() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            stores: RwLock::new(HashMap::new()),
        }
    }

    /// Override the block size for every store this provider creates.
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        assert!(block_size > 0, "block size must be positive");
        self.block_size = block_size;
        self
    }

    /// Number of stores the provider currently tracks.
    pub fn len(&self) -> usize {
        self.stores.read().expect("lock poisoned").len()
    }

    /// Returns `true` if no stores are tracked.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryContentProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentProvider for MemoryContentProvider {
    async fn create(&self) -> BlobResult<Arc<dyn ContentStore>> {
        let store =
            Arc::new(MemoryContentStore::new().with_block_size(self.block_size));
        let id = store.id();
        self.stores
            .write()
            .expect("lock poisoned")
            .insert(id, Arc::clone(&store));
        debug!(id = %id.short_hex(), "content store created");
        Ok(store)
    }

    async fn open(&self, id: StoreId) -> BlobResult<Arc<dyn ContentStore>> {
        let mut stores = self.stores.write().expect("lock poisoned");
        let store = stores.entry(id).or_insert_with(|| {
            debug!(id = %id.short_hex(), "content store opened empty, awaiting replication");
            Arc::new(MemoryContentStore::with_id(id).with_block_size(self.block_size))
        });
        let store = Arc::clone(store);
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -----------------------------------------------------------------------
    // Append / read
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn append_assigns_sequential_indices() {
        let store = MemoryContentStore::new();
        assert_eq!(store.append(b"one").await.unwrap(), 0);
        assert_eq!(store.append(b"two").await.unwrap(), 1);
        assert_eq!(store.block_count(), 2);
    }

    #[tokio::test]
    async fn block_read_roundtrip() {
        let store = MemoryContentStore::new();
        store.append(b"payload").await.unwrap();
        assert_eq!(
            store.block(0).await.unwrap(),
            Some(Bytes::from_static(b"payload"))
        );
    }

    #[tokio::test]
    async fn out_of_range_block_is_none() {
        let store = MemoryContentStore::new();
        assert!(store.block(7).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn oversized_block_is_rejected() {
        let store = MemoryContentStore::new().with_block_size(4);
        let err = store.append(b"too big").await.unwrap_err();
        assert!(matches!(err, BlobError::OversizedBlock { size: 7, max: 4 }));
    }

    // -----------------------------------------------------------------------
    // Whole-payload put/get
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn put_chunks_to_block_size() {
        let store = MemoryContentStore::new().with_block_size(4);
        let blob = store.put(b"0123456789").await.unwrap().unwrap();
        assert_eq!(blob, BlobRef::new(0, 3));
        assert_eq!(
            store.get(&blob).await.unwrap(),
            Some(Bytes::from_static(b"0123456789"))
        );
    }

    #[tokio::test]
    async fn put_empty_payload_is_none() {
        let store = MemoryContentStore::new();
        assert!(store.put(b"").await.unwrap().is_none());
        assert_eq!(store.block_count(), 0);
    }

    #[tokio::test]
    async fn sequential_puts_are_contiguous() {
        let store = MemoryContentStore::new().with_block_size(2);
        let first = store.put(b"aaaa").await.unwrap().unwrap();
        let second = store.put(b"bb").await.unwrap().unwrap();
        assert_eq!(first, BlobRef::new(0, 2));
        assert_eq!(second, BlobRef::new(2, 1));
    }

    // -----------------------------------------------------------------------
    // Clearing
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn clear_releases_blocks_but_keeps_indices() {
        let store = MemoryContentStore::new().with_block_size(2);
        let blob = store.put(b"abcdef").await.unwrap().unwrap();

        let outcome = store.clear(&blob).await.unwrap();
        assert_eq!(outcome.blocks, 3);
        assert_eq!(store.block_count(), 3);
        assert!(store.get(&blob).await.unwrap().is_none());

        // Clearing again reclaims nothing further.
        let again = store.clear(&blob).await.unwrap();
        assert_eq!(again.blocks, 0);
    }

    #[tokio::test]
    async fn clear_tolerates_out_of_range() {
        let store = MemoryContentStore::new();
        store.put(b"x").await.unwrap();
        let outcome = store.clear(&BlobRef::new(10, 5)).await.unwrap();
        assert_eq!(outcome.blocks, 0);
    }

    #[tokio::test]
    async fn clear_all_releases_everything() {
        let store = MemoryContentStore::new().with_block_size(2);
        store.put(b"abcdef").await.unwrap();
        store.put(b"gh").await.unwrap();

        let outcome = store.clear_all().await.unwrap();
        assert_eq!(outcome.blocks, 4);
        assert_eq!(store.total_bytes(), 0);
    }

    #[tokio::test]
    async fn partial_clear_breaks_payload_reads() {
        let store = MemoryContentStore::new().with_block_size(2);
        let blob = store.put(b"abcdef").await.unwrap().unwrap();
        store
            .clear(&BlobRef::new(blob.block_offset + 1, 1))
            .await
            .unwrap();
        assert!(store.get(&blob).await.unwrap().is_none());
        // The untouched blocks still read individually.
        assert!(store.block(blob.block_offset).await.unwrap().is_some());
    }

    // -----------------------------------------------------------------------
    // Close
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn close_rejects_further_operations() {
        let store = MemoryContentStore::new();
        store.put(b"data").await.unwrap();
        store.close().await.unwrap();
        assert!(matches!(
            store.block(0).await.unwrap_err(),
            BlobError::Closed
        ));
        assert!(matches!(
            store.append(b"more").await.unwrap_err(),
            BlobError::Closed
        ));
    }

    // -----------------------------------------------------------------------
    // Provider
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn create_registers_store() {
        let provider = MemoryContentProvider::new();
        let store = provider.create().await.unwrap();
        assert_eq!(provider.len(), 1);

        let reopened = provider.open(store.id()).await.unwrap();
        assert_eq!(reopened.id(), store.id());
    }

    #[tokio::test]
    async fn open_unknown_id_yields_empty_store() {
        let provider = MemoryContentProvider::new();
        let id = StoreId::random();
        let store = provider.open(id).await.unwrap();
        assert_eq!(store.id(), id);
        assert_eq!(store.block_count(), 0);
    }

    #[tokio::test]
    async fn open_twice_yields_same_store() {
        let provider = MemoryContentProvider::new();
        let id = StoreId::random();
        let first = provider.open(id).await.unwrap();
        first.append(b"shared").await.unwrap();

        let second = provider.open(id).await.unwrap();
        assert_eq!(second.block_count(), 1);
    }

    #[tokio::test]
    async fn download_is_a_local_noop() {
        let store = MemoryContentStore::new();
        store
            .download(&crate::traits::BlockRange::new(0, 100))
            .await
            .unwrap();
    }
}
