//! Staged index writes with explicit flush/discard.

use std::sync::Arc;

use skiff_store::{OrderedStore, StoreBatch};
use skiff_types::{normalize, FileEntry, Version};

use crate::error::IndexResult;
use crate::index::{decode_entry, encode_entry};
use crate::keys::{entry_key, entry_path};

/// Staged writes over a live index.
///
/// Writes inside the batch are visible to its own reads but invisible
/// externally until [`flush`](IndexBatch::flush), which commits them
/// atomically in call order (a later write to the same path winning).
/// Dropping the batch, or calling [`discard`](IndexBatch::discard), has zero
/// external effect; committing is always an explicit act.
pub struct IndexBatch {
    inner: StoreBatch,
}

impl IndexBatch {
    pub(crate) fn new(store: Arc<dyn OrderedStore>) -> Self {
        Self {
            inner: StoreBatch::new(store),
        }
    }

    /// Read `path` through the batch: staged state first, then the live index.
    pub async fn get(&self, path: &str) -> IndexResult<Option<FileEntry>> {
        let key = entry_key(&normalize(path));
        match self.inner.get(&key).await? {
            None => Ok(None),
            Some(raw) => decode_entry(&raw).map(Some),
        }
    }

    /// Stage an insert or overwrite at `path`.
    pub fn put(&mut self, path: &str, entry: &FileEntry) -> IndexResult<()> {
        let key = entry_key(&normalize(path));
        let value = encode_entry(entry)?;
        self.inner.put(key, value);
        Ok(())
    }

    /// Stage a delete at `path`.
    pub fn del(&mut self, path: &str) {
        let key = entry_key(&normalize(path));
        self.inner.del(key);
    }

    /// The canonical paths touched so far, in call order.
    pub fn touched_paths(&self) -> Vec<String> {
        self.inner
            .ops()
            .iter()
            .filter_map(|op| entry_path(op.key()))
            .collect()
    }

    /// Number of staged operations.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns `true` if nothing is staged.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Commit every staged write atomically. Returns the version after the
    /// last write.
    pub async fn flush(self) -> IndexResult<Version> {
        let version = self.inner.flush().await?;
        Ok(version)
    }

    /// Drop the batch without committing anything.
    pub fn discard(self) {}
}
