//! The file index: ordered path→entry mapping over an ordered store.

use std::sync::Arc;

use tracing::debug;

use skiff_store::{KeyCursor, OrderedStore, RawEntry, ScanDirection};
use skiff_types::{normalize, FileEntry, StoreId, Version};

use crate::batch::IndexBatch;
use crate::error::{IndexError, IndexResult};
use crate::keys::{entry_key, entry_path, HEADER_KEY};
use crate::traversal::{PathBounds, ShallowCursor};

/// Ordered mapping from canonical paths to [`FileEntry`] values.
///
/// A thin, cloneable view over an [`OrderedStore`]: every handle shares the
/// store, and whether the view is live, pinned, or read-only is the store
/// handle's property. Paths are normalized at every entry point.
#[derive(Clone)]
pub struct FileIndex {
    store: Arc<dyn OrderedStore>,
}

impl std::fmt::Debug for FileIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileIndex")
            .field("version", &self.version())
            .field("writable", &self.writable())
            .finish()
    }
}

impl FileIndex {
    /// Create an index view over the given store.
    pub fn new(store: Arc<dyn OrderedStore>) -> Self {
        Self { store }
    }

    /// The underlying ordered store.
    pub fn store(&self) -> &Arc<dyn OrderedStore> {
        &self.store
    }

    /// The index version.
    pub fn version(&self) -> Version {
        self.store.version()
    }

    /// Whether this view accepts writes.
    pub fn writable(&self) -> bool {
        self.store.writable()
    }

    // ---------------------------------------------------------------
    // Entry operations
    // ---------------------------------------------------------------

    /// The entry at `path`, or `None` if absent.
    pub async fn get(&self, path: &str) -> IndexResult<Option<FileEntry>> {
        let key = entry_key(&normalize(path));
        match self.store.get(&key).await? {
            None => Ok(None),
            Some(raw) => decode_entry(&raw).map(Some),
        }
    }

    /// Insert or overwrite the entry at `path`. Returns the new version.
    pub async fn put(&self, path: &str, entry: &FileEntry) -> IndexResult<Version> {
        let path = normalize(path);
        let value = encode_entry(entry)?;
        let version = self.store.put(&entry_key(&path), &value).await?;
        debug!(%path, %version, "index entry written");
        Ok(version)
    }

    /// Remove the entry at `path`. Succeeds even if absent.
    pub async fn del(&self, path: &str) -> IndexResult<Version> {
        let path = normalize(path);
        let version = self.store.del(&entry_key(&path)).await?;
        debug!(%path, %version, "index entry deleted");
        Ok(version)
    }

    // ---------------------------------------------------------------
    // Range operations
    // ---------------------------------------------------------------

    /// The first entry inside `bounds`, or `None` if the range is empty.
    ///
    /// One store `peek`: `O(log n + 1)` regardless of the range's population.
    pub async fn peek(
        &self,
        bounds: &PathBounds,
        direction: ScanDirection,
    ) -> IndexResult<Option<(String, FileEntry)>> {
        match self.store.peek(&bounds.to_key_bounds(), direction).await? {
            None => Ok(None),
            Some(raw) => decode_raw(raw).map(Some),
        }
    }

    /// Lazy cursor over every entry inside `bounds`.
    pub fn entries(&self, bounds: PathBounds, direction: ScanDirection) -> EntryCursor {
        EntryCursor {
            inner: KeyCursor::new(Arc::clone(&self.store), bounds.to_key_bounds(), direction),
        }
    }

    /// Every descendant of `folder`, at any depth, in path order.
    pub fn list(&self, folder: &str) -> EntryCursor {
        self.entries(PathBounds::subtree(folder), ScanDirection::Forward)
    }

    /// The immediate children of `folder`, one `peek` per child.
    pub fn shallow(&self, folder: &str) -> ShallowCursor {
        ShallowCursor::new(self.clone(), folder)
    }

    // ---------------------------------------------------------------
    // Versioning
    // ---------------------------------------------------------------

    /// A read-only snapshot of the index at `version`.
    pub async fn checkout(&self, version: Version) -> IndexResult<FileIndex> {
        let store = self.store.checkout(version).await?;
        Ok(FileIndex::new(store))
    }

    /// A staged batch over this index. Nothing is externally visible until
    /// [`IndexBatch::flush`]; dropping the batch discards it.
    pub fn batch(&self) -> IndexBatch {
        IndexBatch::new(Arc::clone(&self.store))
    }

    // ---------------------------------------------------------------
    // Header record
    // ---------------------------------------------------------------

    /// The content-store identity from the header record.
    ///
    /// `None` while no writer has published one; readers treat that as
    /// "content store not yet available", never as an error.
    pub async fn content_header(&self) -> IndexResult<Option<StoreId>> {
        match self.store.get(HEADER_KEY).await? {
            None => Ok(None),
            Some(raw) => {
                let id = StoreId::from_slice(&raw)
                    .map_err(|_| IndexError::CorruptHeader { found: raw.len() })?;
                Ok(Some(id))
            }
        }
    }

    /// Publish the content-store identity into the header record.
    pub async fn set_content_header(&self, id: StoreId) -> IndexResult<Version> {
        let version = self.store.put(HEADER_KEY, id.as_bytes()).await?;
        debug!(id = %id.short_hex(), "content header published");
        Ok(version)
    }

    /// Release the underlying store.
    pub async fn close(&self) -> IndexResult<()> {
        self.store.close().await?;
        Ok(())
    }
}

/// Lazy ordered cursor over decoded index entries.
pub struct EntryCursor {
    inner: KeyCursor,
}

impl EntryCursor {
    /// The next `(path, entry)` pair, or `None` when the range is exhausted.
    pub async fn next(&mut self) -> IndexResult<Option<(String, FileEntry)>> {
        match self.inner.next().await? {
            None => Ok(None),
            Some(raw) => decode_raw(raw).map(Some),
        }
    }

    /// Drain the cursor into a vector.
    pub async fn collect(mut self) -> IndexResult<Vec<(String, FileEntry)>> {
        let mut out = Vec::new();
        while let Some(pair) = self.next().await? {
            out.push(pair);
        }
        Ok(out)
    }
}

pub(crate) fn encode_entry(entry: &FileEntry) -> IndexResult<Vec<u8>> {
    serde_json::to_vec(entry).map_err(|e| IndexError::Encoding(e.to_string()))
}

pub(crate) fn decode_entry(raw: &[u8]) -> IndexResult<FileEntry> {
    serde_json::from_slice(raw).map_err(|e| IndexError::Encoding(e.to_string()))
}

fn decode_raw(raw: RawEntry) -> IndexResult<(String, FileEntry)> {
    let path = entry_path(&raw.key)
        .ok_or_else(|| IndexError::Encoding("entry key is not valid UTF-8".into()))?;
    let entry = decode_entry(&raw.value)?;
    Ok((path, entry))
}
