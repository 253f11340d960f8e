//! The top-level drive handle.

use std::sync::Arc;

use bytes::Bytes;
use tokio::task::JoinSet;
use tracing::{debug, info};

use skiff_blobs::{BlockRange, ClearOutcome, ContentProvider, ContentStore};
use skiff_diff::{DiffCursor, Watch, WatchHub};
use skiff_index::{EntryCursor, FileIndex, IndexBatch, PathBounds, ShallowCursor};
use skiff_store::{OrderedStore, ScanDirection};
use skiff_types::{normalize, FileEntry, StoreId, Version};

use crate::config::DriveConfig;
use crate::error::{DriveError, DriveResult};
use crate::router::ContentRouter;
use crate::streams::{ByteRange, PutOptions, ReadStream, WriteStream};

/// What a drive handle is allowed to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriveMode {
    /// The originating handle: writable (if its store is), owns teardown.
    Root,
    /// A version-pinned, read-only view derived from a root.
    Checkout,
}

/// A versioned, path-addressable drive.
///
/// Composes one [`FileIndex`] view with one lazily-resolved content store.
/// Checkouts share the root's [`ContentRouter`] and watch hub by reference,
/// so the content store is discovered or created exactly once per root no
/// matter how many handles derive from it.
pub struct Drive {
    index: FileIndex,
    router: Arc<ContentRouter>,
    hub: Arc<WatchHub>,
    mode: DriveMode,
}

impl std::fmt::Debug for Drive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Drive")
            .field("version", &self.version())
            .field("mode", &self.mode)
            .finish()
    }
}

impl Drive {
    /// Open a root drive over an ordered store and a content provider.
    pub fn open(store: Arc<dyn OrderedStore>, provider: Arc<dyn ContentProvider>) -> Drive {
        Self::open_with(store, provider, DriveConfig::default())
    }

    /// Open a root drive with explicit configuration.
    pub fn open_with(
        store: Arc<dyn OrderedStore>,
        provider: Arc<dyn ContentProvider>,
        config: DriveConfig,
    ) -> Drive {
        let index = FileIndex::new(store);
        let router = Arc::new(ContentRouter::new(index.clone(), provider));
        info!(
            version = %index.version(),
            writable = index.writable(),
            "drive opened"
        );
        Drive {
            index,
            router,
            hub: Arc::new(WatchHub::new(config.watch_capacity)),
            mode: DriveMode::Root,
        }
    }

    /// The current index version (pinned, for a checkout).
    pub fn version(&self) -> Version {
        self.index.version()
    }

    /// This handle's mode.
    pub fn mode(&self) -> DriveMode {
        self.mode
    }

    /// Whether writes are accepted through this handle.
    pub fn writable(&self) -> bool {
        self.mode == DriveMode::Root && self.index.writable()
    }

    /// The underlying index view.
    pub fn index(&self) -> &FileIndex {
        &self.index
    }

    /// The shared content-store router.
    pub fn router(&self) -> &Arc<ContentRouter> {
        &self.router
    }

    /// The content store's identity, once resolved.
    pub fn content_id(&self) -> Option<StoreId> {
        self.router.content_id()
    }

    fn ensure_writable(&self) -> DriveResult<()> {
        if self.mode == DriveMode::Checkout {
            return Err(DriveError::InvalidState("checkouts are read-only"));
        }
        if !self.index.writable() {
            return Err(DriveError::InvalidState("drive is not writable"));
        }
        Ok(())
    }

    // ---------------------------------------------------------------
    // Entries
    // ---------------------------------------------------------------

    /// The entry at `path`, or `None` if absent.
    pub async fn entry(&self, path: &str) -> DriveResult<Option<FileEntry>> {
        Ok(self.index.get(path).await?)
    }

    /// Returns `true` if an entry exists at `path`.
    pub async fn exists(&self, path: &str) -> DriveResult<bool> {
        Ok(self.entry(path).await?.is_some())
    }

    /// The payload bytes of the regular file at `path`.
    ///
    /// `None` for a missing entry or a symlink. A blob-less regular file
    /// reads as empty bytes; content that is referenced but not locally
    /// available reads as `None`.
    pub async fn get(&self, path: &str) -> DriveResult<Option<Bytes>> {
        let Some(entry) = self.index.get(path).await? else {
            return Ok(None);
        };
        if entry.is_symlink() {
            return Ok(None);
        }
        let Some(blob) = entry.blob else {
            return Ok(Some(Bytes::new()));
        };
        let content = self.router.require().await?;
        Ok(content.get(&blob).await?)
    }

    /// Write `data` as a regular file at `path`. Returns the new version.
    pub async fn put(&self, path: &str, data: &[u8]) -> DriveResult<Version> {
        self.put_with(path, data, PutOptions::default()).await
    }

    /// Write `data` at `path` with explicit entry options.
    pub async fn put_with(
        &self,
        path: &str,
        data: &[u8],
        options: PutOptions,
    ) -> DriveResult<Version> {
        self.ensure_writable()?;
        let path = normalize(path);

        let content = self.router.require().await?;
        let blob = content.put(data).await?;

        let entry = FileEntry {
            executable: options.executable,
            linkname: None,
            blob,
            metadata: options.metadata,
        };
        let version = self.index.put(&path, &entry).await?;
        self.hub.publish(&path, version);
        Ok(version)
    }

    /// Remove the entry at `path`. Succeeds even if absent; the backing
    /// blocks are not reclaimed (see [`clear`](Drive::clear)).
    pub async fn del(&self, path: &str) -> DriveResult<Version> {
        self.ensure_writable()?;
        let path = normalize(path);
        let version = self.index.del(&path).await?;
        self.hub.publish(&path, version);
        Ok(version)
    }

    /// Create a symlink at `path` targeting `target`.
    pub async fn symlink(&self, path: &str, target: &str) -> DriveResult<Version> {
        self.ensure_writable()?;
        let path = normalize(path);
        let version = self.index.put(&path, &FileEntry::symlink(target)).await?;
        self.hub.publish(&path, version);
        Ok(version)
    }

    // ---------------------------------------------------------------
    // Streaming
    // ---------------------------------------------------------------

    /// A pull-based reader over the payload at `path`.
    ///
    /// An entry without payload (zero-byte file, symlink) yields an empty
    /// stream; a missing entry is an error, since a stream cannot represent
    /// absence.
    pub async fn read_stream(&self, path: &str) -> DriveResult<ReadStream> {
        self.read_stream_range(path, ByteRange::default()).await
    }

    /// A pull-based reader over a byte range of the payload at `path`.
    pub async fn read_stream_range(
        &self,
        path: &str,
        range: ByteRange,
    ) -> DriveResult<ReadStream> {
        let path = normalize(path);
        let Some(entry) = self.index.get(&path).await? else {
            return Err(DriveError::EntryNotFound(path));
        };
        let Some(blob) = entry.blob else {
            return Ok(ReadStream::empty());
        };
        let content = self.router.require().await?;
        Ok(ReadStream::new(content, blob, range))
    }

    /// A streaming writer that registers its entry at `path` on completion.
    pub async fn write_stream(&self, path: &str, options: PutOptions) -> DriveResult<WriteStream> {
        self.ensure_writable()?;
        let content = self.router.require().await?;
        Ok(WriteStream::new(
            self.index.clone(),
            content,
            Arc::clone(&self.hub),
            normalize(path),
            options,
        ))
    }

    // ---------------------------------------------------------------
    // Listing
    // ---------------------------------------------------------------

    /// Every descendant of `folder`, at any depth, in path order.
    pub fn list(&self, folder: &str) -> EntryCursor {
        self.index.list(folder)
    }

    /// The immediate children of `folder` as `(name, entry)` pairs.
    pub fn list_shallow(&self, folder: &str) -> ShallowCursor {
        self.index.shallow(folder)
    }

    /// Entries inside explicit bounds, for advanced callers.
    pub fn entries(&self, bounds: PathBounds) -> EntryCursor {
        self.index.entries(bounds, ScanDirection::Forward)
    }

    /// The names of `folder`'s immediate children.
    pub async fn readdir(&self, folder: &str) -> DriveResult<Vec<String>> {
        Ok(self.index.shallow(folder).collect_names().await?)
    }

    // ---------------------------------------------------------------
    // Versioning
    // ---------------------------------------------------------------

    /// A read-only drive pinned to `version`.
    ///
    /// Shares (never creates) this drive's content store; a checkout may
    /// trigger lazy discovery through the shared router, but only the root
    /// ever creates.
    pub async fn checkout(&self, version: Version) -> DriveResult<Drive> {
        let index = self.index.checkout(version).await?;
        debug!(%version, "checkout created");
        Ok(Drive {
            index,
            router: Arc::clone(&self.router),
            hub: Arc::clone(&self.hub),
            mode: DriveMode::Checkout,
        })
    }

    /// A staged writable handle over this drive.
    pub fn batch(&self) -> DriveResult<DriveBatch> {
        self.ensure_writable()?;
        Ok(DriveBatch {
            staged: self.index.batch(),
            router: Arc::clone(&self.router),
            hub: Arc::clone(&self.hub),
        })
    }

    // ---------------------------------------------------------------
    // Diff and watch
    // ---------------------------------------------------------------

    /// Lazy diff of the live index against its state at `since`, optionally
    /// bounded to a folder subtree.
    pub async fn diff(&self, since: Version, folder: Option<&str>) -> DriveResult<DiffCursor> {
        let old = self.index.checkout(since).await?;
        let bounds = folder.map(PathBounds::subtree).unwrap_or_default();
        Ok(DiffCursor::new(&old, &self.index, bounds))
    }

    /// Subscribe to changes under `folder`.
    ///
    /// Notifications are range-scoped: a change is delivered only when the
    /// changed path falls inside the watched subtree.
    pub fn watch(&self, folder: &str) -> Watch {
        self.hub.subscribe(PathBounds::subtree(folder))
    }

    // ---------------------------------------------------------------
    // Bulk prefetch
    // ---------------------------------------------------------------

    /// Prefetch the payload of every entry under `folder`, in parallel.
    ///
    /// Best-effort: completion means every sub-fetch settled; individual
    /// failures are logged and do not fail the call.
    pub async fn download(&self, folder: &str) -> DriveResult<()> {
        let mut cursor = self.list(folder);
        let mut downloads = JoinSet::new();
        let mut content: Option<Arc<dyn ContentStore>> = None;

        while let Some((_, entry)) = cursor.next().await? {
            let Some(blob) = entry.blob else { continue };
            let store = match &content {
                Some(store) => Arc::clone(store),
                None => {
                    let store = self.router.require().await?;
                    content = Some(Arc::clone(&store));
                    store
                }
            };
            downloads.spawn(async move {
                if let Err(err) = store.download(&BlockRange::from(blob)).await {
                    debug!(error = %err, "blob prefetch failed");
                }
            });
        }

        settle(downloads).await;
        Ok(())
    }

    /// Prefetch the payload of every entry that changed since `since`.
    pub async fn download_diff(&self, since: Version, folder: Option<&str>) -> DriveResult<()> {
        let mut cursor = self.diff(since, folder).await?;
        let mut downloads = JoinSet::new();
        let mut content: Option<Arc<dyn ContentStore>> = None;

        while let Some(change) = cursor.next().await? {
            let Some(blob) = change.after.and_then(|entry| entry.blob) else {
                continue;
            };
            let store = match &content {
                Some(store) => Arc::clone(store),
                None => {
                    let store = self.router.require().await?;
                    content = Some(Arc::clone(&store));
                    store
                }
            };
            downloads.spawn(async move {
                if let Err(err) = store.download(&BlockRange::from(blob)).await {
                    debug!(error = %err, "blob prefetch failed");
                }
            });
        }

        settle(downloads).await;
        Ok(())
    }

    /// Prefetch explicit index and blob ranges, in parallel.
    pub async fn download_range(
        &self,
        index_ranges: &[PathBounds],
        blob_ranges: &[BlockRange],
    ) -> DriveResult<()> {
        let mut downloads = JoinSet::new();

        for bounds in index_ranges {
            let store = Arc::clone(self.index.store());
            let bounds = bounds.to_key_bounds();
            downloads.spawn(async move {
                if let Err(err) = store.prefetch(&bounds).await {
                    debug!(error = %err, "index prefetch failed");
                }
            });
        }

        if !blob_ranges.is_empty() {
            let content = self.router.require().await?;
            for range in blob_ranges {
                let store = Arc::clone(&content);
                let range = *range;
                downloads.spawn(async move {
                    if let Err(err) = store.download(&range).await {
                        debug!(error = %err, "blob prefetch failed");
                    }
                });
            }
        }

        settle(downloads).await;
        Ok(())
    }

    // ---------------------------------------------------------------
    // Storage reclamation and teardown
    // ---------------------------------------------------------------

    /// Reclaim the content blocks behind the entry at `path`.
    ///
    /// The entry itself is untouched; deletion and reclamation are
    /// deliberately decoupled. `None` if there is no entry, no payload, or
    /// no content store yet.
    pub async fn clear(&self, path: &str) -> DriveResult<Option<ClearOutcome>> {
        let Some(entry) = self.entry(path).await? else {
            return Ok(None);
        };
        let Some(blob) = entry.blob else {
            return Ok(None);
        };
        match self.router.resolve().await? {
            None => Ok(None),
            Some(content) => Ok(Some(content.clear(&blob).await?)),
        }
    }

    /// Reclaim every content block in the store. Root only.
    pub async fn clear_all(&self) -> DriveResult<Option<ClearOutcome>> {
        if self.mode != DriveMode::Root {
            return Err(DriveError::InvalidState(
                "whole-store reclamation requires the root handle",
            ));
        }
        match self.router.resolve().await? {
            None => Ok(None),
            Some(content) => Ok(Some(content.clear_all().await?)),
        }
    }

    /// Reclaim all storage and tear the drive down. Root only.
    pub async fn purge(&self) -> DriveResult<()> {
        if self.mode != DriveMode::Root {
            return Err(DriveError::InvalidState("purge requires the root handle"));
        }
        if let Some(content) = self.router.resolve().await? {
            content.clear_all().await?;
            content.close().await?;
        }
        self.index.close().await?;
        info!("drive purged");
        Ok(())
    }

    /// Release this handle's resources.
    ///
    /// Closing a checkout never affects its origin. Closing the root
    /// releases the content store and the index store; release errors are
    /// logged and swallowed so teardown always completes.
    pub async fn close(&self) {
        if self.mode == DriveMode::Checkout {
            debug!("checkout closed");
            return;
        }
        if let Some(content) = self.router.resolved() {
            if let Err(err) = content.close().await {
                debug!(error = %err, "content store release failed");
            }
        }
        if let Err(err) = self.index.close().await {
            debug!(error = %err, "index release failed");
        }
        info!("drive closed");
    }
}

/// Await every spawned prefetch; failures were already logged in-task.
async fn settle(mut downloads: JoinSet<()>) {
    while let Some(result) = downloads.join_next().await {
        if let Err(err) = result {
            debug!(error = %err, "prefetch task panicked");
        }
    }
}

/// A staged writable handle: index writes collect locally and commit
/// atomically.
///
/// Payload bytes still stream into the content store as they are written;
/// only entry registration is staged. Reads through the batch see its own
/// staged writes; nothing is externally visible until
/// [`commit`](DriveBatch::commit). Dropping the batch, or calling
/// [`discard`](DriveBatch::discard), abandons the staged writes. Committing
/// is always an explicit act, never a side effect of teardown.
pub struct DriveBatch {
    staged: IndexBatch,
    router: Arc<ContentRouter>,
    hub: Arc<WatchHub>,
}

impl DriveBatch {
    /// The entry at `path` as this batch sees it.
    pub async fn entry(&self, path: &str) -> DriveResult<Option<FileEntry>> {
        Ok(self.staged.get(path).await?)
    }

    /// Returns `true` if this batch sees an entry at `path`.
    pub async fn exists(&self, path: &str) -> DriveResult<bool> {
        Ok(self.entry(path).await?.is_some())
    }

    /// Stage a regular-file write at `path`.
    pub async fn put(&mut self, path: &str, data: &[u8]) -> DriveResult<()> {
        self.put_with(path, data, PutOptions::default()).await
    }

    /// Stage a write at `path` with explicit entry options.
    pub async fn put_with(
        &mut self,
        path: &str,
        data: &[u8],
        options: PutOptions,
    ) -> DriveResult<()> {
        let content = self.router.require().await?;
        let blob = content.put(data).await?;
        let entry = FileEntry {
            executable: options.executable,
            linkname: None,
            blob,
            metadata: options.metadata,
        };
        self.staged.put(path, &entry)?;
        Ok(())
    }

    /// Stage a delete at `path`.
    pub fn del(&mut self, path: &str) {
        self.staged.del(path);
    }

    /// Stage a symlink at `path` targeting `target`.
    pub fn symlink(&mut self, path: &str, target: &str) -> DriveResult<()> {
        self.staged.put(path, &FileEntry::symlink(target))?;
        Ok(())
    }

    /// Number of staged writes.
    pub fn len(&self) -> usize {
        self.staged.len()
    }

    /// Returns `true` if nothing is staged.
    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    /// Commit every staged write atomically, in call order. Returns the
    /// committed version and notifies matching watchers.
    pub async fn commit(self) -> DriveResult<Version> {
        let touched = self.staged.touched_paths();
        let version = self.staged.flush().await?;
        for path in &touched {
            self.hub.publish(path, version);
        }
        debug!(%version, writes = touched.len(), "batch committed");
        Ok(version)
    }

    /// Abandon the staged writes. Zero external effect.
    pub fn discard(self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    use skiff_blobs::MemoryContentProvider;
    use skiff_store::MemoryStore;

    fn writer_drive() -> Drive {
        Drive::open(
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryContentProvider::new().with_block_size(4)),
        )
    }

    /// A writable root plus a read-only replica over the same state.
    fn writer_and_reader() -> (Drive, Drive) {
        let store = MemoryStore::new();
        let provider = Arc::new(MemoryContentProvider::new().with_block_size(4));
        let reader = Drive::open(Arc::new(store.read_only_view()), provider.clone());
        let writer = Drive::open(Arc::new(store), provider);
        (writer, reader)
    }

    // -----------------------------------------------------------------------
    // Basic reads and writes
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn put_then_get_roundtrip() {
        let drive = writer_drive();
        drive.put("/hello.txt", b"hello world").await.unwrap();
        let bytes = drive.get("/hello.txt").await.unwrap().unwrap();
        assert_eq!(&bytes[..], b"hello world");
    }

    #[tokio::test]
    async fn get_missing_is_none() {
        let drive = writer_drive();
        assert!(drive.get("/nope").await.unwrap().is_none());
        assert!(!drive.exists("/nope").await.unwrap());
    }

    #[tokio::test]
    async fn empty_file_reads_as_empty_bytes() {
        let drive = writer_drive();
        drive.put("/empty", b"").await.unwrap();

        let entry = drive.entry("/empty").await.unwrap().unwrap();
        assert!(entry.blob.is_none());
        assert_eq!(drive.get("/empty").await.unwrap().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn symlink_get_is_none() {
        let drive = writer_drive();
        drive.symlink("/link", "/target").await.unwrap();

        assert!(drive.get("/link").await.unwrap().is_none());
        let entry = drive.entry("/link").await.unwrap().unwrap();
        assert_eq!(entry.linkname.as_deref(), Some("/target"));
    }

    #[tokio::test]
    async fn del_then_get_is_none() {
        let drive = writer_drive();
        drive.put("/a", b"data").await.unwrap();
        drive.del("/a").await.unwrap();
        assert!(drive.get("/a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn paths_normalize_at_the_boundary() {
        let drive = writer_drive();
        drive.put("docs/../readme.md", b"hi").await.unwrap();
        assert!(drive.exists("/readme.md").await.unwrap());
    }

    #[tokio::test]
    async fn put_with_options() {
        let drive = writer_drive();
        drive
            .put_with(
                "/bin/tool",
                b"#!",
                PutOptions {
                    executable: true,
                    metadata: Some(serde_json::json!({ "v": 1 })),
                },
            )
            .await
            .unwrap();

        let entry = drive.entry("/bin/tool").await.unwrap().unwrap();
        assert!(entry.executable);
        assert_eq!(entry.metadata.unwrap()["v"], 1);
    }

    // -----------------------------------------------------------------------
    // Reader discovery
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn reader_discovers_content_after_writer_publishes() {
        let (writer, reader) = writer_and_reader();

        writer.put("/shared", b"replicated bytes").await.unwrap();

        let bytes = reader.get("/shared").await.unwrap().unwrap();
        assert_eq!(&bytes[..], b"replicated bytes");
        assert_eq!(reader.content_id(), writer.content_id());
    }

    #[tokio::test]
    async fn reader_cannot_write() {
        let (_writer, reader) = writer_and_reader();
        let err = reader.put("/x", b"y").await.unwrap_err();
        assert!(matches!(err, DriveError::InvalidState(_)));
    }

    // -----------------------------------------------------------------------
    // Checkouts
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn checkout_never_observes_later_writes() {
        let drive = writer_drive();
        drive.put("/f", b"old").await.unwrap();
        let snap = drive.checkout(drive.version()).await.unwrap();

        drive.put("/f", b"new").await.unwrap();
        drive.put("/added", b"x").await.unwrap();

        assert_eq!(&snap.get("/f").await.unwrap().unwrap()[..], b"old");
        assert!(snap.get("/added").await.unwrap().is_none());
        assert_eq!(snap.mode(), DriveMode::Checkout);
    }

    #[tokio::test]
    async fn checkout_rejects_writes_and_batches() {
        let drive = writer_drive();
        drive.put("/f", b"x").await.unwrap();
        let snap = drive.checkout(drive.version()).await.unwrap();

        assert!(matches!(
            snap.put("/f", b"y").await.unwrap_err(),
            DriveError::InvalidState(_)
        ));
        assert!(matches!(
            snap.del("/f").await.unwrap_err(),
            DriveError::InvalidState(_)
        ));
        assert!(matches!(snap.batch().err().unwrap(), DriveError::InvalidState(_)));
    }

    #[tokio::test]
    async fn checkout_shares_the_content_store() {
        let drive = writer_drive();
        drive.put("/f", b"bytes").await.unwrap();
        let snap = drive.checkout(drive.version()).await.unwrap();

        // The checkout reads payloads through the shared router.
        assert_eq!(&snap.get("/f").await.unwrap().unwrap()[..], b"bytes");
        let root_content = drive.router().resolved().unwrap();
        let snap_content = snap.router().resolved().unwrap();
        assert!(Arc::ptr_eq(&root_content, &snap_content));
    }

    #[tokio::test]
    async fn closing_a_checkout_leaves_the_origin_usable() {
        let drive = writer_drive();
        drive.put("/f", b"x").await.unwrap();
        let snap = drive.checkout(drive.version()).await.unwrap();

        snap.close().await;
        assert!(drive.get("/f").await.unwrap().is_some());
        drive.put("/g", b"y").await.unwrap();
    }

    // -----------------------------------------------------------------------
    // Batches
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn batch_writes_invisible_until_commit() {
        let drive = writer_drive();
        let mut batch = drive.batch().unwrap();
        batch.put("/staged", b"pending").await.unwrap();

        assert!(batch.exists("/staged").await.unwrap());
        assert!(!drive.exists("/staged").await.unwrap());

        batch.commit().await.unwrap();
        assert_eq!(&drive.get("/staged").await.unwrap().unwrap()[..], b"pending");
    }

    #[tokio::test]
    async fn batch_commits_in_call_order() {
        let drive = writer_drive();
        let mut batch = drive.batch().unwrap();
        batch.put("/p", b"first").await.unwrap();
        batch.put("/p", b"second").await.unwrap();
        batch.commit().await.unwrap();

        assert_eq!(&drive.get("/p").await.unwrap().unwrap()[..], b"second");
    }

    #[tokio::test]
    async fn discarded_batch_has_no_effect() {
        let drive = writer_drive();
        let before = drive.version();

        let mut batch = drive.batch().unwrap();
        batch.put("/staged", b"pending").await.unwrap();
        batch.del("/staged");
        batch.discard();

        assert_eq!(drive.version(), before);
        assert!(!drive.exists("/staged").await.unwrap());
    }

    #[tokio::test]
    async fn batch_symlink_and_delete() {
        let drive = writer_drive();
        drive.put("/old", b"x").await.unwrap();

        let mut batch = drive.batch().unwrap();
        batch.symlink("/ln", "/old").unwrap();
        batch.del("/old");
        batch.commit().await.unwrap();

        assert!(drive.entry("/ln").await.unwrap().unwrap().is_symlink());
        assert!(!drive.exists("/old").await.unwrap());
    }

    // -----------------------------------------------------------------------
    // Listing
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn shallow_and_recursive_listing() {
        let drive = writer_drive();
        for path in ["/f/a", "/f/b", "/f/c", "/f/c/d/e"] {
            drive.put(path, b"x").await.unwrap();
        }

        let names = drive.readdir("/f").await.unwrap();
        assert_eq!(names, vec!["a", "b", "c"]);

        let all = drive.list("/f").collect().await.unwrap();
        let paths: Vec<&str> = all.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(paths, vec!["/f/a", "/f/b", "/f/c", "/f/c/d/e"]);
    }

    #[tokio::test]
    async fn entries_accept_raw_bounds() {
        let drive = writer_drive();
        for path in ["/a", "/b", "/c"] {
            drive.put(path, b"x").await.unwrap();
        }
        let picked = drive
            .entries(PathBounds::all().gte("/b"))
            .collect()
            .await
            .unwrap();
        let paths: Vec<&str> = picked.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(paths, vec!["/b", "/c"]);
    }

    // -----------------------------------------------------------------------
    // Diff and watch
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn diff_after_single_put_has_one_record() {
        let drive = writer_drive();
        drive.put("/base", b"x").await.unwrap();
        let since = drive.version();

        drive.put("/changed", b"y").await.unwrap();

        let diffs = drive.diff(since, None).await.unwrap().collect().await.unwrap();
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].path, "/changed");
    }

    #[tokio::test]
    async fn diff_scoped_to_folder() {
        let drive = writer_drive();
        let since = drive.version();
        drive.put("/in/a", b"x").await.unwrap();
        drive.put("/out/b", b"y").await.unwrap();

        let diffs = drive
            .diff(since, Some("/in"))
            .await
            .unwrap()
            .collect()
            .await
            .unwrap();
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].path, "/in/a");
    }

    #[tokio::test]
    async fn watch_hears_changes_in_its_range_only() {
        let drive = writer_drive();
        let mut watch = drive.watch("/docs");

        drive.put("/docs/a", b"x").await.unwrap();
        drive.put("/images/b", b"y").await.unwrap();

        let event = watch.changed().await.unwrap();
        assert_eq!(event.path, "/docs/a");
        assert!(watch.try_changed().is_none());
    }

    #[tokio::test]
    async fn watch_hears_batch_commits() {
        let drive = writer_drive();
        let mut watch = drive.watch("/");

        let mut batch = drive.batch().unwrap();
        batch.put("/a", b"x").await.unwrap();

        // Nothing until the commit lands.
        assert!(watch.try_changed().is_none());
        let version = batch.commit().await.unwrap();

        let event = watch.changed().await.unwrap();
        assert_eq!(event.path, "/a");
        assert_eq!(event.version, version);
    }

    #[tokio::test]
    async fn watch_hears_deletes() {
        let drive = writer_drive();
        drive.put("/d", b"x").await.unwrap();

        let mut watch = drive.watch("/");
        drive.del("/d").await.unwrap();
        assert_eq!(watch.changed().await.unwrap().path, "/d");
    }

    // -----------------------------------------------------------------------
    // Bulk prefetch
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn download_settles_over_all_entries() {
        let drive = writer_drive();
        for path in ["/f/a", "/f/b", "/f/empty"] {
            drive.put(path, b"payload").await.unwrap();
        }
        drive.put("/f/zero", b"").await.unwrap();

        drive.download("/f").await.unwrap();
        drive.download("/").await.unwrap();
    }

    #[tokio::test]
    async fn download_diff_and_range_settle() {
        let drive = writer_drive();
        let since = drive.version();
        drive.put("/a", b"fresh").await.unwrap();

        drive.download_diff(since, None).await.unwrap();
        drive
            .download_range(
                &[PathBounds::subtree("/")],
                &[BlockRange::new(0, 2)],
            )
            .await
            .unwrap();
    }

    // -----------------------------------------------------------------------
    // Reclamation and teardown
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn clear_reclaims_blocks_but_keeps_the_entry() {
        let drive = writer_drive();
        drive.put("/fat", b"0123456789").await.unwrap();

        let outcome = drive.clear("/fat").await.unwrap().unwrap();
        assert_eq!(outcome.blocks, 3);

        // Entry survives; content does not.
        assert!(drive.exists("/fat").await.unwrap());
        assert!(drive.get("/fat").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn clear_of_missing_or_empty_is_none() {
        let drive = writer_drive();
        drive.put("/empty", b"").await.unwrap();
        assert!(drive.clear("/missing").await.unwrap().is_none());
        assert!(drive.clear("/empty").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn del_does_not_reclaim_blocks() {
        let drive = writer_drive();
        drive.put("/a", b"0123456789").await.unwrap();
        let blob = drive.entry("/a").await.unwrap().unwrap().blob.unwrap();
        drive.del("/a").await.unwrap();

        // The blocks are still in the content store until cleared.
        let content = drive.router().resolved().unwrap();
        assert!(content.get(&blob).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn clear_all_is_root_only() {
        let drive = writer_drive();
        drive.put("/a", b"x").await.unwrap();
        let snap = drive.checkout(drive.version()).await.unwrap();

        assert!(matches!(
            snap.clear_all().await.unwrap_err(),
            DriveError::InvalidState(_)
        ));
        assert!(matches!(
            snap.purge().await.unwrap_err(),
            DriveError::InvalidState(_)
        ));

        let outcome = drive.clear_all().await.unwrap().unwrap();
        assert!(outcome.blocks >= 1);
    }

    #[tokio::test]
    async fn close_completes_even_after_purge() {
        let drive = writer_drive();
        drive.put("/a", b"x").await.unwrap();
        drive.purge().await.unwrap();

        // Stores are already closed; close still completes quietly.
        drive.close().await;
    }
}
