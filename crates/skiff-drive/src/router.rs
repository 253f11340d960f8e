//! Lazy discovery and creation of the content store.

use std::sync::Arc;

use tokio::sync::{watch, OnceCell};
use tracing::{debug, info};

use skiff_blobs::{ContentProvider, ContentStore};
use skiff_index::FileIndex;
use skiff_types::StoreId;

use crate::error::{DriveError, DriveResult};

/// Resolve-once gate for the content store.
///
/// A root drive owns exactly one router; every checkout and batch derived
/// from that root shares it by reference, so all of them converge on the
/// same content-store handle. Resolution runs at most once: concurrent
/// [`resolve`](ContentRouter::resolve) calls are serialized by the cell and
/// all observe the same instance.
///
/// Resolution order:
/// 1. Header record present → open the published identity (reader path).
/// 2. Header absent, index writable → create a store and publish its
///    identity (writer path).
/// 3. Header absent, read-only → not yet available; the gate stays empty
///    and a later call retries.
pub struct ContentRouter {
    index: FileIndex,
    provider: Arc<dyn ContentProvider>,
    cell: OnceCell<Arc<dyn ContentStore>>,
    ready: watch::Sender<bool>,
}

impl ContentRouter {
    /// Create a router over the root's live index view.
    pub fn new(index: FileIndex, provider: Arc<dyn ContentProvider>) -> Self {
        let (ready, _) = watch::channel(false);
        Self {
            index,
            provider,
            cell: OnceCell::new(),
            ready,
        }
    }

    /// The already-resolved handle, if resolution has happened.
    pub fn resolved(&self) -> Option<Arc<dyn ContentStore>> {
        self.cell.get().cloned()
    }

    /// The content store's identity, if resolved.
    pub fn content_id(&self) -> Option<StoreId> {
        self.cell.get().map(|store| store.id())
    }

    /// Resolve the content store, discovering or creating it on first use.
    ///
    /// `Ok(None)` means no writer has published a store yet: a read-only
    /// condition to report, never an error. Every `Ok(Some(..))` across all
    /// handles of one root is the same instance.
    pub async fn resolve(&self) -> DriveResult<Option<Arc<dyn ContentStore>>> {
        match self
            .cell
            .get_or_try_init(|| self.open_or_create())
            .await
        {
            Ok(store) => {
                self.ready.send_replace(true);
                Ok(Some(Arc::clone(store)))
            }
            Err(DriveError::ContentUnavailable) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Resolve, treating an unpublished store as an error.
    pub async fn require(&self) -> DriveResult<Arc<dyn ContentStore>> {
        self.resolve()
            .await?
            .ok_or(DriveError::ContentUnavailable)
    }

    /// A receiver that flips to `true` once the content store is available.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.ready.subscribe()
    }

    async fn open_or_create(&self) -> DriveResult<Arc<dyn ContentStore>> {
        if let Some(id) = self.index.content_header().await? {
            let store = self.provider.open(id).await?;
            debug!(id = %id.short_hex(), "content store discovered from header");
            return Ok(store);
        }

        if self.index.writable() {
            let store = self.provider.create().await?;
            self.index.set_content_header(store.id()).await?;
            info!(id = %store.id().short_hex(), "content store created and published");
            return Ok(store);
        }

        Err(DriveError::ContentUnavailable)
    }
}

impl std::fmt::Debug for ContentRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentRouter")
            .field("resolved", &self.cell.get().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use skiff_blobs::MemoryContentProvider;
    use skiff_store::{MemoryStore, OrderedStore};

    fn writer_setup() -> (MemoryStore, Arc<MemoryContentProvider>) {
        (MemoryStore::new(), Arc::new(MemoryContentProvider::new()))
    }

    #[tokio::test]
    async fn writer_creates_and_publishes() {
        let (store, provider) = writer_setup();
        let index = FileIndex::new(Arc::new(store));
        let router = ContentRouter::new(index.clone(), provider);

        assert!(router.resolved().is_none());
        let content = router.resolve().await.unwrap().unwrap();

        // The identity is now in the header.
        let published = index.content_header().await.unwrap().unwrap();
        assert_eq!(published, content.id());
    }

    #[tokio::test]
    async fn reader_reports_unavailable_until_published() {
        let (store, provider) = writer_setup();
        let reader_index = FileIndex::new(Arc::new(store.read_only_view()));
        let writer_index = FileIndex::new(Arc::new(store));

        let reader = ContentRouter::new(reader_index, provider.clone());
        assert!(reader.resolve().await.unwrap().is_none());

        // Writer publishes; the reader's next resolve discovers it.
        let writer = ContentRouter::new(writer_index, provider);
        let created = writer.resolve().await.unwrap().unwrap();

        let discovered = reader.resolve().await.unwrap().unwrap();
        assert_eq!(discovered.id(), created.id());
    }

    #[tokio::test]
    async fn concurrent_resolves_converge_on_one_instance() {
        let (store, provider) = writer_setup();
        let index = FileIndex::new(Arc::new(store));
        let router = Arc::new(ContentRouter::new(index, provider));

        let (a, b) = tokio::join!(router.resolve(), router.resolve());
        let a = a.unwrap().unwrap();
        let b = b.unwrap().unwrap();

        assert!(Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn repeated_resolves_return_the_same_instance() {
        let (store, provider) = writer_setup();
        let index = FileIndex::new(Arc::new(store));
        let router = ContentRouter::new(index, provider);

        let first = router.resolve().await.unwrap().unwrap();
        let second = router.resolve().await.unwrap().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn require_errors_when_unavailable() {
        let (store, provider) = writer_setup();
        let reader_index = FileIndex::new(Arc::new(store.read_only_view()));
        let router = ContentRouter::new(reader_index, provider);

        let err = router.require().await.err().unwrap();
        assert!(matches!(err, DriveError::ContentUnavailable));
    }

    #[tokio::test]
    async fn ready_signal_flips_on_resolution() {
        let (store, provider) = writer_setup();
        let index = FileIndex::new(Arc::new(store));
        let router = ContentRouter::new(index, provider);

        let mut ready = router.subscribe();
        assert!(!*ready.borrow());

        router.resolve().await.unwrap();
        ready.changed().await.unwrap();
        assert!(*ready.borrow());
    }

    #[tokio::test]
    async fn corrupt_header_is_an_error() {
        let (store, provider) = writer_setup();
        store.put(b"\x00header", b"short").await.unwrap();
        let index = FileIndex::new(Arc::new(store));
        let router = ContentRouter::new(index, provider);

        let err = router.resolve().await.err().unwrap();
        assert!(matches!(
            err,
            DriveError::Index(skiff_index::IndexError::CorruptHeader { found: 5 })
        ));
    }
}
