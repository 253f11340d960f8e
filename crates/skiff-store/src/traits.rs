use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use skiff_types::Version;

use crate::batch::BatchOp;
use crate::bounds::{KeyBounds, RawEntry, ScanDirection};
use crate::error::StoreResult;

/// Ordered, versioned key-value store.
///
/// All implementations must satisfy these invariants:
/// - Keys are totally ordered by their byte representation.
/// - Every committed mutation (including a delete of an absent key) advances
///   the version by exactly one; versions never repeat or go backwards.
/// - `peek` finds the first match in a range in `O(log n + 1)`, never in time
///   proportional to the range's population.
/// - A checkout is pinned: concurrent writes to the live store are never
///   observed through it.
/// - Missing keys read as `Ok(None)`; absence is not an error.
#[async_trait]
pub trait OrderedStore: Send + Sync {
    /// The current version. For a checkout, the pinned version.
    fn version(&self) -> Version;

    /// Whether this handle accepts writes.
    fn writable(&self) -> bool;

    /// Read the value at `key`, or `None` if absent.
    async fn get(&self, key: &[u8]) -> StoreResult<Option<Bytes>>;

    /// Insert or overwrite `key`. Returns the new version.
    async fn put(&self, key: &[u8], value: &[u8]) -> StoreResult<Version>;

    /// Remove `key`. Succeeds (and still advances the version) if absent.
    async fn del(&self, key: &[u8]) -> StoreResult<Version>;

    /// The first entry inside `bounds` in the given direction, or `None`
    /// if the range is empty.
    async fn peek(
        &self,
        bounds: &KeyBounds,
        direction: ScanDirection,
    ) -> StoreResult<Option<RawEntry>>;

    /// Apply a sequence of operations atomically, in order.
    ///
    /// Either every operation commits (a later op on the same key winning)
    /// or none do. Returns the version after the last operation.
    async fn apply(&self, ops: Vec<BatchOp>) -> StoreResult<Version>;

    /// Best-effort prefetch of a key range from peers.
    ///
    /// Local backends hold everything already; the default is a no-op.
    async fn prefetch(&self, _bounds: &KeyBounds) -> StoreResult<()> {
        Ok(())
    }

    /// A read-only snapshot of the store at `version`.
    ///
    /// Writes through the returned handle fail with
    /// [`StoreError::ReadOnly`](crate::StoreError::ReadOnly).
    async fn checkout(&self, version: Version) -> StoreResult<Arc<dyn OrderedStore>>;

    /// Release the store's resources. Only an owning (writable root) handle
    /// actually tears the store down; closing a derived view is a no-op.
    async fn close(&self) -> StoreResult<()> {
        Ok(())
    }
}
