//! In-memory, MVCC-backed ordered store.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use bytes::Bytes;

use skiff_types::Version;

use crate::batch::BatchOp;
use crate::bounds::{KeyBounds, RawEntry, ScanDirection};
use crate::error::{StoreError, StoreResult};
use crate::traits::OrderedStore;

/// One committed value (or tombstone) for a key.
#[derive(Clone, Debug)]
struct Revision {
    version: u64,
    value: Option<Bytes>,
}

#[derive(Default)]
struct State {
    /// Per-key revision history, newest last.
    entries: BTreeMap<Vec<u8>, Vec<Revision>>,
    version: u64,
    closed: bool,
}

impl State {
    fn check_open(&self) -> StoreResult<()> {
        if self.closed {
            return Err(StoreError::Closed);
        }
        Ok(())
    }

    /// The value visible at `at`, if any. Tombstones and not-yet-written
    /// revisions read as `None`.
    fn visible(&self, key: &[u8], at: u64) -> Option<Bytes> {
        self.entries
            .get(key)?
            .iter()
            .rev()
            .find(|rev| rev.version <= at)
            .and_then(|rev| rev.value.clone())
    }

    fn commit(&mut self, key: Vec<u8>, value: Option<Bytes>) -> u64 {
        self.version += 1;
        let revision = Revision {
            version: self.version,
            value,
        };
        self.entries.entry(key).or_default().push(revision);
        self.version
    }
}

struct Shared {
    state: RwLock<State>,
}

/// In-memory ordered store for tests and embedding.
///
/// Keeps a full per-key revision history behind a `RwLock`, which makes
/// checkouts a pinned version number over shared state rather than a copy.
/// Handles derived via [`checkout`](OrderedStore::checkout) and
/// [`read_only_view`](MemoryStore::read_only_view) share the owner's state;
/// only the owning handle's `close` tears the store down.
pub struct MemoryStore {
    shared: Arc<Shared>,
    pinned: Option<Version>,
    writable: bool,
}

impl MemoryStore {
    /// Create a new empty store. The returned handle is the writable owner.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                state: RwLock::new(State::default()),
            }),
            pinned: None,
            writable: true,
        }
    }

    /// A live, non-writable handle over the same state.
    ///
    /// Stands in for a replicated reader of the same index: it observes the
    /// owner's writes as they commit but can never write itself.
    pub fn read_only_view(&self) -> MemoryStore {
        Self {
            shared: Arc::clone(&self.shared),
            pinned: None,
            writable: false,
        }
    }

    /// Number of live (non-tombstoned) keys.
    pub fn len(&self) -> usize {
        let state = self.shared.state.read().expect("lock poisoned");
        let at = self.visible_at(&state);
        state
            .entries
            .keys()
            .filter(|key| state.visible(key, at).is_some())
            .count()
    }

    /// Returns `true` if no live keys exist.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn visible_at(&self, state: &State) -> u64 {
        match self.pinned {
            Some(version) => version.get(),
            None => state.version,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("version", &self.version())
            .field("pinned", &self.pinned)
            .field("writable", &self.writable)
            .finish()
    }
}

#[async_trait]
impl OrderedStore for MemoryStore {
    fn version(&self) -> Version {
        match self.pinned {
            Some(version) => version,
            None => {
                let state = self.shared.state.read().expect("lock poisoned");
                Version::new(state.version)
            }
        }
    }

    fn writable(&self) -> bool {
        self.writable
    }

    async fn get(&self, key: &[u8]) -> StoreResult<Option<Bytes>> {
        let state = self.shared.state.read().expect("lock poisoned");
        state.check_open()?;
        let at = self.visible_at(&state);
        Ok(state.visible(key, at))
    }

    async fn put(&self, key: &[u8], value: &[u8]) -> StoreResult<Version> {
        if !self.writable {
            return Err(StoreError::ReadOnly);
        }
        let mut state = self.shared.state.write().expect("lock poisoned");
        state.check_open()?;
        let version = state.commit(key.to_vec(), Some(Bytes::copy_from_slice(value)));
        Ok(Version::new(version))
    }

    async fn del(&self, key: &[u8]) -> StoreResult<Version> {
        if !self.writable {
            return Err(StoreError::ReadOnly);
        }
        let mut state = self.shared.state.write().expect("lock poisoned");
        state.check_open()?;
        let version = state.commit(key.to_vec(), None);
        Ok(Version::new(version))
    }

    async fn peek(
        &self,
        bounds: &KeyBounds,
        direction: ScanDirection,
    ) -> StoreResult<Option<RawEntry>> {
        if range_is_empty(bounds) {
            return Ok(None);
        }
        let state = self.shared.state.read().expect("lock poisoned");
        state.check_open()?;
        let at = self.visible_at(&state);

        let range = state
            .entries
            .range::<[u8], _>((bounds.lower(), bounds.upper()));

        let found = match direction {
            ScanDirection::Forward => range
                .map(|(key, _)| key)
                .find_map(|key| state.visible(key, at).map(|value| (key.clone(), value))),
            ScanDirection::Reverse => range
                .rev()
                .map(|(key, _)| key)
                .find_map(|key| state.visible(key, at).map(|value| (key.clone(), value))),
        };

        Ok(found.map(|(key, value)| RawEntry { key, value }))
    }

    async fn apply(&self, ops: Vec<BatchOp>) -> StoreResult<Version> {
        if !self.writable {
            return Err(StoreError::ReadOnly);
        }
        let mut state = self.shared.state.write().expect("lock poisoned");
        state.check_open()?;

        let mut version = state.version;
        for op in ops {
            version = match op {
                BatchOp::Put { key, value } => state.commit(key, Some(value)),
                BatchOp::Del { key } => state.commit(key, None),
            };
        }
        Ok(Version::new(version))
    }

    async fn checkout(&self, version: Version) -> StoreResult<Arc<dyn OrderedStore>> {
        let state = self.shared.state.read().expect("lock poisoned");
        state.check_open()?;
        if version.get() > state.version {
            return Err(StoreError::UnknownVersion {
                requested: version.get(),
                current: state.version,
            });
        }
        Ok(Arc::new(MemoryStore {
            shared: Arc::clone(&self.shared),
            pinned: Some(version),
            writable: false,
        }))
    }

    async fn close(&self) -> StoreResult<()> {
        // Derived views never tear down shared state.
        if !self.writable {
            return Ok(());
        }
        let mut state = self.shared.state.write().expect("lock poisoned");
        state.closed = true;
        state.entries.clear();
        Ok(())
    }
}

/// `BTreeMap::range` panics on inverted or doubly-excluded-equal bounds;
/// such ranges simply select nothing.
fn range_is_empty(bounds: &KeyBounds) -> bool {
    let lower = match (&bounds.gt, &bounds.gte) {
        (Some(key), _) => Some((key, true)),
        (None, Some(key)) => Some((key, false)),
        (None, None) => None,
    };
    let upper = match (&bounds.lt, &bounds.lte) {
        (Some(key), _) => Some((key, true)),
        (None, Some(key)) => Some((key, false)),
        (None, None) => None,
    };
    match (lower, upper) {
        (Some((low, low_open)), Some((high, high_open))) => {
            low > high || (low == high && (low_open || high_open))
        }
        _ => false,
    }
}
