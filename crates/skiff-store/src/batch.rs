//! Staged writes committed atomically.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;

use skiff_types::Version;

use crate::error::StoreResult;
use crate::traits::OrderedStore;

/// A single operation inside an atomic batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BatchOp {
    Put { key: Vec<u8>, value: Bytes },
    Del { key: Vec<u8> },
}

impl BatchOp {
    /// The key this operation targets.
    pub fn key(&self) -> &[u8] {
        match self {
            BatchOp::Put { key, .. } => key,
            BatchOp::Del { key } => key,
        }
    }
}

/// Staged writes over a base store.
///
/// Reads through the batch see staged writes first, then fall through to the
/// base. Nothing is externally visible until [`flush`](StoreBatch::flush),
/// which commits every staged operation atomically in call order (a later
/// write to the same key winning). Dropping the batch, or calling
/// [`discard`](StoreBatch::discard), has zero external effect.
pub struct StoreBatch {
    base: Arc<dyn OrderedStore>,
    ops: Vec<BatchOp>,
    overlay: HashMap<Vec<u8>, Option<Bytes>>,
}

impl StoreBatch {
    /// Create an empty batch over `base`.
    pub fn new(base: Arc<dyn OrderedStore>) -> Self {
        Self {
            base,
            ops: Vec::new(),
            overlay: HashMap::new(),
        }
    }

    /// Read `key` through the batch: staged value if present, else the base.
    pub async fn get(&self, key: &[u8]) -> StoreResult<Option<Bytes>> {
        if let Some(staged) = self.overlay.get(key) {
            return Ok(staged.clone());
        }
        self.base.get(key).await
    }

    /// Stage an insert or overwrite.
    pub fn put(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Bytes>) {
        let key = key.into();
        let value = value.into();
        self.overlay.insert(key.clone(), Some(value.clone()));
        self.ops.push(BatchOp::Put { key, value });
    }

    /// Stage a delete.
    pub fn del(&mut self, key: impl Into<Vec<u8>>) {
        let key = key.into();
        self.overlay.insert(key.clone(), None);
        self.ops.push(BatchOp::Del { key });
    }

    /// The staged operations, in call order.
    pub fn ops(&self) -> &[BatchOp] {
        &self.ops
    }

    /// Number of staged operations.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Returns `true` if nothing is staged.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Commit every staged operation atomically. Returns the version after
    /// the last operation (the base's current version if nothing is staged).
    pub async fn flush(self) -> StoreResult<Version> {
        if self.ops.is_empty() {
            return Ok(self.base.version());
        }
        self.base.apply(self.ops).await
    }

    /// Drop the batch without committing anything.
    pub fn discard(self) {}
}
