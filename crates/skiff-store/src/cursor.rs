//! Lazy ordered iteration over a key range.

use std::sync::Arc;

use crate::bounds::{KeyBounds, RawEntry, ScanDirection};
use crate::error::StoreResult;
use crate::traits::OrderedStore;

/// Pull-based cursor over a key range.
///
/// Fetches one entry per [`next`](KeyCursor::next) call by re-seeking past
/// the last yielded key, so nothing is read ahead of consumer demand and
/// dropping the cursor cancels the scan. Each step costs one `peek`
/// (`O(log n + 1)`).
pub struct KeyCursor {
    store: Arc<dyn OrderedStore>,
    bounds: KeyBounds,
    direction: ScanDirection,
    done: bool,
}

impl KeyCursor {
    /// Create a cursor over `bounds` in the given direction.
    pub fn new(store: Arc<dyn OrderedStore>, bounds: KeyBounds, direction: ScanDirection) -> Self {
        Self {
            store,
            bounds,
            direction,
            done: false,
        }
    }

    /// The next entry, or `None` when the range is exhausted.
    pub async fn next(&mut self) -> StoreResult<Option<RawEntry>> {
        if self.done {
            return Ok(None);
        }

        let entry = self.store.peek(&self.bounds, self.direction).await?;
        match entry {
            None => {
                self.done = true;
                Ok(None)
            }
            Some(entry) => {
                match self.direction {
                    ScanDirection::Forward => {
                        self.bounds.gte = None;
                        self.bounds.gt = Some(entry.key.clone());
                    }
                    ScanDirection::Reverse => {
                        self.bounds.lte = None;
                        self.bounds.lt = Some(entry.key.clone());
                    }
                }
                Ok(Some(entry))
            }
        }
    }

    /// Drain the cursor into a vector.
    pub async fn collect(mut self) -> StoreResult<Vec<RawEntry>> {
        let mut out = Vec::new();
        while let Some(entry) = self.next().await? {
            out.push(entry);
        }
        Ok(out)
    }
}
