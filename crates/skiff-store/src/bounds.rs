//! Key-range bounds and raw entries.

use std::ops::Bound;

use bytes::Bytes;

/// A raw key/value pair from the ordered store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawEntry {
    pub key: Vec<u8>,
    pub value: Bytes,
}

/// Scan direction for range operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanDirection {
    Forward,
    Reverse,
}

/// Bounds over the ordered key space.
///
/// Any combination of exclusive (`gt`/`lt`) and inclusive (`gte`/`lte`)
/// bounds; unset sides are unbounded. If both the exclusive and inclusive
/// form of a side are set, the exclusive form wins.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyBounds {
    pub gt: Option<Vec<u8>>,
    pub gte: Option<Vec<u8>>,
    pub lt: Option<Vec<u8>>,
    pub lte: Option<Vec<u8>>,
}

impl KeyBounds {
    /// Bounds covering the entire key space.
    pub fn all() -> Self {
        Self::default()
    }

    /// Set an exclusive lower bound.
    pub fn gt(mut self, key: impl Into<Vec<u8>>) -> Self {
        self.gt = Some(key.into());
        self
    }

    /// Set an inclusive lower bound.
    pub fn gte(mut self, key: impl Into<Vec<u8>>) -> Self {
        self.gte = Some(key.into());
        self
    }

    /// Set an exclusive upper bound.
    pub fn lt(mut self, key: impl Into<Vec<u8>>) -> Self {
        self.lt = Some(key.into());
        self
    }

    /// Set an inclusive upper bound.
    pub fn lte(mut self, key: impl Into<Vec<u8>>) -> Self {
        self.lte = Some(key.into());
        self
    }

    /// The lower bound in `std::ops::Bound` form.
    pub fn lower(&self) -> Bound<&[u8]> {
        match (&self.gt, &self.gte) {
            (Some(k), _) => Bound::Excluded(k.as_slice()),
            (None, Some(k)) => Bound::Included(k.as_slice()),
            (None, None) => Bound::Unbounded,
        }
    }

    /// The upper bound in `std::ops::Bound` form.
    pub fn upper(&self) -> Bound<&[u8]> {
        match (&self.lt, &self.lte) {
            (Some(k), _) => Bound::Excluded(k.as_slice()),
            (None, Some(k)) => Bound::Included(k.as_slice()),
            (None, None) => Bound::Unbounded,
        }
    }

    /// Returns `true` if `key` falls inside the bounds.
    pub fn contains(&self, key: &[u8]) -> bool {
        let above = match self.lower() {
            Bound::Excluded(k) => key > k,
            Bound::Included(k) => key >= k,
            Bound::Unbounded => true,
        };
        let below = match self.upper() {
            Bound::Excluded(k) => key < k,
            Bound::Included(k) => key <= k,
            Bound::Unbounded => true,
        };
        above && below
    }
}
