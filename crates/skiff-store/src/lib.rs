//! Ordered key-value storage for Skiff.
//!
//! The file index is layered on an ordered key-value store consumed purely
//! through the [`OrderedStore`] trait: versioned get/put/del, an ordered
//! range [`peek`](OrderedStore::peek), atomic multi-op
//! [`apply`](OrderedStore::apply), and read-only snapshot
//! [`checkout`](OrderedStore::checkout)s. The store's internals (tree
//! layout, replication, transport) are someone else's concern.
//!
//! # Key Types
//!
//! - [`OrderedStore`] — The store interface the index is built on
//! - [`MemoryStore`] — MVCC in-memory backend for tests and embedding
//! - [`KeyCursor`] — Lazy ordered pull cursor over a key range
//! - [`StoreBatch`] — Staged writes flushed atomically
//! - [`KeyBounds`] — `gt`/`gte`/`lt`/`lte` range bounds
//!
//! # Design Rules
//!
//! 1. One committed mutation advances the version by exactly one.
//! 2. A checkout observes one consistent state for its whole lifetime.
//! 3. Absence is not an error: missing keys read as `None`.
//! 4. A discarded batch has zero external effect.
//! 5. All I/O errors are propagated, never silently ignored.

pub mod batch;
pub mod bounds;
pub mod cursor;
pub mod error;
pub mod memory;
pub mod traits;

pub use batch::{BatchOp, StoreBatch};
pub use bounds::{KeyBounds, RawEntry, ScanDirection};
pub use cursor::KeyCursor;
pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use traits::OrderedStore;
