//! Append-only content storage for Skiff.
//!
//! Payload bytes live outside the file index, in a block-addressed,
//! append-only content store consumed through the [`ContentStore`] trait.
//! Entries in the index point at block ranges ([`BlobRef`]s); the store's
//! chunk transport, erasure coding, and replication are out of scope.
//!
//! # Key Types
//!
//! - [`ContentStore`] — Append/read/clear over a block log
//! - [`ContentProvider`] — Resolves [`StoreId`]s to store handles
//! - [`MemoryContentStore`] / [`MemoryContentProvider`] — In-memory backends
//!   for tests and embedding
//!
//! # Design Rules
//!
//! 1. Blocks are immutable once appended; the log only grows.
//! 2. Deleting an index entry never reclaims blocks; `clear` is the
//!    explicit reclamation surface.
//! 3. Missing or cleared content reads as `None`, never as an error.
//! 4. One logical writer per store: appends are never interleaved.
//!
//! [`BlobRef`]: skiff_types::BlobRef
//! [`StoreId`]: skiff_types::StoreId

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{BlobError, BlobResult};
pub use memory::{MemoryContentProvider, MemoryContentStore};
pub use traits::{BlockRange, ClearOutcome, ContentProvider, ContentStore, DEFAULT_BLOCK_SIZE};
