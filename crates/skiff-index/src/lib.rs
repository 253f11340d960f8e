//! Versioned, path-addressable file index for Skiff.
//!
//! Maps canonical paths to [`FileEntry`] values inside an ordered key-value
//! store. Hierarchy is implicit from `/`-delimited key prefixes (no
//! directory is ever materialized), which makes directory listings range
//! queries and shallow listings a handful of `peek`s.
//!
//! # Key Types
//!
//! - [`FileIndex`] — get/put/del, range cursors, snapshots, batches
//! - [`PathBounds`] — `gt`/`lt` path bounds; [`PathBounds::subtree`] selects
//!   exactly a folder's strict descendants
//! - [`EntryCursor`] — lazy recursive listing
//! - [`ShallowCursor`] — immediate children only, one `peek` per child
//! - [`IndexBatch`] — staged writes with explicit flush/discard
//!
//! [`FileEntry`]: skiff_types::FileEntry

pub mod batch;
pub mod error;
pub mod index;
mod keys;
pub mod traversal;

pub use batch::IndexBatch;
pub use error::{IndexError, IndexResult};
pub use index::{EntryCursor, FileIndex};
pub use traversal::{PathBounds, ShallowCursor};
