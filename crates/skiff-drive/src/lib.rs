//! The Skiff drive: a versioned, path-addressable filesystem abstraction.
//!
//! A [`Drive`] binds one file-index view to one content store: small
//! structured entries (permissions, symlink targets, content pointers) live
//! in the index; payload bytes live in the content store and stream in and
//! out independently. Checkouts pin a version, batches stage writes for an
//! atomic commit, diffs and watches track changes between versions.
//!
//! # Key Types
//!
//! - [`Drive`] — the top-level handle (writable root or read-only checkout)
//! - [`DriveBatch`] — staged writes with explicit commit/discard
//! - [`ContentRouter`] — lazy discover-or-create of the content store
//! - [`ReadStream`] / [`WriteStream`] — pull-based payload streaming
//! - [`DriveConfig`] — tuning knobs
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use skiff_blobs::MemoryContentProvider;
//! use skiff_drive::Drive;
//! use skiff_store::MemoryStore;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), skiff_drive::DriveError> {
//! let drive = Drive::open(
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(MemoryContentProvider::new()),
//! );
//!
//! drive.put("/blob.txt", b"example").await?;
//! let content = drive.get("/blob.txt").await?;
//! assert_eq!(content.as_deref(), Some(&b"example"[..]));
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod drive;
pub mod error;
pub mod router;
pub mod streams;

pub use config::DriveConfig;
pub use drive::{Drive, DriveBatch, DriveMode};
pub use error::{DriveError, DriveResult};
pub use router::ContentRouter;
pub use streams::{ByteRange, PutOptions, ReadStream, WriteStream};
