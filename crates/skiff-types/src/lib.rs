//! Foundation types for Skiff.
//!
//! This crate provides the path, entry, version, and identity types used
//! throughout the Skiff drive. Every other Skiff crate depends on
//! `skiff-types`.
//!
//! # Key Types
//!
//! - [`FileEntry`] — A single index entry (content pointer, mode, link target)
//! - [`BlobRef`] — Reference to a contiguous block range in the content store
//! - [`Version`] — Monotonic identifier of an immutable index state
//! - [`StoreId`] — 32-byte content-store identity
//! - [`normalize`] — Canonical path normalization

pub mod entry;
pub mod error;
pub mod identity;
pub mod path;
pub mod version;

pub use entry::{BlobRef, FileEntry};
pub use error::TypeError;
pub use identity::StoreId;
pub use path::{folder_prefix, normalize, SEP, SUCC};
pub use version::Version;
