//! Entry-level diffing and change notifications for Skiff.
//!
//! Compares two index views (typically a pinned checkout and the live
//! index) and yields one record per differing path, lazily and in path
//! order; optionally bounded to a folder subtree. Watches are range-scoped:
//! a subscriber hears about a change only when the changed path falls inside
//! its bounds, never a global "something changed" signal.
//!
//! # Key Types
//!
//! - [`DiffCursor`] — lazy ordered merge-walk of two index views
//! - [`EntryDiff`] — one differing path with its before/after entries
//! - [`WatchHub`] — subscriber registry fanning out [`ChangeEvent`]s
//! - [`Watch`] — a single subscription

pub mod diff;
pub mod error;
pub mod watch;

pub use diff::{DiffCursor, EntryDiff};
pub use error::{DiffError, DiffResult};
pub use watch::{ChangeEvent, Watch, WatchHub};
