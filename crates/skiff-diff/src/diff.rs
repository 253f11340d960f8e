//! Ordered merge-walk diff between two index views.

use skiff_index::{EntryCursor, FileIndex, PathBounds};
use skiff_store::ScanDirection;
use skiff_types::FileEntry;

use crate::error::DiffResult;

/// One differing path between two index views.
///
/// `before == None` means the path was added; `after == None` means it was
/// deleted; both set means the entry changed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntryDiff {
    pub path: String,
    pub before: Option<FileEntry>,
    pub after: Option<FileEntry>,
}

/// Lazy diff between an `old` and a `new` index view.
///
/// Walks both views' cursors in lockstep (both are path-ordered) and yields
/// a record for every path whose entry differs. Paths with equal entries are
/// skipped silently. Nothing is read beyond what the consumer pulls.
pub struct DiffCursor {
    old: EntryCursor,
    new: EntryCursor,
    old_head: Option<(String, FileEntry)>,
    new_head: Option<(String, FileEntry)>,
    primed: bool,
}

impl DiffCursor {
    /// Diff `old` against `new` inside `bounds`.
    pub fn new(old: &FileIndex, new: &FileIndex, bounds: PathBounds) -> Self {
        Self {
            old: old.entries(bounds.clone(), ScanDirection::Forward),
            new: new.entries(bounds, ScanDirection::Forward),
            old_head: None,
            new_head: None,
            primed: false,
        }
    }

    /// Diff two whole views.
    pub fn over_all(old: &FileIndex, new: &FileIndex) -> Self {
        Self::new(old, new, PathBounds::all())
    }

    /// The next differing path, or `None` when both views are exhausted.
    pub async fn next(&mut self) -> DiffResult<Option<EntryDiff>> {
        if !self.primed {
            self.old_head = self.old.next().await?;
            self.new_head = self.new.next().await?;
            self.primed = true;
        }

        loop {
            match (self.old_head.take(), self.new_head.take()) {
                (None, None) => return Ok(None),

                (Some((path, before)), None) => {
                    self.old_head = self.old.next().await?;
                    return Ok(Some(EntryDiff {
                        path,
                        before: Some(before),
                        after: None,
                    }));
                }

                (None, Some((path, after))) => {
                    self.new_head = self.new.next().await?;
                    return Ok(Some(EntryDiff {
                        path,
                        before: None,
                        after: Some(after),
                    }));
                }

                (Some((old_path, before)), Some((new_path, after))) => {
                    match old_path.cmp(&new_path) {
                        std::cmp::Ordering::Less => {
                            self.new_head = Some((new_path, after));
                            self.old_head = self.old.next().await?;
                            return Ok(Some(EntryDiff {
                                path: old_path,
                                before: Some(before),
                                after: None,
                            }));
                        }
                        std::cmp::Ordering::Greater => {
                            self.old_head = Some((old_path, before));
                            self.new_head = self.new.next().await?;
                            return Ok(Some(EntryDiff {
                                path: new_path,
                                before: None,
                                after: Some(after),
                            }));
                        }
                        std::cmp::Ordering::Equal => {
                            self.old_head = self.old.next().await?;
                            self.new_head = self.new.next().await?;
                            if before != after {
                                return Ok(Some(EntryDiff {
                                    path: new_path,
                                    before: Some(before),
                                    after: Some(after),
                                }));
                            }
                            // Unchanged: keep walking.
                        }
                    }
                }
            }
        }
    }

    /// Drain the cursor into a vector.
    pub async fn collect(mut self) -> DiffResult<Vec<EntryDiff>> {
        let mut out = Vec::new();
        while let Some(diff) = self.next().await? {
            out.push(diff);
        }
        Ok(out)
    }
}
