//! Subtree bounds and directory listings.
//!
//! A folder's subtree is selected with a single bound pair: lower bound
//! `folder + "/"`, upper bound `folder + "0"`. `'0'` is the byte after `'/'`,
//! so every strict descendant of the folder falls inside the bounds and no
//! sibling does (a sibling's first differing byte can never sort between the
//! two sentinels). Recursive listings scan that range; shallow listings jump
//! over whole subtrees with one `peek` per child.

use skiff_types::{folder_prefix, FileEntry, SEP, SUCC};

use skiff_store::{KeyBounds, ScanDirection};

use crate::error::{IndexError, IndexResult};
use crate::index::FileIndex;
use crate::keys::{entry_key, FILES_END, FILES_PREFIX};

/// Bounds over the canonical path space.
///
/// Unset sides are clamped to the whole index. If both the exclusive and
/// inclusive form of a side are set, the exclusive form wins.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PathBounds {
    pub gt: Option<String>,
    pub gte: Option<String>,
    pub lt: Option<String>,
    pub lte: Option<String>,
}

impl PathBounds {
    /// Bounds covering every entry.
    pub fn all() -> Self {
        Self::default()
    }

    /// Set an exclusive lower bound.
    pub fn gt(mut self, path: impl Into<String>) -> Self {
        self.gt = Some(path.into());
        self
    }

    /// Set an inclusive lower bound.
    pub fn gte(mut self, path: impl Into<String>) -> Self {
        self.gte = Some(path.into());
        self
    }

    /// Set an exclusive upper bound.
    pub fn lt(mut self, path: impl Into<String>) -> Self {
        self.lt = Some(path.into());
        self
    }

    /// Set an inclusive upper bound.
    pub fn lte(mut self, path: impl Into<String>) -> Self {
        self.lte = Some(path.into());
        self
    }

    /// Bounds selecting exactly the strict descendants of `folder`.
    ///
    /// The folder argument is normalized first; the root selects the whole
    /// index.
    pub fn subtree(folder: &str) -> Self {
        let prefix = folder_prefix(folder);
        Self::all()
            .gt(format!("{prefix}{SEP}"))
            .lt(format!("{prefix}{SUCC}"))
    }

    /// Returns `true` if `path` falls inside the bounds.
    pub fn contains(&self, path: &str) -> bool {
        let above = match (&self.gt, &self.gte) {
            (Some(b), _) => path > b.as_str(),
            (None, Some(b)) => path >= b.as_str(),
            (None, None) => true,
        };
        let below = match (&self.lt, &self.lte) {
            (Some(b), _) => path < b.as_str(),
            (None, Some(b)) => path <= b.as_str(),
            (None, None) => true,
        };
        above && below
    }

    /// Translate to key bounds, clamped to the files sub-keyspace.
    pub fn to_key_bounds(&self) -> KeyBounds {
        let mut bounds = KeyBounds::all();
        match (&self.gt, &self.gte) {
            (Some(path), _) => bounds.gt = Some(entry_key(path)),
            (None, Some(path)) => bounds.gte = Some(entry_key(path)),
            (None, None) => bounds.gte = Some(FILES_PREFIX.to_vec()),
        }
        match (&self.lt, &self.lte) {
            (Some(path), _) => bounds.lt = Some(entry_key(path)),
            (None, Some(path)) => bounds.lte = Some(entry_key(path)),
            (None, None) => bounds.lt = Some(FILES_END.to_vec()),
        }
        bounds
    }
}

/// Lazy listing of a folder's immediate children.
///
/// Maintains a cursor of the last emitted child name; each step peeks the
/// first entry past `folder + cursor` and then advances the cursor to
/// `"/" + name + "0"`, so the following peek skips the entire just-emitted
/// subtree in one lookup. Total cost is one `peek` per child plus one for
/// termination, independent of how many descendants the subtrees hold.
pub struct ShallowCursor {
    index: FileIndex,
    prefix: String,
    cursor: String,
    done: bool,
}

impl ShallowCursor {
    pub(crate) fn new(index: FileIndex, folder: &str) -> Self {
        Self {
            index,
            prefix: folder_prefix(folder),
            cursor: SEP.to_string(),
            done: false,
        }
    }

    /// The next child as `(name, entry)`, where `entry` is the first index
    /// entry found under that child. `None` when no children remain.
    pub async fn next(&mut self) -> IndexResult<Option<(String, FileEntry)>> {
        if self.done {
            return Ok(None);
        }

        let bounds = PathBounds::all()
            .gt(format!("{}{}", self.prefix, self.cursor))
            .lt(format!("{}{}", self.prefix, SUCC));

        let Some((path, entry)) = self.index.peek(&bounds, ScanDirection::Forward).await? else {
            self.done = true;
            return Ok(None);
        };

        let suffix = path
            .strip_prefix(&self.prefix)
            .and_then(|rest| rest.strip_prefix(SEP))
            .ok_or_else(|| {
                IndexError::Encoding(format!("entry {path} outside folder {}", self.prefix))
            })?;
        let name = match suffix.find(SEP) {
            Some(end) => &suffix[..end],
            None => suffix,
        };

        self.cursor = format!("{SEP}{name}{SUCC}");
        Ok(Some((name.to_string(), entry)))
    }

    /// Drain the cursor into a list of child names.
    pub async fn collect_names(mut self) -> IndexResult<Vec<String>> {
        let mut names = Vec::new();
        while let Some((name, _)) = self.next().await? {
            names.push(name);
        }
        Ok(names)
    }
}
