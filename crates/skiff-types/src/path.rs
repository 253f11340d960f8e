//! Canonical path normalization.
//!
//! Every key stored in the file index is a canonical path: absolute,
//! `.`/`..`-resolved, single separators, no trailing separator except for the
//! root itself. Hierarchy is implicit from `/`-delimited prefixes; no
//! directory is ever a first-class entry.

/// The path separator.
pub const SEP: char = '/';

/// The smallest character sorting strictly after [`SEP`].
///
/// Used as the upper-bound sentinel when selecting a folder's subtree:
/// every strict descendant of `folder` sorts inside
/// `(folder + "/", folder + "0")`, and no sibling does.
pub const SUCC: char = '0';

/// Normalize an arbitrary path string into its canonical form.
///
/// Resolves `.` and `..` segments against the root, collapses repeated
/// separators, and strips any trailing separator (except for the root,
/// which is `"/"`). Never fails: malformed input is resolved as far as
/// syntactically possible, and `..` at the root stays at the root.
///
/// Idempotent: `normalize(&normalize(p)) == normalize(p)`.
pub fn normalize(input: &str) -> String {
    let mut stack: Vec<&str> = Vec::new();

    for segment in input.split(SEP) {
        match segment {
            "" | "." => {}
            ".." => {
                stack.pop();
            }
            name => stack.push(name),
        }
    }

    if stack.is_empty() {
        return SEP.to_string();
    }

    let mut out = String::with_capacity(input.len() + 1);
    for segment in &stack {
        out.push(SEP);
        out.push_str(segment);
    }
    out
}

/// Normalize a folder argument into the prefix used for subtree bounds.
///
/// The root normalizes to the empty prefix so that the same bound formula
/// (`prefix + "/"` .. `prefix + "0"`) covers the whole index.
pub fn folder_prefix(folder: &str) -> String {
    let canonical = normalize(folder);
    if canonical.len() == 1 {
        String::new()
    } else {
        canonical
    }
}
