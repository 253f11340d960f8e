//! Key layout inside the ordered store.
//!
//! File entries live in a `files\0` sub-keyspace; the header record sits at
//! a key sorting before every entry key. Byte-wise ordering of entry keys
//! matches the ordering of the paths they encode, so path bounds translate
//! to key bounds by prefixing alone.

/// Prefix of every file-entry key.
pub(crate) const FILES_PREFIX: &[u8] = b"files\x00";

/// Exclusive upper bound of the files sub-keyspace.
pub(crate) const FILES_END: &[u8] = b"files\x01";

/// Key of the header record (content-store identity).
pub(crate) const HEADER_KEY: &[u8] = b"\x00header";

/// The store key for a canonical path.
pub(crate) fn entry_key(path: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(FILES_PREFIX.len() + path.len());
    key.extend_from_slice(FILES_PREFIX);
    key.extend_from_slice(path.as_bytes());
    key
}

/// The canonical path encoded in a store key, if it is an entry key.
pub(crate) fn entry_path(key: &[u8]) -> Option<String> {
    let path = key.strip_prefix(FILES_PREFIX)?;
    String::from_utf8(path.to_vec()).ok()
}
