//! Monotonic index versions.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Monotonic identifier of an immutable file-index state.
///
/// Every committed mutation advances the version by one. Version 0 is the
/// empty index.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Version(u64);

impl Version {
    /// The version of the empty index.
    pub const ZERO: Version = Version(0);

    /// Wrap a raw version number.
    pub const fn new(v: u64) -> Self {
        Self(v)
    }

    /// The raw version number.
    pub const fn get(self) -> u64 {
        self.0
    }

    /// The next version.
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl From<u64> for Version {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

impl From<Version> for u64 {
    fn from(v: Version) -> Self {
        v.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_then_next() {
        assert_eq!(Version::ZERO.get(), 0);
        assert_eq!(Version::ZERO.next(), Version::new(1));
    }

    #[test]
    fn ordering_follows_raw_value() {
        assert!(Version::new(1) < Version::new(2));
    }

    #[test]
    fn display_format() {
        assert_eq!(Version::new(7).to_string(), "v7");
    }
}
