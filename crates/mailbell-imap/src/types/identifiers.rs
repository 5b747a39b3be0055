//! Tags, UIDs and UID sets.

use std::fmt;
use std::num::NonZeroU32;

/// IMAP command tag, echoed by the server on the completion response.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag(pub String);

impl Tag {
    /// Creates a new tag from a string.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// Returns the tag as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier of a message within a mailbox.
///
/// UIDs are never zero and stay stable for as long as the mailbox's
/// `UIDVALIDITY` does not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Uid(NonZeroU32);

impl Uid {
    /// Creates a new UID. Returns `None` for 0.
    #[must_use]
    pub fn new(n: u32) -> Option<Self> {
        NonZeroU32::new(n).map(Self)
    }

    /// Returns the underlying value.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A sorted set of UIDs as used by `UID FETCH`.
///
/// Serialized with consecutive runs collapsed to ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UidSet(Vec<Uid>);

impl UidSet {
    /// Builds a set from UIDs in any order. Duplicates are removed.
    #[must_use]
    pub fn from_uids(uids: impl IntoIterator<Item = Uid>) -> Self {
        let mut list: Vec<Uid> = uids.into_iter().collect();
        list.sort_unstable();
        list.dedup();
        Self(list)
    }

    /// Returns true if the set holds no UID.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for UidSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let list = &self.0;
        let mut first = true;
        let mut i = 0;
        while i < list.len() {
            let start = list[i].get();
            let mut end = start;
            while i + 1 < list.len() && list[i + 1].get() == end + 1 {
                end += 1;
                i += 1;
            }
            if !first {
                f.write_str(",")?;
            }
            first = false;
            if start == end {
                write!(f, "{start}")?;
            } else {
                write!(f, "{start}:{end}")?;
            }
            i += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    fn uids(values: &[u32]) -> Vec<Uid> {
        values.iter().map(|&n| Uid::new(n).unwrap()).collect()
    }

    #[test]
    fn uid_rejects_zero() {
        assert!(Uid::new(0).is_none());
        assert_eq!(Uid::new(42).unwrap().get(), 42);
    }

    #[test]
    fn uid_set_collapses_runs() {
        let set = UidSet::from_uids(uids(&[7, 3, 4, 5, 9, 10, 3]));
        assert_eq!(set.to_string(), "3:5,7,9:10");
    }

    #[test]
    fn uid_set_single() {
        let set = UidSet::from_uids(uids(&[12]));
        assert_eq!(set.to_string(), "12");
    }

    #[test]
    fn uid_set_empty() {
        assert!(UidSet::from_uids(Vec::new()).is_empty());
    }
}
