//! Membership set paired with its cardinality counter.
//!
//! The counter is private and only `add`/`remove` move it, so the two can
//! never diverge. Stored documents carry both fields (the counter is what
//! queries sort on); deserialization recomputes the counter from the
//! members rather than trusting the stored value.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "CountedSetRepr<T>",
    bound(
        serialize = "T: Serialize",
        deserialize = "T: Ord + Deserialize<'de>"
    )
)]
pub struct CountedSet<T: Ord> {
    members: BTreeSet<T>,
    count: u64,
}

#[derive(Deserialize)]
#[serde(bound(deserialize = "T: Ord + Deserialize<'de>"))]
struct CountedSetRepr<T: Ord> {
    #[serde(default)]
    members: BTreeSet<T>,
}

impl<T: Ord> From<CountedSetRepr<T>> for CountedSet<T> {
    fn from(repr: CountedSetRepr<T>) -> Self {
        let count = repr.members.len() as u64;
        Self {
            members: repr.members,
            count,
        }
    }
}

impl<T: Ord> Default for CountedSet<T> {
    fn default() -> Self {
        Self {
            members: BTreeSet::new(),
            count: 0,
        }
    }
}

impl<T: Ord> CountedSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the member was not already present.
    pub fn add(&mut self, member: T) -> bool {
        let inserted = self.members.insert(member);
        if inserted {
            self.count += 1;
        }
        inserted
    }

    /// Returns true if the member was present.
    pub fn remove(&mut self, member: &T) -> bool {
        let removed = self.members.remove(member);
        if removed {
            self.count -= 1;
        }
        removed
    }

    pub fn contains(&self, member: &T) -> bool {
        self.members.contains(member)
    }

    pub fn size(&self) -> u64 {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.members.iter()
    }
}

impl<T: Ord> FromIterator<T> for CountedSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::new();
        for member in iter {
            set.add(member);
        }
        set
    }
}
