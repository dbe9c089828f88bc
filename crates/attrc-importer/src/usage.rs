//! `Usage` - a set-of-sets of attribute-name tuples.
//!
//! Each inner tuple lists the attributes observed on a name along a single
//! branch of control flow; the empty tuple means "no attributes observed on
//! this branch" (e.g. the name was only passed around, never read). A
//! [`Usage`] accumulates branches with set union, and its keys are built by
//! sorted deduplication so that two branches that observed the same
//! attribute set in a different order collapse to one key.

use std::collections::BTreeSet;

/// One branch's worth of observed attribute names, sorted and deduplicated.
pub type UsageKey = Vec<String>;

/// Build a usage key from an arbitrary iterator of attribute names.
#[must_use]
pub fn usage_key<I, S>(attrnames: I) -> UsageKey
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let set: BTreeSet<String> = attrnames.into_iter().map(Into::into).collect();
    set.into_iter().collect()
}

/// A set-of-sets of attribute-name tuples observed for one name at one
/// definition location, accumulated branch by branch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Usage {
    branches: BTreeSet<UsageKey>,
}

impl Usage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a single branch's usage, deduplicating the attribute names.
    pub fn observe<I, S>(&mut self, attrnames: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.branches.insert(usage_key(attrnames));
    }

    /// Merge another `Usage`'s branches into this one (set union - multiple
    /// usage branches accumulate rather than replace).
    pub fn merge(&mut self, other: &Usage) {
        for key in &other.branches {
            self.branches.insert(key.clone());
        }
    }

    /// True iff any recorded branch observed no attributes at all - the
    /// "some branches have usage, some have none" case needs separate
    /// handling from callers.
    #[must_use]
    pub fn has_empty_branch(&self) -> bool {
        self.branches.iter().any(|k| k.is_empty())
    }

    #[must_use]
    pub fn branches(&self) -> impl Iterator<Item = &UsageKey> {
        self.branches.iter()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.branches.len()
    }
}

impl FromIterator<UsageKey> for Usage {
    fn from_iter<I: IntoIterator<Item = UsageKey>>(iter: I) -> Self {
        Self {
            branches: iter.into_iter().collect(),
        }
    }
}
