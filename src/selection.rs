//! Branch/leaf classification of entries.

use serde::{Deserialize, Serialize};

/// Which entries of a node a query should see.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection {
    /// Entries that expand into a branching child.
    Inner,
    /// Plain values, including entries whose child does not branch.
    Outer,
    #[default]
    All,
}

/// Structural class of a single entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Class {
    Inner,
    Outer,
}

impl Selection {
    pub const ALL: [Selection; 3] = [Selection::Inner, Selection::Outer, Selection::All];

    #[inline]
    pub const fn includes(self, class: Class) -> bool {
        matches!(
            (self, class),
            (Selection::All, _) | (Selection::Inner, Class::Inner) | (Selection::Outer, Class::Outer)
        )
    }
}

/// When does a child node count as a branch?
///
/// An entry is [`Class::Inner`] iff it has a child that is a branch, and a
/// node's `is_leaf` flag is the negation of the same test.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BranchPolicy {
    /// A child is a branch iff it declares at least one entry.
    /// `Land { Car, Truck }` is Inner, `Placeholder {}` is Outer.
    #[default]
    NonEmpty,
    /// A child is a branch iff one of its entries has a child of its own.
    /// `Land { Car, Truck }` is Outer.
    Nested,
}

impl BranchPolicy {
    /// Apply the policy to a node described by its entry count and
    /// whether any of those entries expands further.
    #[inline]
    pub const fn is_branch(self, entry_count: usize, has_child_entries: bool) -> bool {
        match self {
            BranchPolicy::NonEmpty => entry_count > 0,
            BranchPolicy::Nested => has_child_entries,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            BranchPolicy::NonEmpty => "non_empty",
            BranchPolicy::Nested => "nested",
        }
    }
}

impl std::str::FromStr for BranchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "non_empty" => Ok(BranchPolicy::NonEmpty),
            "nested" => Ok(BranchPolicy::Nested),
            other => Err(format!(
                "unknown branch policy '{other}': expected \"non_empty\" or \"nested\""
            )),
        }
    }
}

/// Precomputed classification for one node's entries.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Classes {
    pub(crate) classes: Vec<Class>,
    all: Vec<usize>,
    inner: Vec<usize>,
    outer: Vec<usize>,
}

impl Classes {
    pub(crate) fn new(classes: Vec<Class>) -> Self {
        let all = (0..classes.len()).collect();
        let mut inner = Vec::new();
        let mut outer = Vec::new();
        for (i, class) in classes.iter().enumerate() {
            match class {
                Class::Inner => inner.push(i),
                Class::Outer => outer.push(i),
            }
        }
        Self {
            classes,
            all,
            inner,
            outer,
        }
    }

    #[inline]
    pub(crate) fn indices(&self, selection: Selection) -> &[usize] {
        match selection {
            Selection::Inner => &self.inner,
            Selection::Outer => &self.outer,
            Selection::All => &self.all,
        }
    }
}
