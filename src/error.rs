//! Errors raised while turning a [`TreeDef`](crate::TreeDef) into an [`EnumTree`](crate::EnumTree).

use crate::ir::IntType;

/// A malformed tree definition. The tree never reaches a queryable state.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SpecError {
    #[error("invalid name '{name}' in '{node}': names must be non-empty, without whitespace or '::'")]
    InvalidName { node: String, name: String },

    #[error("duplicate entry '{entry}' in '{node}'")]
    DuplicateEntry { node: String, entry: String },

    #[error(
        "ordinal of '{node}::{entry}' is a {found} literal but '{node}' uses {expected} as its underlying type"
    )]
    TypeMismatch {
        node: String,
        entry: String,
        expected: IntType,
        found: IntType,
    },

    #[error("ordinal {value} of '{node}::{entry}' does not fit in {underlying}")]
    OrdinalOutOfRange {
        node: String,
        entry: String,
        value: i128,
        underlying: IntType,
    },

    #[error("'{node}::{entry}' expands into a child that is never defined")]
    UndefinedChild { node: String, entry: String },

    #[error("'{node}::{entry}' expands into a node named '{child}'; child nodes take the entry's name")]
    ChildNameMismatch {
        node: String,
        entry: String,
        child: String,
    },

    #[error("'{node}' declares a global prefix but is not the root")]
    PrefixOnChild { node: String },

    #[error("deferred body '{parent}::{name}' matches no deferred entry")]
    OrphanDeferred { parent: String, name: String },

    #[error("'{node}::{entry}' has more than one deferred body")]
    DuplicateDeferred { node: String, entry: String },

    #[error(
        "id '{id}' is declared by both '{first}' and '{second}'; recursive lookups by this id would be ambiguous"
    )]
    AmbiguousId {
        id: String,
        first: String,
        second: String,
    },
}

impl SpecError {
    /// Qualified name of the node the error is reported against.
    pub fn node(&self) -> &str {
        match self {
            SpecError::InvalidName { node, .. }
            | SpecError::DuplicateEntry { node, .. }
            | SpecError::TypeMismatch { node, .. }
            | SpecError::OrdinalOutOfRange { node, .. }
            | SpecError::UndefinedChild { node, .. }
            | SpecError::ChildNameMismatch { node, .. }
            | SpecError::PrefixOnChild { node }
            | SpecError::DuplicateDeferred { node, .. } => node,
            SpecError::OrphanDeferred { parent, .. } => parent,
            SpecError::AmbiguousId { first, .. } => first,
        }
    }
}

/// A recursive search in [`SearchMode::Unique`](crate::SearchMode::Unique) matched more than one node.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    #[error("search is ambiguous: matched both '{first}' and '{second}'")]
    Ambiguous { first: String, second: String },
}
