//! # Hierarchical Enumerations (nested-enum)
//!
//! Declare a tree of enumerations once, where an entry may expand into a
//! nested enumeration of its own, and get back for every node a set of
//! immutable reflection tables: values, integers, optional string ids and
//! fully qualified names.
//!
//! ## Design
//!
//! ```text
//! TreeDef (IR) ──▶ EnumTree::build ──▶ EnumTree ──▶ NodeRef queries
//!                   validates,           pre-order     local lookups,
//!                   numbers ordinals,    arena of      Inner/Outer filters,
//!                   classifies entries   node records  recursive aggregates
//! ```
//!
//! Each entry is classified once at build time:
//!
//! - **Inner**: it expands into a child node that is a branch
//!   (see [`BranchPolicy`]).
//! - **Outer**: a plain value, or a child that does not branch.
//!
//! Every table can be filtered by [`Selection::Inner`], [`Selection::Outer`]
//! or [`Selection::All`].
//!
//! ## Example
//!
//! ```
//! use nested_enum::{BuildOptions, EntryDef, EnumTree, NodeDef, Selection, TreeDef};
//!
//! let def = TreeDef::new(
//!     NodeDef::new("Vehicle")
//!         .entry(EntryDef::new("Land").child(NodeDef::new("Land").leaves(["Car", "Truck"])))
//!         .entry(EntryDef::new("Watercraft")),
//! );
//! let tree = EnumTree::build(&def, &BuildOptions::default()).unwrap();
//! let vehicle = tree.root();
//!
//! assert_eq!(vehicle.count(Selection::All), 2);
//! assert_eq!(vehicle.count(Selection::Inner), 1);
//! assert_eq!(vehicle.count_recursive(Selection::All), 4);
//!
//! let car = tree.find_node("Vehicle::Land").unwrap().value_of(0).unwrap();
//! assert_eq!(vehicle.name_recursive(car, false), Some("Vehicle::Land::Car"));
//! ```
//!
//! The `nested_enum!` macro (crate `nested-enum-macro`) generates a typed
//! [`NestedEnum`] implementation per node on top of the same tables.

pub mod builder;
pub mod error;
pub mod ir;
mod lookup;
pub mod selection;
pub mod traits;
pub mod traverse;
pub mod tree;

pub use builder::BuildOptions;
pub use error::{SearchError, SpecError};
pub use ir::{ChildDef, DeferredDef, EntryDef, IntType, NodeDef, Override, TreeDef, UnknownIntType};
pub use selection::{BranchPolicy, Class, Selection};
pub use traits::{LinkedEntry, NestedEnum};
pub use traverse::{NodeTable, SearchMode};
pub use tree::{EntryRef, EnumTree, EnumValue, NodeId, NodeRef, TreeId};
