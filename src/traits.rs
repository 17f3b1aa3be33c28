//! Typed API implemented by generated node types.
//!
//! The `nested_enum!` macro emits one `Value` type per node and implements
//! [`NestedEnum`] for it. Local queries are answered from the associated
//! const tables; recursive ones go through the node's [`EnumTree`].

use std::fmt::Debug;
use std::hash::Hash;

use crate::selection::Selection;
use crate::tree::{EnumTree, EnumValue, NodeId, NodeRef, clean_name};

/// A node of a nested enumeration, seen as a Rust type whose values are its entries.
pub trait NestedEnum: Copy + Eq + Hash + Debug + 'static {
    /// Integer type declared for this node.
    type Underlying: Copy + PartialEq + Debug + Into<i128> + TryFrom<i128> + 'static;

    const QUALIFIED_NAME: &'static str;
    const NODE: NodeId;
    const IS_LEAF: bool;

    /// Every entry, in declaration order.
    const VALUES: &'static [Self];
    const INTEGERS: &'static [Self::Underlying];
    /// Fully qualified entry names.
    const NAMES: &'static [&'static str];
    const IDS: &'static [Option<&'static str>];

    /// The tree this node belongs to.
    fn tree() -> &'static EnumTree;

    fn integer(self) -> Self::Underlying;

    // ----- node -----

    fn node() -> NodeRef<'static> {
        Self::tree().node(Self::NODE)
    }

    fn qualified_name(clean: bool) -> &'static str {
        if clean {
            clean_name(Self::QUALIFIED_NAME)
        } else {
            Self::QUALIFIED_NAME
        }
    }

    fn global_prefix() -> Option<&'static str> {
        Self::node().global_prefix()
    }

    // ----- conversions -----

    /// Value with the given integer; the first declared one on duplicates.
    fn from_integer(raw: Self::Underlying) -> Option<Self> {
        Self::VALUES.iter().copied().find(|v| v.integer() == raw)
    }

    fn to_value(self) -> EnumValue {
        EnumValue::new(Self::tree().id(), Self::NODE, self.integer().into())
    }

    /// Inverse of [`to_value`](Self::to_value); `None` for values of other
    /// nodes or other trees.
    fn from_value(value: EnumValue) -> Option<Self> {
        if value.tree() != Self::tree().id() || value.node() != Self::NODE {
            return None;
        }
        let raw = Self::Underlying::try_from(value.integer()).ok()?;
        Self::from_integer(raw)
    }

    // ----- local lookups -----

    #[doc(hidden)]
    fn position(self) -> Option<usize> {
        Self::VALUES.iter().position(|v| *v == self)
    }

    fn name(self, clean: bool) -> Option<&'static str> {
        let name = Self::NAMES[self.position()?];
        Some(if clean { clean_name(name) } else { name })
    }

    /// `None` when the entry was declared without an id.
    fn id(self) -> Option<&'static str> {
        Self::IDS[self.position()?]
    }

    fn name_and_id(self, clean: bool) -> Option<(&'static str, Option<&'static str>)> {
        let i = self.position()?;
        let name = Self::NAMES[i];
        Some((if clean { clean_name(name) } else { name }, Self::IDS[i]))
    }

    fn linked_type(self) -> Option<&'static str> {
        Self::node().linked_type_of(self.to_value())
    }

    /// Value by fully qualified name.
    fn from_name(name: &str) -> Option<Self> {
        let i = Self::NAMES.iter().position(|n| *n == name)?;
        Some(Self::VALUES[i])
    }

    fn from_id(id: &str) -> Option<Self> {
        let i = Self::IDS.iter().position(|i| *i == Some(id))?;
        Some(Self::VALUES[i])
    }

    fn id_by_name(name: &str) -> Option<&'static str> {
        Self::from_name(name)?.id()
    }

    fn name_by_id(id: &str, clean: bool) -> Option<&'static str> {
        Self::from_id(id)?.name(clean)
    }

    // ----- filtered tables -----

    fn values(selection: Selection) -> Vec<Self> {
        Self::node()
            .indices(selection)
            .iter()
            .map(|&i| Self::VALUES[i])
            .collect()
    }

    fn count(selection: Selection) -> usize {
        Self::node().count(selection)
    }

    fn integers(selection: Selection) -> Vec<Self::Underlying> {
        Self::node()
            .indices(selection)
            .iter()
            .map(|&i| Self::INTEGERS[i])
            .collect()
    }

    fn ids(selection: Selection) -> Vec<Option<&'static str>> {
        Self::node().ids(selection)
    }

    fn names(selection: Selection, clean: bool) -> Vec<&'static str> {
        Self::node().names(selection, clean)
    }

    fn names_and_ids(selection: Selection, clean: bool) -> Vec<(&'static str, Option<&'static str>)> {
        Self::node().names_and_ids(selection, clean)
    }

    fn subtypes(selection: Selection) -> Vec<NodeRef<'static>> {
        Self::node().subtypes(selection)
    }

    // ----- recursive -----

    fn values_recursive(selection: Selection) -> Vec<EnumValue> {
        Self::node().values_recursive(selection)
    }

    fn count_recursive(selection: Selection) -> usize {
        Self::node().count_recursive(selection)
    }

    fn integers_recursive(selection: Selection) -> Vec<i128> {
        Self::node().integers_recursive(selection)
    }

    fn ids_recursive(selection: Selection) -> Vec<Option<&'static str>> {
        Self::node().ids_recursive(selection)
    }

    fn names_recursive(selection: Selection, clean: bool) -> Vec<&'static str> {
        Self::node().names_recursive(selection, clean)
    }

    fn names_and_ids_recursive(
        selection: Selection,
        clean: bool,
    ) -> Vec<(&'static str, Option<&'static str>)> {
        Self::node().names_and_ids_recursive(selection, clean)
    }

    fn subtypes_recursive(selection: Selection) -> Vec<NodeRef<'static>> {
        Self::node().subtypes_recursive(selection)
    }

    /// Name of a value declared anywhere in this node's subtree.
    fn name_recursive<V: NestedEnum>(value: V, clean: bool) -> Option<&'static str> {
        Self::node().name_recursive(value.to_value(), clean)
    }

    fn id_recursive<V: NestedEnum>(value: V) -> Option<&'static str> {
        Self::node().id_recursive(value.to_value())
    }

    fn name_by_id_recursive(id: &str, clean: bool) -> Option<&'static str> {
        Self::node().name_by_id_recursive(id, clean)
    }

    fn id_by_name_recursive(name: &str) -> Option<&'static str> {
        Self::node().id_by_name_recursive(name)
    }

    fn value_by_id_recursive(id: &str) -> Option<EnumValue> {
        Self::node().value_by_id_recursive(id)
    }

    fn value_by_name_recursive(name: &str) -> Option<EnumValue> {
        Self::node().value_by_name_recursive(name)
    }

    /// Whether `V` is this node or one of its descendants.
    fn contains_node<V: NestedEnum>() -> bool {
        std::ptr::eq(Self::tree(), V::tree()) && Self::node().contains(V::NODE)
    }
}

/// Marker type for one entry, carrying its linked type.
///
/// `Linked` is the type given in `Name<Type>`, or the owner's value type.
pub trait LinkedEntry {
    type Owner: NestedEnum;
    type Linked: ?Sized;

    const VALUE: Self::Owner;

    fn linked_type_name() -> &'static str {
        std::any::type_name::<Self::Linked>()
    }
}
