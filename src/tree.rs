//! Immutable node tables and the per-node query surface.
//!
//! An [`EnumTree`] is an arena of node records stored in pre-order, so the
//! subtree of any node is the contiguous id range `[node, subtree_end)`.
//! All queries borrow the tree through a [`NodeRef`].

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::builder::BuildOptions;
use crate::ir::IntType;
use crate::selection::{Class, Classes, Selection};

/// Index of a node inside its [`EnumTree`]; equal to its pre-order position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    pub const fn index(self) -> usize {
        self.0
    }
}

/// Identity of one built [`EnumTree`]. Every call to `EnumTree::build`
/// yields a fresh id; clones share it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TreeId(u64);

impl TreeId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// A node-typed value in untyped form: the tree and node it belongs to, and its integer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EnumValue {
    tree: TreeId,
    node: NodeId,
    integer: i128,
}

impl EnumValue {
    pub const fn new(tree: TreeId, node: NodeId, integer: i128) -> Self {
        Self {
            tree,
            node,
            integer,
        }
    }

    pub const fn tree(self) -> TreeId {
        self.tree
    }

    /// The node that declares this value.
    pub const fn node(self) -> NodeId {
        self.node
    }

    pub const fn integer(self) -> i128 {
        self.integer
    }
}

/// Text after the last `::`.
pub(crate) fn clean_name(name: &str) -> &str {
    name.rsplit_once("::").map_or(name, |(_, tail)| tail)
}

#[derive(Clone, Debug)]
pub(crate) struct NodeRecord {
    pub(crate) name: String,
    pub(crate) qualified_name: String,
    pub(crate) underlying: IntType,
    pub(crate) depth: usize,
    pub(crate) parent: NodeId,
    /// Position of this node's entry in the parent; `None` for the root.
    pub(crate) parent_entry: Option<usize>,
    pub(crate) subtree_end: usize,
    pub(crate) is_leaf: bool,
    // Entry tables, positional.
    pub(crate) names: Vec<String>,
    pub(crate) integers: Vec<i128>,
    pub(crate) ids: Vec<Option<String>>,
    pub(crate) linked: Vec<Option<String>>,
    pub(crate) children: Vec<Option<NodeId>>,
    pub(crate) classes: Classes,
}

/// A fully built, immutable hierarchy of enumerations.
#[derive(Clone, Debug)]
pub struct EnumTree {
    pub(crate) id: TreeId,
    pub(crate) nodes: Vec<NodeRecord>,
    pub(crate) prefix: Option<String>,
    pub(crate) options: BuildOptions,
    pub(crate) by_name: HashMap<String, NodeId>,
}

impl EnumTree {
    pub fn id(&self) -> TreeId {
        self.id
    }

    /// Whether `value` was produced by this tree.
    pub fn owns(&self, value: EnumValue) -> bool {
        value.tree == self.id && value.node.0 < self.nodes.len()
    }

    pub fn root(&self) -> NodeRef<'_> {
        self.node(NodeId::ROOT)
    }

    /// # Panics
    ///
    /// Panics if `id` does not belong to this tree.
    pub fn node(&self, id: NodeId) -> NodeRef<'_> {
        assert!(
            id.0 < self.nodes.len(),
            "node id {} out of range for a tree of {} nodes",
            id.0,
            self.nodes.len()
        );
        NodeRef { tree: self, id }
    }

    pub fn get(&self, id: NodeId) -> Option<NodeRef<'_>> {
        (id.0 < self.nodes.len()).then_some(NodeRef { tree: self, id })
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node by fully qualified name (`"Vehicle::Land"`).
    pub fn find_node(&self, qualified_name: &str) -> Option<NodeRef<'_>> {
        self.by_name.get(qualified_name).map(|&id| self.node(id))
    }

    /// All nodes in pre-order.
    pub fn nodes(&self) -> impl ExactSizeIterator<Item = NodeRef<'_>> + '_ {
        (0..self.nodes.len()).map(move |i| NodeRef {
            tree: self,
            id: NodeId(i),
        })
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }
}

/// Borrowed handle to one node of an [`EnumTree`].
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    pub(crate) tree: &'a EnumTree,
    pub(crate) id: NodeId,
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl Eq for NodeRef<'_> {}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id.0)
            .field("name", &self.record().qualified_name)
            .finish()
    }
}

impl fmt::Display for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.record().qualified_name)
    }
}

impl<'a> NodeRef<'a> {
    #[inline]
    pub(crate) fn record(&self) -> &'a NodeRecord {
        &self.tree.nodes[self.id.0]
    }

    pub fn tree(&self) -> &'a EnumTree {
        self.tree
    }

    pub fn node_id(&self) -> NodeId {
        self.id
    }

    /// Local name of the node (`"Land"`).
    pub fn name(&self) -> &'a str {
        &self.record().name
    }

    /// `"Category::Vehicle::Land"`, or `"Land"` when `clean`.
    pub fn qualified_name(&self, clean: bool) -> &'a str {
        let name = self.record().qualified_name.as_str();
        if clean { clean_name(name) } else { name }
    }

    /// Prefix declared on the root, visible from every node.
    pub fn global_prefix(&self) -> Option<&'a str> {
        self.tree.prefix.as_deref()
    }

    pub fn underlying(&self) -> IntType {
        self.record().underlying
    }

    pub fn is_leaf(&self) -> bool {
        self.record().is_leaf
    }

    pub fn is_root(&self) -> bool {
        self.id == NodeId::ROOT
    }

    /// Distance from the root (root = 0).
    pub fn depth(&self) -> usize {
        self.record().depth
    }

    /// The root is its own parent.
    pub fn parent(&self) -> NodeRef<'a> {
        self.tree.node(self.record().parent)
    }

    /// This node seen as an entry of its parent. `None` for the root.
    pub fn as_entry(&self) -> Option<EntryRef<'a>> {
        self.record().parent_entry.map(|index| EntryRef {
            node: self.parent(),
            index,
        })
    }

    /// Id the parent declares for this node's entry.
    pub fn id(&self) -> Option<&'a str> {
        self.as_entry().and_then(|entry| entry.id())
    }

    /// Integer of this node's entry in the parent.
    pub fn integer(&self) -> Option<i128> {
        self.as_entry().map(|entry| entry.integer())
    }

    /// This node as a value of its parent.
    pub fn value(&self) -> Option<EnumValue> {
        self.as_entry().map(|entry| entry.value())
    }

    /// Ordered entry indices included by `selection`.
    pub fn indices(&self, selection: Selection) -> &'a [usize] {
        self.record().classes.indices(selection)
    }

    pub fn count(&self, selection: Selection) -> usize {
        self.indices(selection).len()
    }

    pub fn values(&self, selection: Selection) -> Vec<EnumValue> {
        let record = self.record();
        self.indices(selection)
            .iter()
            .map(|&i| EnumValue::new(self.tree.id, self.id, record.integers[i]))
            .collect()
    }

    pub fn integers(&self, selection: Selection) -> Vec<i128> {
        let record = self.record();
        self.indices(selection)
            .iter()
            .map(|&i| record.integers[i])
            .collect()
    }

    /// `None` marks an entry declared without an id.
    pub fn ids(&self, selection: Selection) -> Vec<Option<&'a str>> {
        let record = self.record();
        self.indices(selection)
            .iter()
            .map(|&i| record.ids[i].as_deref())
            .collect()
    }

    pub fn names(&self, selection: Selection, clean: bool) -> Vec<&'a str> {
        self.indices(selection)
            .iter()
            .map(|&i| self.entry_name(i, clean))
            .collect()
    }

    pub fn names_and_ids(
        &self,
        selection: Selection,
        clean: bool,
    ) -> Vec<(&'a str, Option<&'a str>)> {
        let record = self.record();
        self.indices(selection)
            .iter()
            .map(|&i| (self.entry_name(i, clean), record.ids[i].as_deref()))
            .collect()
    }

    /// Child nodes of the selected entries, in declaration order.
    pub fn subtypes(&self, selection: Selection) -> Vec<NodeRef<'a>> {
        let record = self.record();
        self.indices(selection)
            .iter()
            .filter_map(|&i| record.children[i])
            .map(|id| self.tree.node(id))
            .collect()
    }

    /// Linked type path per selected entry; entries without one report this node.
    pub fn linked_types(&self, selection: Selection) -> Vec<&'a str> {
        self.indices(selection)
            .iter()
            .map(|&i| self.linked_type_at(i))
            .collect()
    }

    pub fn entries(&self) -> impl ExactSizeIterator<Item = EntryRef<'a>> + 'a {
        let node = *self;
        (0..self.record().names.len()).map(move |index| EntryRef { node, index })
    }

    pub fn entry(&self, index: usize) -> Option<EntryRef<'a>> {
        (index < self.record().names.len()).then_some(EntryRef { node: *self, index })
    }

    pub(crate) fn entry_name(&self, index: usize, clean: bool) -> &'a str {
        let name = self.record().names[index].as_str();
        if clean { clean_name(name) } else { name }
    }

    pub(crate) fn linked_type_at(&self, index: usize) -> &'a str {
        let record = self.record();
        record.linked[index]
            .as_deref()
            .unwrap_or(record.qualified_name.as_str())
    }

    /// Ids of every node in this subtree, this node first.
    pub(crate) fn subtree(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        let tree = self.tree;
        (self.id.0..self.record().subtree_end).map(move |i| NodeRef {
            tree,
            id: NodeId(i),
        })
    }

    pub(crate) fn contains(&self, node: NodeId) -> bool {
        node.0 >= self.id.0 && node.0 < self.record().subtree_end
    }
}

/// One entry of a node, with every column of its row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntryRef<'a> {
    node: NodeRef<'a>,
    index: usize,
}

impl<'a> EntryRef<'a> {
    /// The node that declares this entry.
    pub fn node(&self) -> NodeRef<'a> {
        self.node
    }

    /// Position in declaration order.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self, clean: bool) -> &'a str {
        self.node.entry_name(self.index, clean)
    }

    pub fn integer(&self) -> i128 {
        self.node.record().integers[self.index]
    }

    pub fn value(&self) -> EnumValue {
        EnumValue::new(self.node.tree.id, self.node.id, self.integer())
    }

    pub fn id(&self) -> Option<&'a str> {
        self.node.record().ids[self.index].as_deref()
    }

    /// Linked path exactly as declared.
    pub fn linked(&self) -> Option<&'a str> {
        self.node.record().linked[self.index].as_deref()
    }

    /// Linked path, or the declaring node's qualified name.
    pub fn linked_type(&self) -> &'a str {
        self.node.linked_type_at(self.index)
    }

    pub fn class(&self) -> Class {
        self.node.record().classes.classes[self.index]
    }

    pub fn child(&self) -> Option<NodeRef<'a>> {
        self.node.record().children[self.index].map(|id| self.node.tree.node(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{EntryDef, NodeDef, TreeDef};

    fn vehicle() -> EnumTree {
        let def = TreeDef::new(
            NodeDef::new("Vehicle")
                .prefix("Category")
                .entry(EntryDef::new("Land").child(NodeDef::new("Land").leaves(["Car", "Truck"])))
                .entry(EntryDef::new("Watercraft").id("W").linked("crate::Boat")),
        );
        EnumTree::build(&def, &BuildOptions::default()).unwrap()
    }

    #[test]
    fn clean_name_takes_last_segment() {
        assert_eq!(clean_name("a::b::C"), "C");
        assert_eq!(clean_name("C"), "C");
    }

    #[test]
    fn nodes_are_preorder() {
        let tree = vehicle();
        let names: Vec<_> = tree.nodes().map(|n| n.qualified_name(false)).collect();
        assert_eq!(names, ["Category::Vehicle", "Category::Vehicle::Land"]);
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn root_is_its_own_parent() {
        let tree = vehicle();
        let root = tree.root();
        assert!(root.is_root());
        assert_eq!(root.parent(), root);
        assert_eq!(root.depth(), 0);
        assert_eq!(root.value(), None);
        assert_eq!(root.global_prefix(), Some("Category"));
    }

    #[test]
    fn child_reflects_its_parent_entry() {
        let tree = vehicle();
        let land = tree.find_node("Category::Vehicle::Land").unwrap();
        assert_eq!(land.parent(), tree.root());
        assert_eq!(land.integer(), Some(0));
        assert_eq!(land.id(), None);
        assert_eq!(land.value(), Some(EnumValue::new(tree.id(), NodeId::ROOT, 0)));
        assert_eq!(land.global_prefix(), Some("Category"));
        assert_eq!(land.qualified_name(true), "Land");
    }

    #[test]
    fn linked_type_defaults_to_owner() {
        let tree = vehicle();
        assert_eq!(
            tree.root().linked_types(Selection::All),
            ["Category::Vehicle", "crate::Boat"]
        );
        let entry = tree.root().entry(0).unwrap();
        assert_eq!(entry.linked(), None);
        assert_eq!(entry.class(), Class::Inner);
        assert_eq!(entry.child().map(|c| c.name()), Some("Land"));
    }

    #[test]
    fn get_out_of_range_is_none() {
        let tree = vehicle();
        assert!(tree.get(NodeId::new(7)).is_none());
        assert!(tree.get(NodeId::new(1)).is_some());
    }
}
