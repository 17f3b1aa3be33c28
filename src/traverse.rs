//! Recursive Traversal Engine: subtree aggregation and depth-first search.
//!
//! Both walk the subtree rooted at a node in pre-order: the node's own
//! table first, then each child's subtree in declaration order.

use tracing::trace;

use crate::error::SearchError;
use crate::selection::Selection;
use crate::tree::{EnumValue, NodeRef};

/// How [`NodeRef::search`] treats more than one matching node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SearchMode {
    /// More than one match is [`SearchError::Ambiguous`].
    #[default]
    Unique,
    /// Return the first match in pre-order.
    FirstMatch,
}

/// One visited node's filtered table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeTable<'a, T> {
    pub node: NodeRef<'a>,
    pub items: Vec<T>,
}

impl<'a> NodeRef<'a> {
    /// Per-node tables of the whole subtree, omitting nodes whose filtered table is empty.
    pub fn tables_recursive<T, F>(&self, selection: Selection, mut per_node: F) -> Vec<NodeTable<'a, T>>
    where
        F: FnMut(NodeRef<'a>, Selection) -> Vec<T>,
    {
        self.subtree()
            .filter_map(|node| {
                let items = per_node(node, selection);
                (!items.is_empty()).then_some(NodeTable { node, items })
            })
            .collect()
    }

    fn flatten_recursive<T, F>(&self, selection: Selection, mut per_node: F) -> Vec<T>
    where
        F: FnMut(NodeRef<'a>, Selection) -> Vec<T>,
    {
        self.subtree()
            .flat_map(|node| per_node(node, selection))
            .collect()
    }

    pub fn values_recursive(&self, selection: Selection) -> Vec<EnumValue> {
        self.flatten_recursive(selection, |node, sel| node.values(sel))
    }

    pub fn integers_recursive(&self, selection: Selection) -> Vec<i128> {
        self.flatten_recursive(selection, |node, sel| node.integers(sel))
    }

    pub fn ids_recursive(&self, selection: Selection) -> Vec<Option<&'a str>> {
        self.flatten_recursive(selection, |node, sel| node.ids(sel))
    }

    pub fn names_recursive(&self, selection: Selection, clean: bool) -> Vec<&'a str> {
        self.flatten_recursive(selection, |node, sel| node.names(sel, clean))
    }

    pub fn names_and_ids_recursive(
        &self,
        selection: Selection,
        clean: bool,
    ) -> Vec<(&'a str, Option<&'a str>)> {
        self.flatten_recursive(selection, |node, sel| node.names_and_ids(sel, clean))
    }

    pub fn subtypes_recursive(&self, selection: Selection) -> Vec<NodeRef<'a>> {
        self.flatten_recursive(selection, |node, sel| node.subtypes(sel))
    }

    /// Values classified under `selection` at every level below and at this
    /// node. The node itself is never counted as a value of itself.
    pub fn count_recursive(&self, selection: Selection) -> usize {
        self.subtree().map(|node| node.count(selection)).sum()
    }

    /// Pre-order search for the node satisfying `predicate`.
    pub fn search<P>(&self, mut predicate: P, mode: SearchMode) -> Result<Option<NodeRef<'a>>, SearchError>
    where
        P: FnMut(NodeRef<'a>) -> bool,
    {
        let mut matches = self.subtree().filter(|node| {
            let hit = predicate(*node);
            trace!(node = %node, hit, "search visit");
            hit
        });
        let Some(first) = matches.next() else {
            return Ok(None);
        };
        if mode == SearchMode::Unique
            && let Some(second) = matches.next()
        {
            return Err(SearchError::Ambiguous {
                first: first.qualified_name(false).to_string(),
                second: second.qualified_name(false).to_string(),
            });
        }
        Ok(Some(first))
    }

    /// First node in pre-order satisfying `predicate`.
    ///
    /// Ids are unique across nodes unless the tree was built with
    /// `allow_ambiguous`, and qualified names are always unique, so the
    /// keyed searches below never need more than the first hit.
    fn find_first<P>(&self, predicate: P) -> Option<NodeRef<'a>>
    where
        P: FnMut(&NodeRef<'a>) -> bool,
    {
        self.subtree().find(predicate)
    }

    /// The node in this subtree that declares `value`.
    pub fn node_of(&self, value: EnumValue) -> Option<NodeRef<'a>> {
        (self.tree.owns(value) && self.contains(value.node()))
            .then(|| self.tree.node(value.node()))
    }

    pub fn name_recursive(&self, value: EnumValue, clean: bool) -> Option<&'a str> {
        self.node_of(value)?.name_of(value, clean)
    }

    pub fn id_recursive(&self, value: EnumValue) -> Option<&'a str> {
        self.node_of(value)?.id_of(value)
    }

    pub fn name_by_id_recursive(&self, id: &str, clean: bool) -> Option<&'a str> {
        self.find_first(|node| node.value_by_id(id).is_some())?
            .name_by_id(id, clean)
    }

    pub fn integer_by_id_recursive(&self, id: &str) -> Option<i128> {
        self.value_by_id_recursive(id).map(EnumValue::integer)
    }

    pub fn value_by_id_recursive(&self, id: &str) -> Option<EnumValue> {
        self.subtree().find_map(|node| node.value_by_id(id))
    }

    /// Node declaring the entry named `name` (fully qualified).
    fn owner_of_name(&self, name: &str) -> Option<NodeRef<'a>> {
        let (parent, _) = name.rsplit_once("::")?;
        let owner = self.tree.find_node(parent)?;
        self.contains(owner.id).then_some(owner)
    }

    pub fn id_by_name_recursive(&self, name: &str) -> Option<&'a str> {
        self.owner_of_name(name)?.id_by_name(name)
    }

    pub fn integer_by_name_recursive(&self, name: &str) -> Option<i128> {
        self.owner_of_name(name)?.integer_by_name(name)
    }

    pub fn value_by_name_recursive(&self, name: &str) -> Option<EnumValue> {
        self.owner_of_name(name)?.value_by_name(name)
    }
}
