//! Node Builder: validates a [`TreeDef`] and derives every node's tables.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SpecError;
use crate::ir::{ChildDef, IntType, NodeDef, TreeDef};
use crate::selection::{BranchPolicy, Class, Classes, Selection};
use crate::tree::{EnumTree, NodeId, NodeRecord, TreeId};

/// Knobs that apply to a whole tree.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildOptions {
    /// Underlying type of nodes that do not declare one.
    pub default_underlying: IntType,
    pub branch_policy: BranchPolicy,
    /// Accept an id declared by more than one node. Recursive lookups by
    /// such an id return the first node in pre-order.
    pub allow_ambiguous: bool,
}

impl BuildOptions {
    pub fn default_underlying(mut self, ty: IntType) -> Self {
        self.default_underlying = ty;
        self
    }

    pub fn branch_policy(mut self, policy: BranchPolicy) -> Self {
        self.branch_policy = policy;
        self
    }

    pub fn allow_ambiguous(mut self, allow: bool) -> Self {
        self.allow_ambiguous = allow;
        self
    }
}

impl EnumTree {
    /// Build the immutable tables for `def`.
    ///
    /// Nodes are numbered in pre-order; a node's qualified name is final
    /// before any of its children is built.
    pub fn build(def: &TreeDef, options: &BuildOptions) -> Result<Self, SpecError> {
        let mut builder = TreeBuilder::new(def, options)?;
        let prefix = def.root.prefix.clone().filter(|p| !p.is_empty());
        builder.build_node(&def.root, None, prefix.as_deref())?;
        builder.check_deferred_used()?;

        let TreeBuilder { nodes, .. } = builder;
        if !options.allow_ambiguous {
            check_unique_ids(&nodes)?;
        }

        let by_name = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.qualified_name.clone(), NodeId::new(i)))
            .collect();

        debug!(
            root = %nodes[0].qualified_name,
            nodes = nodes.len(),
            policy = options.branch_policy.as_str(),
            "built enum tree"
        );

        Ok(Self {
            id: TreeId::next(),
            nodes,
            prefix,
            options: *options,
            by_name,
        })
    }
}

/// Where a node hangs in the tree.
struct Parent<'p> {
    id: NodeId,
    entry: usize,
    qualified_name: &'p str,
    depth: usize,
}

struct TreeBuilder<'d> {
    options: BuildOptions,
    /// (parent qualified name, entry name) → deferred body
    deferred: HashMap<(String, String), &'d NodeDef>,
    used_deferred: HashSet<(String, String)>,
    nodes: Vec<NodeRecord>,
}

impl<'d> TreeBuilder<'d> {
    fn new(def: &'d TreeDef, options: &BuildOptions) -> Result<Self, SpecError> {
        let mut deferred = HashMap::new();
        for body in &def.deferred {
            let key = (body.parent.clone(), body.node.name.clone());
            if deferred.insert(key, &body.node).is_some() {
                return Err(SpecError::DuplicateDeferred {
                    node: body.parent.clone(),
                    entry: body.node.name.clone(),
                });
            }
        }
        Ok(Self {
            options: *options,
            deferred,
            used_deferred: HashSet::new(),
            nodes: Vec::new(),
        })
    }

    fn build_node(
        &mut self,
        def: &'d NodeDef,
        parent: Option<Parent<'_>>,
        prefix: Option<&str>,
    ) -> Result<NodeId, SpecError> {
        // 1. Qualified name
        let qualified_name = match (&parent, prefix) {
            (Some(p), _) => format!("{}::{}", p.qualified_name, def.name),
            (None, Some(prefix)) => format!("{prefix}::{}", def.name),
            (None, None) => def.name.clone(),
        };

        // 2. Validate names
        validate_name(&qualified_name, &def.name)?;
        if parent.is_some() && def.prefix.is_some() {
            return Err(SpecError::PrefixOnChild {
                node: qualified_name,
            });
        }
        let mut seen = HashSet::with_capacity(def.entries.len());
        for entry in &def.entries {
            validate_name(&qualified_name, &entry.name)?;
            if !seen.insert(entry.name.as_str()) {
                return Err(SpecError::DuplicateEntry {
                    node: qualified_name,
                    entry: entry.name.clone(),
                });
            }
        }

        // 3. Ordinals, one left-to-right pass
        let underlying = def.underlying.unwrap_or(self.options.default_underlying);
        let mut integers = Vec::with_capacity(def.entries.len());
        let mut next: i128 = 0;
        for entry in &def.entries {
            let value = match entry.ordinal {
                Some(ordinal) => {
                    if let Some(found) = ordinal.ty
                        && found != underlying
                    {
                        return Err(SpecError::TypeMismatch {
                            node: qualified_name,
                            entry: entry.name.clone(),
                            expected: underlying,
                            found,
                        });
                    }
                    ordinal.value
                }
                None => next,
            };
            if !underlying.contains(value) {
                return Err(SpecError::OrdinalOutOfRange {
                    node: qualified_name,
                    entry: entry.name.clone(),
                    value,
                    underlying,
                });
            }
            integers.push(value);
            next = value + 1;
        }

        // 4. Reserve the pre-order slot before building children
        let id = NodeId::new(self.nodes.len());
        let (parent_id, parent_entry, depth) = match &parent {
            Some(p) => (p.id, Some(p.entry), p.depth + 1),
            None => (id, None, 0),
        };
        self.nodes.push(NodeRecord {
            name: def.name.clone(),
            qualified_name: qualified_name.clone(),
            underlying,
            depth,
            parent: parent_id,
            parent_entry,
            subtree_end: 0,
            is_leaf: true,
            names: def
                .entries
                .iter()
                .map(|e| format!("{qualified_name}::{}", e.name))
                .collect(),
            integers,
            ids: def.entries.iter().map(|e| e.id.clone()).collect(),
            linked: def.entries.iter().map(|e| e.linked.clone()).collect(),
            children: vec![None; def.entries.len()],
            classes: Classes::default(),
        });

        // 5. Children, in declaration order
        let mut children = Vec::with_capacity(def.entries.len());
        for (index, entry) in def.entries.iter().enumerate() {
            let child_def = match &entry.child {
                None => {
                    children.push(None);
                    continue;
                }
                Some(ChildDef::Inline(child)) => {
                    if child.name != entry.name {
                        return Err(SpecError::ChildNameMismatch {
                            node: qualified_name,
                            entry: entry.name.clone(),
                            child: child.name.clone(),
                        });
                    }
                    child
                }
                Some(ChildDef::Deferred) => self.take_deferred(&qualified_name, &entry.name)?,
            };
            let child = self.build_node(
                child_def,
                Some(Parent {
                    id,
                    entry: index,
                    qualified_name: &qualified_name,
                    depth,
                }),
                None,
            )?;
            children.push(Some(child));
        }

        // 6. Classification, computed once from the built children
        let policy = self.options.branch_policy;
        let classes: Vec<Class> = children
            .iter()
            .map(|child| match child {
                Some(c) if self.is_branch(*c, policy) => Class::Inner,
                _ => Class::Outer,
            })
            .collect();
        let has_child_entries = children.iter().any(Option::is_some);
        let is_leaf = !policy.is_branch(def.entries.len(), has_child_entries);
        let subtree_end = self.nodes.len();

        let record = &mut self.nodes[id.index()];
        record.children = children;
        record.classes = Classes::new(classes);
        record.is_leaf = is_leaf;
        record.subtree_end = subtree_end;

        debug!(
            node = %record.qualified_name,
            entries = record.names.len(),
            inner = record.classes.indices(Selection::Inner).len(),
            underlying = %underlying,
            is_leaf,
            "built node"
        );

        Ok(id)
    }

    fn is_branch(&self, child: NodeId, policy: BranchPolicy) -> bool {
        let record = &self.nodes[child.index()];
        policy.is_branch(
            record.names.len(),
            record.children.iter().any(Option::is_some),
        )
    }

    fn take_deferred(&mut self, parent: &str, entry: &str) -> Result<&'d NodeDef, SpecError> {
        let key = (parent.to_string(), entry.to_string());
        let Some(&body) = self.deferred.get(&key) else {
            return Err(SpecError::UndefinedChild {
                node: key.0,
                entry: key.1,
            });
        };
        self.used_deferred.insert(key);
        Ok(body)
    }

    fn check_deferred_used(&self) -> Result<(), SpecError> {
        let mut orphans: Vec<_> = self
            .deferred
            .keys()
            .filter(|key| !self.used_deferred.contains(*key))
            .collect();
        orphans.sort();
        match orphans.first() {
            Some((parent, name)) => Err(SpecError::OrphanDeferred {
                parent: parent.clone(),
                name: name.clone(),
            }),
            None => Ok(()),
        }
    }
}

fn validate_name(node: &str, name: &str) -> Result<(), SpecError> {
    if name.is_empty() || name.contains("::") || name.chars().any(char::is_whitespace) {
        return Err(SpecError::InvalidName {
            node: node.to_string(),
            name: name.to_string(),
        });
    }
    Ok(())
}

/// An id may repeat inside one node, but not across nodes.
fn check_unique_ids(nodes: &[NodeRecord]) -> Result<(), SpecError> {
    let mut owners: HashMap<&str, &str> = HashMap::new();
    for node in nodes {
        for id in node.ids.iter().flatten() {
            match owners.get(id.as_str()) {
                Some(&first) if first != node.qualified_name => {
                    return Err(SpecError::AmbiguousId {
                        id: id.clone(),
                        first: first.to_string(),
                        second: node.qualified_name.clone(),
                    });
                }
                Some(_) => {}
                None => {
                    owners.insert(id, &node.qualified_name);
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{EntryDef, Override};

    fn build(def: NodeDef) -> Result<EnumTree, SpecError> {
        EnumTree::build(&TreeDef::new(def), &BuildOptions::default())
    }

    #[test]
    fn ordinals_count_from_zero() {
        let tree = build(NodeDef::new("E").leaves(["A", "B", "C"])).unwrap();
        assert_eq!(tree.root().integers(Selection::All), [0, 1, 2]);
    }

    #[test]
    fn ordinals_resume_after_override() {
        let tree = build(
            NodeDef::new("E")
                .entry(EntryDef::new("A"))
                .entry(EntryDef::new("B").ordinal(10))
                .entry(EntryDef::new("C"))
                .entry(EntryDef::new("D").ordinal(-3))
                .entry(EntryDef::new("F")),
        )
        .unwrap();
        assert_eq!(tree.root().integers(Selection::All), [0, 10, 11, -3, -2]);
    }

    #[test]
    fn duplicate_ordinals_are_legal() {
        let tree = build(
            NodeDef::new("E")
                .entry(EntryDef::new("A").ordinal(1))
                .entry(EntryDef::new("B").ordinal(0)),
        )
        .unwrap();
        assert_eq!(tree.root().integers(Selection::All), [1, 0]);
    }

    #[test]
    fn qualified_names_with_prefix() {
        let tree = build(
            NodeDef::new("Vehicle")
                .prefix("app::Category")
                .entry(EntryDef::new("Land").child(NodeDef::new("Land").leaves(["Car"]))),
        )
        .unwrap();
        let land = tree.root().subtypes(Selection::All)[0];
        assert_eq!(land.qualified_name(false), "app::Category::Vehicle::Land");
        assert_eq!(land.names(Selection::All, false), ["app::Category::Vehicle::Land::Car"]);
        assert_eq!(land.names(Selection::All, true), ["Car"]);
    }

    #[test]
    fn empty_prefix_is_ignored() {
        let tree = build(NodeDef::new("E").prefix("")).unwrap();
        assert_eq!(tree.root().qualified_name(false), "E");
        assert_eq!(tree.root().global_prefix(), None);
    }

    #[test]
    fn rejects_duplicate_sibling() {
        let err = build(NodeDef::new("E").leaves(["A", "A"])).unwrap_err();
        assert_eq!(
            err,
            SpecError::DuplicateEntry {
                node: "E".into(),
                entry: "A".into()
            }
        );
    }

    #[test]
    fn same_name_in_different_nodes_is_fine() {
        let tree = build(
            NodeDef::new("E")
                .entry(EntryDef::new("X").child(NodeDef::new("X").leaves(["Item"])))
                .entry(EntryDef::new("Y").child(NodeDef::new("Y").leaves(["Item"]))),
        )
        .unwrap();
        assert!(tree.find_node("E::X").is_some());
        assert!(tree.find_node("E::Y").is_some());
    }

    #[test]
    fn rejects_bad_names() {
        for bad in ["", "a::b", "two words"] {
            let err = build(NodeDef::new("E").leaves([bad])).unwrap_err();
            assert!(matches!(err, SpecError::InvalidName { .. }), "{bad:?}: {err}");
        }
    }

    #[test]
    fn rejects_typed_override_mismatch() {
        let err = build(
            NodeDef::new("E")
                .underlying(IntType::U32)
                .entry(EntryDef::new("A").ordinal(Override::typed(5, IntType::I64))),
        )
        .unwrap_err();
        assert_eq!(
            err,
            SpecError::TypeMismatch {
                node: "E".into(),
                entry: "A".into(),
                expected: IntType::U32,
                found: IntType::I64,
            }
        );
    }

    #[test]
    fn accepts_matching_typed_override() {
        let tree = build(
            NodeDef::new("E")
                .underlying(IntType::U64)
                .entry(EntryDef::new("A").ordinal(Override::typed(5, IntType::U64))),
        )
        .unwrap();
        assert_eq!(tree.root().integers(Selection::All), [5]);
    }

    #[test]
    fn rejects_out_of_range_and_overflow() {
        let err = build(
            NodeDef::new("E")
                .underlying(IntType::U8)
                .entry(EntryDef::new("A").ordinal(-1)),
        )
        .unwrap_err();
        assert!(matches!(err, SpecError::OrdinalOutOfRange { value: -1, .. }));

        let err = build(
            NodeDef::new("E")
                .underlying(IntType::U8)
                .entry(EntryDef::new("A").ordinal(255))
                .entry(EntryDef::new("B")),
        )
        .unwrap_err();
        assert_eq!(
            err,
            SpecError::OrdinalOutOfRange {
                node: "E".into(),
                entry: "B".into(),
                value: 256,
                underlying: IntType::U8,
            }
        );
    }

    #[test]
    fn children_inherit_default_not_parent_underlying() {
        let tree = EnumTree::build(
            &TreeDef::new(
                NodeDef::new("E")
                    .underlying(IntType::U8)
                    .entry(EntryDef::new("C").child(NodeDef::new("C").leaves(["X"]))),
            ),
            &BuildOptions::default().default_underlying(IntType::I64),
        )
        .unwrap();
        assert_eq!(tree.root().underlying(), IntType::U8);
        assert_eq!(tree.find_node("E::C").unwrap().underlying(), IntType::I64);
    }

    #[test]
    fn rejects_child_name_mismatch() {
        let err = build(
            NodeDef::new("E").entry(EntryDef::new("A").child(NodeDef::new("B"))),
        )
        .unwrap_err();
        assert!(matches!(err, SpecError::ChildNameMismatch { .. }));
    }

    #[test]
    fn rejects_prefix_on_child() {
        let err = build(
            NodeDef::new("E").entry(EntryDef::new("A").child(NodeDef::new("A").prefix("p"))),
        )
        .unwrap_err();
        assert_eq!(err, SpecError::PrefixOnChild { node: "E::A".into() });
    }

    #[test]
    fn resolves_deferred_children() {
        let def = TreeDef::new(
            NodeDef::new("E")
                .entry(EntryDef::new("A").deferred())
                .entry(EntryDef::new("B")),
        )
        .defer("E", NodeDef::new("A").leaves(["X", "Y"]));
        let tree = EnumTree::build(&def, &BuildOptions::default()).unwrap();
        let a = tree.find_node("E::A").unwrap();
        assert_eq!(a.names(Selection::All, true), ["X", "Y"]);
        assert_eq!(a.parent(), tree.root());
    }

    #[test]
    fn deferred_errors() {
        let missing = TreeDef::new(NodeDef::new("E").entry(EntryDef::new("A").deferred()));
        assert_eq!(
            EnumTree::build(&missing, &BuildOptions::default()).unwrap_err(),
            SpecError::UndefinedChild {
                node: "E".into(),
                entry: "A".into()
            }
        );

        let orphan = TreeDef::new(NodeDef::new("E").leaves(["A"])).defer("E", NodeDef::new("Z"));
        assert_eq!(
            EnumTree::build(&orphan, &BuildOptions::default()).unwrap_err(),
            SpecError::OrphanDeferred {
                parent: "E".into(),
                name: "Z".into()
            }
        );

        let twice = TreeDef::new(NodeDef::new("E").entry(EntryDef::new("A").deferred()))
            .defer("E", NodeDef::new("A"))
            .defer("E", NodeDef::new("A"));
        assert!(matches!(
            EnumTree::build(&twice, &BuildOptions::default()).unwrap_err(),
            SpecError::DuplicateDeferred { .. }
        ));
    }

    #[test]
    fn ambiguous_ids_across_nodes() {
        let def = TreeDef::new(
            NodeDef::new("E")
                .entry(EntryDef::new("A").id("dup"))
                .entry(
                    EntryDef::new("B")
                        .child(NodeDef::new("B").entry(EntryDef::new("X").id("dup"))),
                ),
        );
        let err = EnumTree::build(&def, &BuildOptions::default()).unwrap_err();
        assert_eq!(
            err,
            SpecError::AmbiguousId {
                id: "dup".into(),
                first: "E".into(),
                second: "E::B".into()
            }
        );

        let tree = EnumTree::build(&def, &BuildOptions::default().allow_ambiguous(true)).unwrap();
        assert!(tree.options().allow_ambiguous);
    }

    #[test]
    fn duplicate_ids_inside_one_node_are_legal() {
        let tree = build(
            NodeDef::new("E")
                .entry(EntryDef::new("A").id("x"))
                .entry(EntryDef::new("B").id("x")),
        )
        .unwrap();
        assert_eq!(tree.root().ids(Selection::All), [Some("x"), Some("x")]);
    }

    #[test]
    fn classification_follows_policy() {
        let def = TreeDef::new(
            NodeDef::new("E")
                .entry(EntryDef::new("Flat").child(NodeDef::new("Flat").leaves(["A", "B"])))
                .entry(EntryDef::new("Empty").child(NodeDef::new("Empty")))
                .entry(EntryDef::new("Deep").child(
                    NodeDef::new("Deep")
                        .entry(EntryDef::new("Sub").child(NodeDef::new("Sub").leaves(["Z"]))),
                ))
                .entry(EntryDef::new("Plain")),
        );

        let tree = EnumTree::build(&def, &BuildOptions::default()).unwrap();
        let inner: Vec<_> = tree.root().names(Selection::Inner, true);
        assert_eq!(inner, ["Flat", "Deep"]);
        assert!(tree.find_node("E::Empty").unwrap().is_leaf());
        assert!(!tree.find_node("E::Flat").unwrap().is_leaf());

        let strict = BuildOptions::default().branch_policy(BranchPolicy::Nested);
        let tree = EnumTree::build(&def, &strict).unwrap();
        assert_eq!(tree.root().names(Selection::Inner, true), ["Deep"]);
        assert_eq!(
            tree.root().names(Selection::Outer, true),
            ["Flat", "Empty", "Plain"]
        );
        assert!(tree.find_node("E::Flat").unwrap().is_leaf());
        assert!(!tree.find_node("E::Deep").unwrap().is_leaf());
    }

    #[test]
    fn subtree_ranges() {
        let tree = build(
            NodeDef::new("E")
                .entry(EntryDef::new("A").child(NodeDef::new("A").entry(
                    EntryDef::new("AA").child(NodeDef::new("AA").leaves(["x"])),
                )))
                .entry(EntryDef::new("B").child(NodeDef::new("B").leaves(["y"]))),
        )
        .unwrap();
        let order: Vec<_> = tree.nodes().map(|n| n.qualified_name(false)).collect();
        assert_eq!(order, ["E", "E::A", "E::A::AA", "E::B"]);
        let a = tree.find_node("E::A").unwrap();
        assert_eq!(a.subtree().count(), 2);
        assert_eq!(tree.find_node("E::A::AA").unwrap().depth(), 2);
    }
}
