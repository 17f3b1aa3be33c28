//! Lookup Engine: single-node lookups across value, name, id and integer.
//!
//! Every lookup scans this node's own tables in declaration order and
//! returns the first match. A miss is `None`, never an error. Names are
//! matched in their fully qualified form.

use crate::tree::{EnumValue, NodeRef};

impl<'a> NodeRef<'a> {
    /// Row of `value` in this node.
    ///
    /// # Panics
    ///
    /// Panics if `value` was declared by a different node or tree.
    fn position_of(&self, value: EnumValue) -> Option<usize> {
        assert!(
            value.tree() == self.tree.id,
            "value of another tree queried against '{}'",
            self.qualified_name(false),
        );
        assert!(
            value.node() == self.id,
            "value of '{}' queried against '{}'",
            self.tree.node(value.node()).qualified_name(false),
            self.qualified_name(false),
        );
        self.record()
            .integers
            .iter()
            .position(|&i| i == value.integer())
    }

    fn position_by_name(&self, name: &str) -> Option<usize> {
        self.record().names.iter().position(|n| n == name)
    }

    fn position_by_id(&self, id: &str) -> Option<usize> {
        self.record()
            .ids
            .iter()
            .position(|i| i.as_deref() == Some(id))
    }

    // value → *

    pub fn name_of(&self, value: EnumValue, clean: bool) -> Option<&'a str> {
        self.position_of(value).map(|i| self.entry_name(i, clean))
    }

    /// `None` both when the value is unknown and when it was declared without an id.
    pub fn id_of(&self, value: EnumValue) -> Option<&'a str> {
        self.position_of(value)
            .and_then(|i| self.record().ids[i].as_deref())
    }

    pub fn name_and_id_of(
        &self,
        value: EnumValue,
        clean: bool,
    ) -> Option<(&'a str, Option<&'a str>)> {
        self.position_of(value)
            .map(|i| (self.entry_name(i, clean), self.record().ids[i].as_deref()))
    }

    /// Integer of a value declared by this node.
    pub fn integer_of(&self, value: EnumValue) -> Option<i128> {
        self.position_of(value).map(|i| self.record().integers[i])
    }

    pub fn linked_type_of(&self, value: EnumValue) -> Option<&'a str> {
        self.position_of(value).map(|i| self.linked_type_at(i))
    }

    // name → *

    pub fn id_by_name(&self, name: &str) -> Option<&'a str> {
        self.position_by_name(name)
            .and_then(|i| self.record().ids[i].as_deref())
    }

    pub fn integer_by_name(&self, name: &str) -> Option<i128> {
        self.position_by_name(name).map(|i| self.record().integers[i])
    }

    pub fn value_by_name(&self, name: &str) -> Option<EnumValue> {
        self.integer_by_name(name)
            .map(|integer| EnumValue::new(self.tree.id, self.id, integer))
    }

    // id → *

    pub fn name_by_id(&self, id: &str, clean: bool) -> Option<&'a str> {
        self.position_by_id(id).map(|i| self.entry_name(i, clean))
    }

    pub fn integer_by_id(&self, id: &str) -> Option<i128> {
        self.position_by_id(id).map(|i| self.record().integers[i])
    }

    pub fn value_by_id(&self, id: &str) -> Option<EnumValue> {
        self.integer_by_id(id)
            .map(|integer| EnumValue::new(self.tree.id, self.id, integer))
    }

    /// Value with the given integer, if one is declared.
    pub fn value_of(&self, integer: i128) -> Option<EnumValue> {
        self.record()
            .integers
            .contains(&integer)
            .then(|| EnumValue::new(self.tree.id, self.id, integer))
    }
}

#[cfg(test)]
mod tests {
    use crate::builder::BuildOptions;
    use crate::ir::{EntryDef, NodeDef, TreeDef};
    use crate::tree::{EnumTree, EnumValue, NodeId};

    fn cars() -> EnumTree {
        let def = TreeDef::new(
            NodeDef::new("Car")
                .entry(EntryDef::new("Subcompact"))
                .entry(EntryDef::new("Compact").id("C-segment"))
                .entry(EntryDef::new("Blank").id(""))
                .entry(EntryDef::new("Alias").ordinal(1).id("alias")),
        );
        EnumTree::build(&def, &BuildOptions::default()).unwrap()
    }

    #[test]
    fn by_value() {
        let tree = cars();
        let car = tree.root();
        let compact = car.value_of(1).unwrap();
        assert_eq!(car.name_of(compact, false), Some("Car::Compact"));
        assert_eq!(car.name_of(compact, true), Some("Compact"));
        assert_eq!(car.id_of(compact), Some("C-segment"));
        assert_eq!(car.name_and_id_of(compact, true), Some(("Compact", Some("C-segment"))));
        assert_eq!(car.integer_of(compact), Some(1));
        assert_eq!(car.linked_type_of(compact), Some("Car"));
    }

    #[test]
    fn missing_id_is_not_empty_id() {
        let tree = cars();
        let car = tree.root();
        let sub = car.value_by_name("Car::Subcompact").unwrap();
        assert_eq!(car.id_of(sub), None);
        let blank = car.value_by_name("Car::Blank").unwrap();
        assert_eq!(car.id_of(blank), Some(""));
        assert_eq!(car.name_by_id("", true), Some("Blank"));
        assert_eq!(car.name_and_id_of(sub, true), Some(("Subcompact", None)));
    }

    #[test]
    fn by_name_and_id() {
        let tree = cars();
        let car = tree.root();
        assert_eq!(car.id_by_name("Car::Compact"), Some("C-segment"));
        assert_eq!(car.integer_by_name("Car::Compact"), Some(1));
        assert_eq!(car.value_by_id("C-segment"), Some(EnumValue::new(tree.id(), NodeId::ROOT, 1)));
        assert_eq!(car.integer_by_id("C-segment"), Some(1));
        assert_eq!(car.name_by_id("C-segment", false), Some("Car::Compact"));
    }

    #[test]
    fn names_must_be_qualified() {
        let tree = cars();
        assert_eq!(tree.root().value_by_name("Compact"), None);
    }

    #[test]
    fn duplicate_integer_resolves_to_first() {
        let tree = cars();
        let car = tree.root();
        let one = car.value_of(1).unwrap();
        assert_eq!(car.name_of(one, true), Some("Compact"));
        assert_eq!(car.value_by_id("alias"), Some(one));
    }

    #[test]
    fn misses_are_none() {
        let tree = cars();
        let car = tree.root();
        assert_eq!(car.value_of(42), None);
        assert_eq!(car.name_of(EnumValue::new(tree.id(), NodeId::ROOT, 42), false), None);
        assert_eq!(car.value_by_id("nope"), None);
        assert_eq!(car.id_by_name("Car::Nope"), None);
    }

    #[test]
    #[should_panic(expected = "queried against")]
    fn wrong_node_panics() {
        let def = TreeDef::new(
            NodeDef::new("E").entry(EntryDef::new("A").child(NodeDef::new("A").leaves(["X"]))),
        );
        let tree = EnumTree::build(&def, &BuildOptions::default()).unwrap();
        let a = tree.find_node("E::A").unwrap();
        let x = a.value_of(0).unwrap();
        tree.root().name_of(x, false);
    }

    #[test]
    #[should_panic(expected = "value of another tree")]
    fn other_tree_panics() {
        let first = cars();
        let second = cars();
        let compact = second.root().value_by_name("Car::Compact").unwrap();
        first.root().name_of(compact, false);
    }
}
