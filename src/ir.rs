//! Intermediate representation handed to the builder by a front end.
//!
//! A front end (the `nested_enum!` macro, the TOML loader in
//! `nested-enum-build`, or hand-written Rust) describes one tree as a
//! [`TreeDef`]. Nothing here is validated; [`EnumTree::build`] does that.
//!
//! [`EnumTree::build`]: crate::EnumTree::build

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Integer domain shared by all entries of one node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntType {
    I8,
    I16,
    #[default]
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
}

impl IntType {
    pub const ALL: [IntType; 8] = [
        IntType::I8,
        IntType::I16,
        IntType::I32,
        IntType::I64,
        IntType::U8,
        IntType::U16,
        IntType::U32,
        IntType::U64,
    ];

    /// Rust spelling of the type (`"u32"`).
    pub const fn as_str(self) -> &'static str {
        match self {
            IntType::I8 => "i8",
            IntType::I16 => "i16",
            IntType::I32 => "i32",
            IntType::I64 => "i64",
            IntType::U8 => "u8",
            IntType::U16 => "u16",
            IntType::U32 => "u32",
            IntType::U64 => "u64",
        }
    }

    pub const fn min(self) -> i128 {
        match self {
            IntType::I8 => i8::MIN as i128,
            IntType::I16 => i16::MIN as i128,
            IntType::I32 => i32::MIN as i128,
            IntType::I64 => i64::MIN as i128,
            IntType::U8 | IntType::U16 | IntType::U32 | IntType::U64 => 0,
        }
    }

    pub const fn max(self) -> i128 {
        match self {
            IntType::I8 => i8::MAX as i128,
            IntType::I16 => i16::MAX as i128,
            IntType::I32 => i32::MAX as i128,
            IntType::I64 => i64::MAX as i128,
            IntType::U8 => u8::MAX as i128,
            IntType::U16 => u16::MAX as i128,
            IntType::U32 => u32::MAX as i128,
            IntType::U64 => u64::MAX as i128,
        }
    }

    /// Whether `value` is representable in this type.
    #[inline]
    pub const fn contains(self, value: i128) -> bool {
        value >= self.min() && value <= self.max()
    }
}

impl fmt::Display for IntType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown integer type name.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown underlying type '{0}': expected one of i8, i16, i32, i64, u8, u16, u32, u64")]
pub struct UnknownIntType(pub String);

impl FromStr for IntType {
    type Err = UnknownIntType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IntType::ALL
            .into_iter()
            .find(|ty| ty.as_str() == s)
            .ok_or_else(|| UnknownIntType(s.to_string()))
    }
}

/// Explicit ordinal given by the author.
///
/// `ty` is the literal's own type when the front end knows it (`5u64`);
/// the builder rejects it when it differs from the node's underlying type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Override {
    pub value: i128,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<IntType>,
}

impl Override {
    pub const fn new(value: i128) -> Self {
        Self { value, ty: None }
    }

    pub const fn typed(value: i128, ty: IntType) -> Self {
        Self {
            value,
            ty: Some(ty),
        }
    }
}

impl From<i128> for Override {
    fn from(value: i128) -> Self {
        Self::new(value)
    }
}

/// Body of a nested node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChildDef {
    /// Declared in place.
    Inline(NodeDef),
    /// Declared later through a [`DeferredDef`] in the same [`TreeDef`].
    Deferred,
}

impl ChildDef {
    /// The node body, when declared in place.
    pub fn inline(&self) -> Option<&NodeDef> {
        match self {
            Self::Inline(node) => Some(node),
            Self::Deferred => None,
        }
    }
}

/// One enumerator inside a node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntryDef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ordinal: Option<Override>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Opaque path of an external type associated with this entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child: Option<ChildDef>,
}

impl EntryDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ordinal: None,
            id: None,
            linked: None,
            child: None,
        }
    }

    pub fn ordinal(mut self, ordinal: impl Into<Override>) -> Self {
        self.ordinal = Some(ordinal.into());
        self
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn linked(mut self, linked: impl Into<String>) -> Self {
        self.linked = Some(linked.into());
        self
    }

    /// Expand this entry into `node`. The node keeps the entry's name.
    pub fn child(mut self, node: NodeDef) -> Self {
        self.child = Some(ChildDef::Inline(node));
        self
    }

    /// Expand this entry into a node whose body is supplied by a [`DeferredDef`].
    pub fn deferred(mut self) -> Self {
        self.child = Some(ChildDef::Deferred);
        self
    }
}

/// One level of the hierarchy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeDef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underlying: Option<IntType>,
    /// Global name prefix; only valid on the root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(default)]
    pub entries: Vec<EntryDef>,
}

impl NodeDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            underlying: None,
            prefix: None,
            entries: Vec::new(),
        }
    }

    pub fn underlying(mut self, ty: IntType) -> Self {
        self.underlying = Some(ty);
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn entry(mut self, entry: EntryDef) -> Self {
        self.entries.push(entry);
        self
    }

    /// Shorthand for a run of plain leaf entries.
    pub fn leaves<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entries.extend(names.into_iter().map(EntryDef::new));
        self
    }
}

/// Body of a child declared [`ChildDef::Deferred`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeferredDef {
    /// Qualified name of the node that declares the deferred entry.
    pub parent: String,
    /// The child node; its name is the entry's name.
    pub node: NodeDef,
}

/// A complete tree definition: one root plus deferred bodies.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TreeDef {
    pub root: NodeDef,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deferred: Vec<DeferredDef>,
}

impl TreeDef {
    pub fn new(root: NodeDef) -> Self {
        Self {
            root,
            deferred: Vec::new(),
        }
    }

    pub fn defer(mut self, parent: impl Into<String>, node: NodeDef) -> Self {
        self.deferred.push(DeferredDef {
            parent: parent.into(),
            node,
        });
        self
    }
}

impl From<NodeDef> for TreeDef {
    fn from(root: NodeDef) -> Self {
        Self::new(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_type_ranges() {
        assert!(IntType::U8.contains(255));
        assert!(!IntType::U8.contains(256));
        assert!(!IntType::U8.contains(-1));
        assert!(IntType::I8.contains(-128));
        assert!(!IntType::I8.contains(128));
        assert!(IntType::U64.contains(u64::MAX as i128));
        assert!(IntType::I64.contains(i64::MIN as i128));
    }

    #[test]
    fn int_type_parse() {
        for ty in IntType::ALL {
            assert_eq!(ty.as_str().parse::<IntType>(), Ok(ty));
        }
        let err = "usize".parse::<IntType>().unwrap_err();
        assert!(err.to_string().contains("usize"));
    }

    #[test]
    fn default_underlying_is_i32() {
        assert_eq!(IntType::default(), IntType::I32);
    }

    #[test]
    fn builder_methods_compose() {
        let def = NodeDef::new("Vehicle")
            .prefix("Category")
            .underlying(IntType::U32)
            .entry(EntryDef::new("Land").child(NodeDef::new("Land").leaves(["Car", "Truck"])))
            .entry(EntryDef::new("Watercraft").ordinal(5).id("W"));

        assert_eq!(def.entries.len(), 2);
        assert_eq!(def.entries[1].ordinal, Some(Override::new(5)));
        assert_eq!(def.entries[1].id.as_deref(), Some("W"));
        match &def.entries[0].child {
            Some(ChildDef::Inline(land)) => assert_eq!(land.entries.len(), 2),
            other => panic!("expected inline child, got {other:?}"),
        }
    }

    #[test]
    fn deserializes_from_json() {
        let json = r#"{
            "root": {
                "name": "Vehicle",
                "underlying": "u32",
                "entries": [
                    { "name": "Land", "child": { "inline": { "name": "Land", "entries": [ { "name": "Car" } ] } } },
                    { "name": "Watercraft", "ordinal": { "value": 7 }, "id": "W" },
                    { "name": "Aircraft", "child": "deferred" }
                ]
            },
            "deferred": [ { "parent": "Vehicle", "node": { "name": "Aircraft" } } ]
        }"#;

        let def: TreeDef = serde_json::from_str(json).unwrap();
        assert_eq!(def.root.underlying, Some(IntType::U32));
        assert_eq!(def.root.entries[1].ordinal, Some(Override::new(7)));
        assert_eq!(def.root.entries[2].child, Some(ChildDef::Deferred));
        assert_eq!(def.deferred[0].parent, "Vehicle");
    }
}
