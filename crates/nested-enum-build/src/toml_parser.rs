//! TOML configuration parser for enums.toml.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use nested_enum::{BranchPolicy, BuildOptions, EntryDef, IntType, NodeDef, Override, TreeDef};
use serde::Deserialize;

/// Entry names the generated modules already use.
const RESERVED: [&str; 6] = ["Value", "Entry", "tree", "definition", "OPTIONS", "NODE_COUNT"];

/// Rust keywords (strict and reserved, edition 2024); none of them parses as an entry name.
const KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "gen", "if", "impl", "in", "let", "loop", "match", "mod",
    "move", "mut", "pub", "ref", "return", "self", "Self", "static", "struct", "super", "trait",
    "true", "type", "unsafe", "use", "where", "while", "abstract", "become", "box", "do",
    "final", "macro", "override", "priv", "try", "typeof", "unsized", "virtual", "yield",
];

/// Parsed enums configuration.
#[derive(Debug, Clone)]
pub struct EnumsConfig {
    /// Name of the root enumeration
    pub name: String,
    /// Global prefix for qualified names
    pub prefix: Option<String>,
    /// Integer type of the root node
    pub underlying: Option<IntType>,
    pub options: BuildOptions,
    /// All value entries (including auto-generated parents), in first-mention order
    entries: Vec<ValueEntry>,
    /// Per-node settings keyed by dot-separated path
    nodes: BTreeMap<String, NodeConfig>,
}

/// A single entry of some node, addressed by its path from the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueEntry {
    /// Full dot-separated path (e.g., "Land.Car")
    pub path: String,
    /// Tree depth (0 = entry of the root)
    pub depth: usize,
    /// Parent path (None for entries of the root)
    pub parent: Option<String>,
    pub id: Option<String>,
    pub ordinal: Option<i64>,
    /// Rust type path carried by the entry
    pub linked: Option<String>,
    /// Whether the path was listed in `[[values]]` rather than implied by a child
    pub declared: bool,
}

impl ValueEntry {
    /// Last path segment.
    pub fn name(&self) -> &str {
        self.path.rsplit('.').next().unwrap_or(&self.path)
    }
}

/// Settings for an entry that expands into a child node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeConfig {
    pub underlying: Option<IntType>,
}

/// Raw TOML structure.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawEnumsConfig {
    name: String,
    prefix: Option<String>,
    underlying: Option<IntType>,
    default_underlying: Option<IntType>,
    #[serde(default)]
    allow_ambiguous: bool,
    policy: Option<BranchPolicy>,
    #[serde(default)]
    values: Vec<RawValue>,
    #[serde(default)]
    nodes: BTreeMap<String, NodeConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawValue {
    path: String,
    id: Option<String>,
    ordinal: Option<i64>,
    linked: Option<String>,
}

impl EnumsConfig {
    /// Parse from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, EnumsConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| EnumsConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_str(&content)
    }

    /// Parse from a TOML string.
    pub fn from_str(content: &str) -> Result<Self, EnumsConfigError> {
        let raw: RawEnumsConfig = toml::from_str(content)?;

        check_segment(&raw.name, &raw.name, "name")?;

        let entries = Self::expand_values(&raw.values)?;

        for path in raw.nodes.keys() {
            if !entries.iter().any(|e| &e.path == path) {
                return Err(EnumsConfigError::Validation(format!(
                    "Invalid node '{}': path is not declared in [[values]]",
                    path
                )));
            }
        }

        let mut options = BuildOptions::default().allow_ambiguous(raw.allow_ambiguous);
        if let Some(ty) = raw.default_underlying {
            options = options.default_underlying(ty);
        }
        if let Some(policy) = raw.policy {
            options = options.branch_policy(policy);
        }

        Ok(Self {
            name: raw.name,
            prefix: raw.prefix,
            underlying: raw.underlying,
            options,
            entries,
            nodes: raw.nodes,
        })
    }

    /// Get all entries.
    pub fn entries(&self) -> impl Iterator<Item = &ValueEntry> {
        self.entries.iter()
    }

    pub fn get(&self, path: &str) -> Option<&ValueEntry> {
        self.entries.iter().find(|e| e.path == path)
    }

    /// Get entry count.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries directly below `parent` (`None` for the root), in declaration order.
    pub fn children_of<'a>(
        &'a self,
        parent: Option<&'a str>,
    ) -> impl Iterator<Item = &'a ValueEntry> + 'a {
        self.entries
            .iter()
            .filter(move |e| e.parent.as_deref() == parent)
    }

    /// Whether the entry at `path` expands into a child node.
    ///
    /// True when other entries live below it or it has a `[nodes]` table,
    /// which is how an empty child is declared.
    pub fn is_node(&self, path: &str) -> bool {
        self.nodes.contains_key(path) || self.children_of(Some(path)).next().is_some()
    }

    pub fn node_config(&self, path: &str) -> Option<&NodeConfig> {
        self.nodes.get(path)
    }

    /// Lower to the intermediate representation consumed by `EnumTree::build`.
    pub fn to_tree_def(&self) -> TreeDef {
        let mut root = NodeDef::new(&self.name);
        root.underlying = self.underlying;
        root.prefix = self.prefix.clone();
        root.entries = self.entry_defs(None);
        TreeDef::new(root)
    }

    fn entry_defs(&self, parent: Option<&str>) -> Vec<EntryDef> {
        self.children_of(parent)
            .map(|entry| {
                let mut def = EntryDef::new(entry.name());
                def.ordinal = entry.ordinal.map(|v| Override::new(v.into()));
                def.id = entry.id.clone();
                def.linked = entry.linked.clone();
                if self.is_node(&entry.path) {
                    let mut child = NodeDef::new(entry.name());
                    child.underlying = self.nodes.get(&entry.path).and_then(|n| n.underlying);
                    child.entries = self.entry_defs(Some(&entry.path));
                    def = def.child(child);
                }
                def
            })
            .collect()
    }

    /// Expand value paths to include all parent entries.
    ///
    /// e.g., "A.B.C" expands to ["A", "A.B", "A.B.C"]; a parent mentioned
    /// later by its own `[[values]]` item takes that item's settings.
    fn expand_values(values: &[RawValue]) -> Result<Vec<ValueEntry>, EnumsConfigError> {
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut entries: Vec<ValueEntry> = Vec::new();

        for value in values {
            let path = &value.path;
            check_path(path)?;

            let segments: Vec<&str> = path.split('.').collect();

            // Add all ancestors and the path itself
            for depth in 0..segments.len() {
                let ancestor_path = segments[..=depth].join(".");
                if index.contains_key(&ancestor_path) {
                    continue;
                }
                let parent = (depth > 0).then(|| segments[..depth].join("."));
                index.insert(ancestor_path.clone(), entries.len());
                entries.push(ValueEntry {
                    path: ancestor_path,
                    depth,
                    parent,
                    id: None,
                    ordinal: None,
                    linked: None,
                    declared: false,
                });
            }

            let entry = &mut entries[index[path.as_str()]];
            if entry.declared {
                return Err(EnumsConfigError::Validation(format!(
                    "Invalid path '{}': declared more than once",
                    path
                )));
            }
            entry.declared = true;
            entry.id = value.id.clone();
            entry.ordinal = value.ordinal;
            entry.linked = value.linked.clone();
        }

        Ok(entries)
    }
}

fn check_path(path: &str) -> Result<(), EnumsConfigError> {
    if path.is_empty() {
        return Err(EnumsConfigError::Validation("Empty path not allowed".into()));
    }
    if path.starts_with('.') || path.ends_with('.') {
        return Err(EnumsConfigError::Validation(format!(
            "Invalid path '{}': cannot start or end with '.'",
            path
        )));
    }
    if path.contains("..") {
        return Err(EnumsConfigError::Validation(format!(
            "Invalid path '{}': contains '..'",
            path
        )));
    }
    for seg in path.split('.') {
        check_segment(path, seg, "path")?;
        if RESERVED.contains(&seg) {
            return Err(EnumsConfigError::Validation(format!(
                "Invalid path '{}': '{}' is reserved for generated items",
                path, seg
            )));
        }
    }
    Ok(())
}

/// Valid identifier: starts with letter/underscore, continues with alphanumeric/_.
fn check_segment(path: &str, seg: &str, what: &str) -> Result<(), EnumsConfigError> {
    let mut chars = seg.chars();
    match chars.next() {
        None => {
            return Err(EnumsConfigError::Validation(format!(
                "Invalid {} '{}': empty segment",
                what, path
            )));
        }
        Some(first) if !first.is_alphabetic() && first != '_' => {
            return Err(EnumsConfigError::Validation(format!(
                "Invalid {} '{}': segment '{}' must start with letter or underscore",
                what, path, seg
            )));
        }
        Some(_) => {}
    }
    if let Some(c) = chars.find(|c| !c.is_alphanumeric() && *c != '_') {
        return Err(EnumsConfigError::Validation(format!(
            "Invalid {} '{}': segment '{}' contains invalid character '{}'",
            what, path, seg, c
        )));
    }
    if seg == "_" || KEYWORDS.contains(&seg) {
        return Err(EnumsConfigError::Validation(format!(
            "Invalid {} '{}': segment '{}' is a Rust keyword",
            what, path, seg
        )));
    }
    Ok(())
}

/// Errors during config parsing.
#[derive(Debug, thiserror::Error)]
pub enum EnumsConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("validation error: {0}")]
    Validation(String),
}
