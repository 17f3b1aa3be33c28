//! Code generation for the `nested_enum!` macro.

use nested_enum::{BranchPolicy, EntryDef, IntType, NodeDef};

use crate::toml_parser::EnumsConfig;

const INDENT: &str = "    ";

/// Generate a `nested_enum!` invocation for the configured tree.
///
/// The output only names `nested_enum_macro`, so the including crate needs
/// both `nested-enum` and `nested-enum-macro` as dependencies.
pub fn generate_nested_enum_code(config: &EnumsConfig) -> String {
    let def = config.to_tree_def();
    let root = &def.root;

    let mut code = String::new();
    code.push_str("// Generated by nested-enum-build from enums.toml. Do not edit.\n\n");
    code.push_str("nested_enum_macro::nested_enum! {\n");

    // Root attributes
    if let Some(prefix) = &root.prefix {
        code.push_str(&format!("{INDENT}#[prefix = {:?}]\n", prefix));
    }
    if let Some(ty) = root.underlying {
        code.push_str(&format!("{INDENT}#[repr({})]\n", ty));
    }
    if config.options.default_underlying != IntType::default() {
        code.push_str(&format!(
            "{INDENT}#[default_repr({})]\n",
            config.options.default_underlying
        ));
    }
    if config.options.allow_ambiguous {
        code.push_str(&format!("{INDENT}#[allow_ambiguous]\n"));
    }
    if config.options.branch_policy != BranchPolicy::default() {
        code.push_str(&format!(
            "{INDENT}#[policy = {:?}]\n",
            config.options.branch_policy.as_str()
        ));
    }

    code.push_str(&format!("{INDENT}pub enum {} {{\n", root.name));
    generate_entries(&mut code, root, 2);
    code.push_str(&format!("{INDENT}}}\n"));
    code.push_str("}\n");
    code
}

fn generate_entries(code: &mut String, node: &NodeDef, depth: usize) {
    let indent = INDENT.repeat(depth);
    for entry in &node.entries {
        generate_entry(code, entry, &indent, depth);
    }
}

fn generate_entry(code: &mut String, entry: &EntryDef, indent: &str, depth: usize) {
    let child = entry.child.as_ref().and_then(|child| child.inline());

    if let Some(id) = &entry.id {
        code.push_str(&format!("{indent}#[id = {:?}]\n", id));
    }
    if let Some(ty) = child.and_then(|c| c.underlying) {
        code.push_str(&format!("{indent}#[repr({})]\n", ty));
    }

    code.push_str(indent);
    code.push_str(&entry.name);
    if let Some(linked) = &entry.linked {
        code.push_str(&format!("<{}>", linked));
    }
    if let Some(ordinal) = &entry.ordinal {
        code.push_str(&format!(" = {}", ordinal.value));
    }

    match child {
        None => code.push_str(";\n"),
        Some(child) if child.entries.is_empty() => code.push_str(" {}\n"),
        Some(child) => {
            code.push_str(" {\n");
            generate_entries(code, child, depth + 1);
            code.push_str(&format!("{indent}}}\n"));
        }
    }
}
