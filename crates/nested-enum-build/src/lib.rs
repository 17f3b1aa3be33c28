//! Build-time utilities for nested-enum.
//!
//! This crate provides tools for:
//! - Parsing `enums.toml` configuration files
//! - Validating the declared tree with the same builder the macro uses
//! - Generating Rust code with the `nested_enum!` macro
//!
//! # enums.toml
//!
//! ```toml
//! name = "Vehicle"            # root enumeration
//! prefix = "Category"         # optional global prefix
//! underlying = "u32"          # optional, root node's integer type
//! default_underlying = "i32"  # for nodes that do not declare one
//! allow_ambiguous = false
//! policy = "non_empty"        # or "nested"
//!
//! # Parents are created on first mention; declaration order is kept.
//! [[values]]
//! path = "Land.Car"
//! id = "C-segment"
//! ordinal = 3
//! linked = "crate::Hatchback"
//!
//! # Settings for an entry that expands into a child node. An empty
//! # table declares an empty child.
//! [nodes."Land"]
//! underlying = "u64"
//! ```
//!
//! # Usage in build.rs
//!
//! ```ignore
//! // build.rs
//! fn main() {
//!     println!("cargo:rerun-if-changed=enums.toml");
//!     nested_enum_build::generate("enums.toml", "src/generated_enums.rs")
//!         .expect("Failed to generate enums");
//! }
//! ```

mod codegen;
mod toml_parser;

pub use codegen::generate_nested_enum_code;
pub use toml_parser::{EnumsConfig, EnumsConfigError, NodeConfig, ValueEntry};

use std::path::Path;

use nested_enum::{EnumTree, SpecError};
use tracing::info;

/// Main entry point for build.rs integration.
///
/// Reads `enums.toml`, validates the tree and writes the generated code.
///
/// # Errors
///
/// Returns an error if:
/// - `enums.toml` cannot be read, parsed or validated
/// - the declared tree is rejected by [`EnumTree::build`]
/// - the output file cannot be written
pub fn generate(
    config_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
) -> Result<(), GenerateError> {
    let config_path = config_path.as_ref();
    let output_path = output_path.as_ref();

    // 1. Parse enums.toml
    let config = EnumsConfig::from_file(config_path)?;

    // 2. Build the tree the macro will build, so errors surface here
    let tree = EnumTree::build(&config.to_tree_def(), &config.options)?;

    // 3. Generate Rust code
    let code = generate_nested_enum_code(&config);
    std::fs::write(output_path, code)?;

    info!(
        config = %config_path.display(),
        output = %output_path.display(),
        nodes = tree.len(),
        "generated nested enum code"
    );
    Ok(())
}

/// Errors that can occur during generation.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("config error: {0}")]
    Config(#[from] EnumsConfigError),
    /// The configuration parsed but does not describe a valid tree.
    #[error("invalid enum tree: {0}")]
    Spec(#[from] SpecError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
