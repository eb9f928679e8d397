//! Binding generation for contract ABIs
//!
//! Turns an ABI (or a compiler artifact carrying one) into a Rust module with
//! a typed wrapper per contract: one accessor set per function, a parse/decode
//! pair per event, and record structs for tuples and multi-argument calls.

pub mod cli;
pub mod context;
pub mod document;
pub mod generator;
pub mod templates;

#[cfg(test)]
mod tests;

pub use context::GenerationContext;
pub use document::{Document, Node, Printer};
pub use generator::BindingGenerator;

use std::path::{Path, PathBuf};

use ethbind_abi::AbiParser;
use ethbind_common::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Configuration for binding generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CodegenConfig {
    /// Name of the generated contract type
    pub contract_name: String,
    /// Output directory for generated code
    pub output_dir: String,
    /// Embed bytecode and emit a `deploy` accessor
    pub output_bytecode: bool,
    /// Emit `*_batch_call` accessors
    pub has_batch_call: bool,
    /// Crate path the generated code imports its runtime from
    pub runtime_crate: String,
    /// Whether this is a dry run
    pub dry_run: bool,
}

impl Default for CodegenConfig {
    fn default() -> Self {
        Self {
            contract_name: String::new(),
            output_dir: "./generated".to_string(),
            output_bytecode: false,
            has_batch_call: false,
            runtime_crate: "ethbind_runtime".to_string(),
            dry_run: false,
        }
    }
}

impl CodegenConfig {
    /// Load a configuration from a JSON file; absent keys keep their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        serde_json::from_str(&content).map_err(|e| {
            Error::codegen(format!(
                "Invalid configuration {}: {}",
                path.as_ref().display(),
                e
            ))
        })
    }
}

/// Main entry point for binding generation
///
/// Returns the path of the generated file, which is only written when the
/// configuration is not a dry run.
pub async fn generate_contract_code(abi_file_path: &str, config: CodegenConfig) -> Result<PathBuf> {
    let parser = AbiParser::new();
    let artifact = parser.parse_file(abi_file_path)?;
    info!(
        "Parsed {} ABI item(s) from {}",
        artifact.abi.items.len(),
        abi_file_path
    );

    let generator = BindingGenerator::new(config)?;
    generator.write(&artifact).await
}
