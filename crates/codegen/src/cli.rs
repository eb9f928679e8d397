//! CLI interface for binding generation

use std::path::PathBuf;

use clap::Args;
use ethbind_common::{Error, Result};
use tracing::{debug, info};

use super::{generate_contract_code, CodegenConfig};

/// Arguments of the `generate` command
#[derive(Debug, Clone, Args)]
pub struct GenerateArgs {
    /// Path to the contract ABI or compiler artifact JSON file
    pub abi_file: String,

    /// Name of the generated contract type
    #[arg(long)]
    pub name: Option<String>,

    /// Output directory for generated code
    #[arg(long)]
    pub output_dir: Option<String>,

    /// Embed the artifact's bytecode and emit a deploy accessor
    #[arg(long)]
    pub bytecode: bool,

    /// Emit batch-call accessors
    #[arg(long)]
    pub batch_call: bool,

    /// Preview generated code without writing files
    #[arg(long)]
    pub dry_run: bool,

    /// JSON configuration file; flags override its values
    #[arg(long)]
    pub config: Option<String>,
}

impl GenerateArgs {
    /// Merge the flags over the configuration file, if any
    pub fn to_config(&self) -> Result<CodegenConfig> {
        let mut config = match &self.config {
            Some(path) => CodegenConfig::from_file(path)?,
            None => CodegenConfig::default(),
        };

        if let Some(name) = &self.name {
            config.contract_name = name.clone();
        }
        if let Some(output_dir) = &self.output_dir {
            config.output_dir = output_dir.clone();
        }
        config.output_bytecode |= self.bytecode;
        config.has_batch_call |= self.batch_call;
        config.dry_run |= self.dry_run;

        Ok(config)
    }
}

/// Handle the generate command
pub async fn handle_generate_command(args: &GenerateArgs) -> Result<PathBuf> {
    let config = args.to_config()?;

    validate_contract_name(&config.contract_name)?;
    validate_abi_file(&args.abi_file).await?;

    debug!("Codegen configuration: {:?}", config);
    if config.dry_run {
        info!("Performing dry run, no files will be written");
    } else {
        info!("Generating bindings for {}", config.contract_name);
    }

    let path = generate_contract_code(&args.abi_file, config).await?;
    Ok(path)
}

/// Validate the contract name
fn validate_contract_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::codegen(
            "Contract name is required (--name or `contractName` in the config file)",
        ));
    }
    Ok(())
}

/// Validate ABI file exists and is readable
async fn validate_abi_file(file_path: &str) -> Result<()> {
    if !tokio::fs::try_exists(file_path).await? {
        return Err(Error::codegen(format!("ABI file not found: {}", file_path)));
    }

    let content = tokio::fs::read_to_string(file_path).await?;

    // Basic JSON validation
    let _: serde_json::Value = serde_json::from_str(&content)
        .map_err(|e| Error::codegen(format!("Invalid JSON in ABI file: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> GenerateArgs {
        GenerateArgs {
            abi_file: "Token.json".to_string(),
            name: Some("Token".to_string()),
            output_dir: None,
            bytecode: false,
            batch_call: true,
            dry_run: false,
            config: None,
        }
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("codegen.json");
        std::fs::write(
            &path,
            r#"{"contractName": "Vault", "outputDir": "out", "outputBytecode": true}"#,
        )
        .unwrap();

        let mut args = args();
        args.config = Some(path.display().to_string());
        let config = args.to_config().unwrap();

        assert_eq!(config.contract_name, "Token");
        assert_eq!(config.output_dir, "out");
        assert!(config.output_bytecode);
        assert!(config.has_batch_call);
        assert_eq!(config.runtime_crate, "ethbind_runtime");
    }

    #[test]
    fn test_defaults_without_config_file() {
        let config = args().to_config().unwrap();
        assert_eq!(config.output_dir, "./generated");
        assert!(!config.dry_run);
    }

    #[test]
    fn test_empty_name_is_rejected() {
        assert!(validate_contract_name("  ").is_err());
        assert!(validate_contract_name("Token").is_ok());
    }

    #[tokio::test]
    async fn test_missing_abi_file_is_reported() {
        let err = validate_abi_file("/nonexistent/Token.json").await.unwrap_err();
        assert!(err.to_string().contains("ABI file not found"));
    }
}
