//! ethbind command line entry point
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use ethbind_abi::{link_bytecode, AbiParser, ItemKind, Libraries};
use ethbind_codegen::cli::{handle_generate_command, GenerateArgs};

#[derive(Parser)]
#[command(name = "ethbind")]
#[command(author, version, about = "Typed contract bindings from ABI descriptions", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate typed bindings for a contract
    Generate(GenerateArgs),

    /// Print function selectors and event topics
    Signatures {
        /// ABI or compiler artifact JSON file
        abi_file: String,
    },

    /// Resolve library placeholders and print the linked bytecode
    Link {
        /// Compiler artifact JSON file
        artifact: String,

        /// JSON file mapping `file -> contract -> address`
        #[arg(long)]
        libraries: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over the verbosity flag
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Generate(args) => {
            let path = handle_generate_command(&args).await?;
            if !args.dry_run {
                info!("Bindings written to {}", path.display());
            }
        }

        Commands::Signatures { abi_file } => {
            let artifact = AbiParser::new().parse_file(&abi_file)?;
            for item in &artifact.abi.items {
                match item.kind {
                    ItemKind::Function => {
                        println!("{}  {}", hex_selector(&item.selector()), item.signature());
                    }
                    ItemKind::Event if item.anonymous => {
                        println!("{:<66}  {} (anonymous)", "-", item.signature());
                    }
                    ItemKind::Event => println!("{}  {}", item.topic(), item.signature()),
                    ItemKind::Constructor => {}
                }
            }
        }

        Commands::Link { artifact, libraries } => {
            let artifact = AbiParser::new().parse_file(&artifact)?;
            let bytecode = artifact
                .bytecode
                .context("artifact carries no bytecode")?;
            let content = std::fs::read_to_string(&libraries)
                .with_context(|| format!("Failed to read {}", libraries))?;
            let libraries: Libraries = serde_json::from_str(&content)
                .with_context(|| format!("Invalid library map in {}", libraries))?;

            let linked = link_bytecode(&bytecode, &artifact.link_references, Some(&libraries))?;
            println!("{}", linked);
        }
    }

    Ok(())
}

fn hex_selector(selector: &[u8; 4]) -> String {
    format!("0x{:<64}", ethbind_abi::signature::to_hex(selector).trim_start_matches("0x"))
}
