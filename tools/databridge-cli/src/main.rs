// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Databridge CLI
//!
//! Serves the databridge line protocol over stdin/stdout against a world
//! file, or runs one-off commands against it.
//!
//! # Usage
//!
//! ```bash
//! # Serve requests line by line on stdin/stdout
//! databridge --world world.json
//!
//! # One command, params as JSON
//! databridge --world world.json exec get_datatable_row \
//!     --params '{"table_path":"/Game/DT_Items.DT_Items","row_name":"sword"}'
//!
//! # Describe a record type and its subtypes
//! databridge --world world.json schema Effect --subtypes
//!
//! # Write a default configuration file
//! databridge gen-config --output databridge.toml
//! ```
//!
//! Logs go to stderr; stdout carries protocol output only.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use databridge::{BridgeConfig, CommandHandler, Fixture, COMMANDS};
use serde_json::Value;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Runtime-typed record <-> JSON bridge
#[derive(Parser, Debug)]
#[command(name = "databridge")]
#[command(about = "Inspect and edit runtime-typed configuration data as JSON")]
#[command(version)]
struct Args {
    /// World file (record types, tables, assets) as JSON
    #[arg(short, long, global = true)]
    world: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log filter (overrides the configured level)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve requests from stdin until end of input (default)
    Run,

    /// Execute a single command and print its response
    Exec {
        /// Command name
        name: String,

        /// Command params as a JSON object
        #[arg(short, long, default_value = "{}")]
        params: String,
    },

    /// Print the schema of a record type
    Schema {
        /// Record type name
        struct_name: String,

        /// Include the schemas of every subtype
        #[arg(long)]
        subtypes: bool,
    },

    /// List every supported command
    Commands,

    /// Generate a configuration file with default values
    GenConfig {
        /// Output file path
        #[arg(short, long, default_value = "databridge.toml")]
        output: PathBuf,
    },

    /// Validate a configuration file
    Validate {
        /// Configuration file path
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => BridgeConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => BridgeConfig::default(),
    };
    init_logging(args.log_level.as_deref().unwrap_or(&config.log_level));

    match args.command.unwrap_or(Commands::Run) {
        Commands::Run => cmd_run(args.world.as_deref(), config),
        Commands::Exec { name, params } => cmd_exec(args.world.as_deref(), config, &name, &params),
        Commands::Schema {
            struct_name,
            subtypes,
        } => cmd_schema(args.world.as_deref(), config, &struct_name, subtypes),
        Commands::Commands => {
            for command in COMMANDS {
                println!("{}", command);
            }
            Ok(())
        }
        Commands::GenConfig { output } => cmd_gen_config(&output),
        Commands::Validate { path } => cmd_validate(&path),
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    // With `tracing-log` enabled this also forwards the library's `log` records.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn load_handler(world: Option<&Path>, config: BridgeConfig) -> Result<CommandHandler> {
    config.validate().context("invalid configuration")?;
    let Some(world) = world else {
        bail!("missing --world <PATH>");
    };
    let fixture = Fixture::from_file(world)
        .with_context(|| format!("failed to load world {}", world.display()))?;
    for warning in &fixture.warnings {
        warn!("{}", warning);
    }
    info!(
        "loaded {}: {} record types, {} tables, {} assets",
        world.display(),
        fixture.registry.record_count(),
        fixture.catalog.tables().len(),
        fixture.catalog.assets().len()
    );
    Ok(CommandHandler::from_fixture(fixture, config))
}

fn cmd_run(world: Option<&Path>, config: BridgeConfig) -> Result<()> {
    let mut handler = load_handler(world, config)?;
    info!("databridge v{} serving on stdin", databridge::VERSION);

    let stdin = io::stdin();
    let stdout = io::stdout();
    let handled = handler
        .serve(stdin.lock(), stdout.lock())
        .context("protocol stream failed")?;
    info!("{} requests handled", handled);
    Ok(())
}

fn cmd_exec(world: Option<&Path>, config: BridgeConfig, name: &str, params: &str) -> Result<()> {
    let params: Value = serde_json::from_str(params).context("--params is not valid JSON")?;
    let mut handler = load_handler(world, config)?;

    let request = databridge::Request::new(name, params);
    let response = handler.handle_request(&request);
    println!("{}", serde_json::to_string_pretty(&response)?);
    if !response.success {
        std::process::exit(1);
    }
    Ok(())
}

fn cmd_schema(
    world: Option<&Path>,
    config: BridgeConfig,
    struct_name: &str,
    subtypes: bool,
) -> Result<()> {
    let handler = load_handler(world, config)?;
    let describer = databridge::SchemaDescriber::new(handler.registry(), handler.subtypes())
        .with_max_depth(handler.config().max_depth);

    let Some(schema) = describer.record_schema(struct_name, true) else {
        bail!("Struct not found: {}", struct_name);
    };
    println!("{}", serde_json::to_string_pretty(&schema)?);
    if subtypes {
        for subtype in describer.subtype_schemas(struct_name) {
            println!("{}", serde_json::to_string_pretty(&subtype)?);
        }
    }
    Ok(())
}

fn cmd_gen_config(output: &Path) -> Result<()> {
    let content = BridgeConfig::default().to_toml()?;
    std::fs::write(output, content)
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!("Generated configuration: {}", output.display());
    Ok(())
}

fn cmd_validate(path: &Path) -> Result<()> {
    let config = BridgeConfig::from_file(path)
        .with_context(|| format!("failed to load {}", path.display()))?;
    config.validate()?;
    println!("Configuration is valid: {}", path.display());
    println!("  max_batch_size: {}", config.max_batch_size);
    println!("  max_depth: {}", config.max_depth);
    println!("  discriminator_field: {}", config.discriminator_field);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_subcommand_parsing() {
        let args = Args::parse_from(["databridge", "--world", "w.json", "schema", "Effect", "--subtypes"]);
        assert_eq!(args.world, Some(PathBuf::from("w.json")));
        assert!(matches!(
            args.command,
            Some(Commands::Schema { ref struct_name, subtypes: true }) if struct_name == "Effect"
        ));

        let args = Args::parse_from(["databridge", "exec", "ping"]);
        assert!(matches!(args.command, Some(Commands::Exec { ref params, .. }) if params == "{}"));
    }

    #[test]
    fn test_generated_config_validates() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("databridge.toml");
        cmd_gen_config(&path).expect("gen-config");
        cmd_validate(&path).expect("validate");
    }

    #[test]
    fn test_world_is_required() {
        let err = load_handler(None, BridgeConfig::default()).err().expect("error");
        assert!(err.to_string().contains("--world"));
    }
}
