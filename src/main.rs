//! Podwright - service units and firewall rules for compose pods
//!
//! This is the main CLI entry point for Podwright.

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use podwright::config::{ConfigLoader, PodsConfig};
use podwright::error::PodwrightError;
use podwright::generate;
use podwright::output;
use podwright::unit::render_unit;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Podwright - derive service units and firewall rules from pod definitions
#[derive(Parser)]
#[command(name = "podwright")]
#[command(author = "Evoker Industries")]
#[command(version)]
#[command(about = "Derive service units and firewall rules from compose pod definitions", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Pod configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the pod configuration
    Check,

    /// Print or write the service units
    Units {
        /// Directory to write unit files to
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Output format
        #[arg(short, long, value_enum, default_value = "unit")]
        format: UnitFormat,
    },

    /// Print the aggregated firewall allow-lists
    Firewall,

    /// Write service units and firewall rules
    Generate {
        /// Output directory
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum UnitFormat {
    /// systemd unit files
    Unit,
    /// Descriptor JSON
    Json,
}

impl From<UnitFormat> for output::UnitFormat {
    fn from(format: UnitFormat) -> Self {
        match format {
            UnitFormat::Unit => output::UnitFormat::Unit,
            UnitFormat::Json => output::UnitFormat::Json,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(cli.config.as_deref())?;
    let generation = generate::run(&config)?;

    match cli.command {
        Commands::Check => {
            // Warnings were already logged while aggregating.
            println!(
                "{} pods valid, {} TCP and {} UDP ports opened, {} warnings",
                generation.pods.len(),
                generation.firewall.tcp.len(),
                generation.firewall.udp.len(),
                generation.warnings.len()
            );
        }

        Commands::Units {
            output: dir,
            format,
        } => match dir {
            Some(dir) => {
                let artifacts = output::unit_artifacts(&generation, format.into())?;
                output::write_into(&dir, &artifacts)
                    .with_context(|| format!("writing units to {}", dir.display()))?;
            }
            None => match format {
                UnitFormat::Unit => {
                    for unit in &generation.units {
                        println!("# {}", unit.unit_file_name());
                        println!("{}", render_unit(unit));
                    }
                }
                UnitFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&generation.units)?);
                }
            },
        },

        Commands::Firewall => {
            println!("{}", serde_json::to_string_pretty(&generation.firewall)?);
        }

        Commands::Generate { output: dir } => {
            let artifacts = output::all_artifacts(&generation)?;
            output::replace_dir(&dir, &artifacts)
                .with_context(|| format!("replacing {}", dir.display()))?;
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<PodsConfig, PodwrightError> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => ConfigLoader::discover().ok_or_else(|| {
            PodwrightError::ConfigNotFound("no pods.yaml found, pass --config".to_string())
        })?,
    };
    ConfigLoader::parse_file(&path)
}
