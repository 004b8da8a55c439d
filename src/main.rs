//! gmt-clib - GMT C API bridge
//!
//! Command-line entry point for inspecting the loaded library and running
//! modules through a bridge session.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use gmt_clib::{BridgeConfig, NativeApi, Session};

#[derive(Parser)]
#[command(name = "gmt-clib")]
#[command(version)]
#[command(about = "Bridge to the GMT C API", long_about = None)]
struct Cli {
    /// Explicit path to libgmt
    #[arg(long, global = true)]
    library: Option<PathBuf>,

    /// Configuration file (default: gmt-clib.toml in this or a parent directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version and directories of the loaded library
    Info,

    /// Print the value of a named GMT constant
    Constant {
        /// Constant name, e.g. GMT_IS_DATASET
        name: String,
    },

    /// Run a module with pre-split arguments
    Call {
        /// Module name, e.g. gmtinfo
        module: String,

        /// Arguments passed through unchanged
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => BridgeConfig::load(path).with_context(|| format!("Failed to load {}", path.display()))?,
        None => BridgeConfig::load_from_cwd().context("Failed to load gmt-clib.toml")?,
    };
    let mut loader = config.loader();
    if let Some(path) = &cli.library {
        loader = loader.with_hint(path);
    }
    let library = loader.load().context("Failed to load the GMT library")?;
    info!(library = %library.describe(), "loaded GMT");
    let api: Arc<dyn NativeApi> = library;

    let session = Session::with_config(api, config.session.clone());
    session.open().context("Failed to open a GMT session")?;

    match cli.command {
        Commands::Info => {
            for (key, value) in session.info()? {
                println!("{:>14}: {}", key, value);
            }
        }
        Commands::Constant { name } => {
            println!("{}", session.constant(&name)?);
        }
        Commands::Call { module, args } => {
            session
                .call_module(&module, args)
                .with_context(|| format!("gmt {} failed", module))?;
        }
    }

    session.close()?;
    Ok(())
}
