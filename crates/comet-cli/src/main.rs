//! # comet-cli
//!
//! Command-line entry point for the Comet package loader. Handles command
//! parsing, sets up logging and error handling, and dispatches to the
//! command handlers.

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use comet_loader::CometError;
use tracing::{error, info};

mod commands;

use commands::CommandContext;

/// Package loader and dependency-graph builder for the Comet platform
#[derive(Parser)]
#[command(name = "comet", version, about = "Comet package loader")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List all discoverable packages
    List {
        /// Release manifest enabling warehouse resolution
        #[arg(long)]
        manifest: Option<Utf8PathBuf>,
    },
    /// Show a resolved package record
    Show {
        name: String,
        /// App directory whose packages/ overrides the search path
        #[arg(long)]
        app_dir: Option<Utf8PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);
    setup_panic_handler();

    info!("Starting Comet CLI v{}", env!("CARGO_PKG_VERSION"));

    let ctx = CommandContext::new()?;
    if let Err(err) = commands::dispatch_command(cli.command, &ctx) {
        error!("{:#}", err);
        eprintln!("Error: {:#}", err);
        if let Some(hint) = descriptor_hint(&err) {
            eprintln!("{}", hint);
        }
        std::process::exit(1);
    }
    Ok(())
}

/// A hint for errors the user can fix by editing a package descriptor, as
/// opposed to missing packages or internal bugs
fn descriptor_hint(err: &anyhow::Error) -> Option<&'static str> {
    match err.downcast_ref::<CometError>() {
        Some(e) if e.is_configuration() => {
            Some("Fix the package.toml named above and re-run the command.")
        }
        _ => None,
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "comet={},comet_core={},comet_loader={}",
            level, level, level
        ))
        .with_target(false)
        .init();
}

fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|panic_info| {
        error!("Comet encountered an unexpected error: {}", panic_info);
        eprintln!("Comet crashed! This is a bug.");
        eprintln!("Please report this at: https://github.com/comet-platform/comet/issues");
        eprintln!("Error: {}", panic_info);
    }));
}
