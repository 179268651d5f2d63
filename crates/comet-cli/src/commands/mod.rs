//! Command implementations and dispatch logic.

use std::path::PathBuf;

use tracing::info;

pub mod list;
pub mod show;

use crate::Commands;

/// Shared context for all commands
pub struct CommandContext {
    pub cwd: PathBuf,
}

impl CommandContext {
    /// Create a new command context
    pub fn new() -> anyhow::Result<Self> {
        let cwd = std::env::current_dir()?;
        Ok(Self { cwd })
    }
}

/// Dispatch a command to its handler
pub fn dispatch_command(command: Commands, ctx: &CommandContext) -> anyhow::Result<()> {
    match command {
        Commands::List { manifest } => {
            info!("Listing packages");
            list::execute(manifest, ctx)
        }
        Commands::Show { name, app_dir } => {
            info!("Showing package: {}", name);
            show::execute(name, app_dir, ctx)
        }
    }
}
