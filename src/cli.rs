use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "shellres")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Manage resources whose lifecycle is delegated to shell commands", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (default: ./shellres.toml, then the config directory)
    #[arg(short, long, global = true, env = "SHELLRES_CONFIG")]
    pub config: Option<PathBuf>,

    /// State file (default: <state dir>/state.toml)
    #[arg(long, global = true)]
    pub state: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Validate the provider commands and every resource's arguments
    Validate,

    /// Create a declared resource
    Create(ResourceArgs),

    /// Read a resource, refreshing its outputs or noticing it is gone
    #[command(alias = "refresh")]
    Read(ResourceArgs),

    /// Delete a resource
    Delete(ResourceArgs),

    /// Make recorded state match the config
    Apply(ApplyArgs),

    /// Delete every recorded resource
    Destroy(DestroyArgs),

    /// Show recorded resources and their outputs
    Status(StatusArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser)]
pub struct ResourceArgs {
    /// Resource name as declared under [resources]
    pub name: String,
}

#[derive(Parser)]
pub struct ApplyArgs {
    /// Only converge this resource
    pub target: Option<String>,

    /// Dry run - show what would be done
    #[arg(short, long)]
    pub dry_run: bool,

    /// Number of resources converged in parallel
    #[arg(short, long, default_value = "4")]
    pub jobs: usize,
}

#[derive(Parser)]
pub struct DestroyArgs {
    /// Dry run - show what would be deleted
    #[arg(short, long)]
    pub dry_run: bool,
}

#[derive(Parser)]
pub struct StatusArgs {
    /// Print state as JSON
    #[arg(long)]
    pub json: bool,
}
