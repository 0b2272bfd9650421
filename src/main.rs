mod cli;
mod commands;
mod config;
mod paths;
mod state;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use std::io;
use std::path::PathBuf;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    /// Explicit config file from `--config` or `SHELLRES_CONFIG`
    pub config: Option<PathBuf>,
    /// Explicit state file from `--state`
    pub state: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
        config: cli.config,
        state: cli.state,
    };

    match cli.command {
        Command::Validate => commands::validate::run(&ctx),
        Command::Create(args) => commands::lifecycle::create(&ctx, &args.name),
        Command::Read(args) => commands::lifecycle::read(&ctx, &args.name),
        Command::Delete(args) => commands::lifecycle::delete(&ctx, &args.name),
        Command::Apply(args) => {
            commands::apply::apply(&ctx, args.target.as_deref(), args.dry_run, args.jobs)
        }
        Command::Destroy(args) => commands::lifecycle::destroy(&ctx, args.dry_run),
        Command::Status(args) => commands::status::run(&ctx, args.json),
        Command::Completions { shell } => {
            generate(shell, &mut Cli::command(), "shellres", &mut io::stdout());
            Ok(())
        }
    }
}
