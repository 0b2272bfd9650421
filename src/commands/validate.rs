use anyhow::{Result, bail};
use colored::Colorize;

use crate::Context;
use crate::config::ShellresConfig;
use crate::paths;
use crate::ui;

/// Check the provider commands and every declared resource without running anything
pub fn run(ctx: &Context) -> Result<()> {
    ui::header("Validating Configuration");

    let path = paths::config_file(ctx.config.as_deref())?;
    ui::kv("Config", &path.display().to_string());

    let config = ShellresConfig::load(&path)?;
    let issues = config.check();

    if issues.is_empty() {
        ui::kv("Resources", &config.resources.len().to_string());
        println!();
        ui::success("Configuration is valid");
        return Ok(());
    }

    println!();
    for issue in &issues {
        println!("  {} {}", "✗".red(), issue);
    }
    println!();
    bail!("Found {} problem(s) in {}", issues.len(), path.display())
}
