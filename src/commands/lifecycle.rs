use anyhow::{Result, bail};
use colored::Colorize;
use shellkit::{Outputs, ReadOutcome};

use super::Session;
use crate::Context;
use crate::ui;

// ============================================================================
// Create / Read / Delete
// ============================================================================

/// Create one declared resource and record it
pub fn create(ctx: &Context, name: &str) -> Result<()> {
    let mut session = Session::open(ctx)?;

    if let Some(record) = session.state.get(name) {
        bail!(
            "Resource '{}' already exists ({}). Delete it first or run 'shellres apply'",
            name,
            ui::short_id(&record.id)
        );
    }

    let arguments = session.config.arguments(name)?;
    let state = session.client.create(&arguments)?;

    if !state.exists() {
        ui::warn(&format!(
            "Created '{name}' but reading it back failed; nothing was recorded"
        ));
        return Ok(());
    }

    session.state.update(name, &state, &arguments);
    session.save()?;

    ui::success(&format!("Created {} ({})", name, ui::short_id(&state.id)));
    if !ctx.quiet {
        print_outputs(&state.output);
    }
    Ok(())
}

/// Re-run the read command for a recorded resource
pub fn read(ctx: &Context, name: &str) -> Result<()> {
    let mut session = Session::open(ctx)?;

    let Some(record) = session.state.get(name).cloned() else {
        bail!("Resource '{name}' is not recorded. Create it first");
    };

    let mut state = record.resource_state();
    let outcome = session.client.read(&record.arguments, &mut state)?;
    session.state.update(name, &state, &record.arguments);
    session.save()?;

    match outcome {
        ReadOutcome::Present => {
            ui::success(&format!("Read {} ({})", name, ui::short_id(&state.id)));
            if !ctx.quiet {
                print_outputs(&state.output);
            }
        }
        ReadOutcome::Gone => {
            ui::warn(&format!("{name} no longer exists; removed from state"));
        }
    }
    Ok(())
}

/// Delete a recorded resource
///
/// State is only forgotten once the delete command succeeds.
pub fn delete(ctx: &Context, name: &str) -> Result<()> {
    let mut session = Session::open(ctx)?;

    let Some(record) = session.state.get(name).cloned() else {
        bail!("Resource '{name}' is not recorded");
    };

    let mut state = record.resource_state();
    session.client.delete(&record.arguments, &mut state)?;
    session.state.forget(name);
    session.save()?;

    ui::success(&format!("Deleted {name}"));
    Ok(())
}

// ============================================================================
// Destroy
// ============================================================================

/// Delete every recorded resource
pub fn destroy(ctx: &Context, dry_run: bool) -> Result<()> {
    ui::header("Destroying Resources");

    let mut session = Session::open(ctx)?;
    let names: Vec<String> = session.state.resources.keys().cloned().collect();

    if names.is_empty() {
        ui::info("No recorded resources");
        return Ok(());
    }

    if dry_run {
        ui::warn("Dry run - no changes will be made");
        println!();
        for name in &names {
            println!("  {} {}", "-".red(), name);
        }
        return Ok(());
    }

    let mut failed = Vec::new();
    for name in &names {
        let Some(record) = session.state.get(name).cloned() else {
            continue;
        };
        let mut state = record.resource_state();
        match session.client.delete(&record.arguments, &mut state) {
            Ok(()) => {
                session.state.forget(name);
                println!("  {} {}", "✓".green(), name);
            }
            Err(e) => {
                println!("  {} {}", "✗".red(), name);
                failed.push((name.clone(), e.to_string()));
            }
        }
    }

    session.save()?;

    println!();
    if failed.is_empty() {
        ui::success(&format!("Destroyed {} resources", names.len()));
        return Ok(());
    }

    if !ctx.quiet {
        for (name, error) in &failed {
            println!("  {} {} - {}", "✗".red(), name, error.dimmed());
        }
    }
    bail!("{} of {} resources could not be deleted", failed.len(), names.len())
}

/// Print the outputs of a read as key/value pairs
pub fn print_outputs(output: &Outputs) {
    if output.is_empty() {
        ui::dim("(no outputs)");
        return;
    }
    for (key, value) in output {
        ui::kv(key, value);
    }
}
