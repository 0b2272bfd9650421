use anyhow::{Context as _, Result, anyhow, bail};
use colored::Colorize;
use rayon::prelude::*;
use shellkit::{Arguments, Client, ReadOutcome, ResourceState, SHELL_RESOURCE};

use super::Session;
use crate::Context;
use crate::config::ShellresConfig;
use crate::state::{ResourceRecord, ShellresState};
use crate::ui;

// ============================================================================
// Plan
// ============================================================================

/// What apply will do to one resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Declared but not recorded
    Create,
    /// Recorded with different arguments: delete, then create
    Replace,
    /// Recorded with the same arguments: read, and recreate if gone
    Refresh,
    /// Recorded but no longer declared
    Delete,
}

impl Action {
    fn symbol(self) -> colored::ColoredString {
        match self {
            Self::Create => "+".green(),
            Self::Replace => "~".yellow(),
            Self::Refresh => "=".dimmed(),
            Self::Delete => "-".red(),
        }
    }

    fn verb(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Replace => "replace",
            Self::Refresh => "refresh",
            Self::Delete => "delete",
        }
    }
}

/// One planned action
#[derive(Debug, Clone)]
pub struct Step {
    pub name: String,
    pub action: Action,
    /// Declared arguments; empty for deletes
    pub desired: Arguments,
    /// Existing record, if any
    pub record: Option<ResourceRecord>,
}

/// Compute the steps that bring `state` in line with `config`
pub fn plan(
    config: &ShellresConfig,
    state: &ShellresState,
    target: Option<&str>,
) -> Result<Vec<Step>> {
    if let Some(name) = target
        && config.find_resource(name).is_none()
        && state.get(name).is_none()
    {
        bail!("Resource '{name}' is neither declared nor recorded");
    }

    let wanted = |name: &str| target.is_none_or(|t| t == name);
    let mut steps = Vec::new();

    for name in config.resources.keys().filter(|n| wanted(n)) {
        let desired = config.arguments(name)?;
        let record = state.get(name).cloned();
        let action = match &record {
            None => Action::Create,
            Some(r) if SHELL_RESOURCE.requires_replacement(&r.arguments, &desired) => {
                Action::Replace
            }
            Some(_) => Action::Refresh,
        };
        steps.push(Step {
            name: name.clone(),
            action,
            desired,
            record,
        });
    }

    for (name, record) in &state.resources {
        if wanted(name) && config.find_resource(name).is_none() {
            steps.push(Step {
                name: name.clone(),
                action: Action::Delete,
                desired: Arguments::new(),
                record: Some(record.clone()),
            });
        }
    }

    Ok(steps)
}

// ============================================================================
// Execute
// ============================================================================

/// How a step changes the recorded state
#[derive(Debug)]
pub enum Change {
    /// Leave the record alone
    Keep,
    /// Record a new resource, replacing any previous record
    Created(ResourceState, Arguments),
    /// Store the outputs of a successful read
    Refreshed(ResourceState),
    /// Drop the record
    Forget,
}

/// Result of running one step
#[derive(Debug)]
pub struct Outcome {
    pub name: String,
    pub action: Action,
    pub change: Change,
    pub error: Option<anyhow::Error>,
}

impl Outcome {
    fn ok(step: &Step, change: Change) -> Self {
        Self {
            name: step.name.clone(),
            action: step.action,
            change,
            error: None,
        }
    }

    fn failed(step: &Step, change: Change, error: impl Into<anyhow::Error>) -> Self {
        Self {
            name: step.name.clone(),
            action: step.action,
            change,
            error: Some(error.into()),
        }
    }
}

fn created(step: &Step, state: ResourceState) -> Outcome {
    if state.exists() {
        Outcome::ok(step, Change::Created(state, step.desired.clone()))
    } else {
        Outcome::failed(
            step,
            Change::Forget,
            anyhow!("created, but the read command reported it missing"),
        )
    }
}

/// Run one step against the client
pub fn execute(client: &Client, step: &Step) -> Outcome {
    let record = step.record.as_ref();

    match (step.action, record) {
        (Action::Create, _) => match client.create(&step.desired) {
            Ok(state) => created(step, state),
            Err(e) => Outcome::failed(step, Change::Keep, e),
        },

        (Action::Replace, Some(record)) => {
            let mut old = record.resource_state();
            if let Err(e) = client.delete(&record.arguments, &mut old) {
                return Outcome::failed(step, Change::Keep, e);
            }
            match client.create(&step.desired) {
                Ok(state) => created(step, state),
                Err(e) => Outcome::failed(step, Change::Forget, e),
            }
        }

        (Action::Refresh, Some(record)) => {
            let mut state = record.resource_state();
            match client.read(&record.arguments, &mut state) {
                Ok(ReadOutcome::Present) => Outcome::ok(step, Change::Refreshed(state)),
                Ok(ReadOutcome::Gone) => {
                    log::info!("{} disappeared, recreating", step.name);
                    match client.create(&step.desired) {
                        Ok(state) => created(step, state),
                        Err(e) => Outcome::failed(step, Change::Forget, e),
                    }
                }
                Err(e) => Outcome::failed(step, Change::Keep, e),
            }
        }

        (Action::Delete, Some(record)) => {
            let mut state = record.resource_state();
            match client.delete(&record.arguments, &mut state) {
                Ok(()) => Outcome::ok(step, Change::Forget),
                Err(e) => Outcome::failed(step, Change::Keep, e),
            }
        }

        (action, None) => Outcome::failed(
            step,
            Change::Keep,
            anyhow!("cannot {} a resource that is not recorded", action.verb()),
        ),
    }
}

/// Fold an outcome into the recorded state
pub fn record(state: &mut ShellresState, outcome: &Outcome) {
    match &outcome.change {
        Change::Keep => {}
        Change::Created(resource, arguments) => {
            state.forget(&outcome.name);
            state.update(&outcome.name, resource, arguments);
        }
        Change::Refreshed(resource) => {
            if let Some(existing) = state.resources.get_mut(&outcome.name) {
                existing.refreshed(resource);
            }
        }
        Change::Forget => {
            state.forget(&outcome.name);
        }
    }
}

/// Run every step, `jobs` at a time
pub fn execute_all(client: &Client, steps: &[Step], jobs: usize) -> Result<Vec<Outcome>> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs.max(1))
        .build()
        .context("Failed to build worker pool")?;

    Ok(pool.install(|| steps.par_iter().map(|step| execute(client, step)).collect::<Vec<_>>()))
}

// ============================================================================
// Apply Command
// ============================================================================

pub fn apply(ctx: &Context, target: Option<&str>, dry_run: bool, jobs: usize) -> Result<()> {
    ui::header("Applying Configuration");

    if dry_run {
        ui::warn("Dry run - no changes will be made");
        println!();
    }

    let mut session = Session::open(ctx)?;
    let steps = plan(&session.config, &session.state, target)?;

    if steps.is_empty() {
        ui::success("Nothing to do");
        return Ok(());
    }

    if dry_run {
        for step in &steps {
            println!("  {} {} {}", step.action.symbol(), step.name, step.action.verb().dimmed());
        }
        return Ok(());
    }

    let outcomes = execute_all(&session.client, &steps, jobs)?;

    for outcome in &outcomes {
        record(&mut session.state, outcome);
        let mark = if outcome.error.is_none() {
            "✓".green()
        } else {
            "✗".red()
        };
        println!("  {} {} {}", mark, outcome.name, outcome.action.verb().dimmed());
    }

    session.save()?;

    let failed: Vec<_> = outcomes.iter().filter(|o| o.error.is_some()).collect();

    println!();
    if failed.is_empty() {
        ui::success("Apply complete!");
        return Ok(());
    }

    if !ctx.quiet {
        for outcome in &failed {
            if let Some(error) = &outcome.error {
                println!("  {} {} - {}", "✗".red(), outcome.name, error.to_string().dimmed());
            }
        }
    }
    bail!("{} of {} resources failed to apply", failed.len(), outcomes.len())
}
