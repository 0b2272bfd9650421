use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use shellkit::SHELL_RESOURCE;
use std::collections::BTreeMap;

use super::Session;
use super::lifecycle::print_outputs;
use crate::Context;
use crate::config::ShellresConfig;
use crate::state::{ResourceRecord, ShellresState};
use crate::ui;

/// Combined view of one resource across config and state
#[derive(Debug, Serialize)]
pub struct ResourceStatus<'a> {
    pub declared: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<&'a ResourceRecord>,
}

/// Everything `status --json` prints
#[derive(Debug, Serialize)]
pub struct StatusReport<'a> {
    pub resource_type: &'static str,
    pub resources: BTreeMap<&'a str, ResourceStatus<'a>>,
}

/// Join declared and recorded resources by name
pub fn collect<'a>(
    config: &'a ShellresConfig,
    state: &'a ShellresState,
) -> BTreeMap<&'a str, ResourceStatus<'a>> {
    let mut all: BTreeMap<&str, ResourceStatus<'_>> = config
        .resources
        .keys()
        .map(|name| {
            (
                name.as_str(),
                ResourceStatus {
                    declared: true,
                    record: state.get(name),
                },
            )
        })
        .collect();

    for (name, record) in &state.resources {
        all.entry(name.as_str()).or_insert(ResourceStatus {
            declared: false,
            record: Some(record),
        });
    }

    all
}

pub fn run(ctx: &Context, json: bool) -> Result<()> {
    let session = Session::open(ctx)?;
    let resources = collect(&session.config, &session.state);

    if json {
        let report = StatusReport {
            resource_type: SHELL_RESOURCE.type_name,
            resources,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    ui::header("Shellres Status");
    ui::kv("Type", SHELL_RESOURCE.type_name);
    ui::kv("State", &session.state_path.display().to_string());
    ui::kv(
        "Last updated",
        &session.state.last_updated.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    );

    if resources.is_empty() {
        println!();
        ui::info("No resources declared or recorded");
        return Ok(());
    }

    ui::section("Resources");
    for (name, status) in &resources {
        match (status.declared, status.record) {
            (true, Some(record)) => {
                println!("  {} {} {}", "✓".green(), name, ui::short_id(&record.id).dimmed());
            }
            (true, None) => println!("  {} {} {}", "○".yellow(), name, "not created".dimmed()),
            (false, Some(record)) => println!(
                "  {} {} {} {}",
                "✗".red(),
                name,
                ui::short_id(&record.id).dimmed(),
                "no longer declared".dimmed()
            ),
            (false, None) => {}
        }

        if ctx.verbose > 0
            && let Some(record) = status.record
        {
            if let Some(last_read) = record.last_read {
                ui::dim(&format!("  Last read: {}", last_read.format("%Y-%m-%d %H:%M:%S")));
            }
            print_outputs(&record.output);
        }
    }

    Ok(())
}
