use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use shellkit::{Arguments, CommandSpec, Operation, Quoting, ResourceConfig};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::paths;

// ============================================================================
// Main Config Schema
// ============================================================================

/// The shellres configuration file
#[derive(Debug, Serialize, Deserialize)]
pub struct ShellresConfig {
    /// Commands shared by every resource
    pub provider: ProviderConfig,

    /// Declared resource instances, by name
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceDecl>,
}

/// Provider-level settings: the three lifecycle commands and how to run them
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Directory commands run in (defaults to $PWD)
    #[serde(default)]
    pub working_directory: Option<String>,

    pub create_command: String,
    #[serde(default)]
    pub create_parameters: Vec<String>,

    pub read_command: String,
    #[serde(default)]
    pub read_parameters: Vec<String>,

    pub delete_command: String,
    #[serde(default)]
    pub delete_parameters: Vec<String>,

    /// Kill commands running longer than this many seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Shell-quote argument values before substitution
    #[serde(default)]
    pub quote_arguments: bool,
}

/// One declared resource instance
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceDecl {
    /// Arguments for the command templates; scalars of any type
    #[serde(default)]
    pub arguments: BTreeMap<String, toml::Value>,
}

impl ShellresConfig {
    /// Load the config from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read config file: {}", path.display()))?;
        let config = Self::parse(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        log::debug!(
            "Loaded config from {} ({} resources)",
            path.display(),
            config.resources.len()
        );
        Ok(config)
    }

    /// Parse the config from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid TOML format in shellres config")
    }

    /// Build the immutable resource configuration from `[provider]`
    pub fn resource_config(&self) -> ResourceConfig {
        let p = &self.provider;
        let mut config = ResourceConfig::new(
            CommandSpec::new(&p.create_command).with_parameters(&p.create_parameters),
            CommandSpec::new(&p.read_command).with_parameters(&p.read_parameters),
            CommandSpec::new(&p.delete_command).with_parameters(&p.delete_parameters),
        );

        if let Some(dir) = &p.working_directory {
            config = config.with_working_directory(paths::expand(dir).to_string_lossy());
        }
        if let Some(secs) = p.timeout_secs {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        if p.quote_arguments {
            config = config.with_quoting(Quoting::Shell);
        }

        config
    }

    /// Find a declared resource by name
    pub fn find_resource(&self, name: &str) -> Option<&ResourceDecl> {
        self.resources.get(name)
    }

    /// Arguments of a declared resource, coerced to strings
    pub fn arguments(&self, name: &str) -> Result<Arguments> {
        let decl = self
            .find_resource(name)
            .with_context(|| format!("Resource '{name}' is not declared in the config"))?;
        decl.arguments()
            .map_err(|e| anyhow::anyhow!("Invalid arguments for resource '{name}': {e}"))
    }

    /// Collect every problem with the config: provider schema issues, argument
    /// types, and commands that cannot be composed for a declared resource
    pub fn check(&self) -> Vec<String> {
        let resource_config = self.resource_config();
        let mut issues: Vec<String> = resource_config
            .check()
            .into_iter()
            .map(|issue| format!("provider: {issue}"))
            .collect();

        // Composition is only meaningful once the templates themselves are sound
        let templates_ok = issues.is_empty();

        for (name, decl) in &self.resources {
            let arguments = match decl.arguments() {
                Ok(arguments) => arguments,
                Err(e) => {
                    issues.push(format!("resource '{name}': {e}"));
                    continue;
                }
            };

            if !templates_ok {
                continue;
            }

            for operation in Operation::ALL {
                let composed =
                    shellkit::reconciler::invocation(&resource_config, operation, &arguments);
                if let Err(e) = composed {
                    issues.push(format!("resource '{name}': {e}"));
                }
            }
        }

        issues
    }
}

impl ResourceDecl {
    /// Arguments coerced to strings
    pub fn arguments(&self) -> std::result::Result<Arguments, String> {
        self.arguments
            .iter()
            .map(|(key, value)| {
                coerce(value)
                    .map(|v| (key.clone(), v))
                    .map_err(|e| format!("argument '{key}' {e}"))
            })
            .collect()
    }
}

/// Convert a scalar TOML value to the text substituted into commands
fn coerce(value: &toml::Value) -> std::result::Result<String, String> {
    match value {
        toml::Value::String(s) => Ok(s.clone()),
        toml::Value::Integer(i) => Ok(i.to_string()),
        toml::Value::Float(f) => Ok(f.to_string()),
        toml::Value::Boolean(b) => Ok(b.to_string()),
        toml::Value::Datetime(d) => Ok(d.to_string()),
        toml::Value::Array(_) => Err("must be a scalar, found an array".to_string()),
        toml::Value::Table(_) => Err("must be a scalar, found a table".to_string()),
    }
}
