//! Core types for shell-command backed resources.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::template;

/// Arguments supplied for one resource instance, already coerced to text.
///
/// Arguments never change in place: a different set of arguments is a
/// different resource (see [`ResourceDescriptor::requires_replacement`]).
pub type Arguments = BTreeMap<String, String>;

/// Key/value pairs parsed from the output of the read command.
pub type Outputs = BTreeMap<String, String>;

/// Lifecycle operation a command belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Bring the resource into existence
    Create,
    /// Query the resource and report its attributes
    Read,
    /// Remove the resource
    Delete,
}

impl Operation {
    /// All operations, in lifecycle order.
    pub const ALL: [Operation; 3] = [Operation::Create, Operation::Read, Operation::Delete];

    /// Lowercase name, as used in configuration keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Read => "read",
            Operation::Delete => "delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A command template and the names of the arguments that fill its markers.
///
/// Only `%s` and `%v` consume a value, and `%%` is a literal percent sign.
/// Flags, widths and other verbs (`%-5s`, `%q`, `%d`) are not supported and
/// fail validation and composition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    /// Template with positional `%s` markers
    pub template: String,
    /// Argument names, one per marker, in marker order
    #[serde(default)]
    pub parameters: Vec<String>,
}

impl CommandSpec {
    /// A command with no parameters; the template runs verbatim.
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            parameters: Vec::new(),
        }
    }

    /// Set the parameter names for this command.
    pub fn with_parameters<I, S>(mut self, parameters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parameters = parameters.into_iter().map(Into::into).collect();
        self
    }
}

/// How bound values are spliced into a command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quoting {
    /// Values are inserted as-is; the caller owns shell safety
    #[default]
    None,
    /// Values are quoted for the platform shell before insertion
    Shell,
}

/// Immutable configuration shared by every instance of the resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceConfig {
    /// Command that creates the resource
    pub create: CommandSpec,
    /// Command that reads the resource, printing `key=value` lines
    pub read: CommandSpec,
    /// Command that deletes the resource
    pub delete: CommandSpec,
    /// Directory the shell changes into before running a command
    pub working_directory: String,
    /// Value quoting policy
    pub quoting: Quoting,
    /// Kill commands that run longer than this
    pub timeout: Option<Duration>,
}

impl ResourceConfig {
    /// Create a configuration running in the default working directory.
    pub fn new(create: CommandSpec, read: CommandSpec, delete: CommandSpec) -> Self {
        Self {
            create,
            read,
            delete,
            working_directory: default_working_directory(),
            quoting: Quoting::None,
            timeout: None,
        }
    }

    /// Set the working directory.
    pub fn with_working_directory(mut self, dir: impl Into<String>) -> Self {
        self.working_directory = dir.into();
        self
    }

    /// Set the value quoting policy.
    pub fn with_quoting(mut self, quoting: Quoting) -> Self {
        self.quoting = quoting;
        self
    }

    /// Set a timeout for every command.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The command spec for an operation.
    pub fn command(&self, operation: Operation) -> &CommandSpec {
        match operation {
            Operation::Create => &self.create,
            Operation::Read => &self.read,
            Operation::Delete => &self.delete,
        }
    }

    /// Collect every schema problem with this configuration.
    ///
    /// Templates are checked statically here; composition still re-checks
    /// arity at substitution time.
    pub fn check(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.working_directory.trim().is_empty() {
            issues.push("working_directory cannot be empty".to_string());
        }

        for operation in Operation::ALL {
            let spec = self.command(operation);

            if spec.template.trim().is_empty() {
                issues.push(format!("{operation}_command cannot be empty"));
                continue;
            }

            if let Some(pos) = spec.parameters.iter().position(|p| p.trim().is_empty()) {
                issues.push(format!(
                    "{operation}_parameters[{pos}] cannot be an empty name"
                ));
            }

            // No parameters means the template is used verbatim
            if spec.parameters.is_empty() {
                continue;
            }

            match template::count_markers(&spec.template) {
                Ok(markers) if markers != spec.parameters.len() => issues.push(format!(
                    "{operation}_command has {markers} substitution marker(s) but {} parameter(s) are declared",
                    spec.parameters.len()
                )),
                Ok(_) => {}
                Err(reason) => issues.push(format!("{operation}_command: {reason}")),
            }
        }

        issues
    }

    /// Validate the configuration, failing with every issue found.
    pub fn validate(&self) -> Result<()> {
        let issues = self.check();
        if issues.is_empty() {
            Ok(())
        } else {
            Err(Error::InvalidConfig(issues))
        }
    }
}

/// Working directory used when none is configured: `$PWD`, then the
/// process current directory, then `.`.
pub fn default_working_directory() -> String {
    if let Ok(pwd) = std::env::var("PWD") {
        if !pwd.is_empty() {
            return pwd;
        }
    }

    std::env::current_dir()
        .map(|dir| dir.to_string_lossy().into_owned())
        .unwrap_or_else(|_| ".".to_string())
}

/// Mutable state of one resource instance.
///
/// An empty `id` means the resource does not exist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceState {
    /// Opaque identifier derived from the composed create command
    #[serde(default)]
    pub id: String,
    /// Last successfully parsed read output
    #[serde(default)]
    pub output: Outputs,
}

impl ResourceState {
    /// Whether the resource is believed to exist.
    pub fn exists(&self) -> bool {
        !self.id.is_empty()
    }

    /// Record that the resource no longer exists.
    pub fn mark_gone(&mut self) {
        self.id.clear();
        self.output.clear();
    }
}

/// Result of a read: whether the resource still exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadOutcome {
    /// The read command succeeded; outputs were refreshed
    Present,
    /// The read command failed; the resource is considered gone
    Gone,
}

impl ReadOutcome {
    /// Check if the outcome represents presence
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present)
    }
}

/// A fully composed command and where to run it. Built fresh for every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInvocation {
    /// Command with every marker substituted
    pub command: String,
    /// Directory to change into first
    pub working_directory: String,
}

impl CommandInvocation {
    /// Create an invocation.
    pub fn new(command: impl Into<String>, working_directory: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            working_directory: working_directory.into(),
        }
    }

    /// The line handed to the shell, with the directory change folded in.
    pub fn shell_line(&self) -> String {
        if cfg!(windows) {
            format!("cd /d {} && {}", self.working_directory, self.command)
        } else {
            format!("cd {} && {}", self.working_directory, self.command)
        }
    }
}

/// Capabilities of a resource type, consumed by the host's diff logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceDescriptor {
    /// Resource type name
    pub type_name: &'static str,
    /// Any change to arguments forces destroy + create
    pub replace_on_change: bool,
}

/// The shell resource: no partial updates, ever.
pub const SHELL_RESOURCE: ResourceDescriptor = ResourceDescriptor {
    type_name: "shell_resource",
    replace_on_change: true,
};

impl ResourceDescriptor {
    /// Whether moving from `current` to `desired` arguments needs a new resource.
    pub fn requires_replacement(&self, current: &Arguments, desired: &Arguments) -> bool {
        self.replace_on_change && current != desired
    }
}
