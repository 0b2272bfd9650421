//! Error types for shell resource operations.
//!
//! Errors are categorized so the reconciler can tell a configuration bug
//! (missing parameter, bad template) from a command that ran and failed.
//! Only the latter is ever reinterpreted as state: a failed read command
//! means the resource is gone.

use crate::types::Operation;
use std::process::ExitStatus;
use std::time::Duration;
use thiserror::Error;

/// Categories of errors, used to decide how a failure is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The resource configuration is wrong (template, parameters, schema)
    Configuration,
    /// A command was launched (or attempted) and did not succeed
    Execution,
    /// Local IO failure setting up a command, such as creating its output pipe
    Io,
}

impl ErrorCategory {
    /// Get a user-friendly description of this error category.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Configuration => "Invalid resource configuration",
            Self::Execution => "Command failed",
            Self::Io => "IO failure",
        }
    }

    /// Get actionable advice for resolving this error category.
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Configuration => {
                "Check that every declared parameter has an argument and matches a %s marker"
            }
            Self::Execution => "Inspect the command output included with the error",
            Self::Io => "Check permissions and available disk space",
        }
    }
}

/// Why a command invocation did not succeed.
#[derive(Debug, Error)]
pub enum ExecFailure {
    /// The shell could not be started
    #[error("{0}")]
    Launch(#[source] std::io::Error),

    /// Waiting for the command failed at the OS level
    #[error("{0}")]
    Wait(#[source] std::io::Error),

    /// The command ran and exited unsuccessfully
    #[error("{0}")]
    Exit(ExitStatus),

    /// The command exceeded the configured timeout and was killed
    #[error("timed out after {0:?}")]
    TimedOut(Duration),
}

impl ExecFailure {
    /// Exit code of the command, when it exited on its own.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Exit(status) => status.code(),
            _ => None,
        }
    }
}

/// Errors that can occur while binding, composing or running resource commands.
#[derive(Debug, Error)]
pub enum Error {
    /// A declared parameter has no corresponding argument
    #[error("{operation} command '{template}': missing argument for parameter '{name}'")]
    MissingParameter {
        /// Lifecycle operation whose command was being composed
        operation: Operation,
        /// Template of that command
        template: String,
        /// First parameter name with no argument
        name: String,
    },

    /// Substitution left unresolved or malformed markers behind
    #[error(
        "{operation} command: could not interpolate '{template}' with {values:?}, got '{rendered}'"
    )]
    Interpolation {
        /// Lifecycle operation whose command was being composed
        operation: Operation,
        /// The template as configured
        template: String,
        /// The text produced so far, including error markers
        rendered: String,
        /// Values that were substituted
        values: Vec<String>,
    },

    /// The command failed to launch or exited unsuccessfully
    #[error("error running command '{command}': '{cause}'. Output: {output}")]
    CommandExecution {
        /// Full command line handed to the shell
        command: String,
        /// Underlying failure
        #[source]
        cause: ExecFailure,
        /// Captured output (possibly truncated, possibly partial)
        output: String,
    },

    /// The resource configuration failed validation
    #[error("invalid resource configuration: {}", .0.join("; "))]
    InvalidConfig(Vec<String>),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get the error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::MissingParameter { .. } | Error::Interpolation { .. } | Error::InvalidConfig(_) => {
                ErrorCategory::Configuration
            }
            Error::CommandExecution { .. } => ErrorCategory::Execution,
            Error::Io(_) => ErrorCategory::Io,
        }
    }

    /// Whether the error came from running a command rather than preparing it.
    pub fn is_execution_failure(&self) -> bool {
        self.category() == ErrorCategory::Execution
    }

    /// Output captured from the failed command, if any.
    pub fn command_output(&self) -> Option<&str> {
        match self {
            Error::CommandExecution { output, .. } => Some(output),
            _ => None,
        }
    }
}

/// Result type for shell resource operations.
pub type Result<T> = std::result::Result<T, Error>;
