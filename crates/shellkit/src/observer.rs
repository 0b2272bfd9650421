//! Observation of lifecycle steps.
//!
//! Components report what they do through an injected [`Observer`] instead
//! of logging globally. [`LogObserver`] forwards to the `log` facade;
//! [`NoObserver`] discards everything.

use log::Level;

use crate::types::Operation;

/// Something worth reporting during a lifecycle operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event<'a> {
    /// An operation is about to run its composed command
    Starting {
        /// Operation being run
        operation: Operation,
        /// Composed command (before the directory change is added)
        command: &'a str,
    },
    /// A shell is being launched
    Executing {
        /// Shell program
        shell: &'a str,
        /// Flag that introduces the command
        flag: &'a str,
        /// Line passed to the shell
        line: &'a str,
    },
    /// A command finished successfully
    CommandOutput {
        /// Captured output
        output: &'a str,
        /// Whether older output was evicted
        truncated: bool,
    },
    /// The resource was created and given an identifier
    Created {
        /// New identifier
        id: &'a str,
    },
    /// The read command failed, so the resource is considered gone
    MarkedGone {
        /// Output captured from the failed read
        output: &'a str,
    },
    /// A line of read output is being parsed
    OutputLine {
        /// Raw line
        line: &'a str,
    },
    /// A line of read output had no `=` and was skipped
    LineIgnored {
        /// Raw line
        line: &'a str,
    },
    /// A key/value pair was parsed from read output
    OutputValue {
        /// Key
        key: &'a str,
        /// Value
        value: &'a str,
    },
    /// The resource was deleted
    Deleted {
        /// Identifier it had
        id: &'a str,
    },
}

impl Event<'_> {
    /// Log level matching the event's importance.
    pub fn level(&self) -> Level {
        match self {
            Event::Created { .. }
            | Event::MarkedGone { .. }
            | Event::LineIgnored { .. }
            | Event::Deleted { .. } => Level::Info,
            _ => Level::Debug,
        }
    }

    /// Human-readable description.
    pub fn message(&self) -> String {
        match self {
            Event::Starting { operation, command } => match operation {
                Operation::Create => format!("Creating shell resource: {command}"),
                Operation::Read => format!("Reading shell resource: {command}"),
                Operation::Delete => format!("Deleting shell resource: {command}"),
            },
            Event::Executing { shell, flag, line } => {
                format!("Going to execute: {shell} {flag} \"{line}\"")
            }
            Event::CommandOutput { output, truncated } => {
                if *truncated {
                    format!("Command output was (truncated): \"{output}\"")
                } else {
                    format!("Command output was: \"{output}\"")
                }
            }
            Event::Created { id } => format!("Created shell resource: {id}"),
            Event::MarkedGone { output } => {
                format!("Read command returned error, marking resource deleted: {output}")
            }
            Event::OutputLine { line } => format!("Read line: {line}"),
            Event::LineIgnored { line } => format!("Ignoring line without equal sign: \"{line}\""),
            Event::OutputValue { key, value } => format!("\"{key}\" = \"{value}\""),
            Event::Deleted { id } => format!("Deleted shell resource: {id}"),
        }
    }
}

/// Receiver of lifecycle events.
pub trait Observer: Send + Sync {
    /// Called for every event, in order.
    fn notify(&self, event: &Event<'_>);
}

/// Observer that forwards events to the `log` crate.
pub struct LogObserver;

impl Observer for LogObserver {
    fn notify(&self, event: &Event<'_>) {
        log::log!(target: "shellkit", event.level(), "{}", event.message());
    }
}

/// Observer that ignores every event.
pub struct NoObserver;

impl Observer for NoObserver {
    fn notify(&self, _event: &Event<'_>) {}
}
