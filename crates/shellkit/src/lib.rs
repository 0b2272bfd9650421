//! # shellkit
//!
//! Resources whose whole lifecycle is delegated to shell commands.
//!
//! A resource is configured with three command templates (create, read,
//! delete). Each template names the arguments that fill its `%s` markers,
//! in order. This crate provides:
//! - Binding declared parameter names to an instance's arguments
//! - Composing command lines from templates, rejecting arity mismatches
//! - Running commands through the platform shell with bounded output capture
//! - Parsing `key=value` output of the read command
//! - Reconciling create/read/delete into a [`ResourceState`]
//!
//! ## Example
//!
//! ```no_run
//! use shellkit::{Arguments, Client, CommandSpec, ResourceConfig};
//!
//! let config = ResourceConfig::new(
//!     CommandSpec::new("echo \"%s\" > %s").with_parameters(["output", "file"]),
//!     CommandSpec::new("awk '{print \"out=\" $0}' %s").with_parameters(["file"]),
//!     CommandSpec::new("rm %s").with_parameters(["file"]),
//! );
//! let client = Client::new(config).expect("invalid config");
//!
//! let args = Arguments::from([
//!     ("output".to_string(), "hi".to_string()),
//!     ("file".to_string(), "t1".to_string()),
//! ]);
//!
//! let mut state = client.create(&args).expect("create failed");
//! assert_eq!(state.output["out"], "hi");
//!
//! client.delete(&args, &mut state).expect("delete failed");
//! assert!(!state.exists());
//! ```
//!
//! ## Existence
//!
//! A resource exists while its identifier is non-empty. The identifier is
//! the SHA-256 of the composed create command. When the read command cannot
//! be run, exits non-zero or times out, the resource is treated as gone: its
//! identifier and outputs are cleared and no error is returned. Commands that
//! cannot be composed are always errors.
//!
//! ## Shell safety
//!
//! Arguments are spliced into command lines verbatim by default. Use
//! [`Quoting::Shell`] when arguments are not trusted shell fragments.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod binder;
pub mod buffer;
pub mod error;
pub mod identity;
pub mod observer;
pub mod output;
pub mod reconciler;
pub mod template;
pub mod types;

pub use error::{Error, ErrorCategory, ExecFailure, Result};
pub use observer::{Event, LogObserver, NoObserver, Observer};
pub use types::{
    Arguments, CommandInvocation, CommandSpec, Operation, Outputs, Quoting, ReadOutcome,
    ResourceConfig, ResourceDescriptor, ResourceState, SHELL_RESOURCE,
};

use backend::{Backend, shell::ShellBackend};

/// High-level client for one shell resource configuration.
///
/// The client owns the configuration, the backend that runs commands and
/// the observer that receives progress events. It holds no per-instance
/// state, so one client can serve many resource instances, including from
/// several threads at once.
pub struct Client {
    config: ResourceConfig,
    backend: Box<dyn Backend>,
    observer: Box<dyn Observer>,
}

impl Client {
    /// Create a client that runs commands through the platform shell and
    /// logs through the `log` crate.
    ///
    /// Returns an error if the configuration does not validate.
    pub fn new(config: ResourceConfig) -> Result<Self> {
        config.validate()?;
        let backend = ShellBackend::new().with_timeout(config.timeout);
        Ok(Self {
            config,
            backend: Box::new(backend),
            observer: Box::new(LogObserver),
        })
    }

    /// Create a client with a custom backend (useful for testing).
    pub fn with_backend(config: ResourceConfig, backend: Box<dyn Backend>) -> Self {
        Self {
            config,
            backend,
            observer: Box::new(LogObserver),
        }
    }

    /// Replace the observer.
    pub fn with_observer(mut self, observer: Box<dyn Observer>) -> Self {
        self.observer = observer;
        self
    }

    /// The configuration this client runs.
    pub fn config(&self) -> &ResourceConfig {
        &self.config
    }

    /// Check the configuration for schema problems.
    pub fn validate(&self) -> Result<()> {
        self.config.validate()
    }

    /// Compose the command an operation would run, without running it.
    pub fn invocation(&self, operation: Operation, arguments: &Arguments) -> Result<CommandInvocation> {
        reconciler::invocation(&self.config, operation, arguments)
    }

    /// Create a resource instance. See [`reconciler::create`].
    pub fn create(&self, arguments: &Arguments) -> Result<ResourceState> {
        reconciler::create(
            &self.config,
            self.backend.as_ref(),
            self.observer.as_ref(),
            arguments,
        )
    }

    /// Refresh a resource instance. See [`reconciler::read`].
    pub fn read(&self, arguments: &Arguments, state: &mut ResourceState) -> Result<ReadOutcome> {
        reconciler::read(
            &self.config,
            self.backend.as_ref(),
            self.observer.as_ref(),
            arguments,
            state,
        )
    }

    /// Delete a resource instance. See [`reconciler::delete`].
    pub fn delete(&self, arguments: &Arguments, state: &mut ResourceState) -> Result<()> {
        reconciler::delete(
            &self.config,
            self.backend.as_ref(),
            self.observer.as_ref(),
            arguments,
            state,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = ResourceConfig::new(
            CommandSpec::new("echo %s %s").with_parameters(["a"]),
            CommandSpec::new("cat x"),
            CommandSpec::new("rm x"),
        );
        assert!(matches!(Client::new(config), Err(Error::InvalidConfig(_))));
    }

    #[cfg(unix)]
    mod lifecycle {
        use super::*;
        use std::sync::Mutex;
        use tempfile::TempDir;

        struct Recorder(Mutex<Vec<String>>);

        impl Observer for Recorder {
            fn notify(&self, event: &Event<'_>) {
                self.0.lock().unwrap().push(event.message());
            }
        }

        fn client(dir: &TempDir) -> Client {
            let config = ResourceConfig::new(
                CommandSpec::new("echo \"%s\" > %s").with_parameters(["output", "file"]),
                CommandSpec::new("awk '{print \"out=\" $0}' %s").with_parameters(["file"]),
                CommandSpec::new("rm %s").with_parameters(["file"]),
            )
            .with_working_directory(dir.path().to_string_lossy());
            Client::new(config).unwrap().with_observer(Box::new(NoObserver))
        }

        fn args(output: &str, file: &str) -> Arguments {
            Arguments::from([
                ("output".to_string(), output.to_string()),
                ("file".to_string(), file.to_string()),
            ])
        }

        #[test]
        fn test_create_read_delete() {
            let tmp = TempDir::new().unwrap();
            let client = client(&tmp);
            let args = args("hi", "t1");

            let mut state = client.create(&args).unwrap();
            assert!(state.exists());
            assert!(state.id.chars().all(|c| c.is_ascii_hexdigit()));
            assert_eq!(state.output, Outputs::from([("out".to_string(), "hi".to_string())]));

            assert_eq!(client.read(&args, &mut state).unwrap(), ReadOutcome::Present);
            assert_eq!(state.output["out"], "hi");

            client.delete(&args, &mut state).unwrap();
            assert!(!state.exists());
            assert!(!tmp.path().join("t1").exists());
        }

        #[test]
        fn test_read_after_external_deletion() {
            let tmp = TempDir::new().unwrap();
            let client = client(&tmp);
            let args = args("hi", "t1");

            let mut state = client.create(&args).unwrap();
            std::fs::remove_file(tmp.path().join("t1")).unwrap();

            let outcome = client.read(&args, &mut state).unwrap();
            assert_eq!(outcome, ReadOutcome::Gone);
            assert!(state.id.is_empty());
            assert!(state.output.is_empty());
        }

        #[test]
        fn test_value_containing_equals() {
            let tmp = TempDir::new().unwrap();
            let client = client(&tmp);

            let state = client.create(&args(" can you = read this", "t3")).unwrap();
            assert_eq!(state.output["out"], " can you = read this");
        }

        #[test]
        fn test_identity_depends_on_create_command() {
            let tmp = TempDir::new().unwrap();
            let client = client(&tmp);

            let a = client.create(&args("hi", "a")).unwrap();
            let b = client.create(&args("hi", "b")).unwrap();
            let a_again = client.create(&args("hi", "a")).unwrap();
            assert_ne!(a.id, b.id);
            assert_eq!(a.id, a_again.id);
        }

        #[test]
        fn test_failed_delete_keeps_state() {
            let tmp = TempDir::new().unwrap();
            let client = client(&tmp);
            let args = args("hi", "t1");

            let mut state = client.create(&args).unwrap();
            std::fs::remove_file(tmp.path().join("t1")).unwrap();

            assert!(client.delete(&args, &mut state).is_err());
            assert!(state.exists());
        }

        #[test]
        fn test_events_are_reported() {
            let tmp = TempDir::new().unwrap();
            let recorder = std::sync::Arc::new(Recorder(Mutex::new(Vec::new())));

            struct Shared(std::sync::Arc<Recorder>);
            impl Observer for Shared {
                fn notify(&self, event: &Event<'_>) {
                    self.0.notify(event);
                }
            }

            let client = client(&tmp).with_observer(Box::new(Shared(recorder.clone())));
            client.create(&args("hi", "t1")).unwrap();

            let messages = recorder.0.lock().unwrap();
            assert!(messages[0].starts_with("Creating shell resource: echo"));
            assert!(messages.iter().any(|m| m.starts_with("Created shell resource: ")));
            assert!(messages.iter().any(|m| m == "\"out\" = \"hi\""));
        }
    }
}
