//! Create/read/delete against a [`Backend`].
//!
//! Each call composes a fresh [`CommandInvocation`]; nothing is cached
//! between calls. Configuration errors always propagate. The one deliberate
//! translation is in [`read`]: a read command that fails means the resource
//! no longer exists.

use crate::backend::Backend;
use crate::error::Result;
use crate::identity;
use crate::observer::{Event, Observer};
use crate::output;
use crate::template;
use crate::types::{Arguments, CommandInvocation, Operation, ReadOutcome, ResourceConfig, ResourceState};

/// Bind and compose the command for `operation`.
pub fn invocation(
    config: &ResourceConfig,
    operation: Operation,
    arguments: &Arguments,
) -> Result<CommandInvocation> {
    let command = template::compose(
        operation,
        config.command(operation),
        arguments,
        config.quoting,
    )?;
    Ok(CommandInvocation::new(command, &config.working_directory))
}

/// Run the create command, derive the identifier, then read.
///
/// On failure no state is produced. The returned state can already be
/// absent if the chained read fails.
pub fn create(
    config: &ResourceConfig,
    backend: &dyn Backend,
    observer: &dyn Observer,
    arguments: &Arguments,
) -> Result<ResourceState> {
    let invocation = invocation(config, Operation::Create, arguments)?;
    observer.notify(&Event::Starting {
        operation: Operation::Create,
        command: &invocation.command,
    });
    backend.run(&invocation, observer)?;

    let mut state = ResourceState {
        id: identity::resource_id(&invocation.command),
        output: Default::default(),
    };
    observer.notify(&Event::Created { id: &state.id });

    read(config, backend, observer, arguments, &mut state)?;
    Ok(state)
}

/// Run the read command and refresh `state`.
///
/// A failing read command clears the state and reports
/// [`ReadOutcome::Gone`]; it is not an error.
pub fn read(
    config: &ResourceConfig,
    backend: &dyn Backend,
    observer: &dyn Observer,
    arguments: &Arguments,
    state: &mut ResourceState,
) -> Result<ReadOutcome> {
    let invocation = invocation(config, Operation::Read, arguments)?;
    observer.notify(&Event::Starting {
        operation: Operation::Read,
        command: &invocation.command,
    });

    match backend.run(&invocation, observer) {
        Ok(raw) => {
            state.output = output::parse(&raw, observer);
            Ok(ReadOutcome::Present)
        }
        Err(e) if e.is_execution_failure() => {
            observer.notify(&Event::MarkedGone {
                output: e.command_output().unwrap_or_default(),
            });
            state.mark_gone();
            Ok(ReadOutcome::Gone)
        }
        Err(e) => Err(e),
    }
}

/// Run the delete command; clear the identifier only if it succeeds.
pub fn delete(
    config: &ResourceConfig,
    backend: &dyn Backend,
    observer: &dyn Observer,
    arguments: &Arguments,
    state: &mut ResourceState,
) -> Result<()> {
    let invocation = invocation(config, Operation::Delete, arguments)?;
    observer.notify(&Event::Starting {
        operation: Operation::Delete,
        command: &invocation.command,
    });
    backend.run(&invocation, observer)?;

    observer.notify(&Event::Deleted { id: &state.id });
    state.id.clear();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, ExecFailure};
    use crate::observer::NoObserver;
    use crate::types::CommandSpec;
    use std::collections::HashMap;
    use std::io;
    use std::sync::Mutex;

    /// Backend that answers from a table keyed by composed command.
    struct MockBackend {
        responses: HashMap<String, std::result::Result<String, String>>,
        calls: Mutex<Vec<CommandInvocation>>,
    }

    impl MockBackend {
        fn new() -> Self {
            Self {
                responses: HashMap::new(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn ok(mut self, command: &str, output: &str) -> Self {
            self.responses
                .insert(command.to_string(), Ok(output.to_string()));
            self
        }

        fn fail(mut self, command: &str, output: &str) -> Self {
            self.responses
                .insert(command.to_string(), Err(output.to_string()));
            self
        }

        fn commands(&self) -> Vec<String> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .map(|c| c.command.clone())
                .collect()
        }
    }

    impl Backend for MockBackend {
        fn run(&self, invocation: &CommandInvocation, _observer: &dyn Observer) -> Result<String> {
            self.calls.lock().unwrap().push(invocation.clone());
            match self.responses.get(&invocation.command) {
                Some(Ok(output)) => Ok(output.clone()),
                other => Err(Error::CommandExecution {
                    command: invocation.shell_line(),
                    cause: ExecFailure::Launch(io::Error::other("mock failure")),
                    output: match other {
                        Some(Err(output)) => output.clone(),
                        _ => String::new(),
                    },
                }),
            }
        }
    }

    fn config() -> ResourceConfig {
        ResourceConfig::new(
            CommandSpec::new("echo \"%s\" > %s").with_parameters(["output", "file"]),
            CommandSpec::new("cat %s").with_parameters(["file"]),
            CommandSpec::new("rm %s").with_parameters(["file"]),
        )
        .with_working_directory("/work")
    }

    fn arguments() -> Arguments {
        Arguments::from([
            ("output".to_string(), "hi".to_string()),
            ("file".to_string(), "t1".to_string()),
        ])
    }

    #[test]
    fn test_invocation_is_composed() {
        let inv = invocation(&config(), Operation::Create, &arguments()).unwrap();
        assert_eq!(inv.command, "echo \"hi\" > t1");
        assert_eq!(inv.working_directory, "/work");
    }

    #[test]
    fn test_create_sets_id_and_reads() {
        let backend = MockBackend::new()
            .ok("echo \"hi\" > t1", "")
            .ok("cat t1", "out=hi\n");

        let state = create(&config(), &backend, &NoObserver, &arguments()).unwrap();

        assert_eq!(state.id, identity::resource_id("echo \"hi\" > t1"));
        assert_eq!(state.output["out"], "hi");
        assert_eq!(backend.commands(), vec!["echo \"hi\" > t1", "cat t1"]);
    }

    #[test]
    fn test_create_failure_runs_nothing_else() {
        let backend = MockBackend::new().fail("echo \"hi\" > t1", "disk full");

        let err = create(&config(), &backend, &NoObserver, &arguments()).unwrap_err();

        assert_eq!(err.command_output(), Some("disk full"));
        assert_eq!(backend.commands(), vec!["echo \"hi\" > t1"]);
    }

    #[test]
    fn test_create_then_failed_read_is_absent() {
        let backend = MockBackend::new().ok("echo \"hi\" > t1", "");

        let state = create(&config(), &backend, &NoObserver, &arguments()).unwrap();

        assert!(!state.exists());
        assert!(state.output.is_empty());
    }

    #[test]
    fn test_create_missing_argument_runs_nothing() {
        let backend = MockBackend::new();
        let mut args = arguments();
        args.remove("file");

        let err = create(&config(), &backend, &NoObserver, &args).unwrap_err();

        assert!(matches!(err, Error::MissingParameter { ref name, .. } if name == "file"));
        assert!(backend.commands().is_empty());
    }

    #[test]
    fn test_read_replaces_output() {
        let backend = MockBackend::new().ok("cat t1", "a=1\n");
        let mut state = ResourceState {
            id: "id".to_string(),
            output: [("old".to_string(), "x".to_string())].into(),
        };

        let outcome = read(&config(), &backend, &NoObserver, &arguments(), &mut state).unwrap();

        assert_eq!(outcome, ReadOutcome::Present);
        assert_eq!(state.id, "id");
        assert_eq!(state.output.len(), 1);
        assert_eq!(state.output["a"], "1");
    }

    #[test]
    fn test_read_failure_marks_gone() {
        let backend = MockBackend::new().fail("cat t1", "no such file");
        let mut state = ResourceState {
            id: "id".to_string(),
            output: [("a".to_string(), "1".to_string())].into(),
        };

        let outcome = read(&config(), &backend, &NoObserver, &arguments(), &mut state).unwrap();

        assert_eq!(outcome, ReadOutcome::Gone);
        assert!(!state.exists());
        assert!(state.output.is_empty());
    }

    #[test]
    fn test_read_configuration_error_propagates() {
        let mut cfg = config();
        cfg.read = CommandSpec::new("cat %s %s").with_parameters(["file"]);
        let backend = MockBackend::new();
        let mut state = ResourceState {
            id: "id".to_string(),
            output: Default::default(),
        };

        let err = read(&cfg, &backend, &NoObserver, &arguments(), &mut state).unwrap_err();

        assert!(matches!(err, Error::Interpolation { .. }));
        assert!(state.exists());
        assert!(backend.commands().is_empty());
    }

    #[test]
    fn test_delete_clears_id() {
        let backend = MockBackend::new().ok("rm t1", "");
        let mut state = ResourceState {
            id: "id".to_string(),
            output: [("a".to_string(), "1".to_string())].into(),
        };

        delete(&config(), &backend, &NoObserver, &arguments(), &mut state).unwrap();

        assert!(!state.exists());
    }

    #[test]
    fn test_delete_failure_keeps_state() {
        let backend = MockBackend::new().fail("rm t1", "busy");
        let mut state = ResourceState {
            id: "id".to_string(),
            output: Default::default(),
        };

        let err = delete(&config(), &backend, &NoObserver, &arguments(), &mut state).unwrap_err();

        assert!(err.is_execution_failure());
        assert_eq!(state.id, "id");
    }
}
