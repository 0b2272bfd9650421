use crate::error::Result;
use crate::observer::Observer;
use crate::types::CommandInvocation;

pub mod shell;

/// Backend trait for running composed commands
///
/// This trait abstracts process execution, allowing us to:
/// - Run commands through the platform shell
/// - Mock execution for testing the lifecycle logic
pub trait Backend: Send + Sync {
    /// Run the invocation to completion and return its captured output.
    ///
    /// Fails with `Error::CommandExecution` when the command cannot be
    /// launched or does not succeed; the error carries whatever output was
    /// captured.
    fn run(&self, invocation: &CommandInvocation, observer: &dyn Observer) -> Result<String>;
}
