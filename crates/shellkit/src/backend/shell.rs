//! Platform shell backend.
//!
//! Runs each invocation as `/bin/sh -c "cd <dir> && <command>"` (or
//! `cmd /C` on Windows). Standard output and standard error share a single
//! pipe, so the captured text keeps the order the child wrote it in. The
//! pipe is drained into one [`RingBuffer`] so the child can print any amount
//! without growing memory.
//!
//! With a timeout armed on Unix, the shell runs in its own process group and
//! the whole group is killed at the deadline, including anything the shell
//! forked.

use std::io::{self, Read};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::buffer::RingBuffer;
use crate::error::{Error, ExecFailure, Result};
use crate::observer::{Event, Observer};
use crate::types::CommandInvocation;

use super::Backend;

/// Output retained per invocation.
pub const MAX_OUTPUT_BYTES: usize = 8 * 1024;

/// How often a child is polled while a timeout is armed.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Shell program and the flag that introduces a command string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shell {
    /// Program to launch
    pub program: String,
    /// Flag preceding the command line
    pub flag: String,
}

impl Shell {
    /// `cmd /C` on Windows, `/bin/sh -c` everywhere else.
    pub fn platform() -> Self {
        if cfg!(windows) {
            Self {
                program: "cmd".to_string(),
                flag: "/C".to_string(),
            }
        } else {
            Self {
                program: "/bin/sh".to_string(),
                flag: "-c".to_string(),
            }
        }
    }
}

impl Default for Shell {
    fn default() -> Self {
        Self::platform()
    }
}

/// Backend that executes invocations through a system shell.
#[derive(Debug, Clone)]
pub struct ShellBackend {
    shell: Shell,
    timeout: Option<Duration>,
    capacity: usize,
}

impl ShellBackend {
    /// Create a backend using the platform shell and no timeout.
    pub fn new() -> Self {
        Self {
            shell: Shell::platform(),
            timeout: None,
            capacity: MAX_OUTPUT_BYTES,
        }
    }

    /// Kill commands that run longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Use a different shell.
    pub fn with_shell(mut self, shell: Shell) -> Self {
        self.shell = shell;
        self
    }

    /// Retain at most `capacity` bytes of output.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Wait for the child, killing it once the timeout passes.
    fn wait(&self, child: &mut Child) -> std::result::Result<ExitStatus, ExecFailure> {
        let Some(timeout) = self.timeout else {
            return child.wait().map_err(ExecFailure::Wait);
        };

        let deadline = Instant::now() + timeout;
        loop {
            if let Some(status) = child.try_wait().map_err(ExecFailure::Wait)? {
                return Ok(status);
            }
            if Instant::now() >= deadline {
                terminate(child);
                return Err(ExecFailure::TimedOut(timeout));
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

impl Default for ShellBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Put the shell in a new process group so a timeout can kill its children too.
#[cfg(unix)]
fn isolate(command: &mut Command) {
    use std::os::unix::process::CommandExt;
    command.process_group(0);
}

#[cfg(not(unix))]
fn isolate(_command: &mut Command) {}

/// Kill the child and, on Unix, every process in its group.
fn terminate(child: &mut Child) {
    #[cfg(unix)]
    {
        if let Ok(pid) = libc::pid_t::try_from(child.id()) {
            // SAFETY: kill(2) only sends a signal; the group was created by isolate()
            unsafe {
                libc::kill(-pid, libc::SIGKILL);
            }
        }
    }

    // The child may have exited between the poll and the kill
    let _ = child.kill();
    let _ = child.wait();
}

/// Copy everything from `source` into `buffer` until EOF.
fn pump(mut source: impl Read, buffer: &mut RingBuffer) {
    let mut chunk = [0u8; 4096];
    loop {
        match source.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => buffer.push(&chunk[..n]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => {
                log::debug!("Stopped reading command output: {e}");
                break;
            }
        }
    }
}

impl Backend for ShellBackend {
    fn run(&self, invocation: &CommandInvocation, observer: &dyn Observer) -> Result<String> {
        let line = invocation.shell_line();

        observer.notify(&Event::Executing {
            shell: &self.shell.program,
            flag: &self.shell.flag,
            line: &line,
        });

        // One pipe for both streams keeps their relative order
        let (reader, writer) = io::pipe()?;

        let mut command = Command::new(&self.shell.program);
        command
            .arg(&self.shell.flag)
            .arg(&line)
            .stdin(Stdio::null())
            .stdout(writer.try_clone()?)
            .stderr(writer);
        if self.timeout.is_some() {
            isolate(&mut command);
        }

        let spawned = command.spawn();
        // Release the parent's write ends so the reader sees EOF when the child exits
        drop(command);

        let mut child = match spawned {
            Ok(child) => child,
            Err(e) => {
                return Err(Error::CommandExecution {
                    command: line,
                    cause: ExecFailure::Launch(e),
                    output: String::new(),
                });
            }
        };

        let mut buffer = RingBuffer::new(self.capacity);

        // The reader finishes once every process holding the pipe has exited
        let waited = thread::scope(|scope| {
            scope.spawn(|| pump(reader, &mut buffer));
            self.wait(&mut child)
        });

        let output = buffer.to_string_lossy();

        let failure = match waited {
            Ok(status) if status.success() => None,
            Ok(status) => Some(ExecFailure::Exit(status)),
            Err(failure) => Some(failure),
        };

        if let Some(cause) = failure {
            return Err(Error::CommandExecution {
                command: line,
                cause,
                output,
            });
        }

        observer.notify(&Event::CommandOutput {
            output: &output,
            truncated: buffer.is_truncated(),
        });

        Ok(output)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::observer::NoObserver;
    use tempfile::TempDir;

    fn run(command: &str, dir: &str) -> Result<String> {
        ShellBackend::new().run(&CommandInvocation::new(command, dir), &NoObserver)
    }

    #[test]
    fn test_captures_stdout_and_stderr() {
        let out = run("echo one; echo two 1>&2; echo three", ".").unwrap();
        assert_eq!(out, "one\ntwo\nthree\n");
    }

    #[test]
    fn test_merged_output_keeps_write_order() {
        let command = "i=0; while [ $i -lt 200 ]; do echo k=o$i; echo k=e$i 1>&2; i=$((i+1)); done";
        let expected: String = (0..200).map(|i| format!("k=o{i}\nk=e{i}\n")).collect();

        for _ in 0..5 {
            let out = run(command, ".").unwrap();
            assert_eq!(out, expected);
            assert_eq!(crate::output::parse(&out, &NoObserver)["k"], "e199");
        }
    }

    #[test]
    fn test_runs_in_working_directory() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().to_string_lossy().into_owned();
        run("echo data > marker", &dir).unwrap();
        assert!(tmp.path().join("marker").exists());
    }

    #[test]
    fn test_non_zero_exit_keeps_output() {
        let err = run("echo partial; exit 3", ".").unwrap_err();
        match err {
            Error::CommandExecution {
                command,
                cause,
                output,
            } => {
                assert_eq!(command, "cd . && echo partial; exit 3");
                assert_eq!(cause.exit_code(), Some(3));
                assert_eq!(output, "partial\n");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_directory_fails() {
        let err = run("true", "/definitely/not/a/dir").unwrap_err();
        assert!(err.is_execution_failure());
        assert!(!err.command_output().unwrap().is_empty());
    }

    #[test]
    fn test_output_capped() {
        let out = run("head -c 20000 /dev/zero | tr '\\0' 'a'; printf END", ".").unwrap();
        assert_eq!(out.len(), MAX_OUTPUT_BYTES);
        assert!(out.ends_with("END"));
    }

    #[test]
    fn test_output_capped_on_char_boundary() {
        // 1 + 3000 * 3 bytes; eviction lands inside a character
        let command = "printf a; i=0; while [ $i -lt 3000 ]; do printf '\\342\\202\\254'; i=$((i+1)); done";
        let out = run(command, ".").unwrap();
        assert!(out.len() <= MAX_OUTPUT_BYTES);
        assert!(out.len() > MAX_OUTPUT_BYTES - 4);
        assert!(out.chars().all(|c| c == '€'));
    }

    /// Reader that is interrupted once before yielding its data.
    struct Interrupting<'a> {
        interrupted: bool,
        data: &'a [u8],
    }

    impl Read for Interrupting<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(io::ErrorKind::Interrupted.into());
            }
            self.data.read(buf)
        }
    }

    #[test]
    fn test_pump_retries_interrupted_reads() {
        let mut buffer = RingBuffer::new(64);
        let source = Interrupting {
            interrupted: false,
            data: b"out=hi\n",
        };
        pump(source, &mut buffer);
        assert_eq!(buffer.to_string_lossy(), "out=hi\n");
    }

    #[test]
    fn test_launch_failure() {
        let backend = ShellBackend::new().with_shell(Shell {
            program: "/no/such/shell".to_string(),
            flag: "-c".to_string(),
        });
        let err = backend
            .run(&CommandInvocation::new("true", "."), &NoObserver)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::CommandExecution {
                cause: ExecFailure::Launch(_),
                ..
            }
        ));
    }

    #[test]
    fn test_timeout_kills_command() {
        let backend = ShellBackend::new().with_timeout(Some(Duration::from_millis(200)));
        let started = Instant::now();
        let err = backend
            .run(&CommandInvocation::new("exec sleep 5", "."), &NoObserver)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::CommandExecution {
                cause: ExecFailure::TimedOut(_),
                ..
            }
        ));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn test_timeout_kills_forked_commands() {
        let backend = ShellBackend::new().with_timeout(Some(Duration::from_millis(200)));
        let started = Instant::now();
        let err = backend
            .run(
                &CommandInvocation::new("echo started; sleep 3; echo finished", "."),
                &NoObserver,
            )
            .unwrap_err();
        assert!(started.elapsed() < Duration::from_secs(2));
        match err {
            Error::CommandExecution { cause, output, .. } => {
                assert!(matches!(cause, ExecFailure::TimedOut(_)));
                assert_eq!(output, "started\n");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
