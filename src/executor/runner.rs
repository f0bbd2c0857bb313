//! The command-runner contract.
//!
//! Package managers, service managers, and the FPM orchestrator issue all
//! shell commands through [`CommandRunner`], which keeps them testable with
//! scripted runners.

use tracing::debug;

use crate::error::{CommandErrorKind, PhpupError, PhpupResult};

use super::subprocess::{ExecOutput, SubprocessBuilder};

/// Runs shell command strings and captures their output.
///
/// `execute` is the only required method. The provided helpers encode the two
/// failure policies callers need:
///
/// - [`run`](CommandRunner::run) is lenient: non-zero exit still yields the
///   (possibly empty) trimmed output. Callers that grep or parse output and
///   treat "no match" as empty use this.
/// - [`run_with`](CommandRunner::run_with) is strict: on non-zero exit the
///   failure handler maps `(exit_code, stderr)` to the operation's error,
///   which is returned as-is.
pub trait CommandRunner: Send + Sync {
    /// Run `command` through the shell and capture its outcome.
    ///
    /// Errors only on spawn failure; a non-zero exit is a normal outcome.
    fn execute(&self, command: &str) -> PhpupResult<ExecOutput>;

    /// Run `command`, returning trimmed captured output regardless of exit
    /// status.
    fn run(&self, command: &str) -> PhpupResult<String> {
        let output = self.execute(command)?;
        Ok(output.stdout.trim().to_string())
    }

    /// Run `command`; on non-zero exit, map `(exit_code, stderr)` through
    /// `on_failure` and return the resulting error.
    fn run_with(
        &self,
        command: &str,
        on_failure: &dyn Fn(Option<i32>, &str) -> PhpupError,
    ) -> PhpupResult<String> {
        let output = self.execute(command)?;
        if !output.success {
            debug!(
                command = %command,
                exit_code = ?output.exit_code,
                stderr = %output.stderr.trim(),
                "Command failed"
            );
            return Err(on_failure(output.exit_code, output.stderr.trim()));
        }
        Ok(output.stdout.trim().to_string())
    }

    /// Run `command`, failing with a generic non-zero-exit error.
    fn run_checked(&self, command: &str) -> PhpupResult<String> {
        self.run_with(command, &|code, stderr| PhpupError::Command {
            kind: CommandErrorKind::NonZeroExit {
                code,
                stderr: stderr.to_string(),
            },
        })
    }
}

/// The real runner: shells out via `sh -c`.
#[derive(Debug, Default, Clone)]
pub struct SystemRunner;

impl SystemRunner {
    /// Create a new system runner.
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for SystemRunner {
    fn execute(&self, command: &str) -> PhpupResult<ExecOutput> {
        SubprocessBuilder::new("sh")
            .arg("-c")
            .arg(command)
            .run()
    }
}
