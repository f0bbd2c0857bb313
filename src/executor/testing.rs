//! Scripted command runner for unit tests.

use std::sync::Mutex;

use crate::error::PhpupResult;

use super::runner::CommandRunner;
use super::subprocess::ExecOutput;

/// A runner that matches commands against scripted responses and records
/// everything it is asked to run.
#[derive(Default)]
pub(crate) struct ScriptedRunner {
    responses: Mutex<Vec<(String, ExecOutput)>>,
    commands: Mutex<Vec<String>>,
}

impl ScriptedRunner {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Respond to any command containing `pattern` with `stdout` and exit 0.
    pub(crate) fn succeed_on(&self, pattern: &str, stdout: &str) {
        self.responses.lock().unwrap().push((
            pattern.to_string(),
            ExecOutput {
                success: true,
                exit_code: Some(0),
                stdout: stdout.to_string(),
                stderr: String::new(),
            },
        ));
    }

    /// Respond to any command containing `pattern` with a non-zero exit.
    pub(crate) fn fail_on(&self, pattern: &str, code: i32, stderr: &str) {
        self.responses.lock().unwrap().push((
            pattern.to_string(),
            ExecOutput {
                success: false,
                exit_code: Some(code),
                stdout: String::new(),
                stderr: stderr.to_string(),
            },
        ));
    }

    /// All commands executed so far, in order.
    pub(crate) fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    /// How many executed commands contained `pattern`.
    pub(crate) fn count_matching(&self, pattern: &str) -> usize {
        self.commands().iter().filter(|c| c.contains(pattern)).count()
    }
}

impl CommandRunner for ScriptedRunner {
    fn execute(&self, command: &str) -> PhpupResult<ExecOutput> {
        self.commands.lock().unwrap().push(command.to_string());
        let responses = self.responses.lock().unwrap();
        for (pattern, output) in responses.iter() {
            if command.contains(pattern.as_str()) {
                return Ok(output.clone());
            }
        }
        // Unscripted commands succeed with empty output.
        Ok(ExecOutput {
            success: true,
            exit_code: Some(0),
            stdout: String::new(),
            stderr: String::new(),
        })
    }
}
