//! A command runner that records invocations instead of running them.

use std::sync::{Arc, Mutex};

use railstart_core::{
    application::{
        ApplicationError,
        ports::{CapturedOutput, CommandRunner, CommandStatus, Invocation},
    },
    error::RailstartResult,
};

#[derive(Debug, Default)]
struct Script {
    /// `(command prefix, exit code)`; the first matching prefix wins.
    exits: Vec<(String, i32)>,
    /// `(command prefix, stdout)` for `capture`.
    outputs: Vec<(String, String)>,
    calls: Vec<Invocation>,
}

/// Test double for [`CommandRunner`].
///
/// Every command succeeds unless a failure was scripted for it. Commands
/// are matched by the prefix of their display form, e.g. `"git commit"`.
#[derive(Debug, Clone, Default)]
pub struct RecordingRunner {
    script: Arc<Mutex<Script>>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make commands starting with `prefix` exit with `code`.
    pub fn fail_on(self, prefix: impl Into<String>, code: i32) -> Self {
        if let Ok(mut script) = self.script.lock() {
            script.exits.push((prefix.into(), code));
        }
        self
    }

    /// Make `capture` of commands starting with `prefix` print `stdout`.
    pub fn output_for(self, prefix: impl Into<String>, stdout: impl Into<String>) -> Self {
        if let Ok(mut script) = self.script.lock() {
            script.outputs.push((prefix.into(), stdout.into()));
        }
        self
    }

    /// Every invocation so far, in order.
    pub fn invocations(&self) -> Vec<Invocation> {
        self.script
            .lock()
            .map(|s| s.calls.clone())
            .unwrap_or_default()
    }

    /// Display form of every invocation so far, in order.
    pub fn commands(&self) -> Vec<String> {
        self.invocations().iter().map(ToString::to_string).collect()
    }

    fn record(&self, invocation: &Invocation) -> RailstartResult<(CommandStatus, String)> {
        let mut script = self
            .script
            .lock()
            .map_err(|_| ApplicationError::LockPoisoned)?;
        script.calls.push(invocation.clone());

        let line = invocation.to_string();
        let status = script
            .exits
            .iter()
            .find(|(prefix, _)| line.starts_with(prefix.as_str()))
            .map_or_else(CommandStatus::success, |(_, code)| {
                CommandStatus::failure(*code)
            });
        let stdout = script
            .outputs
            .iter()
            .find(|(prefix, _)| line.starts_with(prefix.as_str()))
            .map(|(_, out)| out.clone())
            .unwrap_or_default();
        Ok((status, stdout))
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, invocation: &Invocation) -> RailstartResult<CommandStatus> {
        self.record(invocation).map(|(status, _)| status)
    }

    fn capture(&self, invocation: &Invocation) -> RailstartResult<CapturedOutput> {
        let (status, stdout) = self.record(invocation)?;
        Ok(CapturedOutput {
            status,
            stdout,
            stderr: String::new(),
        })
    }
}
