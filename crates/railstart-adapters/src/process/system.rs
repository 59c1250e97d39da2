//! Runs real processes with `std::process`.

use std::io::{self, Read};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use railstart_core::{
    application::{
        ApplicationError,
        ports::{CapturedOutput, CommandRunner, CommandStatus, Invocation},
    },
    error::{RailstartError, RailstartResult},
};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Production command runner.
///
/// `run` inherits the terminal so generator output streams to the user.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }

    fn command(invocation: &Invocation) -> Command {
        let mut command = Command::new(&invocation.program);
        command.args(&invocation.args).current_dir(&invocation.cwd);
        command
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> RailstartResult<CommandStatus> {
        debug!(command = %invocation, cwd = %invocation.cwd.display(), "Spawning");
        let mut child = Self::command(invocation)
            .stdin(Stdio::inherit())
            .spawn()
            .map_err(|e| unavailable(invocation, e))?;

        let status = wait(&mut child, invocation)?;
        Ok(CommandStatus {
            code: status.code(),
        })
    }

    fn capture(&self, invocation: &Invocation) -> RailstartResult<CapturedOutput> {
        debug!(command = %invocation, "Spawning (captured)");
        let mut child = Self::command(invocation)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| unavailable(invocation, e))?;

        // Drain both pipes on their own threads so a chatty child cannot
        // block on a full pipe while we poll for exit.
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let status = wait(&mut child, invocation)?;
        Ok(CapturedOutput {
            status: CommandStatus {
                code: status.code(),
            },
            stdout: stdout.map(join).unwrap_or_default(),
            stderr: stderr.map(join).unwrap_or_default(),
        })
    }
}

fn drain<R: Read + Send + 'static>(mut reader: R) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = reader.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn join(handle: thread::JoinHandle<String>) -> String {
    handle.join().unwrap_or_default()
}

/// Wait for `child`, killing it once the invocation's timeout has passed.
fn wait(child: &mut Child, invocation: &Invocation) -> RailstartResult<ExitStatus> {
    let Some(timeout) = invocation.timeout else {
        return child.wait().map_err(|e| wait_failed(invocation, e));
    };

    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait().map_err(|e| wait_failed(invocation, e))? {
            return Ok(status);
        }
        if Instant::now() >= deadline {
            warn!(command = %invocation, "Command timed out, killing it");
            let _ = child.kill();
            let _ = child.wait();
            return Err(ApplicationError::CommandTimedOut {
                command: invocation.to_string(),
                seconds: timeout.as_secs(),
            }
            .into());
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn unavailable(invocation: &Invocation, e: io::Error) -> RailstartError {
    ApplicationError::CommandUnavailable {
        program: invocation.program.clone(),
        reason: e.to_string(),
    }
    .into()
}

fn wait_failed(invocation: &Invocation, e: io::Error) -> RailstartError {
    RailstartError::Internal {
        message: format!("waiting for `{}` failed: {}", invocation, e),
    }
}
