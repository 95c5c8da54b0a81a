use super::command::ToolCommand;
use crate::error::{GateError, Result};
use serde::Serialize;
use std::io::{ErrorKind, Read};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

pub const RUN_TIMEOUT: Duration = Duration::from_secs(300);
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

const POLL_INTERVAL: Duration = Duration::from_millis(25);
/// How long a killed tool's pipes are given to close.
const REAP_GRACE: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Serialize)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub duration_ms: u128,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Most tools report on stdout; some (cargo, go vet) write diagnostics
    /// to stderr, so parsers see both.
    pub fn combined(&self) -> String {
        if self.stderr.trim().is_empty() {
            self.stdout.clone()
        } else if self.stdout.trim().is_empty() {
            self.stderr.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ToolInvoker {
    pub run_timeout: Duration,
    pub probe_timeout: Duration,
}

impl Default for ToolInvoker {
    fn default() -> Self {
        Self {
            run_timeout: RUN_TIMEOUT,
            probe_timeout: PROBE_TIMEOUT,
        }
    }
}

impl ToolInvoker {
    pub fn invoke(&self, command: &ToolCommand, working_dir: Option<&Path>) -> Result<ToolOutput> {
        invoke(command, working_dir, self.run_timeout)
    }

    pub fn invoke_line(&self, line: &str, working_dir: Option<&Path>) -> Result<ToolOutput> {
        self.invoke(&ToolCommand::parse(line)?, working_dir)
    }

    pub fn probe(&self, command: &ToolCommand) -> bool {
        match invoke(&command.version_probe(), None, self.probe_timeout) {
            Ok(output) => output.success(),
            Err(e) => {
                debug!(program = %command.program, error = %e, "tool probe failed");
                false
            }
        }
    }
}

pub fn invoke(
    command: &ToolCommand,
    working_dir: Option<&Path>,
    timeout: Duration,
) -> Result<ToolOutput> {
    let operators = command.shell_operators();
    if !operators.is_empty() {
        warn!(
            command = %command,
            operators = ?operators,
            "shell operators are passed to the tool as literal arguments"
        );
    }

    let mut process = Command::new(&command.program);
    process
        .args(&command.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = working_dir {
        process.current_dir(dir);
    }

    debug!(command = %command, cwd = ?working_dir, "invoking tool");
    let started = Instant::now();
    let mut child = process.spawn().map_err(|e| match e.kind() {
        ErrorKind::NotFound => GateError::ToolUnavailable(command.program.clone()),
        _ => GateError::ToolExecution(format!("{}: {}", command.program, e)),
    })?;

    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let deadline = started + timeout;
    let timed_out = || GateError::ToolTimeout {
        command: command.to_string(),
        timeout_secs: timeout.as_secs(),
    };

    let status = match wait_with_deadline(&mut child, deadline) {
        Ok(Some(status)) => status,
        Ok(None) => {
            let _ = child.kill();
            let _ = child.wait();
            reap(&stdout, &stderr);
            return Err(timed_out());
        }
        Err(e) => {
            let _ = child.kill();
            let _ = child.wait();
            reap(&stdout, &stderr);
            return Err(GateError::ToolExecution(format!("{}: {}", command.program, e)));
        }
    };

    // A background process started by the tool can hold the pipes open
    // after the tool itself exits; the deadline covers that wait too.
    let (Some(stdout), Some(stderr)) = (collect(&stdout, deadline), collect(&stderr, deadline))
    else {
        warn!(command = %command, "tool exited but its output pipes stayed open past the deadline");
        return Err(timed_out());
    };

    let output = ToolOutput {
        stdout,
        stderr,
        exit_code: status.code(),
        duration_ms: started.elapsed().as_millis(),
    };
    debug!(
        command = %command,
        exit_code = ?output.exit_code,
        duration_ms = output.duration_ms,
        "tool finished"
    );
    Ok(output)
}

fn wait_with_deadline(
    child: &mut Child,
    deadline: Instant,
) -> std::io::Result<Option<std::process::ExitStatus>> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Receiver<String> {
    let (sender, receiver) = mpsc::channel();
    if let Some(mut reader) = pipe {
        thread::spawn(move || {
            let mut bytes = Vec::new();
            let _ = reader.read_to_end(&mut bytes);
            let _ = sender.send(String::from_utf8_lossy(&bytes).into_owned());
        });
    }
    receiver
}

/// `None` when the pipe is still open at `deadline`. A missing pipe reads
/// as empty.
fn collect(receiver: &Receiver<String>, deadline: Instant) -> Option<String> {
    match receiver.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
        Ok(text) => Some(text),
        Err(RecvTimeoutError::Disconnected) => Some(String::new()),
        Err(RecvTimeoutError::Timeout) => None,
    }
}

fn reap(stdout: &Receiver<String>, stderr: &Receiver<String>) {
    let deadline = Instant::now() + REAP_GRACE;
    let _ = collect(stdout, deadline);
    let _ = collect(stderr, deadline);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invoke_reports_missing_executable_as_unavailable() {
        let command = ToolCommand::parse("qualitygate-no-such-tool --flag").expect("command");
        let result = ToolInvoker::default().invoke(&command, None);
        assert!(matches!(result, Err(GateError::ToolUnavailable(name)) if name == "qualitygate-no-such-tool"));
    }

    #[test]
    fn probe_is_false_for_missing_executable() {
        let command = ToolCommand::parse("qualitygate-no-such-tool").expect("command");
        assert!(!ToolInvoker::default().probe(&command));
    }

    #[cfg(unix)]
    #[test]
    fn invoke_captures_stdout_and_exit_code() {
        let command = ToolCommand::parse("echo 3 passed").expect("command");
        let output = ToolInvoker::default()
            .invoke(&command, None)
            .expect("echo should run");
        assert_eq!(output.stdout.trim(), "3 passed");
        assert!(output.success());
    }

    #[cfg(unix)]
    #[test]
    fn invoke_returns_nonzero_exit_without_error() {
        let command = ToolCommand::parse("false").expect("command");
        let output = ToolInvoker::default()
            .invoke(&command, None)
            .expect("false should run");
        assert_eq!(output.exit_code, Some(1));
    }

    #[cfg(unix)]
    #[test]
    fn invoke_times_out_long_running_tool() {
        let command = ToolCommand::parse("sleep 5").expect("command");
        let result = invoke(&command, None, Duration::from_millis(100));
        assert!(matches!(result, Err(GateError::ToolTimeout { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn deadline_covers_pipes_held_by_background_process() {
        let command = ToolCommand::from_argv(vec![
            "sh".to_string(),
            "-c".to_string(),
            "sleep 4 & echo started".to_string(),
        ])
        .expect("command");
        let started = Instant::now();
        let result = invoke(&command, None, Duration::from_millis(500));
        let elapsed = started.elapsed();
        assert!(matches!(result, Err(GateError::ToolTimeout { .. })));
        assert!(elapsed < Duration::from_secs(2), "invoke blocked for {elapsed:?}");
    }

    #[cfg(unix)]
    #[test]
    fn finished_background_process_does_not_time_out() {
        let command = ToolCommand::from_argv(vec![
            "sh".to_string(),
            "-c".to_string(),
            "(sleep 0.2; echo late) & echo early".to_string(),
        ])
        .expect("command");
        let output = invoke(&command, None, Duration::from_secs(5)).expect("tool should finish");
        assert!(output.stdout.contains("early"));
        assert!(output.stdout.contains("late"));
    }

    #[test]
    fn missing_pipe_reads_as_empty() {
        let receiver = drain::<std::io::Empty>(None);
        assert_eq!(collect(&receiver, Instant::now()), Some(String::new()));
    }

    #[cfg(unix)]
    #[test]
    fn invoke_runs_in_working_dir() {
        let dir = tempfile::TempDir::new().expect("temp dir should be created");
        std::fs::write(dir.path().join("marker.txt"), "x").expect("marker should write");
        let command = ToolCommand::parse("ls").expect("command");
        let output = ToolInvoker::default()
            .invoke(&command, Some(dir.path()))
            .expect("ls should run");
        assert!(output.stdout.contains("marker.txt"));
    }

    #[test]
    fn combined_joins_both_streams() {
        let output = ToolOutput {
            stdout: "out".to_string(),
            stderr: "err".to_string(),
            exit_code: Some(0),
            duration_ms: 1,
        };
        assert_eq!(output.combined(), "out\nerr");
    }
}
