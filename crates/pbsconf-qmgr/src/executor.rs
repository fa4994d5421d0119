//! Command execution.
//!
//! The differ only produces command strings; a [`CommandExecutor`] runs them
//! in order and stops at the first failure. Commands that already ran are not
//! rolled back, so a failed batch may leave PBS partially updated.

use std::process::Stdio;
use std::sync::Mutex;

use async_trait::async_trait;
use rustc_hash::FxHashMap;
use tokio::process::Command as Process;

use crate::command::{self, Command};
use crate::config::ExecutorConfig;
use crate::error::{QmgrError, QmgrResult};
use crate::kind::ObjectKind;

/// Output of one successfully executed command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Runs command batches.
///
/// # Contract
///
/// - Commands run sequentially in the given order.
/// - The first failing command stops the batch with
///   [`QmgrError::CommandFailed`], carrying its index, its text and the
///   stderr collected up to and including the failure. A command that
///   cannot be started fails the same way; one that runs past the timeout
///   fails with [`QmgrError::Timeout`] carrying the same context.
/// - On success one output is returned per command.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Run a batch of commands.
    async fn run(&self, commands: &[Command]) -> QmgrResult<Vec<CommandOutput>>;
}

/// stderr fragments qmgr prints when a listing is empty rather than broken.
const EMPTY_LISTING_MARKERS: [&str; 2] = ["Server has no node list", "No Active Nodes"];

/// Whether a failed `list` command only means that no objects exist yet.
///
/// qmgr reports no structured status, so this matches message text. Keep all
/// such matching here.
pub fn is_empty_listing_error(stderr: &str) -> bool {
    EMPTY_LISTING_MARKERS
        .iter()
        .any(|marker| stderr.contains(marker))
}

/// Append one command's stderr to what a batch has collected so far.
fn collect_stderr(collected: &mut String, stderr: &str) {
    let stderr = stderr.trim_end();
    if stderr.is_empty() {
        return;
    }
    if !collected.is_empty() {
        collected.push('\n');
    }
    collected.push_str(stderr);
}

/// Executes commands as local processes.
///
/// Each command runs as `<shell> -c <command>`, or `<wrapper...> <command>`
/// when a wrapper such as `ssh pbs-head` is configured.
#[derive(Debug, Clone)]
pub struct ShellExecutor {
    config: ExecutorConfig,
}

impl ShellExecutor {
    /// Create a new shell executor.
    pub fn new(config: ExecutorConfig) -> Self {
        Self { config }
    }

    /// The executor configuration.
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    fn process(&self, command: &Command) -> Process {
        let mut process = match self.config.wrapper.split_first() {
            Some((program, args)) => {
                let mut process = Process::new(program);
                process.args(args);
                process
            }
            None => {
                let mut process = Process::new(&self.config.shell);
                process.arg("-c");
                process
            }
        };
        process
            .arg(command.as_str())
            .kill_on_drop(true)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        process
    }
}

#[async_trait]
impl CommandExecutor for ShellExecutor {
    async fn run(&self, commands: &[Command]) -> QmgrResult<Vec<CommandOutput>> {
        let mut outputs = Vec::with_capacity(commands.len());
        let mut collected = String::new();
        let timeout = self.config.timeout();

        for (index, command) in commands.iter().enumerate() {
            tracing::debug!(index, command = command.as_str(), "running command");

            let output = match tokio::time::timeout(timeout, self.process(command).output()).await
            {
                Ok(Ok(output)) => output,
                Ok(Err(e)) => {
                    collect_stderr(&mut collected, &format!("failed to start: {e}"));
                    return Err(QmgrError::CommandFailed {
                        index,
                        command: command.to_string(),
                        stderr: collected,
                    });
                }
                Err(_) => {
                    return Err(QmgrError::Timeout {
                        index,
                        command: command.to_string(),
                        stderr: collected,
                        seconds: timeout.as_secs(),
                    });
                }
            };

            let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            collect_stderr(&mut collected, &stderr);

            if !output.status.success() {
                return Err(QmgrError::CommandFailed {
                    index,
                    command: command.to_string(),
                    stderr: collected,
                });
            }

            outputs.push(CommandOutput { stdout, stderr });
        }

        Ok(outputs)
    }
}

/// In-memory executor for tests and dry runs.
///
/// Every command is recorded. `list` commands answer with the listing text
/// registered for their kind (empty by default); other commands succeed with
/// no output unless a failure was injected.
#[derive(Debug, Default)]
pub struct MockExecutor {
    state: Mutex<MockState>,
}

#[derive(Debug, Default)]
struct MockState {
    listings: FxHashMap<ObjectKind, String>,
    executed: Vec<Command>,
    failure: Option<(String, String)>,
}

impl MockExecutor {
    /// Create an executor with no listings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `text` for `list <kind>` commands.
    pub fn with_listing(self, kind: ObjectKind, text: impl Into<String>) -> Self {
        self.set_listing(kind, text);
        self
    }

    /// Replace the listing served for a kind.
    pub fn set_listing(&self, kind: ObjectKind, text: impl Into<String>) {
        self.lock().listings.insert(kind, text.into());
    }

    /// Fail every command whose text contains `pattern` with the given stderr.
    pub fn fail_when(&self, pattern: impl Into<String>, stderr: impl Into<String>) {
        self.lock().failure = Some((pattern.into(), stderr.into()));
    }

    /// Stop injecting failures.
    pub fn clear_failure(&self) {
        self.lock().failure = None;
    }

    /// All commands run so far, including failed ones.
    pub fn executed(&self) -> Vec<Command> {
        self.lock().executed.clone()
    }

    /// Executed commands that are not `list` commands.
    pub fn mutations(&self) -> Vec<String> {
        self.lock()
            .executed
            .iter()
            .filter(|c| command::listed_kind(c).is_none())
            .map(ToString::to_string)
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl CommandExecutor for MockExecutor {
    async fn run(&self, commands: &[Command]) -> QmgrResult<Vec<CommandOutput>> {
        let mut state = self.lock();
        let mut outputs = Vec::with_capacity(commands.len());
        let mut collected = String::new();

        for (index, command) in commands.iter().enumerate() {
            state.executed.push(command.clone());

            if let Some((pattern, stderr)) = &state.failure {
                if command.as_str().contains(pattern.as_str()) {
                    collect_stderr(&mut collected, stderr);
                    return Err(QmgrError::CommandFailed {
                        index,
                        command: command.to_string(),
                        stderr: collected,
                    });
                }
            }

            let stdout = command::listed_kind(command)
                .and_then(|kind| state.listings.get(&kind).cloned())
                .unwrap_or_default();
            outputs.push(CommandOutput {
                stdout,
                stderr: String::new(),
            });
        }

        Ok(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandBuilder;

    #[test]
    fn test_empty_listing_classification() {
        assert!(is_empty_listing_error(
            "qmgr obj= svr=default: Server has no node list\n"
        ));
        assert!(is_empty_listing_error("No Active Nodes, nothing done."));
        assert!(!is_empty_listing_error("qmgr: Unauthorized Request"));
        assert!(!is_empty_listing_error(""));
    }

    #[test]
    fn test_collect_stderr() {
        let mut collected = String::new();
        collect_stderr(&mut collected, "");
        collect_stderr(&mut collected, "first\n");
        collect_stderr(&mut collected, "second");
        assert_eq!(collected, "first\nsecond");
    }

    #[tokio::test]
    async fn test_mock_serves_listing() {
        let builder = CommandBuilder::default();
        let mock = MockExecutor::new().with_listing(ObjectKind::Queue, "Queue workq\n");

        let outputs = mock
            .run(&[builder.list(ObjectKind::Queue), builder.list(ObjectKind::Node)])
            .await
            .unwrap();
        assert_eq!(outputs[0].stdout, "Queue workq\n");
        assert_eq!(outputs[1].stdout, "");
        assert_eq!(mock.executed().len(), 2);
        assert!(mock.mutations().is_empty());
    }

    #[tokio::test]
    async fn test_mock_fails_fast() {
        let builder = CommandBuilder::new("qmgr");
        let mock = MockExecutor::new();
        mock.fail_when("priority=x", "qmgr: Illegal attribute or resource value");

        let batch = vec![
            builder.set(ObjectKind::Queue, "q", "priority", "1"),
            builder.set(ObjectKind::Queue, "q", "priority", "x"),
            builder.set(ObjectKind::Queue, "q", "enabled", "true"),
        ];
        let err = mock.run(&batch).await.unwrap_err();
        match err {
            QmgrError::CommandFailed {
                index,
                command,
                stderr,
            } => {
                assert_eq!(index, 1);
                assert_eq!(command, "qmgr -c 'set queue q priority=x'");
                assert_eq!(stderr, "qmgr: Illegal attribute or resource value");
            }
            other => panic!("unexpected error: {other}"),
        }
        // The third command never ran.
        assert_eq!(mock.executed().len(), 2);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_shell_executor_runs_in_order() {
        let executor = ShellExecutor::new(ExecutorConfig::default());
        let outputs = executor
            .run(&[Command::new("echo one"), Command::new("echo two >&2")])
            .await
            .unwrap();
        assert_eq!(outputs[0].stdout.trim(), "one");
        assert_eq!(outputs[1].stderr.trim(), "two");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_shell_executor_stops_at_failure() {
        let executor = ShellExecutor::new(ExecutorConfig::default());
        let err = executor
            .run(&[
                Command::new("echo warn >&2"),
                Command::new("echo boom >&2; exit 3"),
                Command::new("echo never"),
            ])
            .await
            .unwrap_err();
        match err {
            QmgrError::CommandFailed { index, stderr, .. } => {
                assert_eq!(index, 1);
                assert_eq!(stderr, "warn\nboom");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_shell_executor_timeout() {
        let config = ExecutorConfig {
            timeout_seconds: 1,
            ..ExecutorConfig::default()
        };
        let executor = ShellExecutor::new(config);
        let err = executor
            .run(&[Command::new("echo warn >&2"), Command::new("sleep 5")])
            .await
            .unwrap_err();
        match err {
            QmgrError::Timeout {
                index,
                command,
                stderr,
                seconds,
            } => {
                assert_eq!(index, 1);
                assert_eq!(command, "sleep 5");
                assert_eq!(stderr, "warn");
                assert_eq!(seconds, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_shell_executor_start_failure_keeps_context() {
        let config = ExecutorConfig {
            wrapper: vec!["/nonexistent/ssh".to_string(), "pbs-head".to_string()],
            ..ExecutorConfig::default()
        };
        let executor = ShellExecutor::new(config);
        let err = executor
            .run(&[Command::new("qmgr -c 'list server'")])
            .await
            .unwrap_err();
        match err {
            QmgrError::CommandFailed {
                index,
                command,
                stderr,
            } => {
                assert_eq!(index, 0);
                assert_eq!(command, "qmgr -c 'list server'");
                assert!(stderr.starts_with("failed to start:"), "{stderr}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
