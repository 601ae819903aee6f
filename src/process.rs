//! Child-process invocation: launch one converter and observe its outcome.
//!
//! ## Why a trait?
//!
//! The orchestrator's routing and result-mapping logic is the part worth
//! testing, and it must be testable without python or the toolkit installed.
//! [`ProcessInvoker`] is the seam: production code injects [`TokioInvoker`],
//! tests inject a recording stub that returns canned [`ProcessOutcome`]s.
//!
//! ## Why resolve instead of erroring?
//!
//! A converter exiting non-zero is an expected, per-request event; a missing
//! interpreter is a deployment problem. Both still leave the orchestrator
//! with a value to interpret, so `run` never returns `Err` — every failure
//! path lands in a field of [`ProcessOutcome`] and the caller decides what
//! it means.

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

/// The observed outcome of exactly one child process.
///
/// Exactly one of these holds per invocation:
/// * terminated normally — `exit_code` is `Some` (any code), streams captured;
/// * never started, or was killed by a timeout — `exit_code` is `None` and
///   `launch_error` says why.
#[derive(Debug, Clone, Default)]
pub struct ProcessOutcome {
    /// Exit code, when the process terminated on its own. `None` when it was
    /// killed by a signal with no code, failed to launch, or timed out.
    pub exit_code: Option<i32>,
    /// Complete captured standard output.
    pub stdout: String,
    /// Complete captured standard error.
    pub stderr: String,
    /// Why the process never produced an exit status, when it didn't.
    pub launch_error: Option<String>,
}

impl ProcessOutcome {
    /// True when the process ran to completion with exit code 0.
    pub fn succeeded(&self) -> bool {
        self.launch_error.is_none() && self.exit_code == Some(0)
    }

    /// Diagnostic text for a failed run: stderr if non-empty, else stdout,
    /// else a generic exit-code message.
    pub fn diagnostic(&self) -> String {
        if let Some(ref reason) = self.launch_error {
            return reason.clone();
        }
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            return stderr.to_string();
        }
        let stdout = self.stdout.trim();
        if !stdout.is_empty() {
            return stdout.to_string();
        }
        match self.exit_code {
            Some(code) => format!("Process exited with code {code}"),
            None => "Process terminated without an exit code".to_string(),
        }
    }
}

/// Launches an external executable and resolves to its [`ProcessOutcome`].
///
/// Implementations must be `Send + Sync`: multiple conversions may run
/// concurrently, each awaiting its own child process.
///
/// Cancellation is not supported — once `run` has spawned the child, the
/// only way out is process exit (or the invoker's own timeout, if it has
/// one). Dropping the returned future does not abort the child unless the
/// implementation arranged for that.
#[async_trait]
pub trait ProcessInvoker: Send + Sync {
    /// Run `program` with `args` (a discrete list, never a shell-interpreted
    /// string) in `cwd`, buffer both output streams completely, and resolve
    /// once the process terminates or fails to start.
    async fn run(&self, program: &Path, args: &[String], cwd: &Path) -> ProcessOutcome;
}

/// Production invoker backed by [`tokio::process::Command`].
///
/// One child per call; stdout/stderr piped and fully buffered; stdin closed.
/// The awaiting task suspends without blocking the runtime, so concurrent
/// conversions proceed as independent OS processes.
#[derive(Debug, Clone, Default)]
pub struct TokioInvoker {
    /// Optional wall-clock limit. On expiry the child is killed and the
    /// outcome reports the timeout through `launch_error`, since no exit
    /// status exists. `None` leaves the process unbounded (the reference
    /// behavior).
    timeout: Option<Duration>,
}

impl TokioInvoker {
    pub fn new() -> Self {
        Self { timeout: None }
    }

    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl ProcessInvoker for TokioInvoker {
    async fn run(&self, program: &Path, args: &[String], cwd: &Path) -> ProcessOutcome {
        debug!(
            program = %program.display(),
            ?args,
            cwd = %cwd.display(),
            "spawning converter process"
        );

        let mut command = Command::new(program);
        command
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Reap the child if the timeout (or the caller) drops the wait
            // future before the process exits.
            .kill_on_drop(true);

        let wait = command.output();

        let output = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, wait).await {
                Ok(io_result) => io_result,
                Err(_) => {
                    warn!(
                        program = %program.display(),
                        secs = limit.as_secs(),
                        "converter process timed out"
                    );
                    return ProcessOutcome {
                        launch_error: Some(format!(
                            "process timed out after {}s",
                            limit.as_secs()
                        )),
                        ..ProcessOutcome::default()
                    };
                }
            },
            None => wait.await,
        };

        match output {
            Ok(out) => {
                let outcome = ProcessOutcome {
                    exit_code: out.status.code(),
                    stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
                    launch_error: None,
                };
                if !outcome.succeeded() {
                    warn!(
                        program = %program.display(),
                        code = ?outcome.exit_code,
                        "converter process exited non-zero"
                    );
                }
                outcome
            }
            Err(e) => {
                warn!(program = %program.display(), error = %e, "failed to start converter process");
                // Raw system error text; the orchestrator adds program context.
                ProcessOutcome {
                    launch_error: Some(e.to_string()),
                    ..ProcessOutcome::default()
                }
            }
        }
    }
}
