//! Bounded child-process execution
//!
//! Every external invocation runs in its own process group under a timeout
//! and an interrupt signal. On either, the whole group is killed so that
//! grandchildren (the binary `go run` builds and launches) die with it.

use crate::feedback::toolchain::ToolchainError;
use std::process::{Output, Stdio};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::Notify;

/// Shell prelude that merges stderr into stdout and then execs the argv
/// that follows, so output keeps its emission order.
const MERGE_STREAMS: &str = "exec \"$@\" 2>&1";

/// Limits applied to one child process
#[derive(Debug, Clone)]
pub struct ProcessLimits {
    /// Wall-clock budget for the whole invocation
    pub timeout: Duration,
    /// Fired by the interrupt handler; wakes any running invocation
    pub interrupt: Arc<Notify>,
}

impl ProcessLimits {
    pub fn new(timeout: Duration, interrupt: Arc<Notify>) -> Self {
        Self { timeout, interrupt }
    }

    /// Same interrupt source, different timeout
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        Self {
            timeout,
            interrupt: self.interrupt.clone(),
        }
    }
}

/// Build a command that runs `program args..` with stderr merged into stdout.
///
/// Arguments travel as positional parameters, never through shell parsing.
pub fn merged_command<I, S>(program: &str, args: I) -> Command
where
    I: IntoIterator<Item = S>,
    S: AsRef<std::ffi::OsStr>,
{
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(MERGE_STREAMS).arg("sh").arg(program).args(args);
    cmd
}

/// Run `cmd` to completion, optionally feeding `stdin`, within `limits`.
///
/// `label` names the invocation in errors (the user-facing program, not `sh`).
pub async fn run_bounded(
    mut cmd: Command,
    label: &str,
    stdin: Option<&str>,
    limits: &ProcessLimits,
) -> Result<Output, ToolchainError> {
    cmd.kill_on_drop(true)
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    #[cfg(unix)]
    cmd.process_group(0);

    // Register for the interrupt before the child exists so a Ctrl-C that
    // lands between spawn and the first poll is not lost.
    let interrupted = limits.interrupt.notified();
    tokio::pin!(interrupted);

    let mut child = cmd.spawn().map_err(|source| ToolchainError::Spawn {
        program: label.to_string(),
        source,
    })?;
    let pid = child.id();

    let input = stdin.map(|text| text.as_bytes().to_vec());
    let pipe = child.stdin.take();
    let feed = async move {
        if let (Some(mut pipe), Some(bytes)) = (pipe, input) {
            if let Err(e) = pipe.write_all(&bytes).await {
                tracing::debug!("child closed stdin early: {e}");
            }
            // dropping `pipe` closes the child's stdin
        }
    };
    let run = async move {
        let ((), output) = tokio::join!(feed, child.wait_with_output());
        output
    };

    tokio::select! {
        result = tokio::time::timeout(limits.timeout, run) => match result {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(source)) => Err(ToolchainError::Spawn {
                program: label.to_string(),
                source,
            }),
            Err(_) => {
                kill_group(pid);
                Err(ToolchainError::Timeout {
                    program: label.to_string(),
                    seconds: limits.timeout.as_secs(),
                })
            }
        },
        _ = &mut interrupted => {
            kill_group(pid);
            Err(ToolchainError::Interrupted {
                program: label.to_string(),
            })
        }
    }
}

/// Detect a failed `exec` inside [`merged_command`].
///
/// `sh` exits 127 when the program is missing and 126 when it isn't
/// executable; `go run` itself never uses those codes.
pub fn exec_failure(output: &Output, label: &str) -> Option<ToolchainError> {
    let kind = match output.status.code() {
        Some(127) => std::io::ErrorKind::NotFound,
        Some(126) => std::io::ErrorKind::PermissionDenied,
        _ => return None,
    };
    Some(ToolchainError::Spawn {
        program: label.to_string(),
        source: std::io::Error::new(kind, combined_output(output).trim().to_string()),
    })
}

/// Concatenate captured stdout and stderr as lossy UTF-8
pub fn combined_output(output: &Output) -> String {
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    text
}

#[cfg(unix)]
fn kill_group(pid: Option<u32>) {
    if let Some(pid) = pid {
        // SAFETY: killpg only sends a signal; a group that already exited
        // yields ESRCH, which is ignored.
        unsafe {
            libc::killpg(pid as libc::pid_t, libc::SIGKILL);
        }
    }
}

#[cfg(not(unix))]
fn kill_group(_pid: Option<u32>) {}
