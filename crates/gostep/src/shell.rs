//! `:command` pass-through
//!
//! Lines starting with `:` run an external command in the session's working
//! directory. Words are split with POSIX shell rules but nothing is expanded.

use engine::process::{combined_output, exec_failure, merged_command, run_bounded, ProcessLimits};
use engine::ToolchainError;
use std::path::Path;
use thiserror::Error;

/// Why a `:` line is not a runnable command
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShellError {
    #[error("unbalanced quotes or trailing escape")]
    Unparseable,
    #[error("empty command")]
    Empty,
}

/// Result of a command that could be started
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaOutcome {
    /// Zero exit; merged output
    Succeeded(String),
    /// Non-zero exit; merged output without its trailing newline
    Failed(String),
}

/// Split a `:` line into argv. Returns `None` when `line` is not a meta-command.
pub fn parse_meta_command(line: &str) -> Option<Result<Vec<String>, ShellError>> {
    let rest = line.trim().strip_prefix(':')?;
    Some(match shlex::split(rest) {
        None => Err(ShellError::Unparseable),
        Some(argv) if argv.is_empty() => Err(ShellError::Empty),
        Some(argv) => Ok(argv),
    })
}

/// Run `argv` in `dir` with merged output under `limits`
pub async fn run_meta_command(
    argv: &[String],
    dir: &Path,
    limits: &ProcessLimits,
) -> Result<MetaOutcome, ToolchainError> {
    let Some((program, args)) = argv.split_first() else {
        return Ok(MetaOutcome::Failed(ShellError::Empty.to_string()));
    };

    let mut cmd = merged_command(program, args);
    cmd.current_dir(dir);

    let output = run_bounded(cmd, program, None, limits).await?;
    if let Some(err) = exec_failure(&output, program) {
        return Err(err);
    }

    let text = combined_output(&output);
    tracing::debug!(%program, status = ?output.status.code(), "meta-command finished");
    if output.status.success() {
        Ok(MetaOutcome::Succeeded(text))
    } else {
        Ok(MetaOutcome::Failed(text.trim_end_matches('\n').to_string()))
    }
}
