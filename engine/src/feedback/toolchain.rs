//! Go toolchain adapter
//!
//! Wraps `goimports` and `go run` behind the [`Toolchain`] trait so the fix
//! loop can be driven by synthetic diagnostics in tests.

use crate::process::{combined_output, exec_failure, merged_command, run_bounded, ProcessLimits};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tokio::sync::Notify;

/// Failures of the toolchain itself, as opposed to failures of user code
#[derive(Debug, Error)]
pub enum ToolchainError {
    /// The tool could not be started or its output could not be collected
    #[error("failed to run `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The tool exceeded its time budget and was killed
    #[error("`{program}` timed out after {seconds}s")]
    Timeout { program: String, seconds: u64 },

    /// The tool was killed by a user interrupt
    #[error("`{program}` interrupted")]
    Interrupted { program: String },

    /// The tool ran and rejected its input
    #[error("{message}")]
    Rejected { message: String },
}

/// Result of one compile-and-run attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    /// Merged stdout/stderr of the toolchain and the program
    pub output: String,
    /// Whether the program compiled and exited zero
    pub success: bool,
    /// Last line of `output` that isn't blank
    pub last_non_empty_line: String,
}

impl RunResult {
    pub fn new(output: impl Into<String>, success: bool) -> Self {
        let output = output.into();
        let last_non_empty_line = output
            .lines()
            .rev()
            .find(|line| !line.trim().is_empty())
            .unwrap_or_default()
            .to_string();

        Self {
            output,
            success,
            last_non_empty_line,
        }
    }
}

/// The two toolchain operations the fix loop depends on
#[async_trait]
pub trait Toolchain: Send + Sync {
    /// Add/remove imports and format `source`.
    ///
    /// A formatter rejection is reported as [`ToolchainError::Rejected`]
    /// carrying the formatter's own diagnostic text.
    async fn organize_imports(
        &self,
        source: &str,
        working_dir: &Path,
    ) -> Result<String, ToolchainError>;

    /// Compile `file_path` and, if that succeeds, execute it.
    async fn compile_and_run(
        &self,
        file_path: &Path,
        working_dir: &Path,
    ) -> Result<RunResult, ToolchainError>;
}

/// Go toolchain configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoToolchainConfig {
    /// `go` binary
    pub go_bin: PathBuf,
    /// `goimports` binary
    pub goimports_bin: PathBuf,
    /// Budget for one `go run` (compile plus execution)
    pub run_timeout_secs: u64,
    /// Budget for one `goimports` pass
    pub format_timeout_secs: u64,
}

impl Default for GoToolchainConfig {
    fn default() -> Self {
        Self {
            go_bin: std::env::var("GOSTEP_GO")
                .unwrap_or_else(|_| "go".into())
                .into(),
            goimports_bin: std::env::var("GOSTEP_GOIMPORTS")
                .unwrap_or_else(|_| "goimports".into())
                .into(),
            run_timeout_secs: std::env::var("GOSTEP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
            format_timeout_secs: 30,
        }
    }
}

/// `goimports` + `go run` adapter
pub struct GoToolchain {
    config: GoToolchainConfig,
    interrupt: Arc<Notify>,
}

impl GoToolchain {
    pub fn new(config: GoToolchainConfig, interrupt: Arc<Notify>) -> Self {
        Self { config, interrupt }
    }

    /// Limits for auxiliary commands (module init, meta-commands)
    pub fn limits(&self) -> ProcessLimits {
        ProcessLimits::new(
            Duration::from_secs(self.config.run_timeout_secs),
            self.interrupt.clone(),
        )
    }

    /// Run `go mod init <module>` in `dir`
    pub async fn init_module(&self, dir: &Path, module: &str) -> Result<(), ToolchainError> {
        let go = self.go_program();
        let mut cmd = merged_command(&go, ["mod", "init", module]);
        cmd.current_dir(dir);

        let output = run_bounded(cmd, &go, None, &self.limits()).await?;
        if let Some(err) = exec_failure(&output, &go) {
            return Err(err);
        }
        if output.status.success() {
            Ok(())
        } else {
            Err(ToolchainError::Rejected {
                message: combined_output(&output).trim().to_string(),
            })
        }
    }

    fn go_program(&self) -> String {
        self.config.go_bin.to_string_lossy().into_owned()
    }
}

#[async_trait]
impl Toolchain for GoToolchain {
    async fn organize_imports(
        &self,
        source: &str,
        working_dir: &Path,
    ) -> Result<String, ToolchainError> {
        let program = self.config.goimports_bin.to_string_lossy().into_owned();
        let mut cmd = Command::new(&self.config.goimports_bin);
        cmd.arg("-srcdir").arg(working_dir).current_dir(working_dir);

        let limits = self
            .limits()
            .with_timeout(Duration::from_secs(self.config.format_timeout_secs));
        let output = run_bounded(cmd, &program, Some(source), &limits).await?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            Err(ToolchainError::Rejected {
                message: String::from_utf8_lossy(&output.stderr)
                    .trim_end()
                    .to_string(),
            })
        }
    }

    async fn compile_and_run(
        &self,
        file_path: &Path,
        working_dir: &Path,
    ) -> Result<RunResult, ToolchainError> {
        let go = self.go_program();
        let target = file_path.strip_prefix(working_dir).unwrap_or(file_path);
        let mut cmd = merged_command(&go, [Path::new("run"), target]);
        cmd.current_dir(working_dir);

        let output = run_bounded(cmd, &go, None, &self.limits()).await?;
        if let Some(err) = exec_failure(&output, &go) {
            return Err(err);
        }
        let result = RunResult::new(combined_output(&output), output.status.success());

        tracing::debug!(
            file = %file_path.display(),
            success = result.success,
            "go run finished"
        );
        Ok(result)
    }
}
