//! Where a session's program lives
//!
//! Scratch workspaces are a fresh module in a temporary directory that is
//! removed on drop. File workspaces extend an existing file and write its
//! original bytes back on drop, so no turn outlives the session.

use anyhow::{Context, Result};
use engine::{GoToolchain, Session};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Module path used for scratch sessions
pub const SCRATCH_MODULE: &str = "gostep.localhost";

/// Program file name used for scratch sessions
pub const SCRATCH_FILE: &str = "main.go";

/// Preamble of a scratch session
pub const SCRATCH_PREAMBLE: &str = "package main";

/// Writes a file's original bytes back when dropped
#[derive(Debug)]
pub struct RestoreGuard {
    path: PathBuf,
    original: Vec<u8>,
}

impl Drop for RestoreGuard {
    fn drop(&mut self) {
        if let Err(e) = std::fs::write(&self.path, &self.original) {
            tracing::warn!(path = %self.path.display(), "failed to restore file: {e}");
        } else {
            tracing::debug!(path = %self.path.display(), "restored original file");
        }
    }
}

/// Working directory, program file and preamble for one session
#[derive(Debug)]
pub struct Workspace {
    working_dir: PathBuf,
    file_path: PathBuf,
    preamble: String,
    _scratch: Option<TempDir>,
    _restore: Option<RestoreGuard>,
}

impl Workspace {
    /// Fresh module in a temporary directory
    pub async fn scratch(toolchain: &GoToolchain) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("gostep")
            .tempdir()
            .context("failed to create temporary directory")?;

        toolchain
            .init_module(dir.path(), SCRATCH_MODULE)
            .await
            .context("failed to run \"go mod init\"")?;

        tracing::debug!(dir = %dir.path().display(), "scratch workspace ready");
        Ok(Self {
            working_dir: dir.path().to_path_buf(),
            file_path: dir.path().join(SCRATCH_FILE),
            preamble: SCRATCH_PREAMBLE.to_string(),
            _scratch: Some(dir),
            _restore: None,
        })
    }

    /// Extend an existing file; its content becomes the preamble
    pub fn from_file(path: &Path) -> Result<Self> {
        let original =
            std::fs::read(path).with_context(|| format!("bad file {}", path.display()))?;
        let preamble = String::from_utf8(original.clone())
            .with_context(|| format!("bad file {}", path.display()))?;

        Ok(Self {
            working_dir: parent_dir(path),
            file_path: path.to_path_buf(),
            preamble,
            _scratch: None,
            _restore: Some(RestoreGuard {
                path: path.to_path_buf(),
                original,
            }),
        })
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// A new, empty session over this workspace
    pub fn session(&self) -> Session {
        Session::new(&self.working_dir, &self.file_path, self.preamble.as_str())
    }
}

/// Directory `go run` is started in for a user file
fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
