//! Incremental execution engine for Go
//!
//! Go has no interactive mode, so every turn rebuilds and reruns the whole
//! program:
//! - [`session`]: confirmed statements, the output offset, and program composition
//! - [`feedback`]: the toolchain seam, diagnostic parsing and the auto-fix loop
//! - [`output`]: isolating the output a turn added
//! - [`process`]: bounded, interruptible child processes
//!
//! # Usage
//!
//! ```no_run
//! # async fn demo() -> engine::TurnResult<()> {
//! use engine::{FixConfig, FixLoop, GoToolchain, GoToolchainConfig, Session};
//! use std::sync::Arc;
//!
//! let toolchain = GoToolchain::new(GoToolchainConfig::default(), Arc::default());
//! let fix_loop = FixLoop::new(toolchain, FixConfig::default());
//! let mut session = Session::new("/tmp/ws", "/tmp/ws/main.go", "package main");
//!
//! let report = fix_loop.run_turn(&mut session, "x := 5").await?;
//! assert!(report.output.is_empty());
//! # Ok(())
//! # }
//! ```

#![allow(clippy::uninlined_format_args)]

pub mod feedback;
pub mod output;
pub mod process;
pub mod session;

pub use feedback::{
    AttemptRecord, Diagnostic, DiagnosticKind, DiagnosticParser, FixConfig, FixLoop,
    GoToolchain, GoToolchainConfig, RunClass, RunResult, Toolchain, ToolchainError, TurnReport,
};
pub use process::ProcessLimits;
pub use session::{Composer, FixPlacement, Session, TurnError, TurnResult};
