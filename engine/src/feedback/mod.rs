//! Compile Feedback Module
//!
//! Provides the loop that makes each turn compile:
//! - Format the composed program and run it with the Go toolchain
//! - Classify the result (success, compile failure, runtime failure)
//! - Discard declared-but-unused identifiers and retry
//!
//! # Architecture
//!
//! ```text
//! Session → Composer → Toolchain → DiagnosticParser → FixLoop → commit
//!              ↑                                         |
//!              └──────────────── discard fixes ──────────┘
//! ```

pub mod correction_loop;
pub mod error_parser;
pub mod toolchain;

pub use correction_loop::{AttemptRecord, FixConfig, FixLoop, TurnReport};
pub use error_parser::{Diagnostic, DiagnosticKind, DiagnosticParser, DiagnosticSummary, RunClass};
pub use toolchain::{GoToolchain, GoToolchainConfig, RunResult, Toolchain, ToolchainError};
