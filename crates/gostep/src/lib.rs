//! Interactive Go sessions
//!
//! The `gostep` binary wires these pieces around the `engine` crate:
//! - [`config`]: command-line and environment configuration
//! - [`workspace`]: the scratch module or user file a session writes to
//! - [`shell`]: `:command` pass-through
//! - [`repl`]: the prompt loop

pub mod config;
pub mod repl;
pub mod shell;
pub mod workspace;
