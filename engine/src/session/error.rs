//! Per-turn error taxonomy

use crate::feedback::error_parser::Diagnostic;
use crate::feedback::toolchain::ToolchainError;
use thiserror::Error;

/// Ways a turn can end without committing
#[derive(Debug, Error)]
pub enum TurnError {
    /// The input is an unterminated fragment; read another line and retry
    #[error("incomplete input")]
    Incomplete,

    /// Compilation failed with nothing the fix loop can repair
    #[error("{output}")]
    Compile {
        output: String,
        diagnostics: Vec<Diagnostic>,
    },

    /// The program compiled but exited non-zero
    #[error("{output}")]
    Runtime { output: String },

    /// The formatter rejected the composed source
    #[error("{message}")]
    Format { message: String },

    /// Recoverable diagnostics kept appearing past the pass limit
    #[error("gave up after {passes} fix passes\n{output}")]
    FixLimitExceeded {
        passes: usize,
        output: String,
        diagnostics: Vec<Diagnostic>,
    },

    /// Discarding the reported identifiers changed nothing
    #[error("unused identifiers could not be discarded: {}\n{output}", .identifiers.join(", "))]
    FixStalled {
        identifiers: Vec<String>,
        output: String,
        diagnostics: Vec<Diagnostic>,
    },

    #[error("`{program}` timed out after {seconds}s")]
    Timeout { program: String, seconds: u64 },

    #[error("interrupted")]
    Interrupted { program: String },

    /// The toolchain could not be invoked at all
    #[error(transparent)]
    Toolchain(ToolchainError),

    /// The program file could not be written
    #[error("failed to write program file")]
    Io(#[from] std::io::Error),
}

impl TurnError {
    /// Whether the session must end rather than just this turn
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Toolchain(_))
    }

    pub fn is_incomplete(&self) -> bool {
        matches!(self, Self::Incomplete)
    }

    /// Parsed diagnostics attached to compile-side failures
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            Self::Compile { diagnostics, .. }
            | Self::FixLimitExceeded { diagnostics, .. }
            | Self::FixStalled { diagnostics, .. } => diagnostics,
            _ => &[],
        }
    }
}

impl From<ToolchainError> for TurnError {
    fn from(err: ToolchainError) -> Self {
        match err {
            ToolchainError::Timeout { program, seconds } => Self::Timeout { program, seconds },
            ToolchainError::Interrupted { program } => Self::Interrupted { program },
            ToolchainError::Rejected { message } => Self::Format { message },
            spawn @ ToolchainError::Spawn { .. } => Self::Toolchain(spawn),
        }
    }
}

/// Result alias for turn execution
pub type TurnResult<T> = Result<T, TurnError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        let spawn = ToolchainError::Spawn {
            program: "go".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert!(TurnError::from(spawn).is_fatal());

        let io = TurnError::from(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "read-only",
        ));
        assert!(!io.is_fatal());

        let timeout = TurnError::from(ToolchainError::Timeout {
            program: "go".to_string(),
            seconds: 1,
        });
        assert!(!timeout.is_fatal());
        assert!(matches!(timeout, TurnError::Timeout { seconds: 1, .. }));

        assert!(!TurnError::Incomplete.is_fatal());
        assert!(TurnError::Incomplete.is_incomplete());
    }

    #[test]
    fn test_write_failure_names_cause_once() {
        let err = TurnError::from(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "no such directory",
        ));
        assert_eq!(err.to_string(), "failed to write program file");
        let source = std::error::Error::source(&err).map(|e| e.to_string());
        assert_eq!(source.as_deref(), Some("no such directory"));
    }

    #[test]
    fn test_rejected_becomes_format_error() {
        let err = TurnError::from(ToolchainError::Rejected {
            message: "<standard input>:4:3: expected operand".to_string(),
        });
        assert_eq!(err.to_string(), "<standard input>:4:3: expected operand");
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_compile_error_displays_raw_output() {
        let output = "# command-line-arguments\n./main.go:4:15: undefined: y".to_string();
        let err = TurnError::Compile {
            output: output.clone(),
            diagnostics: crate::feedback::error_parser::DiagnosticParser::parse(&output),
        };
        assert_eq!(err.to_string(), output);
        assert_eq!(err.diagnostics().len(), 1);
    }
}
