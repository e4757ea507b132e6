//! Go toolchain diagnostic parsing and classification
//!
//! Scrapes `go run` / `goimports` text output line by line. The text shapes
//! matched here are owned by the Go toolchain; they are kept as constants so
//! a format change surfaces in one place.

use crate::feedback::toolchain::RunResult;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Message prefix of the one diagnostic the fix loop can repair.
pub const UNUSED_MARKER: &str = "declared and not used: ";

/// Prefix `go run` puts on its last line when the program exited non-zero.
pub const EXIT_STATUS_MARKER: &str = "exit status ";

/// Substring the formatter emits for a fragment that is still open.
pub const INCOMPLETE_MARKER: &str = "found 'EOF'";

/// `<relative-file>:<line>:<column>: <message>`
static DIAGNOSTIC_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\./[^\s:]+):(\d+):(\d+):\s*(.+)$").unwrap());

/// Whether a diagnostic can be repaired mechanically
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum DiagnosticKind {
    /// Declared-but-unused binding; fixed by discarding `identifier`
    Recoverable { identifier: String },
    /// Anything else
    Unrecoverable,
}

impl DiagnosticKind {
    /// Classify a diagnostic message
    pub fn from_message(message: &str) -> Self {
        match message.strip_prefix(UNUSED_MARKER) {
            Some(rest) if !rest.trim().is_empty() => Self::Recoverable {
                identifier: rest.trim().to_string(),
            },
            _ => Self::Unrecoverable,
        }
    }

    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable { .. })
    }
}

impl std::fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Recoverable { identifier } => write!(f, "recoverable({})", identifier),
            Self::Unrecoverable => write!(f, "unrecoverable"),
        }
    }
}

/// One structured compiler diagnostic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Relative file marker, e.g. `./main.go`
    pub file_marker: String,
    /// Line number (1-indexed)
    pub line: u32,
    /// Column number (1-indexed)
    pub column: u32,
    /// Message text after the location
    pub message: String,
    /// Classification of `message`
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    /// Parse a single line of toolchain output.
    ///
    /// Returns `None` for lines that don't have the diagnostic shape (package
    /// headers, notes, program output).
    pub fn parse_line(line: &str) -> Option<Self> {
        let caps = DIAGNOSTIC_LINE.captures(line.trim_end_matches('\r'))?;
        let line_no = caps[2].parse().ok()?;
        let column = caps[3].parse().ok()?;
        let message = caps[4].to_string();
        let kind = DiagnosticKind::from_message(&message);

        Some(Self {
            file_marker: caps[1].to_string(),
            line: line_no,
            column,
            message,
            kind,
        })
    }

    /// Identifier to discard, if this diagnostic is recoverable
    pub fn discard_target(&self) -> Option<&str> {
        match &self.kind {
            DiagnosticKind::Recoverable { identifier } => Some(identifier),
            DiagnosticKind::Unrecoverable => None,
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}: {}",
            self.file_marker, self.line, self.column, self.message
        )
    }
}

/// Outcome class of one compile-and-run attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunClass {
    /// Zero-exit execution
    Success,
    /// The program never ran; output holds diagnostics
    CompileFailure,
    /// The program compiled but exited non-zero
    RuntimeFailure,
}

impl std::fmt::Display for RunClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::CompileFailure => write!(f, "compile_failure"),
            Self::RuntimeFailure => write!(f, "runtime_failure"),
        }
    }
}

/// Parser for Go toolchain output
pub struct DiagnosticParser;

impl DiagnosticParser {
    /// Parse every diagnostic-shaped line of `text`, in order
    pub fn parse(text: &str) -> Vec<Diagnostic> {
        text.lines().filter_map(Diagnostic::parse_line).collect()
    }

    /// Identifiers named by recoverable diagnostics, in order of appearance
    pub fn discard_targets(diagnostics: &[Diagnostic]) -> Vec<String> {
        diagnostics
            .iter()
            .filter_map(Diagnostic::discard_target)
            .map(String::from)
            .collect()
    }

    /// Whether formatter output marks the source as an unterminated fragment
    pub fn is_incomplete(text: &str) -> bool {
        text.contains(INCOMPLETE_MARKER)
    }

    /// Classify a run result as success, compile failure or runtime failure
    pub fn classify_run(result: &RunResult) -> RunClass {
        if result.success {
            RunClass::Success
        } else if result.last_non_empty_line.starts_with(EXIT_STATUS_MARKER) {
            RunClass::RuntimeFailure
        } else {
            RunClass::CompileFailure
        }
    }

    /// Count diagnostics by kind
    pub fn summarize(diagnostics: &[Diagnostic]) -> DiagnosticSummary {
        let recoverable = diagnostics
            .iter()
            .filter(|d| d.kind.is_recoverable())
            .count();

        DiagnosticSummary {
            total: diagnostics.len(),
            recoverable,
            unrecoverable: diagnostics.len() - recoverable,
        }
    }
}

/// Summary of parsed diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticSummary {
    pub total: usize,
    pub recoverable: usize,
    pub unrecoverable: usize,
}

impl DiagnosticSummary {
    /// True when another fix pass can make progress
    pub fn is_fixable(&self) -> bool {
        self.recoverable > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMPILE_OUTPUT: &str = "# command-line-arguments\n\
        ./main.go:4:1: declared and not used: x\n\
        ./main.go:5:1: declared and not used: y\n\
        ./main.go:6:9: cannot use \"a\" (untyped string constant) as int value in assignment\n";

    #[test]
    fn test_parse_diagnostic_line() {
        let diag = Diagnostic::parse_line("./main.go:12:3: declared and not used: total").unwrap();
        assert_eq!(diag.file_marker, "./main.go");
        assert_eq!(diag.line, 12);
        assert_eq!(diag.column, 3);
        assert_eq!(diag.message, "declared and not used: total");
        assert_eq!(diag.discard_target(), Some("total"));
    }

    #[test]
    fn test_non_diagnostic_lines_ignored() {
        assert!(Diagnostic::parse_line("# command-line-arguments").is_none());
        assert!(Diagnostic::parse_line("main.go:1:1: missing dot-slash marker").is_none());
        assert!(Diagnostic::parse_line("./main.go:x:1: bad line").is_none());
        assert!(Diagnostic::parse_line("hello world").is_none());
    }

    #[test]
    fn test_parse_compile_output() {
        let diags = DiagnosticParser::parse(COMPILE_OUTPUT);
        assert_eq!(diags.len(), 3);
        assert_eq!(
            DiagnosticParser::discard_targets(&diags),
            vec!["x".to_string(), "y".to_string()]
        );
        assert_eq!(diags[2].kind, DiagnosticKind::Unrecoverable);

        let summary = DiagnosticParser::summarize(&diags);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.recoverable, 2);
        assert_eq!(summary.unrecoverable, 1);
        assert!(summary.is_fixable());
    }

    #[test]
    fn test_marker_must_prefix_message() {
        let diag = Diagnostic::parse_line("./main.go:3:2: x declared and not used: y").unwrap();
        assert_eq!(diag.kind, DiagnosticKind::Unrecoverable);

        let empty = Diagnostic::parse_line("./main.go:3:2: declared and not used: ").unwrap();
        assert_eq!(empty.kind, DiagnosticKind::Unrecoverable);
    }

    #[test]
    fn test_incomplete_detection() {
        assert!(DiagnosticParser::is_incomplete(
            "<standard input>:4:12: expected '}', found 'EOF'"
        ));
        assert!(!DiagnosticParser::is_incomplete(
            "<standard input>:4:12: expected ';', found x"
        ));
    }

    #[test]
    fn test_classify_run() {
        let ok = RunResult::new("5\n", true);
        assert_eq!(DiagnosticParser::classify_run(&ok), RunClass::Success);

        let runtime = RunResult::new("5\npanic: boom\n\nexit status 2\n\n", false);
        assert_eq!(
            DiagnosticParser::classify_run(&runtime),
            RunClass::RuntimeFailure
        );

        let compile = RunResult::new(COMPILE_OUTPUT, false);
        assert_eq!(
            DiagnosticParser::classify_run(&compile),
            RunClass::CompileFailure
        );
    }
}
