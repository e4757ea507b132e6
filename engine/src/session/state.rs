//! Durable session state
//!
//! Holds the immutable preamble, the append-only history of confirmed
//! statements and the output line offset. Only the fix loop mutates it, and
//! only after a turn succeeds.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Accumulated state of one interactive session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Directory the toolchain runs in
    working_dir: PathBuf,
    /// File the composed program is written to
    file_path: PathBuf,
    /// Program text that existed before the session began
    preamble: String,
    /// Original text of every successful turn, in order
    statements: Vec<String>,
    /// Line count of the last successful run's full output
    output_offset: usize,
}

impl Session {
    /// Create a session with empty history
    pub fn new(
        working_dir: impl Into<PathBuf>,
        file_path: impl Into<PathBuf>,
        preamble: impl Into<String>,
    ) -> Self {
        Self {
            working_dir: working_dir.into(),
            file_path: file_path.into(),
            preamble: preamble.into(),
            statements: Vec::new(),
            output_offset: 0,
        }
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn preamble(&self) -> &str {
        &self.preamble
    }

    /// Confirmed statements in insertion order
    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    /// Number of successful turns so far
    pub fn turns(&self) -> usize {
        self.statements.len()
    }

    /// Lines of output already shown to the user
    pub fn output_offset(&self) -> usize {
        self.output_offset
    }

    /// Record a successful turn.
    ///
    /// The statement and the offset change together; there is no other
    /// mutation path.
    pub(crate) fn commit(&mut self, statement: String, output_lines: usize) {
        if output_lines < self.output_offset {
            tracing::warn!(
                previous = self.output_offset,
                current = output_lines,
                "program output shrank between turns"
            );
        }
        self.statements.push(statement);
        self.output_offset = output_lines;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_empty() {
        let session = Session::new("/tmp/ws", "/tmp/ws/main.go", "package main");
        assert_eq!(session.preamble(), "package main");
        assert!(session.statements().is_empty());
        assert_eq!(session.output_offset(), 0);
        assert_eq!(session.turns(), 0);
        assert_eq!(session.file_path(), Path::new("/tmp/ws/main.go"));
    }

    #[test]
    fn test_commit_appends_and_moves_offset() {
        let mut session = Session::new("/tmp/ws", "/tmp/ws/main.go", "package main");
        session.commit("x := 5".to_string(), 0);
        session.commit("fmt.Println(x)".to_string(), 1);

        assert_eq!(session.statements(), ["x := 5", "fmt.Println(x)"]);
        assert_eq!(session.output_offset(), 1);
        assert_eq!(session.turns(), 2);
    }
}
