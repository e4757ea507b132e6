//! Prompt loop
//!
//! Reads physical lines with rustyline, groups them into logical statements
//! while the formatter reports an unterminated fragment, and hands each
//! statement to the fix loop. Turn failures are printed and the loop goes
//! on; toolchain failures end the session.

use crate::shell::{self, MetaOutcome};
use anyhow::{Context, Result};
use engine::{FixLoop, ProcessLimits, Session, Toolchain};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::Path;

pub const PROMPT: &str = "> ";
pub const CONTINUATION_PROMPT: &str = ". ";

/// What one physical line led to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    /// `.quit` or `.exit`
    Quit,
    /// Blank line at a fresh prompt
    Blank,
    /// The statement is still open; read another line
    AwaitMore,
    /// Committed turn; the output it added (possibly empty)
    Output(String),
    /// Turn discarded; error text for the user
    TurnFailed(String),
    /// A meta-command ran
    Meta(MetaOutcome),
    /// A meta-command could not be parsed; why
    BadMeta(String),
}

pub struct Repl<T: Toolchain> {
    fix_loop: FixLoop<T>,
    session: Session,
    limits: ProcessLimits,
    pending: Vec<String>,
}

impl<T: Toolchain> Repl<T> {
    pub fn new(fix_loop: FixLoop<T>, session: Session, limits: ProcessLimits) -> Self {
        Self {
            fix_loop,
            session,
            limits,
            pending: Vec::new(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn prompt(&self) -> &'static str {
        if self.pending.is_empty() {
            PROMPT
        } else {
            CONTINUATION_PROMPT
        }
    }

    /// Drop a partially entered statement
    pub fn cancel_pending(&mut self) {
        self.pending.clear();
    }

    /// Process one physical line.
    ///
    /// Errors are session-fatal; everything turn-local is a [`LineOutcome`].
    /// `.quit`, `.exit` and `:` lines are never Go input, even mid-statement.
    pub async fn handle_line(&mut self, line: &str) -> Result<LineOutcome> {
        let trimmed = line.trim();

        if trimmed == ".quit" || trimmed == ".exit" {
            return Ok(LineOutcome::Quit);
        }
        if let Some(parsed) = shell::parse_meta_command(trimmed) {
            self.cancel_pending();
            return Ok(self.meta(parsed).await);
        }
        if self.pending.is_empty() && trimmed.is_empty() {
            return Ok(LineOutcome::Blank);
        }

        self.pending.push(trimmed.to_string());
        let input = self.pending.join("\n");

        match self.fix_loop.run_turn(&mut self.session, &input).await {
            Ok(report) => {
                self.pending.clear();
                if let Ok(json) = serde_json::to_string(&report) {
                    tracing::debug!(report = %json, "turn report");
                }
                Ok(LineOutcome::Output(report.output))
            }
            Err(e) if e.is_incomplete() => Ok(LineOutcome::AwaitMore),
            Err(e) if e.is_fatal() => {
                self.pending.clear();
                Err(e).context("session aborted")
            }
            Err(e) => {
                self.pending.clear();
                Ok(LineOutcome::TurnFailed(format!("{:#}", anyhow::Error::new(e))))
            }
        }
    }

    async fn meta(&self, parsed: Result<Vec<String>, shell::ShellError>) -> LineOutcome {
        let argv = match parsed {
            Ok(argv) => argv,
            Err(e) => {
                tracing::debug!("bad meta-command: {e}");
                return LineOutcome::BadMeta(e.to_string());
            }
        };
        match shell::run_meta_command(&argv, self.session.working_dir(), &self.limits).await {
            Ok(outcome) => LineOutcome::Meta(outcome),
            Err(e) => LineOutcome::Meta(MetaOutcome::Failed(e.to_string())),
        }
    }

    /// Read lines until `.quit`, EOF or a fatal error
    pub async fn run(&mut self, history_path: Option<&Path>) -> Result<()> {
        let config = rustyline::Config::builder().auto_add_history(true).build();
        let mut editor =
            DefaultEditor::with_config(config).context("failed to create line editor")?;

        if let Some(path) = history_path {
            if path.exists() {
                if let Err(e) = editor.load_history(path) {
                    tracing::warn!(path = %path.display(), "failed to load history: {e}");
                }
            }
        }

        let result = self.read_loop(&mut editor).await;

        if let Some(path) = history_path {
            if let Some(parent) = path.parent() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    tracing::warn!(
                        dir = %parent.display(),
                        "failed to create history directory: {e}"
                    );
                }
            }
            if let Err(e) = editor.save_history(path) {
                tracing::warn!(path = %path.display(), "failed to save history: {e}");
            }
        }

        result
    }

    async fn read_loop(&mut self, editor: &mut DefaultEditor) -> Result<()> {
        loop {
            match editor.readline(self.prompt()) {
                Ok(line) => match self.handle_line(&line).await? {
                    LineOutcome::Quit => return Ok(()),
                    LineOutcome::Blank | LineOutcome::AwaitMore => {}
                    LineOutcome::Output(text) => {
                        if !text.is_empty() {
                            println!("{}", text);
                        }
                    }
                    LineOutcome::TurnFailed(message) => eprintln!("{}", message),
                    LineOutcome::Meta(MetaOutcome::Succeeded(text)) => {
                        let text = text.trim_end_matches('\n');
                        if !text.is_empty() {
                            println!("{}", text);
                        }
                    }
                    LineOutcome::Meta(MetaOutcome::Failed(message)) => {
                        eprintln!("command failed: {}", message)
                    }
                    LineOutcome::BadMeta(message) => eprintln!("bad command: {}", message),
                },
                Err(ReadlineError::Interrupted) => self.cancel_pending(),
                Err(ReadlineError::Eof) => return Ok(()),
                Err(e) => return Err(e).context("failed to read input"),
            }
        }
    }
}
