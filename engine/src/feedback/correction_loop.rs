//! Auto-fix loop for declared-but-unused bindings
//!
//! Each turn:
//! 1. Composes the full program with the turn's fix buffer
//! 2. Formats it and runs it
//! 3. On compile failure, discards every unused identifier and repeats
//! 4. Commits the original input to the session on success
//!
//! The fix buffer lives only for the turn. Fixes are never folded into
//! session history, so an identifier that stays unused is rediscovered and
//! discarded again on every later turn.

use crate::feedback::error_parser::{Diagnostic, DiagnosticParser, RunClass};
use crate::feedback::toolchain::{RunResult, Toolchain, ToolchainError};
use crate::output;
use crate::session::{discard_statement, Composer, FixPlacement, Session, TurnError, TurnResult};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Configuration for the fix loop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixConfig {
    /// Maximum compile attempts per turn
    pub max_fix_passes: usize,
    /// Where discard statements go relative to the candidate
    pub placement: FixPlacement,
}

impl Default for FixConfig {
    fn default() -> Self {
        Self {
            max_fix_passes: std::env::var("GOSTEP_MAX_FIX_PASSES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(16),
            placement: FixPlacement::default(),
        }
    }
}

/// One compile-and-run attempt within a turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// Attempt number (1-indexed)
    pub attempt: usize,
    /// How the attempt ended
    pub class: RunClass,
    /// Unused identifiers reported by this attempt
    pub found: Vec<String>,
    pub duration_ms: u64,
}

/// Summary of a committed turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnReport {
    /// Output attributable to this turn, without its final newline
    pub output: String,
    /// Compile attempts used
    pub attempts: usize,
    /// Identifiers discarded to make the turn compile
    pub discarded: Vec<String>,
    pub records: Vec<AttemptRecord>,
    pub duration_ms: u64,
}

/// Discard statements accumulated during one turn
#[derive(Debug, Default)]
struct FixBuffer {
    identifiers: Vec<String>,
    statements: Vec<String>,
}

impl FixBuffer {
    /// Add discards for identifiers not seen yet; returns how many were new
    fn absorb(&mut self, found: &[String]) -> usize {
        let mut added = 0;
        for identifier in found {
            if !self.identifiers.contains(identifier) {
                self.statements.push(discard_statement(identifier));
                self.identifiers.push(identifier.clone());
                added += 1;
            }
        }
        added
    }

    fn statements(&self) -> &[String] {
        &self.statements
    }
}

/// Drives compose, format, run and patch for each turn
pub struct FixLoop<T: Toolchain> {
    toolchain: T,
    composer: Composer,
    config: FixConfig,
}

impl<T: Toolchain> FixLoop<T> {
    pub fn new(toolchain: T, config: FixConfig) -> Self {
        Self {
            toolchain,
            composer: Composer::new(config.placement),
            config,
        }
    }

    pub fn toolchain(&self) -> &T {
        &self.toolchain
    }

    /// Execute one turn.
    ///
    /// On success the input is appended to `session` and the offset moves to
    /// the new output's line count. Every error leaves `session` untouched.
    pub async fn run_turn(&self, session: &mut Session, input: &str) -> TurnResult<TurnReport> {
        let started = Instant::now();
        let max_passes = self.config.max_fix_passes.max(1);
        let mut fixes = FixBuffer::default();
        let mut records = Vec::new();
        let mut last_failure: Option<(String, Vec<Diagnostic>)> = None;

        for attempt in 1..=max_passes {
            let pass_started = Instant::now();
            let run = self.attempt(session, input, fixes.statements()).await?;
            let class = DiagnosticParser::classify_run(&run);

            match class {
                RunClass::Success => {
                    records.push(AttemptRecord {
                        attempt,
                        class,
                        found: Vec::new(),
                        duration_ms: elapsed_ms(pass_started),
                    });
                    let visible =
                        output::visible_output(&run.output, session.output_offset()).to_string();
                    session.commit(input.to_string(), output::line_count(&run.output));

                    tracing::info!(
                        turn = session.turns(),
                        attempts = attempt,
                        discarded = fixes.identifiers.len(),
                        offset = session.output_offset(),
                        "turn committed"
                    );

                    return Ok(TurnReport {
                        output: visible,
                        attempts: attempt,
                        discarded: fixes.identifiers,
                        records,
                        duration_ms: elapsed_ms(started),
                    });
                }
                RunClass::RuntimeFailure => {
                    tracing::debug!(attempt, "program exited non-zero");
                    return Err(TurnError::Runtime {
                        output: output::runtime_failure_text(&run.output, session.output_offset()),
                    });
                }
                RunClass::CompileFailure => {
                    let diagnostics = DiagnosticParser::parse(&run.output);
                    let summary = DiagnosticParser::summarize(&diagnostics);
                    let found = DiagnosticParser::discard_targets(&diagnostics);
                    let raw = run.output.strip_suffix('\n').unwrap_or(&run.output).to_string();
                    records.push(AttemptRecord {
                        attempt,
                        class,
                        found: found.clone(),
                        duration_ms: elapsed_ms(pass_started),
                    });

                    if !summary.is_fixable() {
                        return Err(TurnError::Compile {
                            output: raw,
                            diagnostics,
                        });
                    }

                    if fixes.absorb(&found) == 0 {
                        tracing::warn!(?found, "discarding unused identifiers made no progress");
                        let mut identifiers = found;
                        identifiers.dedup();
                        return Err(TurnError::FixStalled {
                            identifiers,
                            output: raw,
                            diagnostics,
                        });
                    }

                    tracing::debug!(
                        attempt,
                        ?found,
                        diagnostics = summary.total,
                        unrecoverable = summary.unrecoverable,
                        pending = fixes.statements().len(),
                        "discarding unused identifiers"
                    );
                    last_failure = Some((raw, diagnostics));
                }
            }
        }

        let (output, diagnostics) = last_failure.unwrap_or_default();
        Err(TurnError::FixLimitExceeded {
            passes: max_passes,
            output,
            diagnostics,
        })
    }

    /// Compose, format, write and run once
    async fn attempt(
        &self,
        session: &Session,
        input: &str,
        fixes: &[String],
    ) -> TurnResult<RunResult> {
        let source = self.composer.compose(session, input, fixes);

        let formatted = match self
            .toolchain
            .organize_imports(&source, session.working_dir())
            .await
        {
            Ok(text) => text,
            Err(ToolchainError::Rejected { message })
                if DiagnosticParser::is_incomplete(&message) =>
            {
                return Err(TurnError::Incomplete)
            }
            Err(err) => return Err(err.into()),
        };

        tokio::fs::write(session.file_path(), formatted.as_bytes()).await?;

        let run = self
            .toolchain
            .compile_and_run(session.file_path(), session.working_dir())
            .await?;
        Ok(run)
    }
}

fn elapsed_ms(since: Instant) -> u64 {
    since.elapsed().as_millis() as u64
}
