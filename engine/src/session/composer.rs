//! Program composition
//!
//! Turns session state plus a candidate statement into full Go source. Pure
//! string assembly; nothing is parsed.

use crate::session::state::Session;
use serde::{Deserialize, Serialize};

/// Opens the entry point that wraps every statement
pub const ENTRY_OPEN: &str = "\nfunc main() {\n";

/// Closes the entry point
pub const ENTRY_CLOSE: &str = "}";

/// Statement that marks `identifier` as used without changing behavior
pub fn discard_statement(identifier: &str) -> String {
    format!("_ = {}", identifier)
}

/// Where synthesized discard statements go relative to the candidate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixPlacement {
    /// Confirmed, fixes, candidate
    BeforeCandidate,
    /// Confirmed, candidate, fixes. Go needs this order for identifiers the
    /// candidate itself declares.
    #[default]
    AfterCandidate,
}

impl std::str::FromStr for FixPlacement {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "before" | "before_candidate" => Ok(Self::BeforeCandidate),
            "after" | "after_candidate" => Ok(Self::AfterCandidate),
            other => Err(format!(
                "unknown fix placement `{}` (expected `before` or `after`)",
                other
            )),
        }
    }
}

impl std::fmt::Display for FixPlacement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BeforeCandidate => write!(f, "before"),
            Self::AfterCandidate => write!(f, "after"),
        }
    }
}

/// Assembles full source text
#[derive(Debug, Clone, Copy, Default)]
pub struct Composer {
    placement: FixPlacement,
}

impl Composer {
    pub fn new(placement: FixPlacement) -> Self {
        Self { placement }
    }

    /// Preamble, entry-point opening, confirmed statements, then the
    /// candidate and pending fixes in the configured order, then the closing.
    pub fn compose(&self, session: &Session, candidate: &str, fixes: &[String]) -> String {
        let mut source = String::with_capacity(
            session.preamble().len()
                + candidate.len()
                + session.statements().iter().map(|s| s.len() + 1).sum::<usize>()
                + 64,
        );

        source.push_str(session.preamble());
        source.push_str(ENTRY_OPEN);
        for statement in session.statements() {
            push_statement(&mut source, statement);
        }

        match self.placement {
            FixPlacement::BeforeCandidate => {
                for fix in fixes {
                    push_statement(&mut source, fix);
                }
                push_statement(&mut source, candidate);
            }
            FixPlacement::AfterCandidate => {
                push_statement(&mut source, candidate);
                for fix in fixes {
                    push_statement(&mut source, fix);
                }
            }
        }

        source.push_str(ENTRY_CLOSE);
        source
    }
}

fn push_statement(source: &mut String, statement: &str) {
    source.push_str(statement);
    if !statement.ends_with('\n') {
        source.push('\n');
    }
}
