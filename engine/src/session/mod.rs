//! Session state, program composition and the per-turn error taxonomy.

pub mod composer;
pub mod error;
pub mod state;

pub use composer::{discard_statement, Composer, FixPlacement};
pub use error::{TurnError, TurnResult};
pub use state::Session;
