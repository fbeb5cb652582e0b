//! Core domain layer. No external I/O dependencies.
//!
//! Entities, the answer ledger, the countdown timer and the session state
//! machine live here. Dependencies flow inward.

pub mod clock;
pub mod countdown;
pub mod entities;
pub mod errors;
pub mod ledger;
pub mod session;
pub mod timer;

pub use clock::Clock;
pub use countdown::{Remaining, remaining_until};
pub use entities::{
    AnswerRecord, CachedResult, LeaderboardEntry, POINTS_PER_CORRECT, PlayerEntry, Question, Quiz,
    ScoreResult,
};
pub use errors::DomainError;
pub use ledger::AnswerLedger;
pub use session::{AnswerOutcome, FinalizeReason, QuizSession, SessionState};
pub use timer::SessionTimer;
