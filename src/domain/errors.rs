//! Domain errors. Used by ports and use cases.
//!
//! Adapters map infrastructure errors into these.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Empty identifier, missing or out-of-range selection. Recovered locally.
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Quiz not found: {0}")]
    NotFound(String),

    /// Current time is outside the quiz availability window.
    #[error("Quiz unavailable: {0}")]
    Unavailable(String),

    #[error("User '{user}' has already played quiz {quiz_id}")]
    AlreadyPlayed { quiz_id: String, user: String },

    /// Network failure talking to the scoring service.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Scoring service answered with an error status.
    #[error("Submission rejected: {0}")]
    Rejected(String),

    #[error("Cannot {action} while session is {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },

    #[error("Result cache error: {0}")]
    Cache(String),

    /// The session runner has shut down (handle outlived the task).
    #[error("Session closed")]
    SessionClosed,
}

impl DomainError {
    /// Submit-phase failures that leave the session in `Failed` with a retry affordance.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DomainError::Transport(_) | DomainError::Rejected(_))
    }
}
