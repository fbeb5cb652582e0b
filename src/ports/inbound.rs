//! Inbound port. UI (adapter) calls into the application.

use crate::domain::DomainError;

/// Input port: UI/CLI drives one quiz attempt.
#[async_trait::async_trait]
pub trait InputPort: Send + Sync {
    /// Load the quiz, ask for an identifier, run the timed session and show the result.
    async fn run(&self, quiz_id: &str) -> Result<(), DomainError>;
}
