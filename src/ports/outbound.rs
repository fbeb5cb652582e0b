//! Outbound ports. Application calls into infrastructure.
//!
//! Implemented by adapters.

use crate::domain::{AnswerRecord, CachedResult, DomainError, LeaderboardEntry, Quiz, ScoreResult};

/// Scoring service. Owns quiz content, the player roster, scoring and the leaderboard.
#[async_trait::async_trait]
pub trait QuizGateway: Send + Sync {
    /// Fetch a quiz without its answer key. `DomainError::NotFound` when it does not exist.
    async fn load_quiz(&self, quiz_id: &str) -> Result<Quiz, DomainError>;

    /// Whether `user` is already on the quiz's player roster.
    ///
    /// Callers decide the failure policy; the session service fails open.
    async fn has_played(&self, quiz_id: &str, user: &str) -> Result<bool, DomainError>;

    /// Submit the answered positions. The service must itself reject a second
    /// submission for the same (quiz, user).
    async fn submit(
        &self,
        quiz_id: &str,
        user: &str,
        answers: &[AnswerRecord],
    ) -> Result<ScoreResult, DomainError>;

    /// Top `limit` users by total score.
    async fn leaderboard(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, DomainError>;
}

/// Last-result cache. Not authoritative; entries may vanish at any time.
#[async_trait::async_trait]
pub trait ResultCachePort: Send + Sync {
    async fn get(&self, quiz_id: &str, user: &str) -> Result<Option<CachedResult>, DomainError>;

    async fn put(&self, entry: CachedResult) -> Result<(), DomainError>;
}
