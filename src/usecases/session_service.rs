//! Session use case: load a quiz, gate the start, submit the frozen ledger.
//!
//! - Wraps the synchronous `QuizSession` machine with the gateway calls it needs
//! - Prior-play check fails open: an unreachable roster counts as "not played"
//! - Exactly one gateway submit per call; failures leave the session `Failed`
//! - Successful results are cached per (quiz, user) for redisplay

use crate::domain::{
    CachedResult, Clock, DomainError, LeaderboardEntry, QuizSession, ScoreResult, SessionState,
};
use crate::ports::{QuizGateway, ResultCachePort};
use std::sync::Arc;
use tracing::{info, warn};

pub struct QuizSessionService {
    gateway: Arc<dyn QuizGateway>,
    cache: Arc<dyn ResultCachePort>,
    clock: Clock,
}

impl QuizSessionService {
    pub fn new(
        gateway: Arc<dyn QuizGateway>,
        cache: Arc<dyn ResultCachePort>,
        clock: Clock,
    ) -> Self {
        Self {
            gateway,
            cache,
            clock,
        }
    }

    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// Fetch the quiz and evaluate its availability window.
    pub async fn load(&self, quiz_id: &str) -> Result<QuizSession, DomainError> {
        let quiz = self.gateway.load_quiz(quiz_id).await?;
        let mut session = QuizSession::new(quiz)?;
        let state = session.check_availability(self.clock.now());
        if *state == SessionState::Expired {
            info!(quiz_id, "quiz is outside its availability window");
        }
        Ok(session)
    }

    /// Roster lookup with the fail-open policy: errors count as "not played".
    /// The gateway still rejects duplicate submissions authoritatively.
    pub async fn has_played(&self, quiz_id: &str, user: &str) -> bool {
        match self.gateway.has_played(quiz_id, user).await {
            Ok(played) => played,
            Err(e) => {
                warn!(quiz_id, user, error = %e, "prior-play check failed, allowing play");
                false
            }
        }
    }

    /// `NotStarted -> Answering` after validating the identifier and checking the roster.
    pub async fn begin(&self, session: &mut QuizSession, user: &str) -> Result<(), DomainError> {
        let user = QuizSession::normalize_user(user)?;
        if *session.check_availability(self.clock.now()) != SessionState::NotStarted {
            return session.begin(&user, self.clock.now(), false);
        }
        let quiz_id = session.quiz().id.clone();
        let played = self.has_played(&quiz_id, &user).await;
        session.begin(&user, self.clock.now(), played)?;
        info!(
            quiz_id = %quiz_id,
            user = %user,
            questions = session.quiz().questions.len(),
            duration_secs = session.remaining_secs(),
            "session started"
        );
        Ok(())
    }

    /// Send the pending submission once. `Submitting -> Completed | Failed`.
    pub async fn submit(&self, session: &mut QuizSession) -> Result<ScoreResult, DomainError> {
        let answers = match session.pending_submission() {
            Some(list) => list.to_vec(),
            None => {
                return Err(DomainError::InvalidTransition {
                    action: "submit",
                    state: session.state().name(),
                });
            }
        };
        let quiz_id = session.quiz().id.clone();
        let user = session.user().unwrap_or_default().to_string();

        match self.gateway.submit(&quiz_id, &user, &answers).await {
            Ok(result) => {
                session.complete(result.clone())?;
                info!(
                    quiz_id = %quiz_id,
                    user = %user,
                    points = result.points,
                    correct = result.correct_count,
                    position = ?result.position,
                    "submission accepted"
                );
                let entry = CachedResult {
                    quiz_id: quiz_id.clone(),
                    user: user.clone(),
                    result: result.clone(),
                    cached_at: self.clock.now(),
                };
                if let Err(e) = self.cache.put(entry).await {
                    warn!(quiz_id = %quiz_id, user = %user, error = %e, "could not cache result");
                }
                Ok(result)
            }
            Err(e) => {
                warn!(quiz_id = %quiz_id, user = %user, error = %e, "submission failed");
                session.fail(e.to_string(), e.is_retryable())?;
                Err(e)
            }
        }
    }

    /// `Failed -> Submitting -> ...` with the unchanged answer list. No re-answering.
    pub async fn retry(&self, session: &mut QuizSession) -> Result<ScoreResult, DomainError> {
        session.retry()?;
        info!(quiz_id = %session.quiz().id, "retrying submission");
        self.submit(session).await
    }

    /// Last cached result for redisplay. Cache failures degrade to `None`.
    pub async fn cached_result(&self, quiz_id: &str, user: &str) -> Option<CachedResult> {
        match self.cache.get(quiz_id, user).await {
            Ok(found) => found,
            Err(e) => {
                warn!(quiz_id, user, error = %e, "result cache read failed");
                None
            }
        }
    }

    pub async fn leaderboard(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, DomainError> {
        self.gateway.leaderboard(limit).await
    }
}
