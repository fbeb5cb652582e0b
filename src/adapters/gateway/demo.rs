//! In-memory scoring service for offline play and tests.
//!
//! Serves the bundled sample quiz, scores locally (10 points per correct answer),
//! keeps a player roster and a leaderboard. Latency and failures can be scripted.

use crate::domain::{
    AnswerRecord, DomainError, LeaderboardEntry, POINTS_PER_CORRECT, PlayerEntry, Question, Quiz,
    ScoreResult,
};
use crate::ports::QuizGateway;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::info;

/// Identifier of the bundled sample quiz.
pub const SAMPLE_QUIZ_ID: &str = "sample-quiz";

struct StoredQuiz {
    quiz: Quiz,
    answer_key: Vec<usize>,
    players: Vec<PlayerEntry>,
}

/// Local stand-in for the remote scoring service.
pub struct DemoGateway {
    /// Simulated network delay per call.
    delay: Duration,
    quizzes: RwLock<HashMap<String, StoredQuiz>>,
    totals: RwLock<HashMap<String, u32>>,
    submit_calls: AtomicUsize,
    failing_submits: AtomicUsize,
    failing_loads: AtomicUsize,
    roster_unreachable: AtomicBool,
}

impl DemoGateway {
    /// Empty gateway with default delay (100ms).
    pub fn new() -> Self {
        Self::with_delay(Duration::from_millis(100))
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            quizzes: RwLock::new(HashMap::new()),
            totals: RwLock::new(HashMap::new()),
            submit_calls: AtomicUsize::new(0),
            failing_submits: AtomicUsize::new(0),
            failing_loads: AtomicUsize::new(0),
            roster_unreachable: AtomicBool::new(false),
        }
    }

    /// Register a quiz with its answer key (correct option per question).
    pub fn with_quiz(mut self, quiz: Quiz, answer_key: Vec<usize>) -> Self {
        self.quizzes.get_mut().insert(
            quiz.id.clone(),
            StoredQuiz {
                quiz,
                answer_key,
                players: Vec::new(),
            },
        );
        self
    }

    /// Gateway preloaded with the sample quiz, open from an hour before `now` for a day.
    pub fn with_sample_quiz(self, now: DateTime<Utc>) -> Self {
        let (quiz, key) = sample_quiz(now);
        self.with_quiz(quiz, key)
    }

    /// Make the next `n` submissions fail with a transport error.
    pub fn fail_next_submits(&self, n: usize) {
        self.failing_submits.store(n, Ordering::SeqCst);
    }

    /// Make the next `n` quiz loads fail with a transport error.
    pub fn fail_next_loads(&self, n: usize) {
        self.failing_loads.store(n, Ordering::SeqCst);
    }

    /// Withdraw a quiz. Later loads and submits for it answer `NotFound`.
    pub async fn remove_quiz(&self, quiz_id: &str) {
        self.quizzes.write().await.remove(quiz_id);
    }

    /// Make the player roster unreachable (prior-play checks error out).
    pub fn set_roster_unreachable(&self, unreachable: bool) {
        self.roster_unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Number of `submit` invocations so far, failed ones included.
    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    async fn simulate_latency(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }

    fn take_scripted_failure(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl Default for DemoGateway {
    fn default() -> Self {
        Self::new()
    }
}

/// The bundled football quiz and its answer key.
pub fn sample_quiz(now: DateTime<Utc>) -> (Quiz, Vec<usize>) {
    let q = |id: &str, text: &str, options: [&str; 4]| Question {
        id: id.to_string(),
        text: text.to_string(),
        options: options.iter().map(|o| o.to_string()).collect(),
    };
    let quiz = Quiz {
        id: SAMPLE_QUIZ_ID.to_string(),
        title: "Footy IQ - Today's Quiz".to_string(),
        questions: vec![
            q(
                "q1",
                "Which country won the 2018 FIFA World Cup?",
                ["France", "Croatia", "Brazil", "Germany"],
            ),
            q(
                "q2",
                "Who has won the most Ballon d'Or awards (as of 2021)?",
                ["Cristiano Ronaldo", "Lionel Messi", "Zinedine Zidane", "Pele"],
            ),
            q(
                "q3",
                "Which club is known as The Red Devils?",
                ["Liverpool", "Manchester United", "Arsenal", "Chelsea"],
            ),
        ],
        duration_secs: 90,
        start_date: Some(now - ChronoDuration::hours(1)),
        end_date: Some(now + ChronoDuration::days(1)),
    };
    (quiz, vec![0, 1, 1])
}

fn rank_of(totals: &HashMap<String, u32>, user: &str) -> Option<u32> {
    let mut ranked: Vec<(&String, &u32)> = totals.iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    ranked
        .iter()
        .position(|(name, _)| name.as_str() == user)
        .map(|i| i as u32 + 1)
}

#[async_trait::async_trait]
impl QuizGateway for DemoGateway {
    async fn load_quiz(&self, quiz_id: &str) -> Result<Quiz, DomainError> {
        self.simulate_latency().await;
        if Self::take_scripted_failure(&self.failing_loads) {
            return Err(DomainError::Transport(
                "scoring service unreachable (simulated)".to_string(),
            ));
        }
        let quizzes = self.quizzes.read().await;
        quizzes
            .get(quiz_id)
            .map(|s| s.quiz.clone())
            .ok_or_else(|| DomainError::NotFound(quiz_id.to_string()))
    }

    async fn has_played(&self, quiz_id: &str, user: &str) -> Result<bool, DomainError> {
        self.simulate_latency().await;
        if self.roster_unreachable.load(Ordering::SeqCst) {
            return Err(DomainError::Transport(
                "player roster unreachable (simulated)".to_string(),
            ));
        }
        let quizzes = self.quizzes.read().await;
        Ok(quizzes
            .get(quiz_id)
            .is_some_and(|s| s.players.iter().any(|p| p.username == user)))
    }

    async fn submit(
        &self,
        quiz_id: &str,
        user: &str,
        answers: &[AnswerRecord],
    ) -> Result<ScoreResult, DomainError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;
        if Self::take_scripted_failure(&self.failing_submits) {
            return Err(DomainError::Transport(
                "connection refused (simulated)".to_string(),
            ));
        }

        let mut quizzes = self.quizzes.write().await;
        let stored = quizzes
            .get_mut(quiz_id)
            .ok_or_else(|| DomainError::NotFound(quiz_id.to_string()))?;
        if stored.players.iter().any(|p| p.username == user) {
            return Err(DomainError::Rejected(
                "User has already played this quiz".to_string(),
            ));
        }

        let correct_count = answers
            .iter()
            .filter(|a| {
                stored
                    .quiz
                    .questions
                    .iter()
                    .position(|q| q.id == a.question_id)
                    .and_then(|i| stored.answer_key.get(i))
                    .is_some_and(|&key| key == a.selected_option)
            })
            .count() as u32;
        let points = correct_count * POINTS_PER_CORRECT;
        let total_questions = stored.quiz.questions.len() as u32;
        stored.players.push(PlayerEntry {
            username: user.to_string(),
            points,
            correct_count,
            timestamp: Some(Utc::now()),
        });
        drop(quizzes);

        let mut totals = self.totals.write().await;
        *totals.entry(user.to_string()).or_insert(0) += points;
        let position = rank_of(&totals, user);

        info!(
            quiz_id,
            user,
            answered = answers.len(),
            correct_count,
            points,
            "[DEMO] scored submission"
        );

        Ok(ScoreResult {
            points,
            correct_count,
            total_questions,
            position,
        })
    }

    async fn leaderboard(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, DomainError> {
        self.simulate_latency().await;
        let totals = self.totals.read().await;
        let mut rows: Vec<LeaderboardEntry> = totals
            .iter()
            .map(|(username, &total_score)| LeaderboardEntry {
                username: username.clone(),
                total_score,
            })
            .collect();
        rows.sort_by(|a, b| {
            b.total_score
                .cmp(&a.total_score)
                .then_with(|| a.username.cmp(&b.username))
        });
        rows.truncate(limit);
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer(pos: usize, id: &str, option: usize) -> AnswerRecord {
        AnswerRecord {
            question_position: pos,
            question_id: id.to_string(),
            selected_option: option,
        }
    }

    fn gateway() -> DemoGateway {
        DemoGateway::with_delay(Duration::ZERO).with_sample_quiz(Utc::now())
    }

    #[tokio::test]
    async fn scores_ten_points_per_correct_answer() {
        let gw = gateway();
        let result = gw
            .submit(
                SAMPLE_QUIZ_ID,
                "alice",
                &[answer(0, "q1", 0), answer(1, "q2", 0)],
            )
            .await
            .unwrap();
        assert_eq!(result.correct_count, 1);
        assert_eq!(result.points, 10);
        assert_eq!(result.total_questions, 3);
        assert_eq!(result.position, Some(1));
    }

    #[tokio::test]
    async fn roster_tracks_players_and_rejects_duplicates() {
        let gw = gateway();
        assert!(!gw.has_played(SAMPLE_QUIZ_ID, "alice").await.unwrap());
        gw.submit(SAMPLE_QUIZ_ID, "alice", &[]).await.unwrap();
        assert!(gw.has_played(SAMPLE_QUIZ_ID, "alice").await.unwrap());

        let err = gw.submit(SAMPLE_QUIZ_ID, "alice", &[]).await.unwrap_err();
        assert!(matches!(err, DomainError::Rejected(_)));
    }

    #[tokio::test]
    async fn leaderboard_ranks_by_total_score() {
        let gw = gateway();
        gw.submit(SAMPLE_QUIZ_ID, "low", &[]).await.unwrap();
        let high = gw
            .submit(
                SAMPLE_QUIZ_ID,
                "high",
                &[answer(0, "q1", 0), answer(1, "q2", 1), answer(2, "q3", 1)],
            )
            .await
            .unwrap();
        assert_eq!(high.points, 30);
        assert_eq!(high.position, Some(1));

        let board = gw.leaderboard(10).await.unwrap();
        assert_eq!(board[0].username, "high");
        assert_eq!(board[1].username, "low");
        assert_eq!(gw.leaderboard(1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn scripted_failures_are_consumed_in_order() {
        let gw = gateway();
        gw.fail_next_submits(1);
        assert!(matches!(
            gw.submit(SAMPLE_QUIZ_ID, "alice", &[]).await,
            Err(DomainError::Transport(_))
        ));
        assert!(gw.submit(SAMPLE_QUIZ_ID, "alice", &[]).await.is_ok());
        assert_eq!(gw.submit_calls(), 2);
    }

    #[tokio::test]
    async fn unknown_quiz_is_not_found() {
        let gw = gateway();
        assert!(matches!(
            gw.load_quiz("nope").await,
            Err(DomainError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn scripted_load_failure_then_recovers() {
        let gw = gateway();
        gw.fail_next_loads(1);
        assert!(matches!(
            gw.load_quiz(SAMPLE_QUIZ_ID).await,
            Err(DomainError::Transport(_))
        ));
        assert!(gw.load_quiz(SAMPLE_QUIZ_ID).await.is_ok());
    }

    #[tokio::test]
    async fn withdrawn_quiz_refuses_submission() {
        let gw = gateway();
        gw.remove_quiz(SAMPLE_QUIZ_ID).await;
        assert!(matches!(
            gw.submit(SAMPLE_QUIZ_ID, "alice", &[]).await,
            Err(DomainError::NotFound(_))
        ));
    }
}
