//! HTTP adapter for the remote scoring service. Implements QuizGateway via its REST API.

use crate::adapters::gateway::mapper::{
    self, ErrorDto, LeaderboardDto, PlayerDto, QuizDto, SubmitResponseDto,
};
use crate::domain::{AnswerRecord, DomainError, LeaderboardEntry, Quiz, ScoreResult};
use crate::ports::QuizGateway;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, info, warn};

/// REST client of the scoring service.
///
/// Endpoints (relative to `base_url`):
/// - `GET /api/quizzes/{id}`
/// - `GET /api/quizzes/{id}/players`
/// - `POST /api/quizzes/{id}/submit`
/// - `GET /api/leaderboard?limit=N`
pub struct HttpQuizGateway {
    client: Client,
    base_url: String,
}

impl HttpQuizGateway {
    /// # Arguments
    /// * `base_url` - Service root, e.g. "http://localhost:8000"
    /// * `timeout` - Per-request timeout
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, DomainError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::Transport(format!("build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Turn a non-success response into `Rejected`, preferring the service's `detail`.
    async fn rejection(response: reqwest::Response) -> DomainError {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorDto>(&text)
            .ok()
            .and_then(|e| e.detail)
            .unwrap_or_else(|| text.chars().take(200).collect());
        warn!(status = %status, detail = %detail, "scoring service returned error");
        DomainError::Rejected(format!("{}: {}", status, detail))
    }
}

fn transport(e: reqwest::Error) -> DomainError {
    DomainError::Transport(format!("HTTP request failed: {}", e))
}

#[async_trait::async_trait]
impl QuizGateway for HttpQuizGateway {
    async fn load_quiz(&self, quiz_id: &str) -> Result<Quiz, DomainError> {
        let url = self.url(&format!("/api/quizzes/{}", quiz_id));
        debug!(url = %url, "loading quiz");
        let response = self.client.get(&url).send().await.map_err(transport)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(DomainError::NotFound(quiz_id.to_string()));
        }
        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        let dto: QuizDto = response
            .json()
            .await
            .map_err(|e| DomainError::Transport(format!("Failed to parse quiz: {}", e)))?;
        let quiz = mapper::quiz_to_domain(dto);
        info!(
            quiz_id = %quiz.id,
            questions = quiz.questions.len(),
            duration_secs = quiz.duration_secs,
            "quiz loaded"
        );
        Ok(quiz)
    }

    async fn has_played(&self, quiz_id: &str, user: &str) -> Result<bool, DomainError> {
        let url = self.url(&format!("/api/quizzes/{}/players", quiz_id));
        let response = self.client.get(&url).send().await.map_err(transport)?;
        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }
        let players: Vec<PlayerDto> = response
            .json()
            .await
            .map_err(|e| DomainError::Transport(format!("Failed to parse players: {}", e)))?;
        Ok(players
            .into_iter()
            .map(mapper::player_to_domain)
            .any(|p| p.username == user))
    }

    async fn submit(
        &self,
        quiz_id: &str,
        user: &str,
        answers: &[AnswerRecord],
    ) -> Result<ScoreResult, DomainError> {
        let url = self.url(&format!("/api/quizzes/{}/submit", quiz_id));
        let body = mapper::submit_request(user, answers);
        info!(quiz_id, user, answers = answers.len(), "submitting answers");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(transport)?;
        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        let dto: SubmitResponseDto = response
            .json()
            .await
            .map_err(|e| DomainError::Transport(format!("Failed to parse score: {}", e)))?;
        Ok(mapper::score_to_domain(dto))
    }

    async fn leaderboard(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, DomainError> {
        let url = self.url("/api/leaderboard");
        let response = self
            .client
            .get(&url)
            .query(&[("limit", limit)])
            .send()
            .await
            .map_err(transport)?;
        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }
        let rows: Vec<LeaderboardDto> = response.json().await.map_err(|e| {
            DomainError::Transport(format!("Failed to parse leaderboard: {}", e))
        })?;
        Ok(rows.into_iter().map(mapper::leaderboard_to_domain).collect())
    }
}
