//! Wire DTOs of the scoring REST API and their mapping to domain entities.
//!
//! The API speaks camelCase JSON. Timestamps arrive either as RFC 3339 or as
//! naive ISO strings, which are read as UTC.

use crate::domain::{AnswerRecord, LeaderboardEntry, PlayerEntry, Question, Quiz, ScoreResult};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Duration used when the service omits `durationSeconds`.
pub const DEFAULT_DURATION_SECS: u64 = 90;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizDto {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub questions: Vec<QuestionDto>,
    #[serde(default)]
    pub duration_seconds: Option<u64>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct QuestionDto {
    pub id: String,
    pub text: String,
    pub options: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerDto {
    pub username: String,
    #[serde(default)]
    pub points: u32,
    #[serde(default)]
    pub correct_count: u32,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAnswerDto<'a> {
    pub question_id: &'a str,
    pub selected_index: usize,
}

#[derive(Debug, Serialize)]
pub struct SubmitRequestDto<'a> {
    pub username: &'a str,
    pub answers: Vec<SubmitAnswerDto<'a>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponseDto {
    pub points: u32,
    pub correct_count: u32,
    pub total_questions: u32,
    #[serde(default)]
    pub position: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardDto {
    pub username: String,
    #[serde(default)]
    pub total_score: u32,
}

/// FastAPI-style error body: `{"detail": "..."}`.
#[derive(Debug, Deserialize)]
pub struct ErrorDto {
    pub detail: Option<String>,
}

/// Parse an RFC 3339 or naive ISO timestamp. Unparseable input yields `None`.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    match NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        Ok(naive) => Some(naive.and_utc()),
        Err(e) => {
            warn!(value = raw, error = %e, "ignoring unparseable timestamp");
            None
        }
    }
}

pub fn quiz_to_domain(dto: QuizDto) -> Quiz {
    Quiz {
        title: dto.title.unwrap_or_else(|| dto.id.clone()),
        id: dto.id,
        questions: dto
            .questions
            .into_iter()
            .map(|q| Question {
                id: q.id,
                text: q.text,
                options: q.options,
            })
            .collect(),
        duration_secs: dto.duration_seconds.unwrap_or(DEFAULT_DURATION_SECS),
        start_date: dto.start_date.as_deref().and_then(parse_timestamp),
        end_date: dto.end_date.as_deref().and_then(parse_timestamp),
    }
}

pub fn player_to_domain(dto: PlayerDto) -> PlayerEntry {
    PlayerEntry {
        timestamp: dto.timestamp.as_deref().and_then(parse_timestamp),
        username: dto.username,
        points: dto.points,
        correct_count: dto.correct_count,
    }
}

pub fn submit_request<'a>(user: &'a str, answers: &'a [AnswerRecord]) -> SubmitRequestDto<'a> {
    SubmitRequestDto {
        username: user,
        answers: answers
            .iter()
            .map(|a| SubmitAnswerDto {
                question_id: &a.question_id,
                selected_index: a.selected_option,
            })
            .collect(),
    }
}

pub fn score_to_domain(dto: SubmitResponseDto) -> ScoreResult {
    ScoreResult {
        points: dto.points,
        correct_count: dto.correct_count,
        total_questions: dto.total_questions,
        position: dto.position,
    }
}

pub fn leaderboard_to_domain(dto: LeaderboardDto) -> LeaderboardEntry {
    LeaderboardEntry {
        username: dto.username,
        total_score: dto.total_score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_rfc3339_and_naive_timestamps() {
        let expected = Utc.with_ymd_and_hms(2025, 11, 20, 0, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2025-11-20T00:00:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2025-11-20T02:00:00+02:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-11-20T00:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-11-20T00:00:00.000"), Some(expected));
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("next tuesday"), None);
    }

    #[test]
    fn quiz_defaults_duration_and_open_window() {
        let dto: QuizDto = serde_json::from_str(
            r#"{"id":"abc","title":"T","questions":[{"id":"q1","text":"?","options":["a","b"]}],
                "startDate":null,"endDate":"2025-11-27T00:00:00Z"}"#,
        )
        .unwrap();
        let quiz = quiz_to_domain(dto);
        assert_eq!(quiz.duration_secs, DEFAULT_DURATION_SECS);
        assert_eq!(quiz.start_date, None);
        assert!(quiz.end_date.is_some());
        assert_eq!(quiz.questions[0].options.len(), 2);
    }

    #[test]
    fn submit_body_uses_question_ids() {
        let answers = vec![AnswerRecord {
            question_position: 1,
            question_id: "q2".into(),
            selected_option: 3,
        }];
        let body = serde_json::to_value(submit_request("alice", &answers)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "username": "alice",
                "answers": [{"questionId": "q2", "selectedIndex": 3}]
            })
        );
    }

    #[test]
    fn submit_response_allows_missing_position() {
        let dto: SubmitResponseDto = serde_json::from_str(
            r#"{"username":"a","points":20,"correctCount":2,"totalQuestions":3,"position":null}"#,
        )
        .unwrap();
        let score = score_to_domain(dto);
        assert_eq!(score.points, 20);
        assert_eq!(score.position, None);
    }
}
