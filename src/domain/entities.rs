//! Domain entities. Pure data structures for the core business.
//!
//! No HTTP/IO types here. Wire DTOs are mapped in adapters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Points awarded per correct answer by the scoring service.
pub const POINTS_PER_CORRECT: u32 = 10;

/// A quiz as served by the content service. Read-only to the session core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    pub id: String,
    pub title: String,
    pub questions: Vec<Question>,
    pub duration_secs: u64,
    /// `None` means no lower bound on availability.
    pub start_date: Option<DateTime<Utc>>,
    /// `None` means no upper bound on availability.
    pub end_date: Option<DateTime<Utc>>,
}

impl Quiz {
    /// True when `now` lies inside `[start_date, end_date]`.
    pub fn is_available_at(&self, now: DateTime<Utc>) -> bool {
        let started = self.start_date.is_none_or(|start| now >= start);
        let not_ended = self.end_date.is_none_or(|end| now <= end);
        started && not_ended
    }

    /// Maximum points reachable, shown before the quiz starts.
    pub fn total_points(&self) -> u32 {
        self.questions.len() as u32 * POINTS_PER_CORRECT
    }
}

/// A single multiple-choice question. The correct option never reaches the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub text: String,
    pub options: Vec<String>,
}

/// One answered position, as frozen into the submission list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question_position: usize,
    pub question_id: String,
    pub selected_option: usize,
}

/// Score payload returned by the gateway on a successful submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub points: u32,
    pub correct_count: u32,
    pub total_questions: u32,
    /// Leaderboard position; `None` when the user is outside the ranked window.
    pub position: Option<u32>,
}

/// Last known result for a (quiz, user) pair, kept only for redisplay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedResult {
    pub quiz_id: String,
    pub user: String,
    pub result: ScoreResult,
    pub cached_at: DateTime<Utc>,
}

/// Entry of the per-quiz player roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerEntry {
    pub username: String,
    pub points: u32,
    pub correct_count: u32,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Global leaderboard row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub username: String,
    pub total_score: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn quiz(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Quiz {
        Quiz {
            id: "q".into(),
            title: "t".into(),
            questions: vec![Question {
                id: "q1".into(),
                text: "?".into(),
                options: vec!["a".into(), "b".into()],
            }],
            duration_secs: 90,
            start_date: start,
            end_date: end,
        }
    }

    #[test]
    fn availability_window_is_inclusive() {
        let start = Utc.with_ymd_and_hms(2025, 11, 20, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 11, 27, 0, 0, 0).unwrap();
        let q = quiz(Some(start), Some(end));
        assert!(q.is_available_at(start));
        assert!(q.is_available_at(end));
        assert!(!q.is_available_at(start - chrono::Duration::seconds(1)));
        assert!(!q.is_available_at(end + chrono::Duration::seconds(1)));
    }

    #[test]
    fn missing_bounds_are_open_ended() {
        let now = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        assert!(quiz(None, None).is_available_at(now));
        assert!(!quiz(None, Some(now - chrono::Duration::days(1))).is_available_at(now));
    }

    #[test]
    fn total_points_is_ten_per_question() {
        assert_eq!(quiz(None, None).total_points(), 10);
    }
}
