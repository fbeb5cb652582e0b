//! Quiz session state machine.
//!
//! `NotStarted -> Expired | Answering`, `Answering -> Submitting`,
//! `Submitting -> Completed | Failed`, `Failed -> Submitting` (retry).
//!
//! Synchronous and deterministic: the caller supplies the current time, the
//! prior-play verdict and timer ticks. Async collaborators live in `usecases`.

use crate::domain::timer::ExpiryHook;
use crate::domain::{
    AnswerLedger, AnswerRecord, DomainError, Question, Quiz, ScoreResult, SessionTimer,
};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    NotStarted,
    /// Outside the availability window. Terminal.
    Expired,
    Answering,
    /// Ledger frozen, one gateway call pending.
    Submitting,
    Completed(ScoreResult),
    /// Submission failed; a retryable failure re-enters `Submitting` with the same list.
    Failed(String),
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::NotStarted => "not started",
            SessionState::Expired => "expired",
            SessionState::Answering => "answering",
            SessionState::Submitting => "submitting",
            SessionState::Completed(_) => "completed",
            SessionState::Failed(_) => "failed",
        }
    }

    /// No further transitions without outside action (retry counts as outside action).
    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            SessionState::Expired | SessionState::Completed(_) | SessionState::Failed(_)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalizeReason {
    AllAnswered,
    TimeUp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// Moved on to the question at `pointer`.
    Advanced { pointer: usize },
    /// Last question answered; the frozen submission list.
    Finalized(Vec<AnswerRecord>),
}

/// One user's single attempt at one quiz.
#[derive(Debug)]
pub struct QuizSession {
    quiz: Quiz,
    user: Option<String>,
    pointer: usize,
    state: SessionState,
    ledger: AnswerLedger,
    timer: SessionTimer,
    submission: Option<Vec<AnswerRecord>>,
    finalize_reason: Option<FinalizeReason>,
    retryable: bool,
}

impl QuizSession {
    /// Fresh session in `NotStarted`. Rejects quizzes without questions.
    pub fn new(quiz: Quiz) -> Result<Self, DomainError> {
        if quiz.questions.is_empty() {
            return Err(DomainError::Validation(format!(
                "quiz {} has no questions",
                quiz.id
            )));
        }
        let timer = SessionTimer::new(quiz.duration_secs);
        Ok(Self {
            quiz,
            user: None,
            pointer: 0,
            state: SessionState::NotStarted,
            ledger: AnswerLedger::new(),
            timer,
            submission: None,
            finalize_reason: None,
            retryable: false,
        })
    }

    /// Trim and reject empty identifiers.
    pub fn normalize_user(raw: &str) -> Result<String, DomainError> {
        let user = raw.trim();
        if user.is_empty() {
            return Err(DomainError::Validation(
                "please enter your username".to_string(),
            ));
        }
        Ok(user.to_string())
    }

    /// `NotStarted -> Expired` when `now` is outside the availability window.
    pub fn check_availability(&mut self, now: DateTime<Utc>) -> &SessionState {
        if self.state == SessionState::NotStarted && !self.quiz.is_available_at(now) {
            self.state = SessionState::Expired;
        }
        &self.state
    }

    /// `NotStarted -> Answering`. On any failed precondition the session does not
    /// enter `Answering` and the reason is returned.
    pub fn begin(
        &mut self,
        user: &str,
        now: DateTime<Utc>,
        already_played: bool,
    ) -> Result<(), DomainError> {
        let user = Self::normalize_user(user)?;
        match self.check_availability(now) {
            SessionState::NotStarted => {}
            SessionState::Expired => {
                return Err(DomainError::Unavailable(format!(
                    "quiz {} is outside its availability window",
                    self.quiz.id
                )));
            }
            other => {
                return Err(DomainError::InvalidTransition {
                    action: "begin",
                    state: other.name(),
                });
            }
        }
        if already_played {
            return Err(DomainError::AlreadyPlayed {
                quiz_id: self.quiz.id.clone(),
                user,
            });
        }

        self.user = Some(user);
        self.pointer = 0;
        self.timer.reset(self.quiz.duration_secs);
        self.timer.start();
        self.state = SessionState::Answering;
        Ok(())
    }

    /// Record `option` for the current question, then advance or finalize.
    pub fn answer(&mut self, option: usize) -> Result<AnswerOutcome, DomainError> {
        if self.state != SessionState::Answering {
            return Err(DomainError::InvalidTransition {
                action: "answer",
                state: self.state.name(),
            });
        }
        let option_count = self
            .current_question()
            .map(|q| q.options.len())
            .unwrap_or(0);
        if option >= option_count {
            return Err(DomainError::Validation(format!(
                "option {} does not exist (question has {} options)",
                option, option_count
            )));
        }

        self.ledger.record(self.pointer, option, self.pointer)?;

        if self.pointer + 1 < self.quiz.questions.len() {
            self.pointer += 1;
            return Ok(AnswerOutcome::Advanced {
                pointer: self.pointer,
            });
        }
        self.pointer = self.quiz.questions.len();
        match self.finalize(FinalizeReason::AllAnswered) {
            Some(list) => Ok(AnswerOutcome::Finalized(list)),
            None => Err(DomainError::InvalidTransition {
                action: "finalize",
                state: self.state.name(),
            }),
        }
    }

    /// Feed one timer tick. Returns the submission list on the tick that expires the session.
    pub fn tick(&mut self) -> Option<Vec<AnswerRecord>> {
        if self.state != SessionState::Answering {
            return None;
        }
        if self.timer.tick() {
            return self.finalize(FinalizeReason::TimeUp);
        }
        None
    }

    /// Timer expiry event: finalize with whatever the ledger holds.
    pub fn expire(&mut self) -> Option<Vec<AnswerRecord>> {
        self.finalize(FinalizeReason::TimeUp)
    }

    /// The single `Answering -> Submitting` edge. Later triggers get `None`.
    fn finalize(&mut self, reason: FinalizeReason) -> Option<Vec<AnswerRecord>> {
        if self.state != SessionState::Answering {
            return None;
        }
        self.timer.stop();
        self.state = SessionState::Submitting;
        self.finalize_reason = Some(reason);
        let list = self.ledger.submission_list(&self.quiz.questions);
        self.submission = Some(list.clone());
        Some(list)
    }

    /// Frozen list awaiting the gateway; only while `Submitting`.
    pub fn pending_submission(&self) -> Option<&[AnswerRecord]> {
        match self.state {
            SessionState::Submitting => self.submission.as_deref(),
            _ => None,
        }
    }

    /// `Submitting -> Completed`.
    pub fn complete(&mut self, result: ScoreResult) -> Result<(), DomainError> {
        if self.state != SessionState::Submitting {
            return Err(DomainError::InvalidTransition {
                action: "complete",
                state: self.state.name(),
            });
        }
        self.state = SessionState::Completed(result);
        Ok(())
    }

    /// `Submitting -> Failed`. Only a `retryable` failure may be resubmitted.
    pub fn fail(&mut self, reason: impl Into<String>, retryable: bool) -> Result<(), DomainError> {
        if self.state != SessionState::Submitting {
            return Err(DomainError::InvalidTransition {
                action: "fail",
                state: self.state.name(),
            });
        }
        self.state = SessionState::Failed(reason.into());
        self.retryable = retryable;
        Ok(())
    }

    /// `Failed -> Submitting` with the unchanged submission list.
    pub fn retry(&mut self) -> Result<Vec<AnswerRecord>, DomainError> {
        if !self.can_retry() {
            return Err(DomainError::InvalidTransition {
                action: "retry",
                state: self.state.name(),
            });
        }
        let list = self.submission.clone().unwrap_or_default();
        self.state = SessionState::Submitting;
        self.retryable = false;
        Ok(list)
    }

    /// `Failed` with a failure the gateway may accept on a second attempt.
    pub fn can_retry(&self) -> bool {
        matches!(self.state, SessionState::Failed(_)) && self.retryable
    }

    /// Stop the countdown on teardown.
    pub fn abandon(&mut self) {
        self.timer.stop();
    }

    pub fn set_expiry_hook(&mut self, hook: ExpiryHook) {
        self.timer.set_on_expire(hook);
    }

    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn pointer(&self) -> usize {
        self.pointer
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn ledger(&self) -> &AnswerLedger {
        &self.ledger
    }

    pub fn remaining_secs(&self) -> u64 {
        self.timer.remaining_secs()
    }

    pub fn is_timer_running(&self) -> bool {
        self.timer.is_running()
    }

    pub fn finalize_reason(&self) -> Option<FinalizeReason> {
        self.finalize_reason
    }

    pub fn result(&self) -> Option<&ScoreResult> {
        match &self.state {
            SessionState::Completed(r) => Some(r),
            _ => None,
        }
    }

    /// Question at the pointer; `None` once every question has been answered.
    pub fn current_question(&self) -> Option<&Question> {
        self.quiz.questions.get(self.pointer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 11, 21, 12, 0, 0).unwrap()
    }

    fn quiz(questions: usize, duration_secs: u64) -> Quiz {
        Quiz {
            id: "sample-quiz".into(),
            title: "Footy IQ".into(),
            questions: (0..questions)
                .map(|i| Question {
                    id: format!("q{}", i + 1),
                    text: format!("Question {}", i + 1),
                    options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
                })
                .collect(),
            duration_secs,
            start_date: Some(now() - Duration::hours(1)),
            end_date: Some(now() + Duration::days(1)),
        }
    }

    fn started(questions: usize, duration_secs: u64) -> QuizSession {
        let mut s = QuizSession::new(quiz(questions, duration_secs)).unwrap();
        s.begin("alice", now(), false).unwrap();
        s
    }

    fn ticks(s: &mut QuizSession, n: usize) -> Option<Vec<AnswerRecord>> {
        let mut out = None;
        for _ in 0..n {
            if let Some(list) = s.tick() {
                out = Some(list);
            }
        }
        out
    }

    #[test]
    fn rejects_quiz_without_questions() {
        assert!(matches!(
            QuizSession::new(quiz(0, 90)),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn begin_starts_timer_at_quiz_duration() {
        let s = started(3, 90);
        assert_eq!(s.state(), &SessionState::Answering);
        assert_eq!(s.pointer(), 0);
        assert_eq!(s.remaining_secs(), 90);
        assert!(s.is_timer_running());
        assert_eq!(s.user(), Some("alice"));
    }

    #[test]
    fn begin_refuses_empty_identifier() {
        let mut s = QuizSession::new(quiz(3, 90)).unwrap();
        assert!(matches!(
            s.begin("   ", now(), false),
            Err(DomainError::Validation(_))
        ));
        assert_eq!(s.state(), &SessionState::NotStarted);
    }

    #[test]
    fn begin_refuses_when_already_played() {
        let mut s = QuizSession::new(quiz(3, 90)).unwrap();
        let err = s.begin("alice", now(), true).unwrap_err();
        assert!(matches!(err, DomainError::AlreadyPlayed { .. }));
        assert_eq!(s.state(), &SessionState::NotStarted);
        assert!(!s.is_timer_running());
    }

    #[test]
    fn begin_refuses_outside_window() {
        let mut before = QuizSession::new(quiz(3, 90)).unwrap();
        let err = before
            .begin("alice", now() - Duration::hours(2), false)
            .unwrap_err();
        assert!(matches!(err, DomainError::Unavailable(_)));
        assert_eq!(before.state(), &SessionState::Expired);

        let mut after = QuizSession::new(quiz(3, 90)).unwrap();
        assert!(after.begin("alice", now() + Duration::days(2), false).is_err());
        assert_eq!(after.state(), &SessionState::Expired);
        assert!(after.answer(0).is_err());
    }

    #[test]
    fn identifier_is_trimmed() {
        let mut s = QuizSession::new(quiz(1, 90)).unwrap();
        s.begin("  bob ", now(), false).unwrap();
        assert_eq!(s.user(), Some("bob"));
    }

    #[test]
    fn answer_advances_pointer() {
        let mut s = started(3, 90);
        assert_eq!(s.answer(2).unwrap(), AnswerOutcome::Advanced { pointer: 1 });
        assert_eq!(s.ledger().get(0), Some(2));
        assert_eq!(s.current_question().map(|q| q.id.as_str()), Some("q2"));
    }

    #[test]
    fn out_of_range_option_is_rejected_without_side_effects() {
        let mut s = started(3, 90);
        assert!(matches!(s.answer(4), Err(DomainError::Validation(_))));
        assert_eq!(s.pointer(), 0);
        assert!(s.ledger().is_empty());
    }

    #[test]
    fn answering_every_question_finalizes_without_waiting_for_timer() {
        let mut s = started(3, 90);
        s.answer(0).unwrap();
        s.answer(1).unwrap();
        let outcome = s.answer(3).unwrap();

        let AnswerOutcome::Finalized(list) = outcome else {
            panic!("expected finalize on last answer");
        };
        assert_eq!(s.pointer(), 3);
        assert_eq!(s.state(), &SessionState::Submitting);
        assert_eq!(s.finalize_reason(), Some(FinalizeReason::AllAnswered));
        assert!(!s.is_timer_running());
        assert_eq!(list.len(), 3);
        assert_eq!(list[2].selected_option, 3);
        assert_eq!(s.remaining_secs(), 90);
    }

    #[test]
    fn timeout_submits_only_answered_positions() {
        let mut s = started(3, 90);
        assert!(ticks(&mut s, 2).is_none());
        s.answer(0).unwrap();
        assert!(ticks(&mut s, 3).is_none());
        s.answer(1).unwrap();

        let list = ticks(&mut s, 85).expect("expiry finalizes");
        let got: Vec<(usize, usize)> = list
            .iter()
            .map(|a| (a.question_position, a.selected_option))
            .collect();
        assert_eq!(got, vec![(0, 0), (1, 1)]);
        assert_eq!(s.state(), &SessionState::Submitting);
        assert_eq!(s.finalize_reason(), Some(FinalizeReason::TimeUp));
        assert_eq!(s.remaining_secs(), 0);
    }

    #[test]
    fn finalize_happens_once_when_last_answer_meets_expiry() {
        let mut s = started(1, 1);
        assert!(matches!(s.answer(0).unwrap(), AnswerOutcome::Finalized(_)));
        assert!(s.tick().is_none());
        assert!(s.expire().is_none());
        assert_eq!(s.pending_submission().map(|l| l.len()), Some(1));
    }

    #[test]
    fn answer_after_expiry_is_refused_and_not_recorded() {
        let mut s = started(2, 1);
        assert!(s.tick().is_some());
        assert!(matches!(
            s.answer(0),
            Err(DomainError::InvalidTransition { action: "answer", .. })
        ));
        assert!(s.ledger().is_empty());
        assert_eq!(s.pending_submission().map(|l| l.len()), Some(0));
    }

    #[test]
    fn ledger_matches_answered_positions_for_every_prefix() {
        let choices = [3usize, 0, 2, 1, 1];
        for answered in 0..=choices.len() {
            let mut s = started(choices.len(), 60);
            for &c in &choices[..answered] {
                s.answer(c).unwrap();
            }
            let list = s.expire().unwrap_or_else(|| {
                s.pending_submission().map(<[_]>::to_vec).unwrap_or_default()
            });
            assert_eq!(list.len(), answered);
            for (i, rec) in list.iter().enumerate() {
                assert_eq!(rec.question_position, i);
                assert_eq!(rec.selected_option, choices[i]);
            }
        }
    }

    #[test]
    fn failed_submission_retries_with_same_list() {
        let mut s = started(2, 90);
        s.answer(1).unwrap();
        let AnswerOutcome::Finalized(first) = s.answer(0).unwrap() else {
            panic!("expected finalize");
        };
        s.fail("connection refused", true).unwrap();
        assert!(s.can_retry());
        assert_eq!(
            s.state(),
            &SessionState::Failed("connection refused".to_string())
        );

        let again = s.retry().unwrap();
        assert_eq!(again, first);
        assert_eq!(s.state(), &SessionState::Submitting);

        let result = ScoreResult {
            points: 10,
            correct_count: 1,
            total_questions: 2,
            position: Some(4),
        };
        s.complete(result.clone()).unwrap();
        assert_eq!(s.result(), Some(&result));
        assert!(s.answer(0).is_err());
        assert!(s.retry().is_err());
    }

    #[test]
    fn completion_requires_submitting() {
        let mut s = started(2, 90);
        let result = ScoreResult {
            points: 0,
            correct_count: 0,
            total_questions: 2,
            position: None,
        };
        assert!(s.complete(result).is_err());
        assert!(s.fail("x", true).is_err());
    }

    #[test]
    fn non_retryable_failure_refuses_retry() {
        let mut s = started(1, 90);
        s.answer(0).unwrap();
        s.fail("quiz withdrawn", false).unwrap();
        assert!(!s.can_retry());
        assert!(matches!(
            s.retry(),
            Err(DomainError::InvalidTransition { action: "retry", .. })
        ));
        assert_eq!(s.state(), &SessionState::Failed("quiz withdrawn".to_string()));
    }

    #[test]
    fn expiry_hook_runs_once_on_timeout() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicUsize, Ordering};

        let fired = Arc::new(AtomicUsize::new(0));
        let mut s = started(2, 2);
        let c = Arc::clone(&fired);
        s.set_expiry_hook(Box::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
        }));
        ticks(&mut s, 10);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
}
