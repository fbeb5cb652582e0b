//! Implements InputPort. Interactive quiz flow.
//!
//! Text and confirm prompts use inquire on the blocking pool. Questions use the
//! crossterm prompt in `question`, which watches the session and closes itself
//! when time runs out, so no prompt outlives its question.

use crate::adapters::ui::progress;
use crate::adapters::ui::question::{self, PickOutcome};
use crate::domain::{
    DomainError, FinalizeReason, Question, QuizSession, ScoreResult, SessionState, remaining_until,
};
use crate::ports::InputPort;
use crate::usecases::{QuizSessionService, SessionHandle, SessionRunner, SessionSnapshot};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use inquire::ui::{Color, RenderConfig, Styled};
use inquire::{Confirm, InquireError, Text};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::warn;

/// Seconds of "get ready" before the first question.
const GET_READY_SECS: u64 = 3;

/// Green prompt prefix and highlighted option marker for all prompts.
pub fn apply_theme() {
    let config = RenderConfig::default()
        .with_prompt_prefix(Styled::new("?").with_fg(Color::LightGreen))
        .with_highlighted_option_prefix(Styled::new(">").with_fg(Color::LightGreen));
    inquire::set_global_render_config(config);
}

fn prompt_error(e: InquireError) -> DomainError {
    DomainError::Validation(format!("prompt aborted: {}", e))
}

fn join_error(e: tokio::task::JoinError) -> DomainError {
    DomainError::Validation(format!("prompt task failed: {}", e))
}

async fn ask_username() -> Result<String, DomainError> {
    tokio::task::spawn_blocking(|| {
        Text::new("Telegram username:")
            .with_placeholder("@yourusername or username")
            .prompt()
    })
    .await
    .map_err(join_error)?
    .map_err(prompt_error)
}

async fn ask_confirm(message: &'static str) -> Result<bool, DomainError> {
    tokio::task::spawn_blocking(move || Confirm::new(message).with_default(true).prompt())
        .await
        .map_err(join_error)?
        .map_err(prompt_error)
}

/// Seconds left while the session still takes answers.
fn open_question(status: &watch::Receiver<SessionSnapshot>) -> Option<u64> {
    let snap = status.borrow();
    (snap.state == SessionState::Answering).then_some(snap.remaining_secs)
}

fn print_overview(session: &QuizSession, now: DateTime<Utc>) {
    let quiz = session.quiz();
    println!();
    println!("Today's Quiz: {}", quiz.title);
    println!("  Questions:    {}", quiz.questions.len());
    println!("  Time:         {}s", quiz.duration_secs);
    println!("  Total points: {}", quiz.total_points());
    if let Some(end) = quiz.end_date {
        println!("  Expires in:   {}", remaining_until(end, now));
    }
    println!();
}

fn print_result(heading: &str, result: &ScoreResult) {
    println!();
    println!("{}", heading);
    println!("  Points:  {}", result.points);
    println!(
        "  Correct: {} / {}",
        result.correct_count, result.total_questions
    );
    match result.position {
        Some(p) => println!("  Your position: {}", p),
        None => println!("  Your position: unranked"),
    }
}

/// Outcome of one attempt to start with an entered identifier.
#[derive(Debug, PartialEq, Eq)]
enum Entry {
    Started,
    /// Stay on the entry screen and ask for another identifier.
    TryAgain,
    /// The quiz cannot be started at all.
    Stop,
}

/// TUI adapter. Inquire and crossterm prompts.
pub struct TuiInputPort {
    service: Arc<QuizSessionService>,
    tick_period: Duration,
    leaderboard_limit: usize,
}

impl TuiInputPort {
    pub fn new(
        service: Arc<QuizSessionService>,
        tick_period: Duration,
        leaderboard_limit: usize,
    ) -> Self {
        Self {
            service,
            tick_period,
            leaderboard_limit,
        }
    }

    /// Load the quiz. A failed load is reported and retried while `again` says so.
    /// `None` when the quiz does not exist or the user gives up.
    async fn load_until<F, Fut>(
        &self,
        quiz_id: &str,
        mut again: F,
    ) -> Result<Option<QuizSession>, DomainError>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<bool, DomainError>> + Send,
    {
        loop {
            let pb = progress::spinner("Loading quiz...");
            let loaded = self.service.load(quiz_id).await;
            pb.finish_and_clear();

            match loaded {
                Ok(session) => return Ok(Some(session)),
                Err(DomainError::NotFound(_)) => {
                    println!("Quiz not found.");
                    return Ok(None);
                }
                Err(e) => {
                    warn!(quiz_id, error = %e, "quiz load failed");
                    println!("Quiz unavailable right now: {}", e);
                    if !again().await? {
                        return Ok(None);
                    }
                }
            }
        }
    }

    async fn try_begin(&self, session: &mut QuizSession, raw: &str) -> Entry {
        let user = match QuizSession::normalize_user(raw) {
            Ok(u) => u,
            Err(e) => {
                println!("{}", e);
                return Entry::TryAgain;
            }
        };

        if let Some(cached) = self
            .service
            .cached_result(&session.quiz().id, &user)
            .await
        {
            print_result("Your last result", &cached.result);
        }

        let pb = progress::spinner("Checking player roster...");
        let begun = self.service.begin(session, &user).await;
        pb.finish_and_clear();

        match begun {
            Ok(()) => Entry::Started,
            Err(DomainError::Validation(msg)) => {
                println!("{}", msg);
                Entry::TryAgain
            }
            Err(e @ DomainError::AlreadyPlayed { .. }) => {
                println!("{}. Each username can play a quiz once.", e);
                Entry::TryAgain
            }
            Err(e) => {
                println!("{}", e);
                Entry::Stop
            }
        }
    }

    /// Ask for an identifier until the session starts. Returns false when the quiz cannot start.
    async fn start(&self, session: &mut QuizSession) -> Result<bool, DomainError> {
        loop {
            let raw = ask_username().await?;
            match self.try_begin(session, &raw).await {
                Entry::Started => return Ok(true),
                Entry::TryAgain => continue,
                Entry::Stop => return Ok(false),
            }
        }
    }

    /// Prompt question by question until the session leaves `Answering`.
    async fn answer_loop(
        &self,
        handle: &SessionHandle,
        questions: &[Question],
    ) -> Result<(), DomainError> {
        loop {
            let snap = handle.snapshot();
            if snap.state != SessionState::Answering {
                return Ok(());
            }
            let Some(current) = questions.get(snap.pointer) else {
                return Ok(());
            };

            let title = format!(
                "Question {}/{}: {}",
                snap.pointer + 1,
                snap.question_count,
                current.text
            );
            let options = current.options.clone();
            let status = handle.subscribe();
            let picked = tokio::task::spawn_blocking(move || {
                question::ask(&title, &options, || open_question(&status))
            })
            .await
            .map_err(join_error)?
            .map_err(|e| DomainError::Validation(format!("prompt failed: {}", e)))?;

            match picked {
                PickOutcome::Picked(index) => match handle.answer(index).await {
                    Ok(_) => {}
                    Err(DomainError::InvalidTransition { .. }) => return Ok(()),
                    Err(e) => println!("{}", e),
                },
                PickOutcome::Cancelled => return Ok(()),
                PickOutcome::Aborted => {
                    return Err(DomainError::Validation("prompt aborted".to_string()));
                }
            }
        }
    }

    /// Wait for the submit outcome; offer retries while it keeps failing retryably.
    async fn finish(&self, handle: &SessionHandle) -> Result<Option<ScoreResult>, DomainError> {
        let pb = progress::spinner("Submitting answers...");
        let mut snap = handle.settled().await?;
        pb.finish_and_clear();

        if snap.finalize_reason == Some(FinalizeReason::TimeUp) {
            println!(
                "\nTime's up! {} of {} questions answered.",
                snap.answered, snap.question_count
            );
        }

        loop {
            match snap.state {
                SessionState::Completed(result) => return Ok(Some(result)),
                SessionState::Failed(reason) => {
                    println!("Failed to submit quiz: {}", reason);
                    if !snap.retryable {
                        println!("This submission cannot be retried.");
                        return Ok(None);
                    }
                    if !ask_confirm("Submission failed. Retry with the same answers?").await? {
                        return Ok(None);
                    }
                    let pb = progress::spinner("Submitting answers...");
                    snap = handle.retry().await?;
                    pb.finish_and_clear();
                }
                _ => return Ok(None),
            }
        }
    }

    async fn show_leaderboard(&self) {
        match self.service.leaderboard(self.leaderboard_limit).await {
            Ok(rows) if rows.is_empty() => println!("\nLeaderboard is empty."),
            Ok(rows) => {
                println!("\nGlobal Leaderboard");
                for (i, row) in rows.iter().enumerate() {
                    println!("  {:>2}. {:<24} {}", i + 1, row.username, row.total_score);
                }
            }
            Err(e) => {
                warn!(error = %e, "leaderboard unavailable");
                println!("\nLeaderboard unavailable.");
            }
        }
    }
}

#[async_trait]
impl InputPort for TuiInputPort {
    async fn run(&self, quiz_id: &str) -> Result<(), DomainError> {
        let loaded = self
            .load_until(quiz_id, || ask_confirm("Try loading the quiz again?"))
            .await?;
        let Some(mut session) = loaded else {
            return Ok(());
        };

        print_overview(&session, self.service.clock().now());
        if *session.state() == SessionState::Expired {
            println!("This quiz has expired and cannot be played.");
            return Ok(());
        }

        if !self.start(&mut session).await? {
            return Ok(());
        }

        progress::get_ready(GET_READY_SECS).await;

        let questions = session.quiz().questions.clone();
        let handle = SessionRunner::spawn(session, Arc::clone(&self.service), self.tick_period)?;
        self.answer_loop(&handle, &questions).await?;

        if let Some(result) = self.finish(&handle).await? {
            print_result("Result", &result);
            self.show_leaderboard().await;
        }
        Ok(())
    }
}
