//! Single owner of a running session.
//!
//! A tokio task owns the `QuizSession`, its ticker and the one in-flight submit.
//! Answers/retries (from the handle) and ticks (from the ticker) are serialized
//! through one `select!` loop, so an answer and an expiry can never interleave
//! and finalize always reads the ledger after the last write. Dropping the
//! handle shuts the task down and discards any late submit result.

use crate::domain::{AnswerOutcome, DomainError, FinalizeReason, QuizSession, SessionState};
use crate::usecases::session_service::QuizSessionService;
use crate::usecases::ticker::{Tick, Ticker};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

/// Point-in-time view of a running session, published after every transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub quiz_id: String,
    pub user: String,
    pub state: SessionState,
    pub pointer: usize,
    pub question_count: usize,
    pub answered: usize,
    pub remaining_secs: u64,
    pub finalize_reason: Option<FinalizeReason>,
    /// `Failed` and the gateway may accept a resubmission.
    pub retryable: bool,
}

impl SessionSnapshot {
    fn of(session: &QuizSession) -> Self {
        Self {
            quiz_id: session.quiz().id.clone(),
            user: session.user().unwrap_or_default().to_string(),
            state: session.state().clone(),
            pointer: session.pointer(),
            question_count: session.quiz().questions.len(),
            answered: session.ledger().len(),
            remaining_secs: session.remaining_secs(),
            finalize_reason: session.finalize_reason(),
            retryable: session.can_retry(),
        }
    }
}

type Reply = oneshot::Sender<Result<SessionSnapshot, DomainError>>;

enum Command {
    Answer { option: usize, reply: Reply },
    Retry { reply: Reply },
}

/// Caller side of a running session.
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<SessionSnapshot>,
    /// Dropped with the handle; the runner treats that as cancellation.
    _alive: oneshot::Sender<()>,
}

impl SessionHandle {
    /// Answer the current question. Returns once the answer is recorded
    /// (the snapshot may already be `Submitting`).
    pub async fn answer(&self, option: usize) -> Result<SessionSnapshot, DomainError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Answer { option, reply }).await?;
        rx.await.map_err(|_| DomainError::SessionClosed)?
    }

    /// Resubmit after `Failed`. Returns after the gateway has answered.
    pub async fn retry(&self) -> Result<SessionSnapshot, DomainError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Retry { reply }).await?;
        rx.await.map_err(|_| DomainError::SessionClosed)?
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver for display updates (every tick and transition).
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    /// Wait until the session settles (`Completed`, `Failed` or `Expired`).
    pub async fn settled(&self) -> Result<SessionSnapshot, DomainError> {
        let mut rx = self.snapshots.clone();
        let snap = rx
            .wait_for(|s| s.state.is_settled())
            .await
            .map_err(|_| DomainError::SessionClosed)?;
        Ok(snap.clone())
    }

    async fn send(&self, cmd: Command) -> Result<(), DomainError> {
        self.commands
            .send(cmd)
            .await
            .map_err(|_| DomainError::SessionClosed)
    }
}

pub struct SessionRunner {
    session: QuizSession,
    service: Arc<QuizSessionService>,
    commands: mpsc::Receiver<Command>,
    ticks: mpsc::Receiver<Tick>,
    tick_tx: mpsc::Sender<Tick>,
    tick_period: Duration,
    ticker: Option<Ticker>,
    generation: u64,
    snapshots: watch::Sender<SessionSnapshot>,
    alive: oneshot::Receiver<()>,
}

impl SessionRunner {
    /// Take ownership of a session that has just entered `Answering` and run it
    /// on a background task.
    pub fn spawn(
        session: QuizSession,
        service: Arc<QuizSessionService>,
        tick_period: Duration,
    ) -> Result<SessionHandle, DomainError> {
        if *session.state() != SessionState::Answering {
            return Err(DomainError::InvalidTransition {
                action: "run",
                state: session.state().name(),
            });
        }
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (tick_tx, tick_rx) = mpsc::channel(4);
        let (snap_tx, snap_rx) = watch::channel(SessionSnapshot::of(&session));
        let (alive_tx, alive_rx) = oneshot::channel();

        let runner = Self {
            session,
            service,
            commands: cmd_rx,
            ticks: tick_rx,
            tick_tx,
            tick_period,
            ticker: None,
            generation: 0,
            snapshots: snap_tx,
            alive: alive_rx,
        };
        tokio::spawn(runner.run());

        Ok(SessionHandle {
            commands: cmd_tx,
            snapshots: snap_rx,
            _alive: alive_tx,
        })
    }

    async fn run(mut self) {
        self.register_expiry_hook();
        self.start_ticker();

        loop {
            let keep_going = tokio::select! {
                cmd = self.commands.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd).await,
                    None => {
                        debug!(quiz_id = %self.session.quiz().id, "session handle dropped");
                        false
                    }
                },
                Some(tick) = self.ticks.recv() => self.handle_tick(tick).await,
            };
            if !keep_going {
                break;
            }
        }

        self.stop_ticker();
        self.session.abandon();
    }

    fn start_ticker(&mut self) {
        self.generation += 1;
        self.ticker = Some(Ticker::spawn(
            self.tick_period,
            self.generation,
            self.tick_tx.clone(),
        ));
    }

    /// Abort the ticker and retire its generation so queued ticks are ignored.
    fn stop_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.stop();
            self.generation += 1;
        }
    }

    /// Re-registered after each answer so the hook reports the current ledger size.
    fn register_expiry_hook(&mut self) {
        let quiz_id = self.session.quiz().id.clone();
        let user = self.session.user().unwrap_or_default().to_string();
        let answered = self.session.ledger().len();
        let total = self.session.quiz().questions.len();
        self.session.set_expiry_hook(Box::new(move || {
            info!(quiz_id = %quiz_id, user = %user, answered, total, "time is up");
        }));
    }

    fn publish(&self) {
        self.snapshots.send_replace(SessionSnapshot::of(&self.session));
    }

    async fn handle_tick(&mut self, tick: Tick) -> bool {
        if tick.generation != self.generation {
            debug!(
                stale = tick.generation,
                current = self.generation,
                "ignoring tick from stopped ticker"
            );
            return true;
        }
        let finalized = self.session.tick();
        self.publish();
        if finalized.is_some() {
            self.stop_ticker();
            return self.submit().await;
        }
        true
    }

    async fn handle_command(&mut self, cmd: Command) -> bool {
        match cmd {
            Command::Answer { option, reply } => match self.session.answer(option) {
                Ok(AnswerOutcome::Advanced { pointer }) => {
                    debug!(pointer, "answer recorded");
                    self.register_expiry_hook();
                    self.publish();
                    let _ = reply.send(Ok(SessionSnapshot::of(&self.session)));
                    true
                }
                Ok(AnswerOutcome::Finalized(list)) => {
                    debug!(answers = list.len(), "last answer recorded");
                    self.stop_ticker();
                    self.publish();
                    let _ = reply.send(Ok(SessionSnapshot::of(&self.session)));
                    self.submit().await
                }
                Err(e) => {
                    let _ = reply.send(Err(e));
                    true
                }
            },
            Command::Retry { reply } => {
                if let Err(e) = self.session.retry() {
                    let _ = reply.send(Err(e));
                    return true;
                }
                info!(quiz_id = %self.session.quiz().id, "retrying submission");
                self.publish();
                let keep_going = self.submit().await;
                let _ = reply.send(Ok(SessionSnapshot::of(&self.session)));
                keep_going
            }
        }
    }

    /// Run the pending submit unless the handle goes away first.
    /// Returns false when cancelled; the session is then left untouched.
    async fn submit(&mut self) -> bool {
        let outcome = tokio::select! {
            res = self.service.submit(&mut self.session) => Some(res),
            _ = &mut self.alive => None,
        };
        match outcome {
            Some(Ok(_)) => {
                self.publish();
                true
            }
            Some(Err(e)) => {
                if !e.is_retryable() {
                    warn!(error = %e, "submission failed, retry not offered");
                }
                self.publish();
                true
            }
            None => {
                debug!(quiz_id = %self.session.quiz().id, "session abandoned during submit; result discarded");
                false
            }
        }
    }
}
