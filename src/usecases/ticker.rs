//! Once-per-period tick source for a session timer.
//!
//! Each ticker is an owned tokio task tagged with a generation. Stopping or
//! dropping it aborts the task, so no tick is produced after stop; ticks already
//! queued carry the old generation and are ignored by the consumer.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub generation: u64,
}

pub struct Ticker {
    generation: u64,
    task: JoinHandle<()>,
}

impl Ticker {
    /// Start ticking. The first tick arrives one `period` after the call.
    pub fn spawn(period: Duration, generation: u64, tx: mpsc::Sender<Tick>) -> Self {
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if tx.send(Tick { generation }).await.is_err() {
                    break;
                }
            }
        });
        debug!(generation, period_ms = period.as_millis() as u64, "ticker started");
        Self { generation, task }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Idempotent.
    pub fn stop(&self) {
        if !self.task.is_finished() {
            self.task.abort();
            debug!(generation = self.generation, "ticker stopped");
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_period_with_generation() {
        let (tx, mut rx) = mpsc::channel(8);
        let ticker = Ticker::spawn(Duration::from_secs(1), 7, tx);
        assert_eq!(ticker.generation(), 7);

        let started = Instant::now();
        let first = rx.recv().await.unwrap();
        assert_eq!(first, Tick { generation: 7 });
        assert!(started.elapsed() >= Duration::from_secs(1));

        rx.recv().await.unwrap();
        assert!(started.elapsed() >= Duration::from_secs(2));
        ticker.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn stop_before_first_tick_produces_nothing() {
        let (tx, mut rx) = mpsc::channel(8);
        let ticker = Ticker::spawn(Duration::from_secs(1), 1, tx);
        ticker.stop();

        tokio::time::sleep(Duration::from_secs(5)).await;
        // Aborted task dropped its sender, so the channel closes empty.
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn drop_stops_ticking() {
        let (tx, mut rx) = mpsc::channel(8);
        drop(Ticker::spawn(Duration::from_secs(1), 1, tx));
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(rx.recv().await, None);
    }
}
