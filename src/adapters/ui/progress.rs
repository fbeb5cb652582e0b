//! Spinners for pending network calls and the pre-start "get ready" countdown.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Steady spinner shown while a load/check/submit call is pending.
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Bar counting down `secs` seconds before the first question.
pub async fn get_ready(secs: u64) {
    let pb = ProgressBar::new(secs);
    let style = ProgressStyle::with_template("{msg} [{bar:20.green}]")
        .map(|s| s.progress_chars("## "))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    for left in (1..=secs).rev() {
        pb.set_position(left);
        pb.set_message(format!("Get ready... {}", left));
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
    pb.finish_and_clear();
    println!("Go!");
}
