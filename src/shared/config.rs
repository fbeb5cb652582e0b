//! Application configuration. Scoring service endpoint, paths, timing.

use serde::Deserialize;
use std::time::Duration;

/// Quiz played when none is given on the command line.
pub const DEFAULT_QUIZ_ID: &str = "sample-quiz";

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    /// Scoring service root, e.g. "http://localhost:8000". Read from QUIZ_API_BASE.
    /// When unset the bundled offline quiz is served instead.
    #[serde(default)]
    pub api_base: Option<String>,

    /// Directory for the result cache. Read from QUIZ_DATA_DIR.
    #[serde(default)]
    pub data_dir: Option<String>,

    /// Countdown tick period in ms (default 1000). Read from QUIZ_TICK_MS.
    #[serde(default)]
    pub tick_ms: Option<u64>,

    /// Quiz to play. Read from QUIZ_QUIZ_ID.
    #[serde(default)]
    pub quiz_id: Option<String>,

    /// Per-request HTTP timeout in seconds (default 10). Read from QUIZ_REQUEST_TIMEOUT_SECS.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    /// Rows shown on the leaderboard (default 10). Read from QUIZ_LEADERBOARD_LIMIT.
    #[serde(default)]
    pub leaderboard_limit: Option<usize>,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();
        let mut c = config::Config::builder();
        c = c.add_source(config::Environment::with_prefix("QUIZ").try_parsing(true));
        if let Ok(path) = std::env::var("QUIZ_CONFIG") {
            c = c.add_source(config::File::with_name(&path));
        }
        c.build()?.try_deserialize()
    }

    /// Returns the API base if a remote scoring service is configured.
    pub fn api_base(&self) -> Option<&str> {
        self.api_base
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn is_remote_configured(&self) -> bool {
        self.api_base().is_some()
    }

    pub fn data_dir_or_default(&self) -> &str {
        self.data_dir.as_deref().unwrap_or("./data")
    }

    /// Tick period. Defaults to one second; zero is treated as unset.
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_ms.filter(|&ms| ms > 0).unwrap_or(1000))
    }

    pub fn quiz_id_or_default(&self) -> &str {
        self.quiz_id.as_deref().unwrap_or(DEFAULT_QUIZ_ID)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.unwrap_or(10))
    }

    pub fn leaderboard_limit_or_default(&self) -> usize {
        self.leaderboard_limit.unwrap_or(10)
    }
}
