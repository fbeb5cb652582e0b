//! Wiring & DI. Entry point: bootstrap adapters, inject into services, run UI.
//! No business logic here; the session rules live in the domain and use cases.

use chrono::Utc;
use dotenv::dotenv;
use quiz_session::adapters::gateway::{DemoGateway, HttpQuizGateway};
use quiz_session::adapters::persistence::ResultJson;
use quiz_session::adapters::ui::tui::TuiInputPort;
use quiz_session::domain::Clock;
use quiz_session::ports::{InputPort, QuizGateway, ResultCachePort};
use quiz_session::shared::config::AppConfig;
use quiz_session::usecases::QuizSessionService;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let env_loaded = dotenv();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match &env_loaded {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(_) => info!(cwd = %cwd.display(), "no .env found (check CWD)"),
    }

    quiz_session::adapters::ui::init_ui();

    let cfg = match AppConfig::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!(error = %e, "config unreadable, using defaults");
            AppConfig::default()
        }
    };

    // --- Scoring service: remote when QUIZ_API_BASE is set, bundled quiz otherwise ---
    let gateway: Arc<dyn QuizGateway> = match cfg.api_base() {
        Some(base) => {
            info!(url = %base, "using remote scoring service");
            Arc::new(
                HttpQuizGateway::new(base, cfg.request_timeout())
                    .map_err(|e| anyhow::anyhow!("{}", e))?,
            )
        }
        None => {
            warn!("QUIZ_API_BASE not set, serving the bundled offline quiz");
            Arc::new(DemoGateway::new().with_sample_quiz(Utc::now()))
        }
    };

    // --- Result cache ---
    let data_path = PathBuf::from(cfg.data_dir_or_default());
    let cache_path = data_path.join("results.json");
    info!(path = %cache_path.display(), "result cache");
    let cache_impl = ResultJson::new(&cache_path);
    cache_impl
        .load()
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;
    let cache: Arc<dyn ResultCachePort> = Arc::new(cache_impl);

    // --- Services ---
    let service = Arc::new(QuizSessionService::new(gateway, cache, Clock::System));

    let tick_period = cfg.tick_period();
    info!(tick_ms = tick_period.as_millis() as u64, "countdown tick period");
    let input_port: Arc<dyn InputPort> = Arc::new(TuiInputPort::new(
        service,
        tick_period,
        cfg.leaderboard_limit_or_default(),
    ));

    let quiz_id = std::env::args()
        .nth(1)
        .unwrap_or_else(|| cfg.quiz_id_or_default().to_string());

    input_port
        .run(&quiz_id)
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    Ok(())
}
