//! Application use cases. Orchestrate domain logic via ports.

pub mod session_runner;
pub mod session_service;
pub mod ticker;

pub use session_runner::{SessionHandle, SessionRunner, SessionSnapshot};
pub use session_service::QuizSessionService;
pub use ticker::{Tick, Ticker};
