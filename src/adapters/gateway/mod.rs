//! Scoring service adapters. Implement QuizGateway.
//!
//! HTTP client for the real service and an in-memory stand-in for offline play and tests.

pub mod demo;
pub mod http;
pub mod mapper;

pub use demo::{DemoGateway, SAMPLE_QUIZ_ID};
pub use http::HttpQuizGateway;
