//! Infrastructure adapters. Implement ports.
//!
//! Scoring service (HTTP and in-memory), result cache file, terminal UI. Map errors to DomainError.

pub mod gateway;
pub mod persistence;
pub mod ui;
