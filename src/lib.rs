//! Bugtrack backend library.
//!
//! Exports the rule engine, the SQLite-backed store, and supporting types
//! for the CLI and for integration tests.

pub mod cli;
pub mod config;
pub mod credentials;
pub mod db;
pub mod error;
pub mod rules;
pub mod types;
