//! # Claude Quota
//!
//! Estimates Claude subscription quota consumption from the local usage logs
//! Claude Code writes under `~/.claude/projects`.
//!
//! ## Overview
//!
//! The library scans JSONL usage logs and the current session transcript to
//! produce four statusline rows:
//! - Current 5-hour session (output tokens vs. the plan limit)
//! - Current week, all models and Sonnet only (output tokens, Monday 04:00 reset)
//! - Monthly extra-usage spend
//!
//! Past sessions feed P90 estimates that can replace the static plan limits,
//! and rate-limit messages in the logs override the nominal session reset.
//!
//! ## Features
//!
//! - `colors` (default): Enables terminal color output via owo-colors

/// Command-line argument parsing
pub mod cli;

/// Resolved configuration and plan limits
pub mod config;

/// Text and JSON rendering of quota reports
pub mod display;

/// Usage-event extraction from raw log records
pub mod extract;

/// Rate-limit signal detection
pub mod limits;

/// tracing subscriber setup
pub mod logging;

/// Data models for events, blocks, signals and reports
pub mod models;

/// P90 limit estimation
pub mod percentile;

/// Model-family pricing
pub mod pricing;

/// Session, weekly and monthly quota aggregation
pub mod quota;

/// Log scanning and transcript reading
pub mod usage;

/// Utility functions for paths and formatting
pub mod utils;

/// Session block identification
pub mod window;
