use chrono::{DateTime, Utc};
use serde::Serialize;

/// One normalized usage record extracted from a log line.
#[derive(Clone, Debug, Serialize)]
pub struct UsageEvent {
    pub ts: DateTime<Utc>,
    pub input: u64,
    pub output: u64,
    pub cache_create: u64,
    pub cache_read: u64,
    pub cost: f64,
    /// Model id as written by the producer; empty when none was found.
    pub model: String,
    /// `"<message id>:<request id>"` when both ids are present.
    pub key: Option<String>,
}
