//! # Extract Module
//!
//! Turns one decoded log record into a [`UsageEvent`].
//!
//! Producer versions disagree on where token counters live and how they are
//! spelled, so counters are looked up through an ordered list of candidate
//! sources, each checked with a list of field aliases. The first source with a
//! positive input or output count wins; sources are never merged.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Map, Value};

use crate::models::{TokenCounts, UsageEvent};
use crate::pricing::PricingTable;

/// Where token counters may live within a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum UsageSource {
    /// `message.usage`
    MessageUsage,
    /// top-level `usage`
    Usage,
    /// the record itself
    Record,
}

const ASSISTANT_SOURCES: [UsageSource; 3] = [
    UsageSource::MessageUsage,
    UsageSource::Usage,
    UsageSource::Record,
];

const DEFAULT_SOURCES: [UsageSource; 3] = [
    UsageSource::Usage,
    UsageSource::MessageUsage,
    UsageSource::Record,
];

const INPUT_KEYS: &[&str] = &["input_tokens", "inputTokens"];
const OUTPUT_KEYS: &[&str] = &["output_tokens", "outputTokens"];
const CACHE_CREATE_KEYS: &[&str] = &[
    "cache_creation_tokens",
    "cache_creation_input_tokens",
    "cacheCreationTokens",
    "cacheCreationInputTokens",
];
const CACHE_READ_KEYS: &[&str] = &[
    "cache_read_input_tokens",
    "cache_read_tokens",
    "cacheReadInputTokens",
    "cacheReadTokens",
];

const COST_KEYS: &[&str] = &["cost", "cost_usd", "costUSD"];

pub fn record_type(record: &Value) -> Option<&str> {
    record.get("type").and_then(|s| s.as_str())
}

fn source_object(record: &Value, source: UsageSource) -> Option<&Map<String, Value>> {
    match source {
        UsageSource::MessageUsage => record.get("message")?.get("usage")?.as_object(),
        UsageSource::Usage => record.get("usage")?.as_object(),
        UsageSource::Record => record.as_object(),
    }
}

/// Counter value of the first alias present in `obj`; a present alias wins
/// even when it holds zero.
fn first_count(obj: &Map<String, Value>, keys: &[&str]) -> u64 {
    keys.iter()
        .find_map(|k| obj.get(*k))
        .map(as_count)
        .unwrap_or(0)
}

fn as_count(v: &Value) -> u64 {
    v.as_u64()
        .or_else(|| {
            v.as_f64()
                .filter(|f| f.is_finite() && *f > 0.0)
                .map(|f| f as u64)
        })
        .unwrap_or(0)
}

/// Token counters of a record, or `None` when no candidate source carries a
/// positive input or output count.
pub fn extract_tokens(record: &Value) -> Option<TokenCounts> {
    let sources = if record_type(record) == Some("assistant") {
        &ASSISTANT_SOURCES
    } else {
        &DEFAULT_SOURCES
    };
    sources.iter().find_map(|&src| {
        let obj = source_object(record, src)?;
        let tokens = TokenCounts {
            input: first_count(obj, INPUT_KEYS),
            output: first_count(obj, OUTPUT_KEYS),
            cache_create: first_count(obj, CACHE_CREATE_KEYS),
            cache_read: first_count(obj, CACHE_READ_KEYS),
        };
        (tokens.input > 0 || tokens.output > 0).then_some(tokens)
    })
}

/// Explicit cost when the record carries a non-zero number, otherwise the
/// flat-rate estimate.
pub fn extract_cost(record: &Value, tokens: &TokenCounts, pricing: &PricingTable) -> f64 {
    let explicit = COST_KEYS
        .iter()
        .filter_map(|k| record.get(*k).and_then(|v| v.as_f64()))
        .find(|c| c.is_finite() && *c != 0.0);
    match explicit {
        Some(c) => c,
        None if tokens.input > 0 || tokens.output > 0 => pricing.estimate_cost(tokens),
        None => 0.0,
    }
}

/// First non-empty of `message.model`, `model`, `usage.model`.
pub fn extract_model(record: &Value) -> String {
    let candidates = [
        record.get("message").and_then(|m| m.get("model")),
        record.get("model"),
        record.get("usage").and_then(|u| u.get("model")),
    ];
    candidates
        .into_iter()
        .flatten()
        .filter_map(|v| v.as_str())
        .find(|s| !s.is_empty())
        .unwrap_or_default()
        .to_string()
}

fn non_empty_str(v: Option<&Value>) -> Option<&str> {
    v.and_then(|s| s.as_str()).filter(|s| !s.is_empty())
}

pub fn message_id(record: &Value) -> Option<&str> {
    non_empty_str(record.get("message_id"))
        .or_else(|| non_empty_str(record.get("message").and_then(|m| m.get("id"))))
}

pub fn request_id(record: &Value) -> Option<&str> {
    non_empty_str(record.get("requestId")).or_else(|| non_empty_str(record.get("request_id")))
}

/// `"<message id>:<request id>"`; records missing either id have no key.
pub fn identity_key(record: &Value) -> Option<String> {
    match (message_id(record), request_id(record)) {
        (Some(m), Some(r)) => Some(format!("{m}:{r}")),
        _ => None,
    }
}

/// Accepts RFC 3339, naive ISO (read as UTC) and numeric epoch seconds.
pub fn parse_timestamp(v: &Value) -> Option<DateTime<Utc>> {
    match v {
        Value::String(s) => parse_timestamp_str(s),
        Value::Number(n) => {
            let secs = n.as_f64()?;
            if !secs.is_finite() {
                return None;
            }
            let whole = secs.floor();
            let nanos = ((secs - whole) * 1e9) as u32;
            DateTime::<Utc>::from_timestamp(whole as i64, nanos.min(999_999_999))
        }
        _ => None,
    }
}

pub fn parse_timestamp_str(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|n| n.and_utc())
}

pub fn record_timestamp(record: &Value) -> Option<DateTime<Utc>> {
    record.get("timestamp").and_then(parse_timestamp)
}

/// Full extraction. `None` when the record has no parseable timestamp or no
/// usable token data.
pub fn extract_event(record: &Value, pricing: &PricingTable) -> Option<UsageEvent> {
    let ts = record_timestamp(record)?;
    let tokens = extract_tokens(record)?;
    let cost = extract_cost(record, &tokens, pricing);
    Some(UsageEvent {
        ts,
        input: tokens.input,
        output: tokens.output,
        cache_create: tokens.cache_create,
        cache_read: tokens.cache_read,
        cost,
        model: extract_model(record),
        key: identity_key(record),
    })
}
