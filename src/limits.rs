//! # Limits Module
//!
//! Detects rate-limit notices embedded in raw log records.
//!
//! Two independent rules:
//! - `system` records whose string `content` mentions "limit" or "rate";
//!   an optional "wait N minutes" yields the reset time.
//! - `user` records carrying a `tool_result` whose text says "limit reached";
//!   an optional `limit reached|<epoch>` suffix yields the reset time.
//!
//! Raw records are scanned before deduplication and usage filtering, since
//! these notices usually carry no token usage.

use chrono::{DateTime, TimeDelta, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::extract::{record_timestamp, record_type};
use crate::models::{LimitKind, LimitSignal};

static WAIT_MINUTES_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)wait\s+(\d+)\s+minutes?").unwrap());

static RESET_EPOCH_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"limit reached\|(\d+)").unwrap());

/// Minutes from a "wait N minute(s)" phrase.
pub fn parse_wait_minutes(text: &str) -> Option<u32> {
    WAIT_MINUTES_RE.captures(text)?.get(1)?.as_str().parse().ok()
}

/// Reset instant from a `limit reached|<unix seconds>` marker.
pub fn parse_reset_epoch(text: &str) -> Option<DateTime<Utc>> {
    let secs: i64 = RESET_EPOCH_RE.captures(text)?.get(1)?.as_str().parse().ok()?;
    DateTime::<Utc>::from_timestamp(secs, 0)
}

pub fn detect_system_limit(record: &Value) -> Option<LimitSignal> {
    let content = record.get("content")?.as_str()?;
    let lower = content.to_lowercase();
    if !lower.contains("limit") && !lower.contains("rate") {
        return None;
    }
    let ts = record_timestamp(record)?;
    let wait_minutes = parse_wait_minutes(content);
    let reset_at = wait_minutes.and_then(|m| ts.checked_add_signed(TimeDelta::minutes(m as i64)));
    Some(LimitSignal {
        kind: LimitKind::SystemLimit,
        ts,
        content: content.to_string(),
        reset_at,
        wait_minutes: reset_at.and(wait_minutes),
    })
}

/// First tool-result text mentioning "limit reached".
pub fn detect_tool_result_limit(record: &Value) -> Option<LimitSignal> {
    let items = record.get("message")?.get("content")?.as_array()?;
    let texts = items
        .iter()
        .filter(|item| item.get("type").and_then(|t| t.as_str()) == Some("tool_result"))
        .filter_map(|item| item.get("content").and_then(|c| c.as_array()))
        .flatten()
        .filter_map(|ti| ti.get("text").and_then(|t| t.as_str()));
    for text in texts {
        if !text.to_lowercase().contains("limit reached") {
            continue;
        }
        let Some(ts) = record_timestamp(record) else {
            continue;
        };
        return Some(LimitSignal {
            kind: LimitKind::ToolResultLimit,
            ts,
            content: text.to_string(),
            reset_at: parse_reset_epoch(text),
            wait_minutes: None,
        });
    }
    None
}

pub fn detect_limit(record: &Value) -> Option<LimitSignal> {
    match record_type(record)? {
        "system" => detect_system_limit(record),
        "user" => detect_tool_result_limit(record),
        _ => None,
    }
}

pub fn detect_limits(raw: &[Value]) -> Vec<LimitSignal> {
    let signals: Vec<LimitSignal> = raw.iter().filter_map(detect_limit).collect();
    if !signals.is_empty() {
        debug!(count = signals.len(), "limit signals detected");
    }
    signals
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_system_wait_minutes() {
        let ts = Utc.with_ymd_and_hms(2025, 5, 2, 10, 0, 0).unwrap();
        let rec = json!({
            "type": "system",
            "timestamp": ts.to_rfc3339(),
            "content": "Please wait 15 minutes before retrying due to rate limit"
        });
        let sig = detect_limit(&rec).unwrap();
        assert_eq!(sig.kind, LimitKind::SystemLimit);
        assert_eq!(sig.wait_minutes, Some(15));
        assert_eq!(sig.reset_at, Some(ts + TimeDelta::minutes(15)));
    }

    #[test]
    fn test_system_without_wait_has_no_reset() {
        let rec = json!({
            "type": "system",
            "timestamp": "2025-05-02T10:00:00Z",
            "content": "Rate LIMIT hit"
        });
        let sig = detect_limit(&rec).unwrap();
        assert!(sig.reset_at.is_none());
        assert!(sig.wait_minutes.is_none());
    }

    #[test]
    fn test_system_requires_string_content_and_timestamp() {
        let non_string = json!({"type": "system", "timestamp": "2025-05-02T10:00:00Z", "content": ["limit"]});
        assert!(detect_limit(&non_string).is_none());
        let no_ts = json!({"type": "system", "content": "limit"});
        assert!(detect_limit(&no_ts).is_none());
        let unrelated = json!({"type": "system", "timestamp": "2025-05-02T10:00:00Z", "content": "compacted"});
        assert!(detect_limit(&unrelated).is_none());
    }

    #[test]
    fn test_tool_result_with_epoch() {
        let rec = json!({
            "type": "user",
            "timestamp": "2025-05-02T10:00:00Z",
            "message": {"content": [
                {"type": "text", "text": "limit reached|1"},
                {"type": "tool_result", "content": [
                    {"type": "text", "text": "nothing to see"},
                    {"type": "text", "text": "Claude AI usage limit reached|1746180000"}
                ]},
                {"type": "tool_result", "content": [
                    {"type": "text", "text": "Limit reached again"}
                ]}
            ]}
        });
        let sig = detect_limit(&rec).unwrap();
        assert_eq!(sig.kind, LimitKind::ToolResultLimit);
        assert_eq!(sig.content, "Claude AI usage limit reached|1746180000");
        assert_eq!(sig.reset_at, Utc.timestamp_opt(1_746_180_000, 0).single());
        assert!(sig.wait_minutes.is_none());
    }

    #[test]
    fn test_tool_result_bad_epoch_still_signals() {
        let rec = json!({
            "type": "user",
            "timestamp": "2025-05-02T10:00:00Z",
            "message": {"content": [
                {"type": "tool_result", "content": [
                    {"type": "text", "text": "Usage limit reached|99999999999999999999999"}
                ]}
            ]}
        });
        let sig = detect_limit(&rec).unwrap();
        assert!(sig.reset_at.is_none());
    }

    #[test]
    fn test_other_kinds_ignored() {
        let rec = json!({"type": "assistant", "timestamp": "2025-05-02T10:00:00Z", "content": "rate limit"});
        assert!(detect_limit(&rec).is_none());
        assert!(detect_limits(&[rec]).is_empty());
    }
}
