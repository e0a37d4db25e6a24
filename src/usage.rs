//! # Usage Module
//!
//! Reads usage JSONL logs from disk.
//!
//! ## Key Functions
//!
//! - `find_jsonl_files`: Collects log files under candidate roots, once per canonical path
//! - `scan_usage`: Extracts, deduplicates and sorts usage events across all files
//! - `read_transcript_output_tokens`: Output tokens of one session transcript,
//!   keeping only the final cumulative value per streamed request

use chrono::{DateTime, TimeDelta, Utc};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};
use walkdir::WalkDir;

use crate::extract::{extract_event, identity_key, record_timestamp, record_type, request_id};
use crate::models::UsageEvent;
use crate::pricing::PricingTable;
use crate::utils::DEFAULT_LOOKBACK_HOURS;

#[derive(Clone, Debug)]
pub struct ScanOptions {
    /// Drop events older than this many hours before `now`; `None` keeps everything.
    pub lookback_hours: Option<i64>,
    /// Also return every decoded record, before any filtering.
    pub include_raw: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            lookback_hours: Some(DEFAULT_LOOKBACK_HOURS),
            include_raw: false,
        }
    }
}

#[derive(Debug, Default)]
pub struct ScanResult {
    /// Surviving events, ascending by timestamp.
    pub events: Vec<UsageEvent>,
    /// Raw records in file order, undeduplicated. Only filled with `include_raw`.
    pub raw: Option<Vec<Value>>,
}

/// All `*.jsonl` files beneath the roots, following symlinks. A file reachable
/// from several roots or links is returned once; unreadable roots, entries and
/// link loops are skipped.
pub fn find_jsonl_files(roots: &[PathBuf]) -> Vec<PathBuf> {
    let mut seen: HashSet<PathBuf> = HashSet::new();
    let mut files = Vec::new();
    for root in roots {
        if !root.is_dir() {
            debug!(root = %root.display(), "skipping missing root");
            continue;
        }
        for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
            let entry = match entry {
                Ok(e) => e,
                Err(err) => {
                    debug!(root = %root.display(), error = %err, "skipping unreadable entry");
                    continue;
                }
            };
            let path = entry.path();
            if !entry.file_type().is_file()
                || path.extension().and_then(|e| e.to_str()) != Some("jsonl")
            {
                continue;
            }
            let canonical = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
            if seen.insert(canonical) {
                files.push(path.to_path_buf());
            }
        }
    }
    files
}

/// Decoded JSON objects of a file. Blank and malformed lines are skipped and
/// the malformed ones counted; an unreadable file yields `None`.
fn read_records(path: &Path) -> Option<Vec<Value>> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(err) => {
            debug!(file = %path.display(), error = %err, "skipping unreadable file");
            return None;
        }
    };
    let (records, malformed) = parse_records(BufReader::new(file));
    if malformed > 0 {
        trace!(file = %path.display(), malformed, "skipped malformed lines");
    }
    Some(records)
}

/// JSON objects of a line stream plus the number of malformed lines.
fn parse_records<R: BufRead>(reader: R) -> (Vec<Value>, usize) {
    let mut records = Vec::new();
    let mut malformed = 0usize;
    for line in reader.lines() {
        let Ok(line) = line else {
            malformed += 1;
            continue;
        };
        let t = line.trim();
        if t.is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(t) {
            Ok(v) if v.is_object() => records.push(v),
            _ => malformed += 1,
        }
    }
    (records, malformed)
}

/// Scan every log file under `roots`.
///
/// Records sharing an identity key are kept once across the whole corpus
/// (first seen wins); records without a key are never deduplicated.
pub fn scan_usage(
    roots: &[PathBuf],
    opts: &ScanOptions,
    pricing: &PricingTable,
    now: DateTime<Utc>,
) -> ScanResult {
    let cutoff = opts
        .lookback_hours
        .and_then(|h| now.checked_sub_signed(TimeDelta::hours(h)));
    let files = find_jsonl_files(roots);

    let mut events: Vec<UsageEvent> = Vec::new();
    let mut raw: Option<Vec<Value>> = opts.include_raw.then(Vec::new);
    let mut seen: HashSet<String> = HashSet::new();

    for path in &files {
        let Some(records) = read_records(path) else {
            continue;
        };
        for record in records {
            if let Some(key) = identity_key(&record) {
                if !seen.insert(key) {
                    if let Some(r) = raw.as_mut() {
                        r.push(record);
                    }
                    continue;
                }
            }
            let event = extract_event(&record, pricing);
            if let Some(r) = raw.as_mut() {
                r.push(record);
            }
            let Some(event) = event else {
                continue;
            };
            if cutoff.is_some_and(|c| event.ts < c) {
                continue;
            }
            events.push(event);
        }
    }

    events.sort_by_key(|e| e.ts);
    debug!(
        files = files.len(),
        events = events.len(),
        raw = raw.as_ref().map_or(0, Vec::len),
        "usage scan complete"
    );
    ScanResult { events, raw }
}

/// Output tokens of one transcript.
///
/// The producer writes several streaming records per request, each carrying
/// the running total in `message.usage.output_tokens`. Only the last value per
/// (message id, request id) pair is summed; records missing either id count
/// on their own. Missing or unreadable files yield 0.
pub fn read_transcript_output_tokens(path: &Path, since: Option<DateTime<Utc>>) -> u64 {
    if !path.is_file() {
        return 0;
    }
    let Some(records) = read_records(path) else {
        return 0;
    };

    let mut last_by_request: HashMap<String, u64> = HashMap::new();
    let mut unkeyed: u64 = 0;

    for record in records {
        if record_type(&record) != Some("assistant") {
            continue;
        }
        if let Some(since) = since {
            match record_timestamp(&record) {
                Some(ts) if ts >= since => {}
                _ => continue,
            }
        }
        let Some(message) = record.get("message").filter(|m| m.is_object()) else {
            continue;
        };
        let output = message
            .get("usage")
            .and_then(|u| u.get("output_tokens"))
            .and_then(|n| n.as_u64())
            .unwrap_or(0);
        if output == 0 {
            continue;
        }
        let msg_id = message
            .get("id")
            .and_then(|s| s.as_str())
            .filter(|s| !s.is_empty());
        match (msg_id, request_id(&record)) {
            (Some(m), Some(r)) => {
                last_by_request.insert(format!("{m}:{r}"), output);
            }
            _ => unkeyed = unkeyed.saturating_add(output),
        }
    }

    last_by_request
        .values()
        .fold(unkeyed, |acc, &v| acc.saturating_add(v))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_records_counts_malformed_lines() {
        let body = "{\"type\":\"user\"}\n\nnot json\n[1,2]\n  {\"type\":\"assistant\"}  \n{\"broken\":";
        let (records, malformed) = parse_records(body.as_bytes());
        assert_eq!(records.len(), 2);
        assert_eq!(malformed, 3);
        assert_eq!(record_type(&records[1]), Some("assistant"));
    }

    #[test]
    fn test_parse_records_invalid_utf8_is_malformed() {
        let body: &[u8] = b"{\"type\":\"user\"}\n\xff\xfe\n";
        let (records, malformed) = parse_records(body);
        assert_eq!(records.len(), 1);
        assert_eq!(malformed, 1);
    }
}
