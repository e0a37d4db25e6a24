use chrono::{TimeZone, Utc};
use serde_json::Value;

use claude_quota::config::QuotaConfig;
use claude_quota::display::build_json_output;
use claude_quota::models::UsageEvent;
use claude_quota::quota::summarize;

#[test]
fn json_output_shape_minimal() {
    let now = Utc.with_ymd_and_hms(2026, 2, 18, 12, 0, 0).unwrap();
    let events = vec![UsageEvent {
        ts: Utc.with_ymd_and_hms(2026, 2, 18, 10, 30, 0).unwrap(),
        input: 90_000,
        output: 10_000,
        cache_create: 20_000,
        cache_read: 13_456,
        cost: 1.234,
        model: "claude-sonnet-4-5".into(),
        key: Some("msg_1:req_1".into()),
    }];
    let report = summarize(&QuotaConfig::default(), &events, &[], &now);
    let json: Value = build_json_output(&report, now);

    assert_eq!(json["generated_at"], "2026-02-18T12:00:00+00:00");
    let entries = json["entries"].as_array().expect("entries array");
    assert_eq!(entries.len(), 4);

    for e in entries {
        assert!(e["label"].is_string());
        assert!(e["pct"].is_number());
        assert!(e["reset_label"].is_string());
        assert!(e["remaining"].is_string());
    }

    let session = &entries[0];
    assert_eq!(session["label"], "Session");
    assert_eq!(session["used"], 0);
    assert_eq!(session["total"], 88_000);
    assert_eq!(session["reset_label"], "3pm");
    assert_eq!(session["remaining"], "3h00m");

    let week = &entries[1];
    assert_eq!(week["used"], 10_000);
    assert_eq!(week["total"], 300_000);

    let extra = &entries[3];
    assert_eq!(extra["spent"], 1.23);
    assert_eq!(extra["limit"], 50.0);
    assert!(extra.get("used").is_none());

    assert!(json["dynamic_limits"]["output_tokens"].is_null());
    assert!(json["dynamic_limits"]["cost_usd"].is_null());
    assert_eq!(json["active_block_signals"], Value::Array(vec![]));
}
