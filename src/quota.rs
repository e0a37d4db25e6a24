//! # Quota Module
//!
//! Combines the usage scan, the session windows and the limit signals into
//! the four statusline rows: current session, current week (all models),
//! current week (Sonnet) and monthly extra-usage spend.
//!
//! Reset labels and remaining-time strings come from `utils`. Calendar
//! boundaries are computed in the caller's timezone. [`compute_quota`]
//! uses the system local zone; [`compute_quota_in`] takes any `TimeZone` so the
//! clock and zone can be fixed in tests.

use chrono::{
    DateTime, Datelike, Local, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta,
    TimeZone, Timelike, Utc,
};
use serde_json::Value;
use std::fmt::Display;
use tracing::debug;

use crate::config::{QuotaConfig, SessionLimitMode};
use crate::limits::detect_limits;
use crate::models::{
    ActiveBlockInfo, DynamicLimits, ModelFamily, QuotaAmount, QuotaEntry, QuotaReport,
    SessionBlock, UsageEvent,
};
use crate::percentile::{p90_cost_limit, p90_output_limit};
use crate::usage::{ScanOptions, read_transcript_output_tokens, scan_usage};
use crate::utils::{format_remaining, format_reset_label, round1, round2};
use crate::window::{active_block, attach_limits, identify_blocks};

/// Weekly limits reset on Monday at this local hour.
pub const WEEKLY_RESET_HOUR: u32 = 4;

pub const SESSION_LABEL: &str = "Session";
pub const WEEK_LABEL: &str = "Current week";
pub const WEEK_SONNET_LABEL: &str = "Week (Sonnet)";
pub const EXTRA_USAGE_LABEL: &str = "Extra usage";

/// Scan the configured directories and summarize, using the system timezone.
pub fn compute_quota(config: &QuotaConfig, now: DateTime<Utc>) -> QuotaReport {
    compute_quota_in(config, &now.with_timezone(&Local))
}

/// [`compute_quota`] with an explicit zone for calendar boundaries.
pub fn compute_quota_in<Tz>(config: &QuotaConfig, now: &DateTime<Tz>) -> QuotaReport
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let opts = ScanOptions {
        lookback_hours: config.lookback_hours,
        include_raw: true,
    };
    let scan = scan_usage(
        &config.candidate_dirs,
        &opts,
        &config.pricing,
        now.with_timezone(&Utc),
    );
    let raw = scan.raw.unwrap_or_default();
    summarize(config, &scan.events, &raw, now)
}

/// Build the report from already scanned events and raw records.
pub fn summarize<Tz>(
    config: &QuotaConfig,
    events: &[UsageEvent],
    raw: &[Value],
    now: &DateTime<Tz>,
) -> QuotaReport
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let now_utc = now.with_timezone(&Utc);
    let mut blocks = identify_blocks(events, config.window(), now_utc);
    let signals = detect_limits(raw);
    attach_limits(&mut blocks, &signals);

    let dynamic_limits = DynamicLimits {
        output_tokens: p90_output_limit(&blocks, &config.p90),
        cost_usd: p90_cost_limit(&blocks, &config.p90),
    };
    let active = active_block(&blocks);

    let mut entries = Vec::with_capacity(4);
    entries.push(session_entry(config, active, &dynamic_limits, now));
    entries.extend(weekly_entries(config, events, now));
    entries.push(monthly_entry(config, events, now));

    debug!(
        blocks = blocks.len(),
        signals = signals.len(),
        active = active.map(|b| b.id.as_str()).unwrap_or("-"),
        "quota computed"
    );

    QuotaReport {
        entries,
        dynamic_limits,
        active_block_signals: active.map(|b| b.limit_signals.clone()).unwrap_or_default(),
        block_count: blocks.len(),
        active_block: active.map(ActiveBlockInfo::from),
    }
}

fn pct(used: f64, total: f64) -> f64 {
    if total > 0.0 {
        round1(used / total * 100.0)
    } else {
        0.0
    }
}

fn token_entry<Tz>(
    label: &str,
    used: u64,
    total: u64,
    reset: Option<DateTime<Utc>>,
    now: &DateTime<Tz>,
) -> QuotaEntry
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let now_utc = now.with_timezone(&Utc);
    QuotaEntry {
        label: label.to_string(),
        pct: pct(used as f64, total as f64),
        amount: QuotaAmount::Tokens { used, total },
        reset_label: reset
            .map(|r| format_reset_label(r, now))
            .unwrap_or_default(),
        reset_at: reset,
        remaining: reset
            .map(|r| format_remaining(r, now_utc))
            .unwrap_or_default(),
    }
}

fn session_entry<Tz>(
    config: &QuotaConfig,
    active: Option<&SessionBlock>,
    dynamic: &DynamicLimits,
    now: &DateTime<Tz>,
) -> QuotaEntry
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let limit = match config.session_limit {
        SessionLimitMode::Static => config.plan.output_limit,
        SessionLimitMode::P90 => dynamic.output_tokens.unwrap_or(config.plan.output_limit),
    };
    let used = config
        .transcript_path
        .as_deref()
        .map(|p| read_transcript_output_tokens(p, active.map(|b| b.start)))
        .unwrap_or(0);
    let reset = active.map(SessionBlock::effective_reset);
    token_entry(SESSION_LABEL, used, limit, reset, now)
}

fn weekly_entries<Tz>(
    config: &QuotaConfig,
    events: &[UsageEvent],
    now: &DateTime<Tz>,
) -> [QuotaEntry; 2]
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let since = last_weekly_reset(now).with_timezone(&Utc);
    let reset = next_weekly_reset(now).with_timezone(&Utc);

    let (mut all, mut sonnet) = (0u64, 0u64);
    for e in events.iter().filter(|e| e.ts >= since) {
        all = all.saturating_add(e.output);
        if ModelFamily::from_model(&e.model) == ModelFamily::Sonnet {
            sonnet = sonnet.saturating_add(e.output);
        }
    }

    [
        token_entry(WEEK_LABEL, all, config.weekly_output_limit, Some(reset), now),
        token_entry(
            WEEK_SONNET_LABEL,
            sonnet,
            config.weekly_sonnet_limit,
            Some(reset),
            now,
        ),
    ]
}

fn monthly_entry<Tz>(config: &QuotaConfig, events: &[UsageEvent], now: &DateTime<Tz>) -> QuotaEntry
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let since = month_start(now).with_timezone(&Utc);
    let reset = next_month_start(now).with_timezone(&Utc);
    let spent: f64 = events.iter().filter(|e| e.ts >= since).map(|e| e.cost).sum();
    let limit = config.monthly_spend_limit;

    QuotaEntry {
        label: EXTRA_USAGE_LABEL.to_string(),
        pct: pct(spent, limit),
        amount: QuotaAmount::Spend {
            spent: round2(spent),
            limit,
        },
        reset_label: format_reset_label(reset, now),
        reset_at: Some(reset),
        remaining: format_remaining(reset, now.with_timezone(&Utc)),
    }
}

/// Resolve a wall-clock time in `tz`. Ambiguous times take the earlier
/// instant; times inside a DST gap are pushed forward by an hour.
fn resolve_local<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> DateTime<Tz> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => tz
            .from_local_datetime(&(naive + TimeDelta::hours(1)))
            .earliest()
            .unwrap_or_else(|| tz.from_utc_datetime(&naive)),
    }
}

fn at_hour(date: NaiveDate, hour: u32) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN) + TimeDelta::hours(i64::from(hour))
}

/// Most recent Monday 04:00 at or before `now`. Before 04:00 on a Monday
/// that is the previous week's Monday.
pub fn last_weekly_reset<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Tz> {
    let mut days_back = i64::from(now.weekday().num_days_from_monday());
    if days_back == 0 && now.hour() < WEEKLY_RESET_HOUR {
        days_back = 7;
    }
    let date = now.date_naive() - TimeDelta::days(days_back);
    resolve_local(&now.timezone(), at_hour(date, WEEKLY_RESET_HOUR))
}

/// Next Monday 04:00 strictly after `now`.
pub fn next_weekly_reset<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Tz> {
    let mut days_ahead = (7 - i64::from(now.weekday().num_days_from_monday())) % 7;
    if days_ahead == 0 && now.hour() >= WEEKLY_RESET_HOUR {
        days_ahead = 7;
    }
    let date = now.date_naive() + TimeDelta::days(days_ahead);
    resolve_local(&now.timezone(), at_hour(date, WEEKLY_RESET_HOUR))
}

/// Local midnight on the first of the current month.
pub fn month_start<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Tz> {
    let first = NaiveDate::from_ymd_opt(now.year(), now.month(), 1).unwrap_or(now.date_naive());
    resolve_local(&now.timezone(), at_hour(first, 0))
}

/// Local midnight on the first of the following month.
pub fn next_month_start<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Tz> {
    let (year, month) = if now.month() == 12 {
        (now.year() + 1, 1)
    } else {
        (now.year(), now.month() + 1)
    };
    let first = NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(now.date_naive());
    resolve_local(&now.timezone(), at_hour(first, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Weekday};

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn test_weekly_reset_midweek() {
        // Wednesday
        let now = utc(2026, 2, 18, 12, 0);
        let last = last_weekly_reset(&now);
        let next = next_weekly_reset(&now);
        assert_eq!(last, utc(2026, 2, 16, 4, 0));
        assert_eq!(next, utc(2026, 2, 23, 4, 0));
        assert_eq!(last.weekday(), Weekday::Mon);
        assert_eq!(next - last, TimeDelta::days(7));
    }

    #[test]
    fn test_weekly_reset_monday_boundary() {
        let early = utc(2026, 2, 16, 3, 59);
        assert_eq!(last_weekly_reset(&early), utc(2026, 2, 9, 4, 0));
        assert_eq!(next_weekly_reset(&early), utc(2026, 2, 16, 4, 0));

        let after = utc(2026, 2, 16, 4, 0);
        assert_eq!(last_weekly_reset(&after), utc(2026, 2, 16, 4, 0));
        assert_eq!(next_weekly_reset(&after), utc(2026, 2, 23, 4, 0));
    }

    #[test]
    fn test_weekly_reset_uses_local_zone() {
        let tz = FixedOffset::west_opt(5 * 3600).unwrap();
        let now = tz.with_ymd_and_hms(2026, 2, 18, 12, 0, 0).unwrap();
        assert_eq!(
            last_weekly_reset(&now).with_timezone(&Utc),
            utc(2026, 2, 16, 9, 0)
        );
    }

    #[test]
    fn test_month_bounds() {
        let now = utc(2026, 2, 18, 12, 0);
        assert_eq!(month_start(&now), utc(2026, 2, 1, 0, 0));
        assert_eq!(next_month_start(&now), utc(2026, 3, 1, 0, 0));

        let december = utc(2026, 12, 31, 23, 0);
        assert_eq!(month_start(&december), utc(2026, 12, 1, 0, 0));
        assert_eq!(next_month_start(&december), utc(2027, 1, 1, 0, 0));
    }

    #[test]
    fn test_pct_zero_limit() {
        assert_eq!(pct(10.0, 0.0), 0.0);
        assert_eq!(pct(1.0, 3.0), 33.3);
    }
}
