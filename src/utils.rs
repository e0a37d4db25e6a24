use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc};
use std::collections::HashSet;
use std::fmt::Display;
use std::path::{Path, PathBuf};

pub const WINDOW_DURATION_HOURS: i64 = 5;
pub const DEFAULT_LOOKBACK_HOURS: i64 = 96;
pub const DEFAULT_HOOK_JSON: &str = "/tmp/claude_statusline_debug.json";

/// Candidate `projects` directories, in discovery order:
/// 1. `config_dir` (a `.claude` dir gets `/projects`, anything else `/.claude/projects`)
/// 2. `~/.claude/projects`
/// 3. `~/.config/claude/projects` (XDG config dir)
///
/// Duplicates (by canonical path) and non-existing directories are dropped.
pub fn claude_paths(config_dir: Option<&str>) -> Vec<PathBuf> {
    let mut candidates: Vec<PathBuf> = Vec::new();
    if let Some(dir) = config_dir.map(str::trim).filter(|d| !d.is_empty()) {
        candidates.push(projects_dir_for(Path::new(dir)));
    }
    let basedirs = directories::BaseDirs::new();
    if let Some(b) = basedirs.as_ref() {
        candidates.push(b.home_dir().join(".claude").join("projects"));
        candidates.push(b.config_dir().join("claude").join("projects"));
    }
    dedup_existing_dirs(candidates)
}

fn projects_dir_for(dir: &Path) -> PathBuf {
    if dir.file_name().is_some_and(|n| n == ".claude") {
        dir.join("projects")
    } else {
        dir.join(".claude").join("projects")
    }
}

/// Keep the first occurrence of each existing directory, comparing canonical paths.
pub fn dedup_existing_dirs(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut seen: HashSet<PathBuf> = HashSet::new();
    paths
        .into_iter()
        .filter(|p| p.is_dir())
        .filter(|p| seen.insert(std::fs::canonicalize(p).unwrap_or_else(|_| p.clone())))
        .collect()
}

/// 785 → "785", 8785 → "8.8k", 88000 → "88k", 1000000 → "1M"
pub fn format_tokens(n: u64) -> String {
    if n < 1_000 {
        return n.to_string();
    }
    let (v, unit) = if n >= 1_000_000 {
        (n as f64 / 1e6, "M")
    } else {
        (n as f64 / 1e3, "k")
    };
    if v.fract() == 0.0 {
        format!("{v:.0}{unit}")
    } else {
        format!("{v:.1}{unit}")
    }
}

pub fn format_currency(v: f64) -> String {
    format!("{v:.2}")
}

/// Round to one decimal place.
pub fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// "9pm", "11:30pm", "tmrw 4am" or "Feb 19 at 4am", in the zone of `now`.
pub fn format_reset_label<Tz>(reset: DateTime<Utc>, now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let local = reset.with_timezone(&now.timezone());
    let hour12 = match local.hour() % 12 {
        0 => 12,
        h => h,
    };
    let meridiem = if local.hour() < 12 { "am" } else { "pm" };
    let time = if local.minute() == 0 {
        format!("{hour12}{meridiem}")
    } else {
        format!("{hour12}:{:02}{meridiem}", local.minute())
    };

    let today = now.date_naive();
    let day = local.date_naive();
    if day == today {
        time
    } else if today.succ_opt() == Some(day) {
        format!("tmrw {time}")
    } else {
        format!("{} {} at {time}", local.format("%b"), local.day())
    }
}

/// "2d3h", "4h07m", "12m"; empty once `reset` has passed.
pub fn format_remaining(reset: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (reset - now).num_seconds();
    if secs <= 0 {
        return String::new();
    }
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3_600;
    let minutes = (secs % 3_600) / 60;
    if days > 0 {
        format!("{days}d{hours}h")
    } else if hours > 0 {
        format!("{hours}h{minutes:02}m")
    } else {
        format!("{minutes}m")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_tokens() {
        assert_eq!(format_tokens(785), "785");
        assert_eq!(format_tokens(8_785), "8.8k");
        assert_eq!(format_tokens(88_000), "88k");
        assert_eq!(format_tokens(1_000_000), "1M");
        assert_eq!(format_tokens(1_500_000), "1.5M");
    }

    #[test]
    fn test_projects_dir_for() {
        assert_eq!(
            projects_dir_for(Path::new("/home/u/.claude")),
            PathBuf::from("/home/u/.claude/projects")
        );
        assert_eq!(
            projects_dir_for(Path::new("/srv/alt")),
            PathBuf::from("/srv/alt/.claude/projects")
        );
    }

    #[test]
    fn test_dedup_existing_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let a = tmp.path().join("a");
        std::fs::create_dir(&a).unwrap();
        let dotted = tmp.path().join("a").join(".");
        let missing = tmp.path().join("missing");
        let out = dedup_existing_dirs(vec![a.clone(), dotted, missing]);
        assert_eq!(out, vec![a]);
    }

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn test_reset_labels() {
        let now = utc(2026, 2, 18, 12, 0);
        assert_eq!(format_reset_label(utc(2026, 2, 18, 21, 0), &now), "9pm");
        assert_eq!(format_reset_label(utc(2026, 2, 18, 23, 30), &now), "11:30pm");
        assert_eq!(format_reset_label(utc(2026, 2, 19, 0, 0), &now), "tmrw 12am");
        assert_eq!(format_reset_label(utc(2026, 2, 23, 4, 0), &now), "Feb 23 at 4am");
        assert_eq!(format_reset_label(utc(2026, 2, 18, 12, 5), &now), "12:05pm");
    }

    #[test]
    fn test_reset_label_in_local_zone() {
        let tz = chrono::FixedOffset::east_opt(9 * 3600).unwrap();
        let now = tz.with_ymd_and_hms(2026, 2, 18, 20, 0, 0).unwrap();
        // 16:00 UTC is 01:00 the next day at +09:00
        assert_eq!(format_reset_label(utc(2026, 2, 18, 16, 0), &now), "tmrw 1am");
    }

    #[test]
    fn test_format_remaining() {
        let now = utc(2026, 2, 18, 12, 0);
        assert_eq!(format_remaining(utc(2026, 2, 20, 15, 0), now), "2d3h");
        assert_eq!(format_remaining(utc(2026, 2, 18, 16, 7), now), "4h07m");
        assert_eq!(format_remaining(utc(2026, 2, 18, 12, 12), now), "12m");
        assert_eq!(format_remaining(now, now), "");
        assert_eq!(format_remaining(utc(2026, 2, 18, 11, 0), now), "");
    }

    #[test]
    fn test_rounding() {
        assert_eq!(round1(12.345), 12.3);
        assert_eq!(round2(22.7149), 22.71);
    }
}
