use chrono::{DateTime, Utc};
use std::env;

#[cfg(feature = "colors")]
use owo_colors::OwoColorize;

// Provide a no-op color shim when "colors" feature is disabled
#[cfg(not(feature = "colors"))]
pub mod color_shim {
    use std::fmt::{self, Display, Formatter};

    #[derive(Clone)]
    pub struct Plain(pub String);

    impl Display for Plain {
        fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
            f.write_str(&self.0)
        }
    }

    pub trait ColorizeShim {
        fn as_str(&self) -> &str;

        fn bright_black(&self) -> Plain {
            Plain(self.as_str().to_string())
        }
        fn red(&self) -> Plain {
            Plain(self.as_str().to_string())
        }
        fn yellow(&self) -> Plain {
            Plain(self.as_str().to_string())
        }
        fn green(&self) -> Plain {
            Plain(self.as_str().to_string())
        }
        fn bold(&self) -> Plain {
            Plain(self.as_str().to_string())
        }
        fn dimmed(&self) -> Plain {
            Plain(self.as_str().to_string())
        }
    }

    impl ColorizeShim for &str {
        fn as_str(&self) -> &str {
            self
        }
    }
    impl ColorizeShim for String {
        fn as_str(&self) -> &str {
            self.as_str()
        }
    }
    impl ColorizeShim for Plain {
        fn as_str(&self) -> &str {
            &self.0
        }
    }
}

#[cfg(not(feature = "colors"))]
use color_shim::ColorizeShim as OwoColorize;

use crate::models::{QuotaAmount, QuotaEntry, QuotaReport};
use crate::utils::{format_currency, format_tokens};

fn colors_enabled() -> bool {
    env::var("NO_COLOR").is_err()
}

fn colorize_percent(pct: f64) -> String {
    let s = format!("{pct:.1}%");
    if !colors_enabled() {
        return s;
    }
    if pct >= 95.0 {
        s.red().bold().to_string()
    } else if pct >= 80.0 {
        s.yellow().bold().to_string()
    } else {
        s.green().to_string()
    }
}

fn amount_text(amount: &QuotaAmount) -> String {
    match *amount {
        QuotaAmount::Tokens { used, total } => {
            format!("{}/{}", format_tokens(used), format_tokens(total))
        }
        QuotaAmount::Spend { spent, limit } => {
            format!("${}/${}", format_currency(spent), format_currency(limit))
        }
    }
}

/// One statusline row, e.g. `Session 45.2% 39.8k/88k Resets 9pm [2h15m]`.
pub fn format_entry_line(entry: &QuotaEntry, now: DateTime<Utc>) -> String {
    let mut line = format!(
        "{} {} {}",
        entry.label,
        colorize_percent(entry.pct),
        amount_text(&entry.amount)
    );
    if !entry.reset_label.is_empty() {
        line.push_str(&format!(" Resets {}", entry.reset_label));
    }
    let remaining = entry.remaining_at(now);
    if !remaining.is_empty() {
        let tag = format!("[{remaining}]");
        if colors_enabled() {
            line.push_str(&format!(" {}", tag.dimmed()));
        } else {
            line.push_str(&format!(" {tag}"));
        }
    }
    line
}

pub fn print_text_output(report: &QuotaReport, now: DateTime<Utc>) {
    for entry in &report.entries {
        println!("{}", format_entry_line(entry, now));
    }
}

/// The report as JSON, with `remaining` recomputed against `now`.
pub fn build_json_output(report: &QuotaReport, now: DateTime<Utc>) -> serde_json::Value {
    let entries: Vec<serde_json::Value> = report
        .entries
        .iter()
        .map(|e| {
            let mut v = serde_json::to_value(e).unwrap_or_default();
            if let Some(obj) = v.as_object_mut() {
                obj.insert("remaining".into(), e.remaining_at(now).into());
            }
            v
        })
        .collect();

    serde_json::json!({
        "generated_at": now.to_rfc3339(),
        "entries": entries,
        "dynamic_limits": report.dynamic_limits,
        "active_block_signals": report.active_block_signals,
        "block_count": report.block_count,
        "active_block": report.active_block,
    })
}

pub fn print_json_output(report: &QuotaReport, now: DateTime<Utc>) -> anyhow::Result<()> {
    let json = build_json_output(report, now);
    println!("{}", serde_json::to_string(&json)?);
    Ok(())
}

/// Diagnostic summary for `--debug`, written to stderr.
pub fn print_debug_summary(report: &QuotaReport) {
    eprintln!();
    eprintln!("{}", "=== Debug Information ===".bright_black());
    eprintln!("Blocks: {}", report.block_count);
    match report.active_block.as_ref() {
        Some(b) => eprintln!(
            "Active block: {} - {} ({} events, {} tokens, ${}, models: {})",
            b.start.format("%Y-%m-%d %H:%M UTC"),
            b.end.format("%H:%M UTC"),
            b.event_count,
            format_tokens(b.total_tokens),
            format_currency(b.cost),
            if b.models.is_empty() { "-".to_string() } else { b.models.join(", ") }
        ),
        None => eprintln!("Active block: none"),
    }
    eprintln!(
        "P90 limits: tokens={}, cost={}",
        report
            .dynamic_limits
            .output_tokens
            .map(format_tokens)
            .unwrap_or_else(|| "n/a".into()),
        report
            .dynamic_limits
            .cost_usd
            .map(|c| format!("${}", format_currency(c)))
            .unwrap_or_else(|| "n/a".into())
    );
    if report.active_block_signals.is_empty() {
        eprintln!("Limit signals: none in active block");
    }
    for s in &report.active_block_signals {
        eprintln!(
            "Limit signal: {:?} at {} (reset: {:?}, wait: {:?}m)",
            s.kind,
            s.ts.format("%Y-%m-%d %H:%M:%S UTC"),
            s.reset_at.map(|r| r.format("%Y-%m-%d %H:%M:%S UTC").to_string()),
            s.wait_minutes
        );
    }
    eprintln!("{}", "========================".bright_black());
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry(amount: QuotaAmount, reset_at: Option<DateTime<Utc>>) -> QuotaEntry {
        QuotaEntry {
            label: "Session".into(),
            pct: 45.2,
            amount,
            reset_label: if reset_at.is_some() { "9pm".into() } else { String::new() },
            reset_at,
            remaining: String::new(),
        }
    }

    #[test]
    fn test_amount_text() {
        assert_eq!(
            amount_text(&QuotaAmount::Tokens {
                used: 39_800,
                total: 88_000
            }),
            "39.8k/88k"
        );
        assert_eq!(
            amount_text(&QuotaAmount::Spend {
                spent: 22.71,
                limit: 50.0
            }),
            "$22.71/$50.00"
        );
    }

    #[test]
    #[serial_test::serial]
    fn test_entry_line_plain() {
        unsafe {
            env::set_var("NO_COLOR", "1");
        }
        let now = Utc.with_ymd_and_hms(2026, 2, 18, 18, 45, 0).unwrap();
        let reset = Utc.with_ymd_and_hms(2026, 2, 18, 21, 0, 0).unwrap();
        let e = entry(
            QuotaAmount::Tokens {
                used: 39_800,
                total: 88_000,
            },
            Some(reset),
        );
        assert_eq!(
            format_entry_line(&e, now),
            "Session 45.2% 39.8k/88k Resets 9pm [2h15m]"
        );

        let idle = entry(QuotaAmount::Tokens { used: 0, total: 88_000 }, None);
        assert_eq!(format_entry_line(&idle, now), "Session 45.2% 0/88k");
        unsafe {
            env::remove_var("NO_COLOR");
        }
    }

    #[test]
    fn test_json_recomputes_remaining() {
        let now = Utc.with_ymd_and_hms(2026, 2, 18, 20, 0, 0).unwrap();
        let reset = Utc.with_ymd_and_hms(2026, 2, 18, 21, 0, 0).unwrap();
        let report = QuotaReport {
            entries: vec![entry(
                QuotaAmount::Tokens {
                    used: 10,
                    total: 100,
                },
                Some(reset),
            )],
            dynamic_limits: Default::default(),
            active_block_signals: Vec::new(),
            block_count: 0,
            active_block: None,
        };
        let v = build_json_output(&report, now);
        assert_eq!(v["entries"][0]["remaining"], "1h00m");
        assert_eq!(v["entries"][0]["used"], 10);
        assert_eq!(v["entries"][0]["total"], 100);
        assert!(v["dynamic_limits"]["output_tokens"].is_null());
    }
}
