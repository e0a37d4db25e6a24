use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::block::{SessionBlock, TokenCounts};
use crate::models::limit::LimitSignal;
use crate::utils::format_remaining;

/// Either a token pair or a money pair, flattened into the entry on output.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QuotaAmount {
    Tokens { used: u64, total: u64 },
    Spend { spent: f64, limit: f64 },
}

/// A display-ready summary row.
#[derive(Clone, Debug, Serialize)]
pub struct QuotaEntry {
    pub label: String,
    /// 0-100, one decimal.
    pub pct: f64,
    #[serde(flatten)]
    pub amount: QuotaAmount,
    /// e.g. "9pm", "tmrw 4am", "Feb 19 at 4am"
    pub reset_label: String,
    pub reset_at: Option<DateTime<Utc>>,
    /// Remaining time at computation; renderers should call [`QuotaEntry::remaining_at`].
    pub remaining: String,
}

impl QuotaEntry {
    pub fn remaining_at(&self, now: DateTime<Utc>) -> String {
        self.reset_at
            .map(|r| format_remaining(r, now))
            .unwrap_or_default()
    }
}

/// P90-derived limits; `None` means not enough history.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct DynamicLimits {
    pub output_tokens: Option<u64>,
    pub cost_usd: Option<f64>,
}

/// The active session block, without its events.
#[derive(Clone, Debug, Serialize)]
pub struct ActiveBlockInfo {
    pub id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub tokens: TokenCounts,
    pub total_tokens: u64,
    pub cost: f64,
    pub models: Vec<String>,
    pub event_count: usize,
}

impl From<&SessionBlock> for ActiveBlockInfo {
    fn from(b: &SessionBlock) -> Self {
        Self {
            id: b.id.clone(),
            start: b.start,
            end: b.end,
            tokens: b.tokens,
            total_tokens: b.tokens.total(),
            cost: b.cost,
            models: b.models.clone(),
            event_count: b.event_count,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct QuotaReport {
    /// Session, weekly (all), weekly (Sonnet), monthly spend; always four rows.
    pub entries: Vec<QuotaEntry>,
    pub dynamic_limits: DynamicLimits,
    pub active_block_signals: Vec<LimitSignal>,
    /// Blocks in the scanned range, gaps included.
    pub block_count: usize,
    pub active_block: Option<ActiveBlockInfo>,
}
