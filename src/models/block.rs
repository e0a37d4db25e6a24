use crate::models::entry::UsageEvent;
use crate::models::limit::LimitSignal;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct TokenCounts {
    pub input: u64,
    pub output: u64,
    pub cache_create: u64,
    pub cache_read: u64,
}

impl TokenCounts {
    pub fn total(&self) -> u64 {
        self.input
            .saturating_add(self.output)
            .saturating_add(self.cache_create)
            .saturating_add(self.cache_read)
    }

    /// Counters saturate at `u64::MAX`.
    pub fn add_event(&mut self, e: &UsageEvent) {
        self.input = self.input.saturating_add(e.input);
        self.output = self.output.saturating_add(e.output);
        self.cache_create = self.cache_create.saturating_add(e.cache_create);
        self.cache_read = self.cache_read.saturating_add(e.cache_read);
    }
}

/// Coarse model-name classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelFamily {
    Opus,
    Sonnet,
    Haiku,
    Other,
}

impl ModelFamily {
    pub const ALL: [ModelFamily; 4] = [
        ModelFamily::Opus,
        ModelFamily::Sonnet,
        ModelFamily::Haiku,
        ModelFamily::Other,
    ];

    pub fn from_model(model_id: &str) -> Self {
        let m = model_id.to_lowercase();
        if m.contains("opus") {
            ModelFamily::Opus
        } else if m.contains("sonnet") {
            ModelFamily::Sonnet
        } else if m.contains("haiku") {
            ModelFamily::Haiku
        } else {
            ModelFamily::Other
        }
    }

    fn index(&self) -> usize {
        match self {
            ModelFamily::Opus => 0,
            ModelFamily::Sonnet => 1,
            ModelFamily::Haiku => 2,
            ModelFamily::Other => 3,
        }
    }
}

#[derive(Default, Clone, Debug, Serialize)]
pub struct FamilyStats {
    pub tokens: TokenCounts,
    pub cost: f64,
    pub events: usize,
}

/// Per-family sub-tallies of a block. Every family has a slot; a family that
/// never appeared has `events == 0`.
#[derive(Default, Clone, Debug)]
pub struct FamilyTallies([FamilyStats; 4]);

impl FamilyTallies {
    pub fn get(&self, family: ModelFamily) -> &FamilyStats {
        &self.0[family.index()]
    }

    pub fn add_event(&mut self, family: ModelFamily, e: &UsageEvent) {
        let stats = &mut self.0[family.index()];
        stats.tokens.add_event(e);
        stats.cost += e.cost;
        stats.events += 1;
    }

    /// Families that received at least one event.
    pub fn iter(&self) -> impl Iterator<Item = (ModelFamily, &FamilyStats)> {
        ModelFamily::ALL
            .into_iter()
            .map(|f| (f, self.get(f)))
            .filter(|(_, s)| s.events > 0)
    }
}

#[derive(Clone, Debug)]
pub struct SessionBlock {
    pub id: String,
    pub start: DateTime<Utc>,
    /// Nominal end: `start` plus the window duration (for gaps, the next event).
    pub end: DateTime<Utc>,
    /// Timestamp of the last contained event, set on finalization.
    pub actual_end: Option<DateTime<Utc>>,
    pub entries: Vec<UsageEvent>,
    pub tokens: TokenCounts,
    pub per_family: FamilyTallies,
    pub cost: f64,
    pub models: Vec<String>,
    pub event_count: usize,
    pub is_gap: bool,
    pub is_active: bool,
    pub limit_signals: Vec<LimitSignal>,
}

impl SessionBlock {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            id: start.to_rfc3339(),
            start,
            end,
            actual_end: None,
            entries: Vec::new(),
            tokens: TokenCounts::default(),
            per_family: FamilyTallies::default(),
            cost: 0.0,
            models: Vec::new(),
            event_count: 0,
            is_gap: false,
            is_active: false,
            limit_signals: Vec::new(),
        }
    }

    pub fn gap(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            id: format!("gap-{}", start.to_rfc3339()),
            is_gap: true,
            ..Self::new(start, end)
        }
    }

    /// Non-gap and no longer open.
    pub fn is_completed(&self) -> bool {
        !self.is_gap && !self.is_active
    }

    pub fn add_event(&mut self, e: UsageEvent) {
        self.tokens.add_event(&e);
        self.cost += e.cost;
        self.per_family
            .add_event(ModelFamily::from_model(&e.model), &e);
        if !e.model.is_empty() && !self.models.iter().any(|m| m == &e.model) {
            self.models.push(e.model.clone());
        }
        self.event_count += 1;
        self.entries.push(e);
    }

    pub fn finalize(&mut self) {
        self.actual_end = self.entries.last().map(|e| e.ts);
        self.event_count = self.entries.len();
    }

    /// Earliest attached signal carrying a reset instant, if any.
    pub fn signal_reset(&self) -> Option<DateTime<Utc>> {
        self.limit_signals
            .iter()
            .filter(|s| s.reset_at.is_some())
            .min_by_key(|s| s.ts)
            .and_then(|s| s.reset_at)
    }

    /// Reset instant to display: a signalled reset overrides the nominal end.
    pub fn effective_reset(&self) -> DateTime<Utc> {
        self.signal_reset().unwrap_or(self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LimitKind;
    use chrono::{TimeDelta, TimeZone};

    #[test]
    fn test_family_from_model() {
        assert_eq!(ModelFamily::from_model("claude-opus-4-1"), ModelFamily::Opus);
        assert_eq!(ModelFamily::from_model("Claude-Sonnet-4-5"), ModelFamily::Sonnet);
        assert_eq!(ModelFamily::from_model("claude-3-5-haiku"), ModelFamily::Haiku);
        assert_eq!(ModelFamily::from_model(""), ModelFamily::Other);
    }

    #[test]
    fn test_earliest_signal_reset_wins() {
        let start = Utc.with_ymd_and_hms(2025, 6, 10, 10, 0, 0).unwrap();
        let mut block = SessionBlock::new(start, start + TimeDelta::hours(5));
        let signal = |mins: i64, reset: Option<i64>| LimitSignal {
            kind: LimitKind::SystemLimit,
            ts: start + TimeDelta::minutes(mins),
            content: "limit".into(),
            reset_at: reset.map(|r| start + TimeDelta::minutes(r)),
            wait_minutes: None,
        };
        block.limit_signals = vec![signal(90, Some(150)), signal(10, None), signal(30, Some(200))];
        assert_eq!(block.signal_reset(), Some(start + TimeDelta::minutes(200)));
        assert_eq!(block.effective_reset(), start + TimeDelta::minutes(200));

        block.limit_signals.clear();
        assert_eq!(block.effective_reset(), block.end);
    }
}
