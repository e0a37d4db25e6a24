//! # Percentile Module
//!
//! P90 estimates over completed session blocks, used as dynamic limits when
//! enough history exists. Callers fall back to static plan limits on `None`.

use tracing::debug;

use crate::models::SessionBlock;

#[derive(Clone, Debug, PartialEq)]
pub struct P90Settings {
    /// Completed blocks required before an estimate is produced.
    pub min_sessions: usize,
    /// A block "hit" a tier when its output reaches this share of the tier limit.
    pub hit_threshold: f64,
    /// Known plan-tier output limits.
    pub tier_limits: Vec<u64>,
    /// Multiplier applied to the cost estimate.
    pub cost_buffer: f64,
    /// Floor for the token estimate.
    pub min_output_limit: u64,
    /// Floor for the cost estimate, in USD.
    pub min_cost_limit: f64,
}

impl Default for P90Settings {
    fn default() -> Self {
        Self {
            min_sessions: 5,
            hit_threshold: 0.95,
            tier_limits: vec![19_000, 88_000, 220_000, 880_000],
            cost_buffer: 1.2,
            min_output_limit: 19_000,
            min_cost_limit: 18.0,
        }
    }
}

/// 90th percentile by linear interpolation between order statistics at rank
/// `0.9 * (n - 1)`. `None` for an empty sample.
pub fn percentile_90(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut vs = values.to_vec();
    vs.sort_by(f64::total_cmp);
    let n = vs.len();
    let rank = 0.9 * (n - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = (lower + 1).min(n - 1);
    let frac = rank - lower as f64;
    Some(vs[lower] + frac * (vs[upper] - vs[lower]))
}

fn completed(blocks: &[SessionBlock]) -> Vec<&SessionBlock> {
    blocks.iter().filter(|b| b.is_completed()).collect()
}

/// Output-token P90, floored and clamped to `min_output_limit`.
///
/// Blocks that reached a known tier limit are preferred as the sample; when
/// none did, every block with output is used.
pub fn p90_output_limit(blocks: &[SessionBlock], settings: &P90Settings) -> Option<u64> {
    let done = completed(blocks);
    if done.len() < settings.min_sessions {
        debug!(
            completed = done.len(),
            required = settings.min_sessions,
            "not enough history for token P90"
        );
        return None;
    }

    let hit = |output: u64| {
        settings
            .tier_limits
            .iter()
            .any(|&lim| output as f64 >= lim as f64 * settings.hit_threshold)
    };
    let mut values: Vec<f64> = done
        .iter()
        .map(|b| b.tokens.output)
        .filter(|&o| hit(o))
        .map(|o| o as f64)
        .collect();
    if values.is_empty() {
        values = done
            .iter()
            .map(|b| b.tokens.output)
            .filter(|&o| o > 0)
            .map(|o| o as f64)
            .collect();
    }

    let min_limit = settings.min_output_limit;
    match percentile_90(&values) {
        Some(p90) => Some((p90.floor() as u64).max(min_limit)),
        None => Some(min_limit),
    }
}

/// Cost P90 scaled by the safety buffer and clamped to `min_cost_limit`.
pub fn p90_cost_limit(blocks: &[SessionBlock], settings: &P90Settings) -> Option<f64> {
    let done = completed(blocks);
    if done.len() < settings.min_sessions {
        debug!(
            completed = done.len(),
            required = settings.min_sessions,
            "not enough history for cost P90"
        );
        return None;
    }
    let costs: Vec<f64> = done.iter().map(|b| b.cost).filter(|&c| c > 0.0).collect();
    let p90 = percentile_90(&costs)?;
    Some((p90 * settings.cost_buffer).max(settings.min_cost_limit))
}
