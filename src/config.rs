//! # Config Module
//!
//! Everything the quota computation needs, passed in explicitly. The core
//! never reads the environment; the binary builds a [`QuotaConfig`] from
//! its (env-backed) command-line arguments.

use chrono::TimeDelta;
use std::path::PathBuf;

use crate::cli::{Args, PlanTypeArg, SessionLimitArg};
use crate::percentile::P90Settings;
use crate::pricing::PricingTable;
use crate::utils::{DEFAULT_LOOKBACK_HOURS, WINDOW_DURATION_HOURS};

/// Per-window output limit and spending cap of a subscription plan.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlanLimits {
    pub display: &'static str,
    pub output_limit: u64,
    pub cost_limit: f64,
}

pub const PRO: PlanLimits = PlanLimits {
    display: "Pro",
    output_limit: 19_000,
    cost_limit: 18.0,
};

pub const MAX5: PlanLimits = PlanLimits {
    display: "Max 5x",
    output_limit: 88_000,
    cost_limit: 35.0,
};

pub const MAX20: PlanLimits = PlanLimits {
    display: "Max 20x",
    output_limit: 220_000,
    cost_limit: 140.0,
};

/// Which limit the session row is measured against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionLimitMode {
    /// The plan's static output limit.
    #[default]
    Static,
    /// The token P90 of past blocks, falling back to the static limit.
    P90,
}

#[derive(Clone, Debug)]
pub struct QuotaConfig {
    /// `projects` directories to scan.
    pub candidate_dirs: Vec<PathBuf>,
    /// Transcript of the in-progress session, when known.
    pub transcript_path: Option<PathBuf>,
    pub plan: PlanLimits,
    pub session_limit: SessionLimitMode,
    pub weekly_output_limit: u64,
    pub weekly_sonnet_limit: u64,
    /// Monthly extra-usage cap in USD.
    pub monthly_spend_limit: f64,
    pub pricing: PricingTable,
    pub p90: P90Settings,
    pub window_hours: i64,
    pub lookback_hours: Option<i64>,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            candidate_dirs: Vec::new(),
            transcript_path: None,
            plan: MAX5,
            session_limit: SessionLimitMode::Static,
            weekly_output_limit: 300_000,
            weekly_sonnet_limit: 1_000_000,
            monthly_spend_limit: 50.0,
            pricing: PricingTable::default(),
            p90: P90Settings::default(),
            window_hours: WINDOW_DURATION_HOURS,
            lookback_hours: Some(DEFAULT_LOOKBACK_HOURS),
        }
    }
}

impl QuotaConfig {
    pub fn window(&self) -> TimeDelta {
        TimeDelta::hours(self.window_hours)
    }

    /// Resolve from parsed arguments. Directory discovery and the transcript
    /// lookup are left to the caller.
    pub fn from_args(args: &Args) -> Self {
        let plan = match args.plan_type {
            PlanTypeArg::Pro => PRO,
            PlanTypeArg::Max5 => MAX5,
            PlanTypeArg::Max20 => MAX20,
        };
        let session_limit = match args.session_limit {
            SessionLimitArg::Static => SessionLimitMode::Static,
            SessionLimitArg::P90 => SessionLimitMode::P90,
        };
        Self {
            plan,
            session_limit,
            weekly_output_limit: args.weekly_output_limit,
            weekly_sonnet_limit: args.weekly_sonnet_limit,
            monthly_spend_limit: args.extra_usage_limit.max(0.0),
            window_hours: args.window_hours.max(1),
            lookback_hours: (args.lookback_hours > 0).then_some(args.lookback_hours),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = QuotaConfig::default();
        assert_eq!(c.plan.output_limit, 88_000);
        assert_eq!(c.weekly_output_limit, 300_000);
        assert_eq!(c.weekly_sonnet_limit, 1_000_000);
        assert_eq!(c.monthly_spend_limit, 50.0);
        assert_eq!(c.window(), TimeDelta::hours(5));
        assert_eq!(c.lookback_hours, Some(96));
        assert_eq!(c.p90.min_sessions, 5);
    }
}
