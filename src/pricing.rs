//! # Pricing Module
//!
//! Per-family rates used to estimate cost when a log record carries none.
//!
//! ## Pricing Structure
//!
//! Each family has a rate (USD per million tokens) for:
//! - Input tokens
//! - Output tokens
//! - Cache creation
//!
//! Cache reads are not billed by the estimate.
//!
//! Estimation applies one flat profile (Sonnet by default) to every record,
//! whatever its model tag.

use crate::models::{ModelFamily, TokenCounts};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pricing {
    pub input_per_m: f64,
    pub output_per_m: f64,
    pub cache_create_per_m: f64,
}

impl Pricing {
    pub fn cost(&self, tokens: &TokenCounts) -> f64 {
        ((tokens.input as f64) * self.input_per_m
            + (tokens.output as f64) * self.output_per_m
            + (tokens.cache_create as f64) * self.cache_create_per_m)
            / 1_000_000.0
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PricingTable {
    pub opus: Pricing,
    pub sonnet: Pricing,
    pub haiku: Pricing,
    /// Family whose rates are applied to every record.
    pub estimation_family: ModelFamily,
}

impl Default for PricingTable {
    fn default() -> Self {
        Self {
            opus: Pricing {
                input_per_m: 5.0,
                output_per_m: 25.0,
                cache_create_per_m: 6.25,
            },
            sonnet: Pricing {
                input_per_m: 3.0,
                output_per_m: 15.0,
                cache_create_per_m: 3.75,
            },
            haiku: Pricing {
                input_per_m: 1.0,
                output_per_m: 5.0,
                cache_create_per_m: 1.25,
            },
            estimation_family: ModelFamily::Sonnet,
        }
    }
}

impl PricingTable {
    /// Rates for a family; "other" has no table of its own and uses Sonnet.
    pub fn for_family(&self, family: ModelFamily) -> Pricing {
        match family {
            ModelFamily::Opus => self.opus,
            ModelFamily::Haiku => self.haiku,
            ModelFamily::Sonnet | ModelFamily::Other => self.sonnet,
        }
    }

    pub fn estimate_cost(&self, tokens: &TokenCounts) -> f64 {
        self.for_family(self.estimation_family).cost(tokens)
    }
}
