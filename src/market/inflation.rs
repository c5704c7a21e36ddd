//! Consumer price index drift.

use crate::market::rng::RandomSource;
use crate::types::config::InflationConfig;

/// Bounded normal CPI growth per round.
#[derive(Debug, Clone)]
pub struct InflationModel {
    config: InflationConfig,
}

impl InflationModel {
    pub fn new(config: InflationConfig) -> Self {
        Self { config }
    }

    /// One round's CPI increase, clamped to `[min_increase, max_increase]`.
    #[inline]
    pub fn next_increase<R: RandomSource + ?Sized>(&self, rng: &mut R) -> f64 {
        let z = rng.next_standard_normal();
        (self.config.mean_increase + self.config.std_dev * z)
            .max(self.config.min_increase)
            .min(self.config.max_increase)
    }

    /// Grow `cpi` by one round. Returns the new CPI and the increase applied.
    pub fn step<R: RandomSource + ?Sized>(&self, cpi: f64, rng: &mut R) -> (f64, f64) {
        let increase = self.next_increase(rng);
        (cpi * (1.0 + increase), increase)
    }
}
