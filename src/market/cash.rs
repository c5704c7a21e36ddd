//! Per-round cash injections into a player's account.

use crate::market::rng::RandomSource;
use crate::types::config::CashInjectionConfig;

/// Injects `base + round * growth` cash, jittered by up to `variability`.
#[derive(Debug, Clone)]
pub struct CashInjector {
    config: CashInjectionConfig,
}

impl CashInjector {
    pub fn new(config: CashInjectionConfig) -> Self {
        Self { config }
    }

    /// Injection for `round`, or `0.0` when injections are disabled.
    ///
    /// Draws a uniform only when enabled.
    pub fn amount<R: RandomSource + ?Sized>(&self, round: u32, rng: &mut R) -> f64 {
        if !self.config.enabled {
            return 0.0;
        }
        let base = self.config.base_amount + round as f64 * self.config.growth_per_round;
        let jitter = (rng.next_uniform() * 2.0 - 1.0) * self.config.variability;
        (base + jitter).max(0.0)
    }
}
