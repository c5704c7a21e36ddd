//! Simulation configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimulationError};
use crate::market::correlation::CorrelationMethod;
use crate::types::asset::AssetUniverse;
use crate::types::state::{PriceVector, ShockRange, ShockSoftening};

/// CPI growth parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InflationConfig {
    pub initial_cpi: f64,
    pub mean_increase: f64,
    pub std_dev: f64,
    pub min_increase: f64,
    pub max_increase: f64,
}

impl Default for InflationConfig {
    fn default() -> Self {
        Self {
            initial_cpi: 100.0,
            mean_increase: 0.025,
            std_dev: 0.015,
            min_increase: -0.01,
            max_increase: 0.06,
        }
    }
}

/// Per-round cash injection parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CashInjectionConfig {
    pub enabled: bool,
    pub base_amount: f64,
    pub growth_per_round: f64,
    pub variability: f64,
}

impl Default for CashInjectionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_amount: 5_000.0,
            growth_per_round: 500.0,
            variability: 1_000.0,
        }
    }
}

/// Configuration for one game session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of rounds in a game
    pub max_rounds: u32,

    /// Assets, their return parameters and correlations
    pub universe: AssetUniverse,

    /// Starting price of every asset
    pub initial_prices: PriceVector,

    pub correlation_method: CorrelationMethod,

    /// Starting cash of the player
    pub initial_cash: f64,

    /// Fraction of starting cash bought into each asset at round 0
    pub initial_allocation: BTreeMap<String, f64>,

    pub inflation: InflationConfig,

    pub cash_injection: CashInjectionConfig,

    /// Shock range for the first cycle crash
    pub shock_range: ShockRange,

    /// Soften the shock range after each cycle crash
    pub soften_after_crash: bool,

    pub softening: ShockSoftening,

    /// Random seed for reproducibility (None = random)
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            max_rounds: 20,
            universe: AssetUniverse::investment_odyssey(),
            initial_prices: PriceVector::investment_odyssey(),
            correlation_method: CorrelationMethod::RowWeighted,
            initial_cash: 10_000.0,
            initial_allocation: BTreeMap::new(),
            inflation: InflationConfig::default(),
            cash_injection: CashInjectionConfig::default(),
            shock_range: ShockRange::default(),
            soften_after_crash: true,
            softening: ShockSoftening::default(),
            seed: None,
        }
    }
}

impl SimulationConfig {
    /// Parse and validate a JSON config. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: SimulationConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// `n` copies of this config seeded `first_seed..first_seed + n`.
    pub fn seed_sweep(&self, first_seed: u64, n: usize) -> Vec<SimulationConfig> {
        (0..n as u64)
            .map(|i| self.clone().with_seed(first_seed + i))
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        for name in self.universe.names() {
            if !self.initial_prices.contains(name) {
                return Err(SimulationError::config(format!(
                    "no initial price for asset {}",
                    name
                )));
            }
        }
        for (asset, _) in self.initial_prices.iter() {
            if self.universe.get(asset).is_none() {
                return Err(SimulationError::config(format!(
                    "initial price given for unknown asset {}",
                    asset
                )));
            }
        }
        self.initial_prices.ensure_positive()?;

        if !(self.initial_cash.is_finite() && self.initial_cash >= 0.0) {
            return Err(SimulationError::config(format!(
                "initial cash {} must be non-negative",
                self.initial_cash
            )));
        }

        let mut total_fraction = 0.0;
        for (asset, &fraction) in &self.initial_allocation {
            if self.universe.get(asset).is_none() {
                return Err(SimulationError::config(format!(
                    "allocation to unknown asset {}",
                    asset
                )));
            }
            if !(0.0..=1.0).contains(&fraction) {
                return Err(SimulationError::config(format!(
                    "allocation fraction {} for {} outside [0, 1]",
                    fraction, asset
                )));
            }
            total_fraction += fraction;
        }
        if total_fraction > 1.0 + 1e-9 {
            return Err(SimulationError::config(format!(
                "allocation fractions sum to {}",
                total_fraction
            )));
        }

        if !(self.inflation.initial_cpi > 0.0)
            || self.inflation.min_increase > self.inflation.max_increase
            || self.inflation.min_increase <= -1.0
        {
            return Err(SimulationError::config("invalid inflation parameters"));
        }

        self.shock_range.validate()?;
        self.softening.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = SimulationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_rounds, 20);
        assert_eq!(config.initial_cash, 10_000.0);
    }

    #[test]
    fn test_from_json_partial() {
        let config = SimulationConfig::from_json(
            r#"{"max_rounds": 5, "seed": 9, "initial_allocation": {"Gold": 0.5}}"#,
        )
        .unwrap();
        assert_eq!(config.max_rounds, 5);
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.universe.len(), 6);
        assert_eq!(config.initial_allocation.get("Gold"), Some(&0.5));
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        let err = SimulationConfig::from_json("{not json").unwrap_err();
        assert!(matches!(err, SimulationError::Config(_)));
    }

    #[test]
    fn test_validation_failures() {
        let mut config = SimulationConfig::default();
        config.initial_allocation.insert("Tulips".to_string(), 0.2);
        assert!(config.validate().is_err());

        let mut config = SimulationConfig::default();
        config.initial_allocation.insert("Gold".to_string(), 0.7);
        config.initial_allocation.insert("Bonds".to_string(), 0.7);
        assert!(config.validate().is_err());

        let mut config = SimulationConfig::default();
        config.initial_prices.insert("Tulips", 1.0);
        assert!(config.validate().is_err());

        let config = SimulationConfig {
            shock_range: ShockRange {
                low: -0.2,
                high: -0.6,
            },
            ..SimulationConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_shock_settings_checked_on_load() {
        let err = SimulationConfig::from_json(r#"{"softening": {"high_cap": 0.5}}"#).unwrap_err();
        assert!(matches!(err, SimulationError::Configuration(_)));

        let err =
            SimulationConfig::from_json(r#"{"shock_range": {"low": 0.5, "high": -0.9}}"#).unwrap_err();
        assert!(matches!(err, SimulationError::Config(_)));

        let config = SimulationConfig {
            softening: ShockSoftening {
                low_cap: 0.2,
                ..ShockSoftening::default()
            },
            ..SimulationConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_seed_sweep() {
        let configs = SimulationConfig::default().seed_sweep(100, 3);
        let seeds: Vec<_> = configs.iter().map(|c| c.seed).collect();
        assert_eq!(seeds, vec![Some(100), Some(101), Some(102)]);
    }
}
