//! Asset parameters, regime tags and the asset universe.

use derive_more::Display;
use serde::{de, Deserialize, Deserializer, Serialize};

use crate::error::{Result, SimulationError};
use crate::types::correlation::CorrelationMatrix;

/// How a volatile asset's dampening above the decay threshold is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, Serialize, Deserialize)]
pub enum DampeningMode {
    /// Scale the whole return, mean included.
    #[default]
    #[display("whole-return")]
    WholeReturn,
    /// Scale only the `std_dev * z` term.
    #[display("dispersion-only")]
    DispersionOnly,
}

/// Rule set for an asset whose return depends on its price level and on the
/// time since its last crash.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolatileRegime {
    /// Prices strictly below this take the growth branch.
    pub low_price_threshold: f64,
    /// Prices at or above this take the cap-crash branch.
    pub high_price_threshold: f64,
    pub growth_range: (f64, f64),
    pub cap_crash_range: (f64, f64),
    /// Dampening starts strictly above this price.
    pub decay_threshold: f64,
    pub decay_increment: f64,
    pub decay_per_increment: f64,
    pub max_decay: f64,
    pub dampening: DampeningMode,
    /// Rounds that must pass since the last crash before another can fire.
    pub crash_cycle_rounds: u32,
    pub crash_probability: f64,
}

impl Default for VolatileRegime {
    fn default() -> Self {
        Self {
            low_price_threshold: 10_000.0,
            high_price_threshold: 1_000_000.0,
            growth_range: (0.50, 2.00),
            cap_crash_range: (-0.50, -0.30),
            decay_threshold: 100_000.0,
            decay_increment: 50_000.0,
            decay_per_increment: 0.05,
            max_decay: 0.7,
            dampening: DampeningMode::WholeReturn,
            crash_cycle_rounds: 4,
            crash_probability: 0.5,
        }
    }
}

impl VolatileRegime {
    fn validate(&self, asset: &str) -> Result<()> {
        let bad = |what: &str| {
            Err(SimulationError::config(format!(
                "volatile regime of {}: {}",
                asset, what
            )))
        };
        if !(self.low_price_threshold < self.high_price_threshold) {
            return bad("low price threshold must be below high price threshold");
        }
        if self.growth_range.0 > self.growth_range.1 {
            return bad("growth range is reversed");
        }
        if self.cap_crash_range.0 > self.cap_crash_range.1 {
            return bad("cap crash range is reversed");
        }
        if self.decay_increment <= 0.0 {
            return bad("decay increment must be positive");
        }
        if !(0.0..=1.0).contains(&self.max_decay) {
            return bad("max decay must lie in [0, 1]");
        }
        if !(0.0..=1.0).contains(&self.crash_probability) {
            return bad("crash probability must lie in [0, 1]");
        }
        Ok(())
    }
}

/// Which return rule applies to an asset.
#[derive(Debug, Clone, Copy, PartialEq, Default, Display, Serialize, Deserialize)]
pub enum RegimeKind {
    /// Correlated, bounded normal return.
    #[default]
    #[display("standard")]
    Standard,
    #[display("price-dependent volatile")]
    PriceDependentVolatile(VolatileRegime),
}

/// Static return parameters for one asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetParameters {
    pub name: String,
    pub mean_return: f64,
    pub std_dev: f64,
    pub min_return: f64,
    pub max_return: f64,
    #[serde(default)]
    pub regime: RegimeKind,
}

impl AssetParameters {
    pub fn new(
        name: impl Into<String>,
        mean_return: f64,
        std_dev: f64,
        min_return: f64,
        max_return: f64,
    ) -> Self {
        Self {
            name: name.into(),
            mean_return,
            std_dev,
            min_return,
            max_return,
            regime: RegimeKind::Standard,
        }
    }

    /// Tag this asset as price-dependent volatile.
    pub fn with_regime(mut self, regime: VolatileRegime) -> Self {
        self.regime = RegimeKind::PriceDependentVolatile(regime);
        self
    }

    #[inline]
    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.min_return).min(self.max_return)
    }

    pub fn validate(&self) -> Result<()> {
        let values = [self.mean_return, self.std_dev, self.min_return, self.max_return];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(SimulationError::config(format!(
                "{}: parameters must be finite",
                self.name
            )));
        }
        if !(self.min_return <= self.mean_return && self.mean_return <= self.max_return) {
            return Err(SimulationError::config(format!(
                "{}: expected min {} <= mean {} <= max {}",
                self.name, self.min_return, self.mean_return, self.max_return
            )));
        }
        if self.std_dev < 0.0 {
            return Err(SimulationError::config(format!(
                "{}: negative std dev {}",
                self.name, self.std_dev
            )));
        }
        if self.min_return < -1.0 {
            return Err(SimulationError::config(format!(
                "{}: min return {} would allow negative prices",
                self.name, self.min_return
            )));
        }
        if let RegimeKind::PriceDependentVolatile(regime) = &self.regime {
            regime.validate(&self.name)?;
        }
        Ok(())
    }
}

/// Ordered asset list with a matching correlation matrix.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetUniverse {
    assets: Vec<AssetParameters>,
    correlation: CorrelationMatrix,
}

impl<'de> Deserialize<'de> for AssetUniverse {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            assets: Vec<AssetParameters>,
            correlation: CorrelationMatrix,
        }

        let raw = Raw::deserialize(deserializer)?;
        AssetUniverse::new(raw.assets, raw.correlation).map_err(de::Error::custom)
    }
}

impl AssetUniverse {
    pub fn new(assets: Vec<AssetParameters>, correlation: CorrelationMatrix) -> Result<Self> {
        if assets.len() != correlation.dim() {
            return Err(SimulationError::config(format!(
                "correlation matrix is {}x{} but there are {} assets",
                correlation.dim(),
                correlation.dim(),
                assets.len()
            )));
        }
        for (i, asset) in assets.iter().enumerate() {
            asset.validate()?;
            if assets[..i].iter().any(|a| a.name == asset.name) {
                return Err(SimulationError::config(format!(
                    "duplicate asset name {}",
                    asset.name
                )));
            }
        }
        Ok(Self { assets, correlation })
    }

    /// The six-asset universe of the Investment Odyssey game.
    pub fn investment_odyssey() -> Self {
        let assets = vec![
            AssetParameters::new("S&P 500", 0.1151, 0.1949, -0.43, 0.50),
            AssetParameters::new("Bonds", 0.0334, 0.0301, 0.0003, 0.14),
            AssetParameters::new("Real Estate", 0.0439, 0.0620, -0.12, 0.24),
            AssetParameters::new("Gold", 0.0648, 0.2076, -0.32, 1.25),
            AssetParameters::new("Commodities", 0.0815, 0.1522, -0.25, 2.00),
            AssetParameters::new("Bitcoin", 0.50, 1.00, -0.73, 2.50)
                .with_regime(VolatileRegime::default()),
        ];
        let correlation = CorrelationMatrix::from_rows_unchecked(vec![
            vec![1.0000, -0.5169, 0.3425, 0.0199, 0.1243, 0.4057],
            vec![-0.5169, 1.0000, 0.0176, 0.0289, -0.0235, -0.2259],
            vec![0.3425, 0.0176, 1.0000, -0.4967, -0.0334, 0.1559],
            vec![0.0199, 0.0289, -0.4967, 1.0000, 0.0995, -0.5343],
            vec![0.1243, -0.0235, -0.0334, 0.0995, 1.0000, 0.0436],
            vec![0.4057, -0.2259, 0.1559, -0.5343, 0.0436, 1.0000],
        ]);
        Self { assets, correlation }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn assets(&self) -> &[AssetParameters] {
        &self.assets
    }

    pub fn correlation(&self) -> &CorrelationMatrix {
        &self.correlation
    }

    pub fn get(&self, name: &str) -> Option<&AssetParameters> {
        self.assets.iter().find(|a| a.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.assets.iter().map(|a| a.name.as_str())
    }
}
