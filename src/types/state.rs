//! Per-game mutable state: prices and round bookkeeping.

use std::collections::BTreeMap;

use derive_more::From;
use serde::{de, Deserialize, Deserializer, Serialize};

use crate::error::{Result, SimulationError};

/// Range a cycle-crash return is drawn from. Always `low <= high <= 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ShockRange {
    pub low: f64,
    pub high: f64,
}

impl Default for ShockRange {
    fn default() -> Self {
        Self {
            low: -0.75,
            high: -0.50,
        }
    }
}

impl<'de> Deserialize<'de> for ShockRange {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            low: f64,
            high: f64,
        }
        let raw = Raw::deserialize(deserializer)?;
        ShockRange::new(raw.low, raw.high).map_err(de::Error::custom)
    }
}

impl ShockRange {
    pub fn new(low: f64, high: f64) -> Result<Self> {
        let range = Self { low, high };
        range.validate()?;
        Ok(range)
    }

    /// Check `low <= high <= 0` on a range built from public fields.
    pub fn validate(&self) -> Result<()> {
        let (low, high) = (self.low, self.high);
        if !(low.is_finite() && high.is_finite() && low <= high && high <= 0.0) {
            return Err(SimulationError::config(format!(
                "shock range [{}, {}] must satisfy low <= high <= 0",
                low, high
            )));
        }
        Ok(())
    }

    /// Range for the next crash after one has fired.
    pub fn softened(&self, rule: &ShockSoftening) -> Self {
        let high = (self.high + rule.step).max(rule.high_floor).min(rule.high_cap);
        let low = (self.low + rule.step).max(rule.low_floor).min(rule.low_cap);
        Self {
            low: low.min(high),
            high,
        }
    }
}

/// How the shock range moves toward zero after each cycle crash.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShockSoftening {
    pub step: f64,
    pub high_floor: f64,
    pub high_cap: f64,
    pub low_floor: f64,
    pub low_cap: f64,
}

impl ShockSoftening {
    /// Softening must move toward zero and keep both ends non-positive.
    pub fn validate(&self) -> Result<()> {
        let ends = [
            ("high", self.high_floor, self.high_cap),
            ("low", self.low_floor, self.low_cap),
        ];
        if !(self.step.is_finite() && self.step >= 0.0) {
            return Err(SimulationError::config(format!(
                "softening step {} must be non-negative",
                self.step
            )));
        }
        for (end, floor, cap) in ends {
            if !(floor.is_finite() && cap.is_finite() && floor <= cap && cap <= 0.0) {
                return Err(SimulationError::config(format!(
                    "softening {} end [{}, {}] must satisfy floor <= cap <= 0",
                    end, floor, cap
                )));
            }
        }
        Ok(())
    }
}

impl Default for ShockSoftening {
    fn default() -> Self {
        Self {
            step: 0.1,
            high_floor: -0.5,
            high_cap: -0.05,
            low_floor: -0.75,
            low_cap: -0.15,
        }
    }
}

/// Round bookkeeping carried between calls to the price engine.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RoundState {
    pub round_number: u32,
    pub last_crash_round: u32,
    pub crash_shock_range: ShockRange,
}

impl RoundState {
    pub fn new(round_number: u32, last_crash_round: u32, crash_shock_range: ShockRange) -> Self {
        Self {
            round_number,
            last_crash_round,
            crash_shock_range,
        }
    }

    #[inline]
    pub fn rounds_since_crash(&self) -> u32 {
        self.round_number.saturating_sub(self.last_crash_round)
    }
}

/// Asset name to strictly positive price.
#[derive(Debug, Clone, PartialEq, Default, From, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceVector(BTreeMap<String, f64>);

impl PriceVector {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Starting prices of the Investment Odyssey game.
    pub fn investment_odyssey() -> Self {
        [
            ("S&P 500", 100.0),
            ("Bonds", 100.0),
            ("Real Estate", 5_000.0),
            ("Gold", 3_000.0),
            ("Commodities", 100.0),
            ("Bitcoin", 50_000.0),
        ]
        .into_iter()
        .collect()
    }

    #[inline]
    pub fn get(&self, asset: &str) -> Option<f64> {
        self.0.get(asset).copied()
    }

    pub fn insert(&mut self, asset: impl Into<String>, price: f64) -> Option<f64> {
        self.0.insert(asset.into(), price)
    }

    pub fn contains(&self, asset: &str) -> bool {
        self.0.contains_key(asset)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(name, &price)| (name.as_str(), price))
    }

    /// Fail on the first non-positive or non-finite price.
    pub fn ensure_positive(&self) -> Result<()> {
        for (asset, price) in self.iter() {
            if !(price.is_finite() && price > 0.0) {
                return Err(SimulationError::NumericDomain {
                    asset: asset.to_string(),
                    price,
                });
            }
        }
        Ok(())
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for PriceVector {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shock_range_validation() {
        assert!(ShockRange::new(-0.75, -0.5).is_ok());
        assert!(ShockRange::new(-0.5, -0.75).is_err());
        assert!(ShockRange::new(-0.2, 0.1).is_err());
    }

    #[test]
    fn test_shock_range_json_is_validated() {
        let range: ShockRange = serde_json::from_str(r#"{"low":-0.6,"high":-0.2}"#).unwrap();
        assert_eq!(range, ShockRange::new(-0.6, -0.2).unwrap());

        assert!(serde_json::from_str::<ShockRange>(r#"{"low":0.5,"high":-0.9}"#).is_err());
        assert!(serde_json::from_str::<ShockRange>(r#"{"low":-0.2,"high":0.3}"#).is_err());
        let state = r#"{"round_number":3,"last_crash_round":0,"crash_shock_range":{"low":1.0,"high":2.0}}"#;
        assert!(serde_json::from_str::<RoundState>(state).is_err());
    }

    #[test]
    fn test_softening_rule_validation() {
        assert!(ShockSoftening::default().validate().is_ok());

        let bad = [
            ShockSoftening { high_cap: 0.5, ..ShockSoftening::default() },
            ShockSoftening { low_cap: 0.1, ..ShockSoftening::default() },
            ShockSoftening { low_floor: -0.1, ..ShockSoftening::default() },
            ShockSoftening { step: -0.1, ..ShockSoftening::default() },
        ];
        for rule in bad {
            assert!(matches!(rule.validate(), Err(SimulationError::Configuration(_))));
        }
    }

    #[test]
    fn test_softening_sequence() {
        let rule = ShockSoftening::default();
        let mut range = ShockRange::default();
        let mut seen = Vec::new();

        for _ in 0..8 {
            range = range.softened(&rule);
            assert!(range.low <= range.high && range.high <= 0.0);
            seen.push((range.low, range.high));
        }

        assert!((seen[0].0 - -0.65).abs() < 1e-12);
        assert!((seen[0].1 - -0.4).abs() < 1e-12);
        // Both ends saturate at their caps
        let (low, high) = *seen.last().unwrap();
        assert!((low - -0.15).abs() < 1e-12);
        assert!((high - -0.05).abs() < 1e-12);
    }

    #[test]
    fn test_rounds_since_crash_saturates() {
        let state = RoundState::new(2, 5, ShockRange::default());
        assert_eq!(state.rounds_since_crash(), 0);

        let state = RoundState::new(9, 5, ShockRange::default());
        assert_eq!(state.rounds_since_crash(), 4);
    }

    #[test]
    fn test_price_vector_positivity() {
        let mut prices = PriceVector::investment_odyssey();
        assert_eq!(prices.len(), 6);
        assert!(prices.ensure_positive().is_ok());

        prices.insert("Gold", 0.0);
        let err = prices.ensure_positive().unwrap_err();
        assert!(matches!(err, SimulationError::NumericDomain { ref asset, .. } if asset == "Gold"));
    }

    #[test]
    fn test_round_state_json() {
        let state = RoundState::default();
        let json = serde_json::to_string(&state).unwrap();
        let back: RoundState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
        assert_eq!(back.crash_shock_range.low, -0.75);
    }
}
