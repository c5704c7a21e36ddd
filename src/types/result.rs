//! Simulation result types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::market::regime::RegimeEvent;
use crate::portfolio::PerformanceSummary;
use crate::types::state::{PriceVector, ShockRange};

/// State of a game right after one round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundSnapshot {
    /// Round number just played (1-based)
    pub round: u32,

    pub prices: PriceVector,

    /// Return applied to each asset this round
    pub returns: BTreeMap<String, f64>,

    /// Regime branch taken by each volatile asset
    pub events: Vec<(String, RegimeEvent)>,

    pub cpi: f64,
    pub cpi_increase: f64,

    pub cash_injection: f64,

    /// Player cash plus holdings at this round's prices
    pub total_value: f64,

    /// Shock range in force for the next cycle crash
    pub shock_range: ShockRange,
}

impl RoundSnapshot {
    pub fn cycle_crash(&self) -> bool {
        self.events
            .iter()
            .any(|(_, event)| *event == RegimeEvent::CycleCrash)
    }
}

/// Outcome of a finished game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionResult {
    /// Seed used for this game
    pub seed: u64,

    pub rounds_played: u32,

    pub final_prices: PriceVector,

    /// Price of each asset at round 0..=rounds_played
    pub price_history: BTreeMap<String, Vec<f64>>,

    /// CPI at round 0..=rounds_played
    pub cpi_history: Vec<f64>,

    /// Portfolio value at round 0..=rounds_played
    pub value_history: Vec<f64>,

    /// Rounds in which a cycle crash fired
    pub crash_rounds: Vec<u32>,

    pub summary: PerformanceSummary,
}

/// Batch result containing all session results.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BatchSimulationResult {
    pub results: Vec<SessionResult>,
}

impl BatchSimulationResult {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Mean final portfolio value, `None` for an empty batch.
    pub fn mean_final_value(&self) -> Option<f64> {
        self.mean_of(|r| r.summary.total_value)
    }

    pub fn mean_real_return_pct(&self) -> Option<f64> {
        self.mean_of(|r| r.summary.real_return_pct)
    }

    /// Mean final price of `asset` over sessions that priced it.
    pub fn mean_final_price(&self, asset: &str) -> Option<f64> {
        let prices: Vec<f64> = self
            .results
            .iter()
            .filter_map(|r| r.final_prices.get(asset))
            .collect();
        if prices.is_empty() {
            return None;
        }
        Some(prices.iter().sum::<f64>() / prices.len() as f64)
    }

    /// Cycle crashes across all sessions.
    pub fn total_crashes(&self) -> usize {
        self.results.iter().map(|r| r.crash_rounds.len()).sum()
    }

    fn mean_of(&self, f: impl Fn(&SessionResult) -> f64) -> Option<f64> {
        if self.results.is_empty() {
            return None;
        }
        Some(self.results.iter().map(f).sum::<f64>() / self.results.len() as f64)
    }
}
