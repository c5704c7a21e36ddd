//! Correlated multi-asset price process.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{Result, SimulationError};
use crate::market::correlation::{CorrelationEngine, CorrelationMethod};
use crate::market::regime::{adjust_return, RegimeEvent};
use crate::market::returns::compute_return;
use crate::market::rng::{PcgSource, RandomSource};
use crate::types::asset::{AssetUniverse, RegimeKind};
use crate::types::state::{PriceVector, RoundState};

/// Result of advancing prices by one round.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundOutcome {
    pub prices: PriceVector,
    /// Input state with `last_crash_round` updated if a cycle crash fired.
    /// `round_number` is never touched here.
    pub round_state: RoundState,
    pub returns: BTreeMap<String, f64>,
    /// Branch taken for each volatile asset, in universe order.
    pub events: Vec<(String, RegimeEvent)>,
}

impl RoundOutcome {
    /// Whether any volatile asset hit a cycle crash this round.
    pub fn cycle_crash(&self) -> bool {
        self.events
            .iter()
            .any(|(_, event)| *event == RegimeEvent::CycleCrash)
    }
}

/// Generates one round of prices for every asset of a universe.
///
/// Per round:
/// 1. Draw one independent standard normal per asset
/// 2. Correlate the draws
/// 3. Bound each standard asset's return
/// 4. Let the regime adjuster pick each volatile asset's return
/// 5. Apply `new = prev * (1 + r)`
pub struct PriceSeriesEngine<R = PcgSource> {
    universe: AssetUniverse,
    correlation: CorrelationEngine,
    rng: R,
}

impl PriceSeriesEngine<PcgSource> {
    /// Row-weighted engine over a PCG source.
    pub fn seeded(universe: AssetUniverse, seed: Option<u64>) -> Result<Self> {
        Self::new(universe, CorrelationMethod::RowWeighted, PcgSource::new(seed))
    }
}

impl<R: RandomSource> PriceSeriesEngine<R> {
    pub fn new(universe: AssetUniverse, method: CorrelationMethod, rng: R) -> Result<Self> {
        let correlation = CorrelationEngine::new(universe.correlation(), method)?;
        Ok(Self {
            universe,
            correlation,
            rng,
        })
    }

    pub fn universe(&self) -> &AssetUniverse {
        &self.universe
    }

    /// Advance `prev_prices` by one round.
    ///
    /// Fails if the prices and the universe disagree on the asset set, if the
    /// crash shock range is malformed, or if any input or output price is not
    /// strictly positive.
    pub fn advance_round(
        &mut self,
        prev_prices: &PriceVector,
        round_state: &RoundState,
    ) -> Result<RoundOutcome> {
        self.check_prices(prev_prices)?;
        round_state.crash_shock_range.validate()?;

        let mut state = *round_state;
        let n = self.universe.len();
        let draws: Vec<f64> = (0..n).map(|_| self.rng.next_standard_normal()).collect();
        let correlated = self.correlation.correlate(&draws)?;

        let mut returns = BTreeMap::new();
        let mut events = Vec::new();
        let mut prices = PriceVector::new();

        for (asset, &z) in self.universe.assets().iter().zip(&correlated) {
            let prev = prev_prices
                .get(&asset.name)
                .ok_or_else(|| missing_price(&asset.name))?;

            let r = match &asset.regime {
                RegimeKind::Standard => compute_return(asset, z),
                RegimeKind::PriceDependentVolatile(regime) => {
                    let outcome = adjust_return(asset, regime, prev, &mut state, &mut self.rng);
                    events.push((asset.name.clone(), outcome.event));
                    outcome.return_value
                }
            };

            let price = prev + prev * r;
            if !(price.is_finite() && price > 0.0) {
                return Err(SimulationError::NumericDomain {
                    asset: asset.name.clone(),
                    price,
                });
            }
            returns.insert(asset.name.clone(), r);
            prices.insert(asset.name.clone(), price);
        }

        debug!(
            round = state.round_number,
            assets = n,
            crashed = events.iter().any(|(_, e)| *e == RegimeEvent::CycleCrash),
            "prices advanced"
        );

        Ok(RoundOutcome {
            prices,
            round_state: state,
            returns,
            events,
        })
    }

    fn check_prices(&self, prices: &PriceVector) -> Result<()> {
        for (asset, _) in prices.iter() {
            if self.universe.get(asset).is_none() {
                return Err(SimulationError::config(format!(
                    "no parameters for asset {}",
                    asset
                )));
            }
        }
        for name in self.universe.names() {
            if !prices.contains(name) {
                return Err(missing_price(name));
            }
        }
        prices.ensure_positive()
    }
}

fn missing_price(asset: &str) -> SimulationError {
    SimulationError::config(format!("missing price for asset {}", asset))
}
