//! Single-game session driver.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::error::{Result, SimulationError};
use crate::market::cash::CashInjector;
use crate::market::inflation::InflationModel;
use crate::market::price_process::PriceSeriesEngine;
use crate::market::rng::{PcgSource, RandomSource};
use crate::portfolio::{PerformanceSummary, Portfolio};
use crate::types::config::SimulationConfig;
use crate::types::result::{RoundSnapshot, SessionResult};
use crate::types::state::{PriceVector, RoundState};

/// One game: prices, round state, CPI and the player's portfolio, advanced
/// together one round at a time.
///
/// Each round:
/// 1. Bump the round number and generate new prices
/// 2. Soften the shock range if a cycle crash fired
/// 3. Grow the CPI
/// 4. Inject cash into the portfolio
pub struct GameSession<R = PcgSource> {
    config: SimulationConfig,
    seed: u64,
    engine: PriceSeriesEngine<R>,
    /// Drives CPI and cash injections, separate from the price stream
    economy_rng: R,
    inflation: InflationModel,
    injector: CashInjector,
    prices: PriceVector,
    round_state: RoundState,
    cpi: f64,
    portfolio: Portfolio,
    total_cash_injected: f64,
    price_history: BTreeMap<String, Vec<f64>>,
    cpi_history: Vec<f64>,
    value_history: Vec<f64>,
    crash_rounds: Vec<u32>,
}

impl GameSession<PcgSource> {
    /// Create a session from a config.
    ///
    /// Prices use `seed` and the economy uses `seed + 1`. Without a seed one is
    /// drawn from entropy and reported in the result.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        let seed = config.seed.unwrap_or_else(rand::random::<u64>);
        let price_rng = PcgSource::new(Some(seed));
        let economy_rng = PcgSource::new(Some(seed.wrapping_add(1)));
        Self::with_sources(config, seed, price_rng, economy_rng)
    }
}

impl<R: RandomSource> GameSession<R> {
    /// Create a session over explicit random sources.
    pub fn with_sources(
        config: SimulationConfig,
        seed: u64,
        price_rng: R,
        economy_rng: R,
    ) -> Result<Self> {
        config.validate()?;

        let engine = PriceSeriesEngine::new(
            config.universe.clone(),
            config.correlation_method,
            price_rng,
        )?;
        let prices = config.initial_prices.clone();

        let mut portfolio = Portfolio::new(config.initial_cash);
        portfolio.allocate(&config.initial_allocation, &prices)?;
        let initial_value = portfolio.value(&prices)?;

        let price_history = prices
            .iter()
            .map(|(asset, price)| (asset.to_string(), vec![price]))
            .collect();
        let round_state = RoundState::new(0, 0, config.shock_range);
        let cpi = config.inflation.initial_cpi;

        info!(
            seed,
            max_rounds = config.max_rounds,
            assets = config.universe.len(),
            "game session created"
        );

        Ok(Self {
            inflation: InflationModel::new(config.inflation),
            injector: CashInjector::new(config.cash_injection),
            config,
            seed,
            engine,
            economy_rng,
            prices,
            round_state,
            cpi,
            portfolio,
            total_cash_injected: 0.0,
            price_history,
            cpi_history: vec![cpi],
            value_history: vec![initial_value],
            crash_rounds: Vec::new(),
        })
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn round(&self) -> u32 {
        self.round_state.round_number
    }

    pub fn is_over(&self) -> bool {
        self.round() >= self.config.max_rounds
    }

    pub fn prices(&self) -> &PriceVector {
        &self.prices
    }

    pub fn round_state(&self) -> &RoundState {
        &self.round_state
    }

    pub fn cpi(&self) -> f64 {
        self.cpi
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    pub fn crash_rounds(&self) -> &[u32] {
        &self.crash_rounds
    }

    pub fn price_history(&self) -> &BTreeMap<String, Vec<f64>> {
        &self.price_history
    }

    /// Buy at the current round's prices.
    pub fn buy(&mut self, asset: &str, quantity: f64) -> Result<()> {
        self.portfolio.buy(asset, quantity, &self.prices)
    }

    /// Sell at the current round's prices.
    pub fn sell(&mut self, asset: &str, quantity: f64) -> Result<()> {
        self.portfolio.sell(asset, quantity, &self.prices)
    }

    /// Play one round. Fails with `GameOver` once every round has been played.
    ///
    /// On error no round is committed: prices, round state, CPI and the
    /// portfolio are as before. The price stream has still moved on, so a
    /// retry draws fresh numbers.
    pub fn advance(&mut self) -> Result<RoundSnapshot> {
        if self.is_over() {
            warn!(max_rounds = self.config.max_rounds, "advance after game over");
            return Err(SimulationError::GameOver {
                max_rounds: self.config.max_rounds,
            });
        }

        let mut state = self.round_state;
        state.round_number += 1;
        let outcome = self.engine.advance_round(&self.prices, &state)?;
        let value = self.portfolio.holdings_value(&outcome.prices)?;

        let crashed = outcome.cycle_crash();
        let mut state = outcome.round_state;
        if crashed {
            self.crash_rounds.push(state.round_number);
            if self.config.soften_after_crash {
                state.crash_shock_range = state.crash_shock_range.softened(&self.config.softening);
            }
        }

        let (cpi, cpi_increase) = self.inflation.step(self.cpi, &mut self.economy_rng);
        let injection = self.injector.amount(state.round_number, &mut self.economy_rng);

        self.round_state = state;
        self.prices = outcome.prices;
        self.cpi = cpi;
        self.portfolio.deposit(injection);
        self.total_cash_injected += injection;

        for (asset, price) in self.prices.iter() {
            self.price_history
                .entry(asset.to_string())
                .or_default()
                .push(price);
        }
        self.cpi_history.push(cpi);
        let total_value = self.portfolio.cash + value;
        self.value_history.push(total_value);

        debug!(
            round = state.round_number,
            crashed,
            cpi,
            injection,
            total_value,
            "round complete"
        );

        Ok(RoundSnapshot {
            round: state.round_number,
            prices: self.prices.clone(),
            returns: outcome.returns,
            events: outcome.events,
            cpi,
            cpi_increase,
            cash_injection: injection,
            total_value,
            shock_range: state.crash_shock_range,
        })
    }

    /// Play every remaining round.
    pub fn run_to_end(&mut self) -> Result<Vec<RoundSnapshot>> {
        let remaining = self.config.max_rounds.saturating_sub(self.round());
        let mut snapshots = Vec::with_capacity(remaining as usize);
        while !self.is_over() {
            snapshots.push(self.advance()?);
        }
        Ok(snapshots)
    }

    /// Performance at the current round.
    pub fn summary(&self) -> Result<PerformanceSummary> {
        let total_value = self.portfolio.value(&self.prices)?;
        Ok(PerformanceSummary::compute(
            total_value,
            self.config.initial_cash,
            self.total_cash_injected,
            self.config.inflation.initial_cpi,
            self.cpi,
        ))
    }

    /// Snapshot the session as a result.
    pub fn result(&self) -> Result<SessionResult> {
        Ok(SessionResult {
            seed: self.seed,
            rounds_played: self.round(),
            final_prices: self.prices.clone(),
            price_history: self.price_history.clone(),
            cpi_history: self.cpi_history.clone(),
            value_history: self.value_history.clone(),
            crash_rounds: self.crash_rounds.clone(),
            summary: self.summary()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::rng::SequenceSource;
    use crate::types::config::CashInjectionConfig;

    fn quiet_config(seed: u64) -> SimulationConfig {
        SimulationConfig {
            cash_injection: CashInjectionConfig {
                enabled: false,
                ..CashInjectionConfig::default()
            },
            seed: Some(seed),
            ..SimulationConfig::default()
        }
    }

    fn scripted(config: SimulationConfig) -> GameSession<SequenceSource> {
        GameSession::with_sources(
            config,
            0,
            SequenceSource::constant(0.0, 0.0),
            SequenceSource::constant(0.0, 0.5),
        )
        .unwrap()
    }

    #[test]
    fn test_full_game_then_game_over() {
        let mut session = GameSession::new(SimulationConfig::default().with_seed(42)).unwrap();
        let snapshots = session.run_to_end().unwrap();

        assert_eq!(snapshots.len(), 20);
        assert_eq!(snapshots.last().unwrap().round, 20);
        assert!(session.is_over());
        assert!(matches!(
            session.advance(),
            Err(SimulationError::GameOver { max_rounds: 20 })
        ));

        let result = session.result().unwrap();
        assert_eq!(result.rounds_played, 20);
        assert_eq!(result.cpi_history.len(), 21);
        assert_eq!(result.value_history.len(), 21);
        for history in result.price_history.values() {
            assert_eq!(history.len(), 21);
            assert!(history.iter().all(|p| *p > 0.0));
        }
    }

    #[test]
    fn test_same_seed_same_game() {
        let mut a = GameSession::new(SimulationConfig::default().with_seed(7)).unwrap();
        let mut b = GameSession::new(SimulationConfig::default().with_seed(7)).unwrap();

        assert_eq!(a.run_to_end().unwrap(), b.run_to_end().unwrap());
        assert_eq!(a.result().unwrap(), b.result().unwrap());
    }

    #[test]
    fn test_unseeded_session_reports_seed() {
        let mut session = GameSession::new(SimulationConfig::default()).unwrap();
        session.advance().unwrap();

        let mut replay = GameSession::new(SimulationConfig::default().with_seed(session.seed())).unwrap();
        replay.advance().unwrap();
        assert_eq!(session.prices(), replay.prices());
    }

    #[test]
    fn test_all_cash_value_constant() {
        let mut session = GameSession::new(quiet_config(3)).unwrap();
        for snapshot in session.run_to_end().unwrap() {
            assert_eq!(snapshot.total_value, 10_000.0);
            assert_eq!(snapshot.cash_injection, 0.0);
        }
        let summary = session.summary().unwrap();
        assert_eq!(summary.nominal_return, 0.0);
        // Inflation eats into an all-cash position
        assert!(summary.final_cpi > 100.0);
        assert!(summary.real_return < 0.0);
    }

    #[test]
    fn test_bonds_only_value_rises() {
        let mut config = quiet_config(5);
        config.initial_allocation.insert("Bonds".to_string(), 1.0);
        let mut session = GameSession::new(config).unwrap();

        let mut last = session.portfolio().value(session.prices()).unwrap();
        for snapshot in session.run_to_end().unwrap() {
            assert!(snapshot.total_value > last);
            last = snapshot.total_value;
        }
    }

    #[test]
    fn test_cash_injections_accumulate() {
        let mut session = scripted(SimulationConfig::default());
        let snapshots = session.run_to_end().unwrap();

        // Midpoint uniform: exactly base + round * growth
        for s in &snapshots {
            assert_eq!(s.cash_injection, 5_000.0 + 500.0 * s.round as f64);
        }
        let expected: f64 = (1..=20).map(|r| 5_000.0 + 500.0 * r as f64).sum();
        let summary = session.summary().unwrap();
        assert_eq!(summary.total_cash_injected, expected);
        assert_eq!(summary.total_value, 10_000.0 + expected);
    }

    #[test]
    fn test_cycle_crash_softens_shock_range() {
        let mut session = scripted(SimulationConfig::default());

        for _ in 0..3 {
            assert!(!session.advance().unwrap().cycle_crash());
        }
        let crash = session.advance().unwrap();
        assert!(crash.cycle_crash());
        assert_eq!(session.crash_rounds(), &[4]);
        assert_eq!(session.round_state().last_crash_round, 4);
        assert!((crash.shock_range.low - -0.65).abs() < 1e-12);
        assert!((crash.shock_range.high - -0.4).abs() < 1e-12);
        assert_eq!(crash.returns["Bitcoin"], -0.73);

        // Next crash cannot fire before round 8
        for _ in 0..3 {
            assert!(!session.advance().unwrap().cycle_crash());
        }
        assert!(session.advance().unwrap().cycle_crash());
        assert_eq!(session.crash_rounds(), &[4, 8]);
    }

    #[test]
    fn test_softening_can_be_disabled() {
        let config = SimulationConfig {
            soften_after_crash: false,
            ..SimulationConfig::default()
        };
        let mut session = scripted(config);
        let snapshots = session.run_to_end().unwrap();

        assert!(snapshots.iter().any(|s| s.cycle_crash()));
        assert!(snapshots
            .iter()
            .all(|s| s.shock_range == crate::types::state::ShockRange::default()));
    }

    #[test]
    fn test_trades_use_current_prices() {
        let mut session = GameSession::new(quiet_config(11)).unwrap();
        session.advance().unwrap();
        let gold = session.prices().get("Gold").unwrap();

        session.buy("Gold", 1.0).unwrap();
        assert!((session.portfolio().cash - (10_000.0 - gold)).abs() < 1e-9);
        session.sell("Gold", 1.0).unwrap();
        assert!((session.portfolio().cash - 10_000.0).abs() < 1e-9);

        assert!(matches!(
            session.sell("Gold", 1.0),
            Err(SimulationError::InsufficientHoldings { .. })
        ));
    }

    #[test]
    fn test_failed_round_commits_nothing() {
        use crate::types::asset::{AssetParameters, AssetUniverse};
        use crate::types::correlation::CorrelationMatrix;

        let universe = AssetUniverse::new(
            vec![AssetParameters::new("Doomed", -1.0, 0.0, -1.0, 0.0)],
            CorrelationMatrix::identity(1),
        )
        .unwrap();
        let config = SimulationConfig {
            universe,
            initial_prices: [("Doomed", 10.0)].into_iter().collect(),
            initial_allocation: [("Doomed".to_string(), 0.5)].into_iter().collect(),
            ..quiet_config(3)
        };
        let mut session = GameSession::new(config).unwrap();
        let portfolio = session.portfolio().clone();

        let err = session.advance().unwrap_err();
        assert!(matches!(err, SimulationError::NumericDomain { .. }));
        assert_eq!(session.round(), 0);
        assert_eq!(session.prices().get("Doomed"), Some(10.0));
        assert_eq!(session.cpi(), 100.0);
        assert_eq!(session.portfolio(), &portfolio);
        assert_eq!(session.price_history()["Doomed"], vec![10.0]);
        assert!(session.crash_rounds().is_empty());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = SimulationConfig::default();
        config.initial_prices = PriceVector::new();
        assert!(GameSession::new(config).is_err());
    }
}
