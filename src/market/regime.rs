//! Return override for price-dependent volatile assets.
//!
//! Branches on the asset's current price:
//! - below `low_price_threshold`: uniform growth return
//! - at or above `high_price_threshold`: uniform cap-crash return
//! - otherwise: an independent normal return, dampened above
//!   `decay_threshold`, which a cycle crash may replace once
//!   `crash_cycle_rounds` have passed since the last one
//!
//! Every branch is clamped to the asset's return bounds.

use derive_more::Display;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::market::rng::RandomSource;
use crate::types::asset::{AssetParameters, DampeningMode, VolatileRegime};
use crate::types::state::RoundState;

/// Which branch produced a volatile asset's return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
pub enum RegimeEvent {
    #[display("growth")]
    Growth,
    #[display("cap-crash")]
    CapCrash,
    #[display("normal")]
    Normal,
    #[display("dampened")]
    Dampened,
    #[display("cycle-crash")]
    CycleCrash,
}

/// Return chosen for a volatile asset and the branch that chose it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegimeOutcome {
    pub return_value: f64,
    pub event: RegimeEvent,
}

/// Fraction by which a return is scaled down at `price`.
#[inline]
pub fn volatility_reduction(regime: &VolatileRegime, price: f64) -> f64 {
    if price <= regime.decay_threshold {
        return 0.0;
    }
    let increments = (price - regime.decay_threshold) / regime.decay_increment;
    (increments * regime.decay_per_increment).min(regime.max_decay)
}

/// Compute the return of a volatile asset at `price`.
///
/// A cycle crash sets `state.last_crash_round` to the current round.
pub fn adjust_return<R: RandomSource + ?Sized>(
    asset: &AssetParameters,
    regime: &VolatileRegime,
    price: f64,
    state: &mut RoundState,
    rng: &mut R,
) -> RegimeOutcome {
    let (raw, event) = if price < regime.low_price_threshold {
        let (low, high) = regime.growth_range;
        (rng.uniform_between(low, high), RegimeEvent::Growth)
    } else if price >= regime.high_price_threshold {
        let (low, high) = regime.cap_crash_range;
        (rng.uniform_between(low, high), RegimeEvent::CapCrash)
    } else {
        normal_range_return(asset, regime, price, state, rng)
    };

    let return_value = asset.clamp(raw);
    debug!(
        asset = %asset.name,
        price,
        %event,
        return_value,
        "volatile regime return"
    );
    RegimeOutcome { return_value, event }
}

fn normal_range_return<R: RandomSource + ?Sized>(
    asset: &AssetParameters,
    regime: &VolatileRegime,
    price: f64,
    state: &mut RoundState,
    rng: &mut R,
) -> (f64, RegimeEvent) {
    let z = rng.next_standard_normal();
    let mut value = asset.mean_return + asset.std_dev * z;
    let mut event = RegimeEvent::Normal;

    let reduction = volatility_reduction(regime, price);
    if price > regime.decay_threshold {
        value = match regime.dampening {
            DampeningMode::WholeReturn => value * (1.0 - reduction),
            DampeningMode::DispersionOnly => {
                asset.mean_return + asset.std_dev * z * (1.0 - reduction)
            }
        };
        event = RegimeEvent::Dampened;
    }

    if state.rounds_since_crash() >= regime.crash_cycle_rounds
        && rng.next_uniform() < regime.crash_probability
    {
        let shock = state.crash_shock_range;
        value = rng.uniform_between(shock.low, shock.high);
        state.last_crash_round = state.round_number;
        event = RegimeEvent::CycleCrash;
        info!(
            asset = %asset.name,
            round = state.round_number,
            shock = value,
            "cycle crash triggered"
        );
    }

    (value, event)
}
