//! Investment Odyssey simulation engine in Rust
//!
//! Correlated multi-asset price generation for the Investment Odyssey
//! portfolio game: six asset classes with bounded, correlated returns, a
//! price-dependent volatile asset with periodic crash shocks, and the round
//! economy around it (inflation, cash injections, portfolio valuation).
//!
//! All randomness comes from instance-local sources, so sessions are
//! reproducible from a seed and safe to run in parallel.

pub mod error;
pub mod types;
pub mod market;
pub mod portfolio;
pub mod simulation;

#[cfg(feature = "python")]
mod python;

pub use error::{Result, SimulationError};
pub use market::{PriceSeriesEngine, RandomSource, RoundOutcome};
pub use portfolio::{PerformanceSummary, Portfolio};
pub use simulation::{run_sessions_parallel, BatchConfig, GameSession};
pub use types::{
    AssetParameters, AssetUniverse, CorrelationMatrix, PriceVector, RegimeKind, RoundState,
    SimulationConfig,
};
