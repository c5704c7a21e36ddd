//! Core types for the simulation engine.

pub mod asset;
pub mod correlation;
pub mod state;
pub mod config;
pub mod result;

pub use asset::{AssetParameters, AssetUniverse, DampeningMode, RegimeKind, VolatileRegime};
pub use correlation::CorrelationMatrix;
pub use state::{PriceVector, RoundState, ShockRange, ShockSoftening};
pub use config::{CashInjectionConfig, InflationConfig, SimulationConfig};
pub use result::{BatchSimulationResult, RoundSnapshot, SessionResult};
