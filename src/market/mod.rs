//! Price generation and the per-round game economy.

pub mod rng;
pub mod correlation;
pub mod returns;
pub mod regime;
pub mod price_process;
pub mod inflation;
pub mod cash;

pub use rng::{PcgSource, RandomSource, SequenceSource};
pub use correlation::{correlate, CorrelationEngine, CorrelationMethod};
pub use returns::compute_return;
pub use regime::{adjust_return, RegimeEvent, RegimeOutcome};
pub use price_process::{PriceSeriesEngine, RoundOutcome};
pub use inflation::InflationModel;
pub use cash::CashInjector;
