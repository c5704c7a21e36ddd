//! Player portfolios and their valuation.

pub mod account;
pub mod performance;

pub use account::Portfolio;
pub use performance::PerformanceSummary;
