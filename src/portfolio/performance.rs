//! End-of-game performance metrics.

use serde::{Deserialize, Serialize};

/// Nominal and inflation-adjusted results of one player.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub total_value: f64,
    pub initial_cash: f64,
    pub total_cash_injected: f64,
    pub nominal_return: f64,
    pub nominal_return_pct: f64,
    /// `total_value` deflated to starting-CPI money, minus starting cash.
    pub real_return: f64,
    pub real_return_pct: f64,
    pub final_cpi: f64,
}

impl PerformanceSummary {
    /// Returns are measured against starting cash only; injections count
    /// toward the final value.
    pub fn compute(
        total_value: f64,
        initial_cash: f64,
        total_cash_injected: f64,
        initial_cpi: f64,
        final_cpi: f64,
    ) -> Self {
        let nominal_return = total_value - initial_cash;
        let real_value = total_value / final_cpi * initial_cpi;
        let real_return = real_value - initial_cash;
        let pct = |r: f64| {
            if initial_cash > 0.0 {
                r / initial_cash * 100.0
            } else {
                0.0
            }
        };
        Self {
            total_value,
            initial_cash,
            total_cash_injected,
            nominal_return,
            nominal_return_pct: pct(nominal_return),
            real_return,
            real_return_pct: pct(real_return),
            final_cpi,
        }
    }
}
