//! Player cash and holdings.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SimulationError};
use crate::types::state::PriceVector;

/// Quantities below this are treated as fully sold.
const QUANTITY_EPSILON: f64 = 1e-12;

/// Cash plus asset quantities held by one player.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Portfolio {
    pub cash: f64,
    pub holdings: BTreeMap<String, f64>,
}

impl Portfolio {
    pub fn new(cash: f64) -> Self {
        Self {
            cash,
            holdings: BTreeMap::new(),
        }
    }

    #[inline]
    pub fn quantity(&self, asset: &str) -> f64 {
        self.holdings.get(asset).copied().unwrap_or(0.0)
    }

    /// `cash + sum(quantity * price)`.
    pub fn value(&self, prices: &PriceVector) -> Result<f64> {
        Ok(self.cash + self.holdings_value(prices)?)
    }

    /// Market value of the holdings alone.
    pub fn holdings_value(&self, prices: &PriceVector) -> Result<f64> {
        let mut total = 0.0;
        for (asset, &quantity) in &self.holdings {
            total += quantity * price_of(prices, asset)?;
        }
        Ok(total)
    }

    /// Buy `quantity` units of `asset` at the current price.
    pub fn buy(&mut self, asset: &str, quantity: f64, prices: &PriceVector) -> Result<()> {
        check_quantity(quantity)?;
        let price = price_of(prices, asset)?;
        let cost = quantity * price;
        if cost > self.cash {
            return Err(SimulationError::InsufficientCash {
                required: cost,
                available: self.cash,
            });
        }
        self.cash -= cost;
        *self.holdings.entry(asset.to_string()).or_insert(0.0) += quantity;
        debug!(asset, quantity, price, cash = self.cash, "buy");
        Ok(())
    }

    /// Sell `quantity` units of `asset` at the current price.
    pub fn sell(&mut self, asset: &str, quantity: f64, prices: &PriceVector) -> Result<()> {
        check_quantity(quantity)?;
        let held = self.quantity(asset);
        if quantity > held + QUANTITY_EPSILON {
            return Err(SimulationError::InsufficientHoldings {
                asset: asset.to_string(),
                requested: quantity,
                held,
            });
        }
        let price = price_of(prices, asset)?;
        let remaining = held - quantity;
        if remaining <= QUANTITY_EPSILON {
            self.holdings.remove(asset);
        } else {
            self.holdings.insert(asset.to_string(), remaining);
        }
        self.cash += quantity * price;
        debug!(asset, quantity, price, cash = self.cash, "sell");
        Ok(())
    }

    /// Spend `fraction` of current cash on `asset`. Returns the quantity bought.
    pub fn buy_with_fraction(
        &mut self,
        asset: &str,
        fraction: f64,
        prices: &PriceVector,
    ) -> Result<f64> {
        if !(0.0..=1.0).contains(&fraction) {
            return Err(SimulationError::InvalidTrade(format!(
                "cash fraction {} outside [0, 1]",
                fraction
            )));
        }
        let price = price_of(prices, asset)?;
        let quantity = self.cash * fraction / price;
        if quantity <= 0.0 {
            return Ok(0.0);
        }
        // Guard the last ulp of float error against the cash check
        let cost = (quantity * price).min(self.cash);
        self.cash -= cost;
        *self.holdings.entry(asset.to_string()).or_insert(0.0) += quantity;
        debug!(asset, quantity, price, cash = self.cash, "buy");
        Ok(quantity)
    }

    /// Spend `fraction` of the cash held at call time on each asset.
    ///
    /// Either every entry is bought or the portfolio is left untouched.
    pub fn allocate(
        &mut self,
        allocation: &BTreeMap<String, f64>,
        prices: &PriceVector,
    ) -> Result<()> {
        let budget = self.cash;
        let mut next = self.clone();
        for (asset, &fraction) in allocation {
            if budget <= 0.0 || fraction <= 0.0 {
                continue;
            }
            let share = (budget * fraction / next.cash).min(1.0);
            next.buy_with_fraction(asset, share, prices)?;
        }
        *self = next;
        Ok(())
    }

    /// Sell every position at current prices.
    pub fn liquidate(&mut self, prices: &PriceVector) -> Result<()> {
        let positions: Vec<(String, f64)> = self
            .holdings
            .iter()
            .map(|(asset, &quantity)| (asset.clone(), quantity))
            .collect();
        for (asset, quantity) in positions {
            self.sell(&asset, quantity, prices)?;
        }
        Ok(())
    }

    pub fn deposit(&mut self, amount: f64) {
        self.cash += amount;
    }
}

fn check_quantity(quantity: f64) -> Result<()> {
    if !(quantity.is_finite() && quantity > 0.0) {
        return Err(SimulationError::InvalidTrade(format!(
            "quantity {} must be positive",
            quantity
        )));
    }
    Ok(())
}

fn price_of(prices: &PriceVector, asset: &str) -> Result<f64> {
    prices
        .get(asset)
        .ok_or_else(|| SimulationError::config(format!("no price for asset {}", asset)))
}
