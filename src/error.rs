//! Error type shared by the engine, portfolio and session driver.

use thiserror::Error;

/// Errors that can occur while simulating a game.
#[derive(Error, Debug)]
pub enum SimulationError {
    /// Asset table, correlation matrix or price vector are inconsistent.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A supplied or generated price is zero, negative or not finite.
    #[error("Non-positive price for {asset}: {price}")]
    NumericDomain { asset: String, price: f64 },

    #[error("Insufficient cash: required {required:.2}, available {available:.2}")]
    InsufficientCash { required: f64, available: f64 },

    #[error("Insufficient holdings of {asset}: requested {requested}, held {held}")]
    InsufficientHoldings {
        asset: String,
        requested: f64,
        held: f64,
    },

    #[error("Invalid trade: {0}")]
    InvalidTrade(String),

    #[error("Game over: all {max_rounds} rounds have been played")]
    GameOver { max_rounds: u32 },

    #[error("Invalid config file: {0}")]
    Config(#[from] serde_json::Error),
}

impl SimulationError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        SimulationError::Configuration(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, SimulationError>;
