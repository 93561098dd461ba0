use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors generated while computing indicators from a candle sequence.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Deserialize, Serialize, Error)]
pub enum IndicatorError {
    #[error("insufficient data: {required} candles required, {available} available")]
    InsufficientData { required: usize, available: usize },

    #[error("candles out of chronological order at index {index}")]
    Unordered { index: usize },

    #[error("invalid candle at index {index}: non-finite value, negative volume or high < low")]
    InvalidCandle { index: usize },

    #[error("indicator value overflowed the f64 range")]
    Overflow,
}

/// Errors generated while classifying market state into a [`Signal`](crate::signal::Signal).
#[derive(Debug, Clone, Eq, PartialEq, Hash, Error)]
pub enum SignalError {
    #[error("invalid classification input: {field} is missing or out of range")]
    InvalidInput { field: &'static str },

    #[error("invalid thresholds: {0}")]
    InvalidThresholds(String),
}
