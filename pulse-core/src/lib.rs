//! Pulse Core
//!
//! Pure computations behind the futures radar:
//! - [`indicator`]: ATR and approximate cumulative volume delta over candle sequences
//! - [`signal`]: rule-based classification into [`Signal`] labels
//! - [`plan`]: entry / take-profit / stop-loss levels for directional signals
//!
//! Nothing in this crate performs I/O or reads process state. Every function is
//! deterministic given its arguments, so callers may run symbols in parallel.

pub mod candle;
pub mod error;
pub mod indicator;
pub mod plan;
pub mod signal;

pub use candle::{Candle, TakerFlow};
pub use error::{IndicatorError, SignalError};
pub use indicator::{
    IndicatorSnapshot, compute_approx_cvd, compute_atr, compute_taker_cvd, signed_volume,
    true_ranges,
};
pub use plan::{PlanConfig, TradePlan};
pub use signal::{
    Classification, MarketContext, Reason, Signal, Thresholds, classify, classify_snapshot,
    evaluate,
};
