//! Indicator engine: ATR and approximate cumulative volume delta.
//!
//! Both indicators are single-pass computations over an ascending candle sequence.
//! Values are never rounded here; rounding is a presentation concern.

use crate::{
    candle::{Candle, TakerFlow},
    error::IndicatorError,
};
use serde::{Deserialize, Serialize};

/// Indicator values for one symbol at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
pub struct IndicatorSnapshot {
    /// Average true range in price units
    pub atr: f64,
    /// Approximate cumulative volume delta in base units
    pub cvd_approx: f64,
}

impl IndicatorSnapshot {
    /// Compute ATR over `atr_candles` and the candle-direction CVD over `cvd_candles`.
    ///
    /// The two sequences may come from different timeframes (eg/ 15m for ATR, 1m for CVD).
    pub fn from_candles(
        atr_candles: &[Candle],
        cvd_candles: &[Candle],
        period: usize,
    ) -> Result<Self, IndicatorError> {
        Ok(Self {
            atr: compute_atr(atr_candles, period)?,
            cvd_approx: compute_approx_cvd(cvd_candles)?,
        })
    }
}

/// Average True Range over the trailing `period` candles.
///
/// True range is `max(high - low, |high - prev_close|, |low - prev_close|)`. The first candle
/// has no previous close and contributes `high - low` only, which is why `period + 1` candles
/// are required: every true range inside the window then has a real previous close.
///
/// The average is a simple mean of the window, not Wilder smoothing.
pub fn compute_atr(candles: &[Candle], period: usize) -> Result<f64, IndicatorError> {
    let required = period.saturating_add(1);
    if period == 0 || candles.len() < required {
        return Err(IndicatorError::InsufficientData {
            required,
            available: candles.len(),
        });
    }

    let ranges = true_ranges(candles)?;
    let window = &ranges[ranges.len() - period..];

    finite(window.iter().sum::<f64>() / period as f64)
}

/// Per-candle true range for the whole sequence, first element using `high - low` only.
pub fn true_ranges(candles: &[Candle]) -> Result<Vec<f64>, IndicatorError> {
    validate(candles)?;

    let mut prev_close: Option<f64> = None;
    Ok(candles
        .iter()
        .map(|candle| {
            let tr = match prev_close {
                Some(prev_close) => candle
                    .range()
                    .max((candle.high - prev_close).abs())
                    .max((candle.low - prev_close).abs()),
                None => candle.range(),
            };
            prev_close = Some(candle.close);
            tr
        })
        .collect())
}

/// Approximate cumulative volume delta from candle direction.
///
/// Each candle's volume is counted as buying when `close >= open` and as selling otherwise,
/// and the signed volumes are summed across the whole sequence.
///
/// This is a coarse heuristic: a candle that closes up can still contain more aggressive
/// selling than buying. It proxies order-flow pressure when no trade tape is available and
/// must not be read as a precise buy/sell volume delta. See [`compute_taker_cvd`] for the
/// kline taker-split variant.
pub fn compute_approx_cvd(candles: &[Candle]) -> Result<f64, IndicatorError> {
    if candles.is_empty() {
        return Err(IndicatorError::InsufficientData {
            required: 1,
            available: 0,
        });
    }
    validate(candles)?;

    finite(candles.iter().map(signed_volume).sum())
}

/// Volume signed by candle direction: positive when `close >= open`, negative otherwise.
pub fn signed_volume(candle: &Candle) -> f64 {
    if candle.is_bullish() {
        candle.volume
    } else {
        -candle.volume
    }
}

/// Cumulative volume delta from the taker buy volume reported with each kline.
///
/// delta = taker_buy - (volume - taker_buy), summed over the sequence. Closer to real order
/// flow than [`compute_approx_cvd`] but still aggregated per candle.
pub fn compute_taker_cvd(flows: &[TakerFlow]) -> Result<f64, IndicatorError> {
    if flows.is_empty() {
        return Err(IndicatorError::InsufficientData {
            required: 1,
            available: 0,
        });
    }

    if let Some(index) = flows.iter().position(|flow| {
        !flow.volume.is_finite()
            || !flow.taker_buy_volume.is_finite()
            || flow.volume < 0.0
            || flow.taker_buy_volume < 0.0
            || flow.taker_buy_volume > flow.volume
    }) {
        return Err(IndicatorError::InvalidCandle { index });
    }

    finite(flows.iter().map(TakerFlow::delta).sum())
}

/// Accumulated sums of valid inputs can still overflow to infinity.
fn finite(value: f64) -> Result<f64, IndicatorError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(IndicatorError::Overflow)
    }
}

fn validate(candles: &[Candle]) -> Result<(), IndicatorError> {
    if let Some(index) = candles.iter().position(|candle| !candle.is_valid()) {
        return Err(IndicatorError::InvalidCandle { index });
    }

    match candles
        .windows(2)
        .position(|pair| pair[1].open_time < pair[0].open_time)
    {
        Some(index) => Err(IndicatorError::Unordered { index: index + 1 }),
        None => Ok(()),
    }
}
