use chrono::{DateTime, Utc};
use derive_more::Constructor;
use serde::{Deserialize, Serialize};

/// One OHLCV row for a sampling interval.
///
/// Sequences of candles are expected in ascending `open_time` order and are never
/// mutated once fetched.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize, Constructor)]
pub struct Candle {
    pub open_time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// Close at or above open. Doji candles count as bullish.
    pub fn is_bullish(&self) -> bool {
        self.close >= self.open
    }

    /// All prices, volume and the high-low range are finite, volume is non-negative and
    /// high >= low.
    pub fn is_valid(&self) -> bool {
        [self.open, self.high, self.low, self.close, self.volume]
            .iter()
            .all(|value| value.is_finite())
            && self.range().is_finite()
            && self.volume >= 0.0
            && self.high >= self.low
    }

    /// High minus low.
    pub fn range(&self) -> f64 {
        self.high - self.low
    }
}

/// Taker split of a candle's volume, as reported by Binance klines.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize, Constructor)]
pub struct TakerFlow {
    /// Total base volume traded in the interval
    pub volume: f64,
    /// Base volume where the aggressor was the buyer
    pub taker_buy_volume: f64,
}

impl TakerFlow {
    /// Aggressive buy volume minus aggressive sell volume.
    pub fn delta(&self) -> f64 {
        self.taker_buy_volume - (self.volume - self.taker_buy_volume)
    }
}
