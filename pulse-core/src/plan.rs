use crate::signal::Signal;
use serde::{Deserialize, Serialize};

/// ATR scaling and clamps used to place take-profit and stop-loss levels.
///
/// Distances are fractions of entry price: `tp = clamp(atr_pct * tp_atr_multiple, tp_min, tp_max)`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct PlanConfig {
    pub tp_atr_multiple: f64,
    pub tp_min: f64,
    pub tp_max: f64,
    pub sl_atr_multiple: f64,
    pub sl_min: f64,
    pub sl_max: f64,
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            tp_atr_multiple: 5.0,
            tp_min: 0.01,
            tp_max: 0.05,
            sl_atr_multiple: 3.0,
            sl_min: 0.01,
            sl_max: 0.03,
        }
    }
}

/// Entry, target and stop levels for a directional [`Signal`].
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct TradePlan {
    pub signal: Signal,
    pub entry: f64,
    pub take_profit: f64,
    pub stop_loss: f64,
    /// Potential gain over potential loss, unrounded
    pub risk_reward: f64,
}

impl PlanConfig {
    /// Finite, non-negative fields with `min <= max` for both clamps.
    pub fn is_valid(&self) -> bool {
        [
            self.tp_atr_multiple,
            self.tp_min,
            self.tp_max,
            self.sl_atr_multiple,
            self.sl_min,
            self.sl_max,
        ]
        .iter()
        .all(|value| value.is_finite() && *value >= 0.0)
            && self.tp_min <= self.tp_max
            && self.sl_min <= self.sl_max
    }
}

impl TradePlan {
    /// Build a plan entering at `price`. Returns `None` for [`Signal::Wait`] or when price / ATR
    /// cannot produce meaningful levels.
    pub fn new(signal: Signal, price: f64, atr: f64, config: &PlanConfig) -> Option<Self> {
        if !signal.is_directional()
            || !config.is_valid()
            || !price.is_finite()
            || price <= 0.0
            || !atr.is_finite()
        {
            return None;
        }

        let atr_pct = atr.max(0.0) / price;
        let tp_distance = (atr_pct * config.tp_atr_multiple).clamp(config.tp_min, config.tp_max);
        let sl_distance = (atr_pct * config.sl_atr_multiple).clamp(config.sl_min, config.sl_max);
        if sl_distance <= 0.0 {
            return None;
        }

        let (take_profit, stop_loss) = match signal {
            Signal::ScalpLong => (price * (1.0 + tp_distance), price * (1.0 - sl_distance)),
            Signal::ScalpShort => (price * (1.0 - tp_distance), price * (1.0 + sl_distance)),
            Signal::Wait => return None,
        };

        Some(Self {
            signal,
            entry: price,
            take_profit,
            stop_loss,
            risk_reward: tp_distance / sl_distance,
        })
    }
}
