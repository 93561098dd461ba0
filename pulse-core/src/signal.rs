//! Signal generator: rule-based classification of one symbol's market state.
//!
//! Classification is a pure function of its inputs and an explicit [`Thresholds`] record.
//! Label transitions between refresh cycles are tracked by the caller, not here.

use crate::{error::SignalError, indicator::IndicatorSnapshot};
use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Recommendation label for a symbol.
#[derive(
    Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Default, Display, Deserialize, Serialize,
)]
pub enum Signal {
    #[display("SCALP LONG")]
    ScalpLong,
    #[display("SCALP SHORT")]
    ScalpShort,
    #[default]
    #[display("WAIT")]
    Wait,
}

impl Signal {
    /// ScalpLong or ScalpShort.
    pub fn is_directional(&self) -> bool {
        !matches!(self, Signal::Wait)
    }
}

/// Why a [`Signal`] was chosen.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Display, Deserialize, Serialize)]
pub enum Reason {
    #[display("Funding negative (shorts pay) + buying pressure on a strong up move -> short squeeze")]
    SqueezeLong,
    #[display("Funding positive (longs pay) + selling pressure on a strong down move -> long squeeze")]
    SqueezeShort,
    #[display("High volatility - prefer to wait for a clearer setup")]
    HighVolatility,
    #[display("Open interest too thin for a reliable setup")]
    ThinOpenInterest,
    #[display("No clear squeeze condition")]
    NoSetup,
}

/// Outcome of [`evaluate`].
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Deserialize, Serialize)]
pub struct Classification {
    pub signal: Signal,
    pub reason: Reason,
}

impl Classification {
    /// Report [`Reason::HighVolatility`] for a [`Reason::NoSetup`] wait whose ATR, as a
    /// percentage of price, is above [`Thresholds::max_atr_pct`]. The label never changes.
    pub fn with_atr_pct(self, atr_pct: f64, thresholds: &Thresholds) -> Self {
        let volatile = thresholds
            .max_atr_pct
            .is_some_and(|max_atr_pct| atr_pct > max_atr_pct);

        match self.reason {
            Reason::NoSetup if volatile => Self {
                reason: Reason::HighVolatility,
                ..self
            },
            _ => self,
        }
    }
}

/// Tunable classification thresholds.
///
/// Every directional rule compares against one of these fields; there are no other
/// constants in the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Thresholds {
    /// Minimum absolute 24h price change, in percent, before a directional label is considered.
    /// The move must point the same way as the label (up for long, down for short).
    pub min_price_change_pct_for_signal: f64,
    /// CVD must be strictly beyond this magnitude in the label's direction.
    /// Expressed in base-asset units, so `0.0` means "any net buying / selling".
    pub cvd_significance_threshold: f64,
    /// Funding must be strictly beyond this magnitude against the label's direction:
    /// below `-funding_rate_extreme` for long, above `+funding_rate_extreme` for short.
    pub funding_rate_extreme: f64,
    /// Symbols with open interest below this never receive a directional label.
    pub min_open_interest: f64,
    /// When set, an ATR above this value forces [`Signal::Wait`].
    pub max_atr: Option<f64>,
    /// When set, a wait with no setup whose ATR is above this percentage of price is reported
    /// as [`Reason::HighVolatility`]. See [`Classification::with_atr_pct`].
    pub max_atr_pct: Option<f64>,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            min_price_change_pct_for_signal: 1.0,
            cvd_significance_threshold: 0.0,
            funding_rate_extreme: 0.0005,
            min_open_interest: 0.0,
            max_atr: None,
            max_atr_pct: Some(3.0),
        }
    }
}

impl Thresholds {
    /// Every threshold is finite and non-negative.
    pub fn validate(&self) -> Result<(), SignalError> {
        let fields = [
            (
                "min_price_change_pct_for_signal",
                self.min_price_change_pct_for_signal,
            ),
            ("cvd_significance_threshold", self.cvd_significance_threshold),
            ("funding_rate_extreme", self.funding_rate_extreme),
            ("min_open_interest", self.min_open_interest),
        ];

        fields
            .into_iter()
            .chain(self.max_atr.map(|max_atr| ("max_atr", max_atr)))
            .chain(self.max_atr_pct.map(|max_atr_pct| ("max_atr_pct", max_atr_pct)))
            .try_for_each(|(name, value)| {
                if value.is_finite() && value >= 0.0 {
                    Ok(())
                } else {
                    Err(SignalError::InvalidThresholds(format!(
                        "{name} must be finite and non-negative, got {value}"
                    )))
                }
            })
    }
}

/// Market state fetched once per refresh cycle.
///
/// `None` marks a field the market data client could not provide. Classification fails on
/// missing fields instead of substituting defaults.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct MarketContext {
    pub symbol: String,
    /// 24h price change in percent (eg/ 3.5 means +3.5%)
    pub price_change_pct_24h: Option<f64>,
    pub open_interest: Option<f64>,
    pub funding_rate: Option<f64>,
}

/// Classify into a [`Signal`].
///
/// Fails with [`SignalError::InvalidInput`] if any input is non-finite, or if ATR or open
/// interest is negative. `thresholds` are expected to have passed [`Thresholds::validate`]
/// once, when the configuration was loaded.
pub fn classify(
    atr: f64,
    cvd: f64,
    funding_rate: f64,
    open_interest: f64,
    price_change_pct: f64,
    thresholds: &Thresholds,
) -> Result<Signal, SignalError> {
    evaluate(
        atr,
        cvd,
        funding_rate,
        open_interest,
        price_change_pct,
        thresholds,
    )
    .map(|classification| classification.signal)
}

/// [`classify`] applied to an [`IndicatorSnapshot`] and [`MarketContext`].
pub fn classify_snapshot(
    snapshot: &IndicatorSnapshot,
    context: &MarketContext,
    thresholds: &Thresholds,
) -> Result<Classification, SignalError> {
    let funding_rate = context.funding_rate.ok_or(SignalError::InvalidInput {
        field: "funding_rate",
    })?;
    let open_interest = context.open_interest.ok_or(SignalError::InvalidInput {
        field: "open_interest",
    })?;
    let price_change_pct = context
        .price_change_pct_24h
        .ok_or(SignalError::InvalidInput {
            field: "price_change_pct_24h",
        })?;

    evaluate(
        snapshot.atr,
        snapshot.cvd_approx,
        funding_rate,
        open_interest,
        price_change_pct,
        thresholds,
    )
}

/// Classify and report the [`Reason`] behind the label.
pub fn evaluate(
    atr: f64,
    cvd: f64,
    funding_rate: f64,
    open_interest: f64,
    price_change_pct: f64,
    thresholds: &Thresholds,
) -> Result<Classification, SignalError> {
    let inputs = [
        ("atr", atr),
        ("cvd", cvd),
        ("funding_rate", funding_rate),
        ("open_interest", open_interest),
        ("price_change_pct", price_change_pct),
    ];
    if let Some((field, _)) = inputs.into_iter().find(|(_, value)| !value.is_finite()) {
        return Err(SignalError::InvalidInput { field });
    }
    if atr < 0.0 {
        return Err(SignalError::InvalidInput { field: "atr" });
    }
    if open_interest < 0.0 {
        return Err(SignalError::InvalidInput {
            field: "open_interest",
        });
    }

    let classification = |signal, reason| Ok(Classification { signal, reason });

    if thresholds.max_atr.is_some_and(|max_atr| atr > max_atr) {
        return classification(Signal::Wait, Reason::HighVolatility);
    }
    if open_interest < thresholds.min_open_interest {
        return classification(Signal::Wait, Reason::ThinOpenInterest);
    }

    let long = cvd > thresholds.cvd_significance_threshold
        && funding_rate < -thresholds.funding_rate_extreme
        && price_change_pct >= thresholds.min_price_change_pct_for_signal;

    let short = cvd < -thresholds.cvd_significance_threshold
        && funding_rate > thresholds.funding_rate_extreme
        && price_change_pct <= -thresholds.min_price_change_pct_for_signal;

    match (long, short) {
        (true, _) => classification(Signal::ScalpLong, Reason::SqueezeLong),
        (_, true) => classification(Signal::ScalpShort, Reason::SqueezeShort),
        _ => classification(Signal::Wait, Reason::NoSetup),
    }
}
