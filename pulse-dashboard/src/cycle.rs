//! One refresh cycle: select the universe, fetch per-symbol market data, classify.

use crate::config::{CvdSource, DashboardConfig};
use chrono::{DateTime, Utc};
use futures::{StreamExt, stream};
use pulse_core::{
    IndicatorError, IndicatorSnapshot, MarketContext, Signal, SignalError, TradePlan,
    classify_snapshot, compute_approx_cvd, compute_atr, compute_taker_cvd,
};
use pulse_data::{
    DataError, Kline, MarketDataSource, Ticker24h, Universe, top_volatile_symbols,
};
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Why a symbol produced no analysis this cycle.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("market data: {0}")]
    Data(#[from] DataError),

    #[error("indicator: {0}")]
    Indicator(#[from] IndicatorError),

    #[error("signal: {0}")]
    Signal(#[from] SignalError),
}

impl AnalysisError {
    /// Determine if the symbol's previous analysis is still worth showing.
    ///
    /// Indicator and signal failures are local to this cycle's data. Market data failures
    /// defer to [`DataError::is_transient`].
    pub fn is_transient(&self) -> bool {
        match self {
            AnalysisError::Data(error) => error.is_transient(),
            AnalysisError::Indicator(_) | AnalysisError::Signal(_) => true,
        }
    }
}

/// Analysed state of one symbol.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub symbol: String,
    /// Close of the latest kline
    pub price: f64,
    pub price_change_pct_24h: f64,
    pub atr: f64,
    /// ATR as a percentage of price
    pub atr_pct: f64,
    pub funding_rate: f64,
    pub open_interest: f64,
    pub cvd: f64,
    pub signal: Signal,
    pub reason: String,
    pub plan: Option<TradePlan>,
    pub time: DateTime<Utc>,
}

/// Outcome of [`run_cycle`].
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub universe: Universe,
    /// Successful analyses in universe order
    pub analyses: Vec<Analysis>,
    /// Symbols skipped this cycle, in universe order
    pub failures: Vec<(String, AnalysisError)>,
    pub started: DateTime<Utc>,
    pub finished: DateTime<Utc>,
}

impl CycleReport {
    pub fn analysis(&self, symbol: &str) -> Option<&Analysis> {
        self.analyses.iter().find(|analysis| analysis.symbol == symbol)
    }

    pub fn failure(&self, symbol: &str) -> Option<&AnalysisError> {
        self.failures
            .iter()
            .find_map(|(failed, error)| (failed == symbol).then_some(error))
    }
}

/// Run one refresh cycle against `source`.
///
/// Symbols are analysed concurrently, at most `config.fetch_concurrency` at a time. A symbol
/// that fails is reported in [`CycleReport::failures`] and never aborts the cycle.
pub async fn run_cycle<Source>(source: &Source, config: &DashboardConfig) -> CycleReport
where
    Source: MarketDataSource + ?Sized,
{
    let started = Utc::now();
    let universe = top_volatile_symbols(source, &config.universe).await;

    let tickers: HashMap<String, Ticker24h> = match source.tickers_24h().await {
        Ok(tickers) => tickers
            .into_iter()
            .map(|ticker| (ticker.symbol.clone(), ticker))
            .collect(),
        Err(error) => {
            warn!(%error, "24h tickers unavailable, price change missing this cycle");
            HashMap::new()
        }
    };

    // Jobs own their symbol and ticker: the cycle future must be Send for tokio::spawn
    let jobs = universe
        .symbols
        .iter()
        .enumerate()
        .map(|(index, symbol)| (index, symbol.clone(), tickers.get(symbol).cloned()))
        .collect::<Vec<_>>();

    let mut results = stream::iter(jobs)
        .map(move |(index, symbol, ticker)| async move {
            let result = analyse_symbol(source, &symbol, ticker.as_ref(), config).await;
            (index, result)
        })
        .buffer_unordered(config.fetch_concurrency.max(1))
        .collect::<Vec<_>>()
        .await;
    results.sort_by_key(|(index, _)| *index);

    let mut analyses = Vec::with_capacity(results.len());
    let mut failures = Vec::new();
    for (index, result) in results {
        let symbol = &universe.symbols[index];
        match result {
            Ok(analysis) => analyses.push(analysis),
            Err(error) if error.is_transient() => {
                warn!(%symbol, %error, "symbol skipped this cycle");
                failures.push((symbol.clone(), error));
            }
            Err(error) => {
                error!(%symbol, %error, "symbol failed with a non-transient error");
                failures.push((symbol.clone(), error));
            }
        }
    }

    let finished = Utc::now();
    info!(
        symbols = universe.symbols.len(),
        analysed = analyses.len(),
        failed = failures.len(),
        elapsed_ms = (finished - started).num_milliseconds(),
        "refresh cycle complete"
    );

    CycleReport {
        universe,
        analyses,
        failures,
        started,
        finished,
    }
}

/// Fetch and classify one symbol.
///
/// Klines are required. Funding, open interest and the 24h ticker degrade to missing
/// context, which the classifier rejects with [`SignalError::InvalidInput`].
pub async fn analyse_symbol<Source>(
    source: &Source,
    symbol: &str,
    ticker: Option<&Ticker24h>,
    config: &DashboardConfig,
) -> Result<Analysis, AnalysisError>
where
    Source: MarketDataSource + ?Sized,
{
    let (klines, cvd_klines, funding, open_interest) = futures::join!(
        source.klines(symbol, config.timeframe, config.kline_limit),
        source.klines(symbol, config.cvd_interval, config.cvd_limit),
        source.funding_rate(symbol),
        source.open_interest(symbol),
    );
    let klines = klines?;
    let cvd_klines = cvd_klines?;

    let funding_rate = match funding {
        Ok(funding) => funding.map(|funding| funding.funding_rate),
        Err(error) => {
            debug!(%symbol, %error, "funding rate unavailable");
            None
        }
    };
    let open_interest = match open_interest {
        Ok(open_interest) => Some(open_interest.open_interest),
        Err(error) => {
            debug!(%symbol, %error, "open interest unavailable");
            None
        }
    };

    let snapshot = indicator_snapshot(&klines, &cvd_klines, config)?;
    let context = MarketContext {
        symbol: symbol.to_string(),
        price_change_pct_24h: ticker.map(|ticker| ticker.price_change_pct),
        open_interest,
        funding_rate,
    };

    // compute_atr guarantees klines is non-empty
    let price = klines.last().map(|kline| kline.close).unwrap_or_default();
    let atr_pct = if price > 0.0 {
        snapshot.atr / price * 100.0
    } else {
        0.0
    };

    let classification = classify_snapshot(&snapshot, &context, &config.thresholds)?
        .with_atr_pct(atr_pct, &config.thresholds);

    Ok(Analysis {
        symbol: symbol.to_string(),
        price,
        price_change_pct_24h: context.price_change_pct_24h.unwrap_or_default(),
        atr: snapshot.atr,
        atr_pct,
        funding_rate: funding_rate.unwrap_or_default(),
        open_interest: open_interest.unwrap_or_default(),
        cvd: snapshot.cvd_approx,
        signal: classification.signal,
        reason: classification.reason.to_string(),
        plan: TradePlan::new(classification.signal, price, snapshot.atr, &config.plan),
        time: Utc::now(),
    })
}

fn indicator_snapshot(
    klines: &[Kline],
    cvd_klines: &[Kline],
    config: &DashboardConfig,
) -> Result<IndicatorSnapshot, IndicatorError> {
    let candles = klines.iter().map(Kline::candle).collect::<Vec<_>>();
    let atr = compute_atr(&candles, config.atr_period)?;

    let cvd_approx = match config.cvd_source {
        CvdSource::Candle => {
            compute_approx_cvd(&cvd_klines.iter().map(Kline::candle).collect::<Vec<_>>())?
        }
        CvdSource::Taker => {
            compute_taker_cvd(&cvd_klines.iter().map(Kline::taker_flow).collect::<Vec<_>>())?
        }
    };

    Ok(IndicatorSnapshot { atr, cvd_approx })
}
