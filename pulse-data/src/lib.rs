//! Pulse Data
//!
//! Binance USD-M Futures REST market data for the futures radar:
//! - [`client`]: [`MarketDataSource`] trait and the reqwest-backed [`BinanceFuturesClient`]
//! - [`model`]: normalised kline, ticker, funding, open interest and exchange info models
//! - [`universe`]: top-N volatile symbol selection with a fallback list
//! - [`cache`]: TTL cache for exchange-wide responses

pub mod cache;
pub mod client;
pub mod de;
pub mod error;
pub mod model;
pub mod universe;

pub use client::{BINANCE_FUTURES_BASE, BinanceConfig, BinanceFuturesClient, MarketDataSource};
pub use error::DataError;
pub use model::{ExchangeInfo, FundingRate, Interval, Kline, OpenInterest, SymbolInfo, Ticker24h};
pub use universe::{
    FALLBACK_SYMBOLS, Universe, UniverseConfig, UniverseSource, fallback_symbols,
    select_top_volatile, top_volatile_symbols,
};
