//! Selection of the symbols a refresh cycle analyses.

use crate::{client::MarketDataSource, model::Ticker24h};
use itertools::Itertools;
use std::collections::HashSet;
use tracing::{info, warn};

/// Liquid pairs used when the ticker endpoint is unavailable or yields nothing usable.
pub const FALLBACK_SYMBOLS: [&str; 10] = [
    "BTCUSDT", "ETHUSDT", "BNBUSDT", "XRPUSDT", "SOLUSDT", "ADAUSDT", "DOGEUSDT", "AVAXUSDT",
    "DOTUSDT", "MATICUSDT",
];

/// Symbols excluded by default (delisted or erratic tickers).
pub const DEFAULT_EXCLUDED_SYMBOLS: [&str; 2] = ["COCOSUSDT", "BEAMUSDT"];

/// How the top-N volatile universe is chosen.
#[derive(Debug, Clone, PartialEq)]
pub struct UniverseConfig {
    /// Number of symbols to return
    pub top_n: usize,
    /// Required quote asset suffix (eg/ "USDT")
    pub quote_asset: String,
    /// Symbols never selected
    pub excluded: Vec<String>,
}

impl Default for UniverseConfig {
    fn default() -> Self {
        Self {
            top_n: 10,
            quote_asset: "USDT".to_string(),
            excluded: DEFAULT_EXCLUDED_SYMBOLS
                .iter()
                .map(|symbol| symbol.to_string())
                .collect(),
        }
    }
}

/// Where the selected symbols came from.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum UniverseSource {
    Tickers,
    Fallback,
}

/// Selected symbols, most volatile first.
#[derive(Debug, Clone, PartialEq)]
pub struct Universe {
    pub symbols: Vec<String>,
    pub source: UniverseSource,
}

/// First `n` entries of [`FALLBACK_SYMBOLS`].
pub fn fallback_symbols(n: usize) -> Vec<String> {
    FALLBACK_SYMBOLS
        .iter()
        .take(n)
        .map(|symbol| symbol.to_string())
        .collect()
}

/// Rank tickers by absolute 24h price change, ties broken by base volume, and keep the top N.
///
/// A ticker is eligible when it quotes in `config.quote_asset`, is not a dated delivery
/// contract, is not excluded, has traded volume, and (if `tradable` is given) is a
/// tradable perpetual.
pub fn select_top_volatile(
    tickers: &[Ticker24h],
    tradable: Option<&HashSet<String>>,
    config: &UniverseConfig,
) -> Vec<String> {
    tickers
        .iter()
        .filter(|ticker| ticker.symbol.ends_with(&config.quote_asset))
        .filter(|ticker| !ticker.symbol.contains('_'))
        .filter(|ticker| !config.excluded.iter().any(|excluded| excluded == &ticker.symbol))
        .filter(|ticker| ticker.volume > 0.0 && ticker.price_change_pct.is_finite())
        .filter(|ticker| tradable.is_none_or(|tradable| tradable.contains(&ticker.symbol)))
        .sorted_by(|a, b| {
            b.price_change_pct
                .abs()
                .total_cmp(&a.price_change_pct.abs())
                .then_with(|| b.volume.total_cmp(&a.volume))
        })
        .take(config.top_n)
        .map(|ticker| ticker.symbol.clone())
        .collect()
}

/// Fetch tickers (and exchange info when available) and select the top N volatile symbols.
///
/// Never fails: any fetch error or an empty selection falls back to [`FALLBACK_SYMBOLS`].
pub async fn top_volatile_symbols<Source>(source: &Source, config: &UniverseConfig) -> Universe
where
    Source: MarketDataSource + ?Sized,
{
    let tickers = match source.tickers_24h().await {
        Ok(tickers) => tickers,
        Err(error) => {
            warn!(%error, "24h ticker fetch failed, using fallback symbols");
            return Universe {
                symbols: fallback_symbols(config.top_n),
                source: UniverseSource::Fallback,
            };
        }
    };

    // Exchange info only narrows the universe, so its failure is not fatal
    let tradable = match source.exchange_info().await {
        Ok(info) => Some(
            info.tradable_perpetuals()
                .map(str::to_string)
                .collect::<HashSet<_>>(),
        ),
        Err(error) => {
            warn!(%error, "exchange info fetch failed, skipping contract status filter");
            None
        }
    };

    let symbols = select_top_volatile(&tickers, tradable.as_ref(), config);
    if symbols.is_empty() {
        warn!("no eligible tickers, using fallback symbols");
        return Universe {
            symbols: fallback_symbols(config.top_n),
            source: UniverseSource::Fallback,
        };
    }

    info!(count = symbols.len(), "selected top volatile symbols");
    Universe {
        symbols,
        source: UniverseSource::Tickers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::DataError,
        model::{ExchangeInfo, FundingRate, Interval, Kline, OpenInterest, SymbolInfo},
    };
    use async_trait::async_trait;

    fn ticker(symbol: &str, price_change_pct: f64, volume: f64) -> Ticker24h {
        Ticker24h {
            symbol: symbol.to_string(),
            price_change_pct,
            last_price: 1.0,
            volume,
            quote_volume: volume,
        }
    }

    fn tickers() -> Vec<Ticker24h> {
        vec![
            ticker("BTCUSDT", 2.0, 1_000.0),
            ticker("ETHUSDT", -9.5, 5_000.0),
            ticker("SOLUSDT", 9.5, 9_000.0),
            ticker("COCOSUSDT", 40.0, 1_000.0),
            ticker("ETHBTC", 30.0, 1_000.0),
            ticker("BTCUSDT_250926", 25.0, 1_000.0),
            ticker("DEADUSDT", 50.0, 0.0),
            ticker("XRPUSDT", 0.5, 100.0),
        ]
    }

    #[test]
    fn test_select_top_volatile() {
        struct TestCase {
            input: (Option<HashSet<String>>, usize),
            expected: Vec<&'static str>,
        }

        let tests = vec![
            TestCase {
                // TC0: ranked by |change| then volume, ineligible tickers removed
                input: (None, 10),
                expected: vec!["SOLUSDT", "ETHUSDT", "BTCUSDT", "XRPUSDT"],
            },
            TestCase {
                // TC1: truncated to top N
                input: (None, 2),
                expected: vec!["SOLUSDT", "ETHUSDT"],
            },
            TestCase {
                // TC2: restricted to tradable perpetuals
                input: (
                    Some(HashSet::from(["BTCUSDT".to_string(), "XRPUSDT".to_string()])),
                    10,
                ),
                expected: vec!["BTCUSDT", "XRPUSDT"],
            },
            TestCase {
                // TC3: top zero
                input: (None, 0),
                expected: vec![],
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let (tradable, top_n) = test.input;
            let config = UniverseConfig {
                top_n,
                ..Default::default()
            };
            let actual = select_top_volatile(&tickers(), tradable.as_ref(), &config);
            assert_eq!(actual, test.expected, "TC{} failed", index);
        }
    }

    #[test]
    fn test_fallback_symbols() {
        assert_eq!(fallback_symbols(3), vec!["BTCUSDT", "ETHUSDT", "BNBUSDT"]);
        assert_eq!(fallback_symbols(50).len(), FALLBACK_SYMBOLS.len());
    }

    struct FakeSource {
        tickers: Result<Vec<Ticker24h>, DataError>,
        exchange_info: Result<ExchangeInfo, DataError>,
    }

    #[async_trait]
    impl MarketDataSource for FakeSource {
        async fn exchange_info(&self) -> Result<ExchangeInfo, DataError> {
            self.exchange_info.clone()
        }

        async fn tickers_24h(&self) -> Result<Vec<Ticker24h>, DataError> {
            self.tickers.clone()
        }

        async fn klines(&self, _: &str, _: Interval, _: u16) -> Result<Vec<Kline>, DataError> {
            Ok(vec![])
        }

        async fn funding_rate(&self, _: &str) -> Result<Option<FundingRate>, DataError> {
            Ok(None)
        }

        async fn open_interest(&self, _: &str) -> Result<OpenInterest, DataError> {
            Err(DataError::EmptyResponse("openInterest".to_string()))
        }
    }

    fn perpetual(symbol: &str) -> SymbolInfo {
        SymbolInfo {
            symbol: symbol.to_string(),
            status: "TRADING".to_string(),
            contract_type: "PERPETUAL".to_string(),
            quote_asset: "USDT".to_string(),
        }
    }

    #[tokio::test]
    async fn test_top_volatile_symbols_from_tickers() {
        let source = FakeSource {
            tickers: Ok(tickers()),
            exchange_info: Ok(ExchangeInfo {
                symbols: vec![perpetual("ETHUSDT"), perpetual("BTCUSDT")],
            }),
        };

        let universe = top_volatile_symbols(&source, &UniverseConfig::default()).await;
        assert_eq!(universe.source, UniverseSource::Tickers);
        assert_eq!(universe.symbols, vec!["ETHUSDT", "BTCUSDT"]);
    }

    #[tokio::test]
    async fn test_top_volatile_symbols_without_exchange_info() {
        let source = FakeSource {
            tickers: Ok(tickers()),
            exchange_info: Err(DataError::Http("timeout".to_string())),
        };

        let config = UniverseConfig {
            top_n: 1,
            ..Default::default()
        };
        let universe = top_volatile_symbols(&source, &config).await;
        assert_eq!(universe.source, UniverseSource::Tickers);
        assert_eq!(universe.symbols, vec!["SOLUSDT"]);
    }

    #[tokio::test]
    async fn test_top_volatile_symbols_fallback() {
        struct TestCase {
            input: FakeSource,
        }

        let tests = vec![
            TestCase {
                // TC0: ticker endpoint down
                input: FakeSource {
                    tickers: Err(DataError::Status {
                        status: 503,
                        endpoint: "/fapi/v1/ticker/24hr".to_string(),
                    }),
                    exchange_info: Ok(ExchangeInfo::default()),
                },
            },
            TestCase {
                // TC1: nothing eligible
                input: FakeSource {
                    tickers: Ok(vec![ticker("DEADUSDT", 50.0, 0.0)]),
                    exchange_info: Err(DataError::Http("timeout".to_string())),
                },
            },
        ];

        let config = UniverseConfig {
            top_n: 4,
            ..Default::default()
        };
        for (index, test) in tests.into_iter().enumerate() {
            let universe = top_volatile_symbols(&test.input, &config).await;
            assert_eq!(universe.source, UniverseSource::Fallback, "TC{} failed", index);
            assert_eq!(universe.symbols, fallback_symbols(4), "TC{} failed", index);
        }
    }
}
