//! Binance USD-M Futures REST client.

use crate::{
    cache::TtlCache,
    error::DataError,
    model::{
        BinanceKline, ExchangeInfo, FundingRate, Interval, Kline, OpenInterest, Ticker24h,
    },
};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Default Binance USD-M Futures REST base url.
pub const BINANCE_FUTURES_BASE: &str = "https://fapi.binance.com";

const PATH_EXCHANGE_INFO: &str = "/fapi/v1/exchangeInfo";
const PATH_TICKER_24H: &str = "/fapi/v1/ticker/24hr";
const PATH_KLINES: &str = "/fapi/v1/klines";
const PATH_FUNDING_RATE: &str = "/fapi/v1/fundingRate";
const PATH_OPEN_INTEREST: &str = "/fapi/v1/openInterest";

/// Source of the market data a refresh cycle needs.
///
/// Implemented by [`BinanceFuturesClient`]; tests substitute in-memory fakes.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Symbol universe with contract type and trading status.
    async fn exchange_info(&self) -> Result<ExchangeInfo, DataError>;

    /// 24h rolling statistics for every symbol.
    async fn tickers_24h(&self) -> Result<Vec<Ticker24h>, DataError>;

    /// Most recent `limit` klines for `symbol`, ascending by open time.
    async fn klines(
        &self,
        symbol: &str,
        interval: Interval,
        limit: u16,
    ) -> Result<Vec<Kline>, DataError>;

    /// Latest settled funding rate, `None` if the exchange reports no history.
    async fn funding_rate(&self, symbol: &str) -> Result<Option<FundingRate>, DataError>;

    /// Current open interest in contracts.
    async fn open_interest(&self, symbol: &str) -> Result<OpenInterest, DataError>;
}

/// [`BinanceFuturesClient`] configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct BinanceConfig {
    /// REST base url
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Time-to-live for exchange-wide responses (24h tickers, exchange info)
    pub cache_ttl: Duration,
}

impl Default for BinanceConfig {
    fn default() -> Self {
        Self {
            base_url: BINANCE_FUTURES_BASE.to_string(),
            timeout: Duration::from_secs(10),
            cache_ttl: Duration::from_secs(60),
        }
    }
}

impl BinanceConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }
}

/// Binance USD-M Futures REST client.
#[derive(Debug)]
pub struct BinanceFuturesClient {
    http: reqwest::Client,
    base_url: Url,
    tickers: TtlCache<&'static str, Vec<Ticker24h>>,
    exchange_info: TtlCache<&'static str, ExchangeInfo>,
}

impl BinanceFuturesClient {
    pub fn new(config: BinanceConfig) -> Result<Self, DataError> {
        let base_url = Url::parse(&config.base_url)?;
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http,
            base_url,
            tickers: TtlCache::new(config.cache_ttl),
            exchange_info: TtlCache::new(config.cache_ttl),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Forget cached exchange-wide responses so the next cycle refetches them.
    pub fn clear_cache(&self) {
        self.tickers.clear();
        self.exchange_info.clear();
    }

    async fn get<T>(&self, path: &'static str, query: &[(&str, String)]) -> Result<T, DataError>
    where
        T: DeserializeOwned,
    {
        let url = self.base_url.join(path)?;
        debug!(%url, ?query, "GET");

        let response = self.http.get(url).query(query).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!(endpoint = path, status = status.as_u16(), "Binance request rejected");
            return Err(DataError::Status {
                status: status.as_u16(),
                endpoint: path.to_string(),
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|error| DataError::parse(path, error))
    }
}

#[async_trait]
impl MarketDataSource for BinanceFuturesClient {
    async fn exchange_info(&self) -> Result<ExchangeInfo, DataError> {
        if let Some(info) = self.exchange_info.get(&PATH_EXCHANGE_INFO) {
            return Ok(info);
        }

        let info: ExchangeInfo = self.get(PATH_EXCHANGE_INFO, &[]).await?;
        self.exchange_info.insert(PATH_EXCHANGE_INFO, info.clone());
        Ok(info)
    }

    async fn tickers_24h(&self) -> Result<Vec<Ticker24h>, DataError> {
        if let Some(tickers) = self.tickers.get(&PATH_TICKER_24H) {
            return Ok(tickers);
        }

        let tickers: Vec<Ticker24h> = self.get(PATH_TICKER_24H, &[]).await?;
        if tickers.is_empty() {
            return Err(DataError::EmptyResponse(PATH_TICKER_24H.to_string()));
        }
        self.tickers.insert(PATH_TICKER_24H, tickers.clone());
        Ok(tickers)
    }

    async fn klines(
        &self,
        symbol: &str,
        interval: Interval,
        limit: u16,
    ) -> Result<Vec<Kline>, DataError> {
        let raw: Vec<BinanceKline> = self
            .get(
                PATH_KLINES,
                &[
                    ("symbol", symbol.to_string()),
                    ("interval", interval.to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;

        raw.into_iter().map(Kline::try_from).collect()
    }

    async fn funding_rate(&self, symbol: &str) -> Result<Option<FundingRate>, DataError> {
        let mut history: Vec<FundingRate> = self
            .get(
                PATH_FUNDING_RATE,
                &[("symbol", symbol.to_string()), ("limit", "1".to_string())],
            )
            .await?;

        Ok(history.pop())
    }

    async fn open_interest(&self, symbol: &str) -> Result<OpenInterest, DataError> {
        self.get(PATH_OPEN_INTEREST, &[("symbol", symbol.to_string())])
            .await
    }
}
