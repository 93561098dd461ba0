//! Normalised models for the Binance USD-M Futures REST endpoints used by Pulse.

use crate::{
    de::{datetime_utc_from_epoch_ms, de_opt_str, de_str, de_u64_epoch_ms_as_datetime_utc},
    error::DataError,
};
use chrono::{DateTime, Utc};
use pulse_core::{Candle, TakerFlow};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Kline interval accepted by `/fapi/v1/klines`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Default, Deserialize, Serialize)]
pub enum Interval {
    #[serde(rename = "1m")]
    M1,
    #[serde(rename = "3m")]
    M3,
    #[serde(rename = "5m")]
    M5,
    #[default]
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "30m")]
    M30,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "2h")]
    H2,
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "1d")]
    D1,
}

impl Interval {
    pub const ALL: [Interval; 9] = [
        Interval::M1,
        Interval::M3,
        Interval::M5,
        Interval::M15,
        Interval::M30,
        Interval::H1,
        Interval::H2,
        Interval::H4,
        Interval::D1,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::M1 => "1m",
            Interval::M3 => "3m",
            Interval::M5 => "5m",
            Interval::M15 => "15m",
            Interval::M30 => "30m",
            Interval::H1 => "1h",
            Interval::H2 => "2h",
            Interval::H4 => "4h",
            Interval::D1 => "1d",
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Interval {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Interval::ALL
            .into_iter()
            .find(|interval| interval.as_str() == s.trim())
            .ok_or_else(|| DataError::parse("interval", format!("unsupported interval '{s}'")))
    }
}

/// Raw Binance kline array.
///
/// ```json
/// [1499040000000, "0.01634790", "0.80000000", "0.01575800", "0.01577100", "148976.11427815",
///  1499644799999, "2434.19055334", 308, "1756.87402397", "28.46694368", "0"]
/// ```
#[derive(Debug, Deserialize)]
pub struct BinanceKline(
    pub u64,    // 0: Open time
    pub String, // 1: Open
    pub String, // 2: High
    pub String, // 3: Low
    pub String, // 4: Close
    pub String, // 5: Volume
    pub u64,    // 6: Close time
    pub String, // 7: Quote asset volume
    pub u64,    // 8: Number of trades
    pub String, // 9: Taker buy base asset volume
    pub String, // 10: Taker buy quote asset volume
    pub serde_json::Value, // 11: Ignore
);

/// Parsed kline with the fields Pulse uses.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Kline {
    pub open_time: DateTime<Utc>,
    pub close_time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub quote_volume: f64,
    pub trades: u64,
    pub taker_buy_base: f64,
    pub taker_buy_quote: f64,
}

impl Kline {
    pub fn candle(&self) -> Candle {
        Candle::new(
            self.open_time,
            self.open,
            self.high,
            self.low,
            self.close,
            self.volume,
        )
    }

    pub fn taker_flow(&self) -> TakerFlow {
        TakerFlow::new(self.volume, self.taker_buy_base)
    }
}

impl TryFrom<BinanceKline> for Kline {
    type Error = DataError;

    fn try_from(kline: BinanceKline) -> Result<Self, Self::Error> {
        fn number(field: &'static str, raw: &str) -> Result<f64, DataError> {
            raw.parse::<f64>()
                .map_err(|error| DataError::parse(format!("kline {field}"), error))
        }

        fn time(field: &'static str, epoch_ms: u64) -> Result<DateTime<Utc>, DataError> {
            datetime_utc_from_epoch_ms(epoch_ms)
                .ok_or_else(|| DataError::parse(format!("kline {field}"), "out of range"))
        }

        Ok(Self {
            open_time: time("open_time", kline.0)?,
            close_time: time("close_time", kline.6)?,
            open: number("open", &kline.1)?,
            high: number("high", &kline.2)?,
            low: number("low", &kline.3)?,
            close: number("close", &kline.4)?,
            volume: number("volume", &kline.5)?,
            quote_volume: number("quote_volume", &kline.7)?,
            trades: kline.8,
            taker_buy_base: number("taker_buy_base", &kline.9)?,
            taker_buy_quote: number("taker_buy_quote", &kline.10)?,
        })
    }
}

/// `/fapi/v1/ticker/24hr` entry.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Ticker24h {
    pub symbol: String,
    #[serde(rename = "priceChangePercent", deserialize_with = "de_str")]
    pub price_change_pct: f64,
    #[serde(rename = "lastPrice", deserialize_with = "de_str")]
    pub last_price: f64,
    #[serde(deserialize_with = "de_str")]
    pub volume: f64,
    #[serde(rename = "quoteVolume", deserialize_with = "de_str")]
    pub quote_volume: f64,
}

/// `/fapi/v1/fundingRate` entry.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FundingRate {
    pub symbol: String,
    #[serde(rename = "fundingRate", deserialize_with = "de_str")]
    pub funding_rate: f64,
    #[serde(
        rename = "fundingTime",
        deserialize_with = "de_u64_epoch_ms_as_datetime_utc"
    )]
    pub funding_time: DateTime<Utc>,
    #[serde(rename = "markPrice", default, deserialize_with = "de_opt_str")]
    pub mark_price: Option<f64>,
}

/// `/fapi/v1/openInterest` response.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OpenInterest {
    pub symbol: String,
    #[serde(rename = "openInterest", deserialize_with = "de_str")]
    pub open_interest: f64,
    #[serde(deserialize_with = "de_u64_epoch_ms_as_datetime_utc")]
    pub time: DateTime<Utc>,
}

/// `/fapi/v1/exchangeInfo` response, restricted to the symbol list.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct ExchangeInfo {
    pub symbols: Vec<SymbolInfo>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SymbolInfo {
    pub symbol: String,
    pub status: String,
    #[serde(rename = "contractType")]
    pub contract_type: String,
    #[serde(rename = "quoteAsset")]
    pub quote_asset: String,
}

impl SymbolInfo {
    /// Perpetual contract currently open for trading.
    pub fn is_tradable_perpetual(&self) -> bool {
        self.status == "TRADING" && self.contract_type == "PERPETUAL"
    }
}

impl ExchangeInfo {
    /// Symbols of tradable perpetual contracts.
    pub fn tradable_perpetuals(&self) -> impl Iterator<Item = &str> {
        self.symbols
            .iter()
            .filter(|info| info.is_tradable_perpetual())
            .map(|info| info.symbol.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_from_str() {
        struct TestCase {
            input: &'static str,
            expected: Option<Interval>,
        }

        let tests = vec![
            TestCase {
                // TC0
                input: "15m",
                expected: Some(Interval::M15),
            },
            TestCase {
                // TC1: surrounding whitespace
                input: " 4h ",
                expected: Some(Interval::H4),
            },
            TestCase {
                // TC2: unsupported by the dashboard
                input: "12h",
                expected: None,
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let actual = test.input.parse::<Interval>().ok();
            assert_eq!(actual, test.expected, "TC{} failed", index);
        }

        assert_eq!(Interval::H1.to_string(), "1h");
    }

    #[test]
    fn test_de_kline() {
        let input = r#"[
            1499040000000, "0.01634790", "0.80000000", "0.01575800", "0.01577100",
            "148976.11427815", 1499644799999, "2434.19055334", 308, "1756.87402397",
            "28.46694368", "17928899.62484339"
        ]"#;

        let raw = serde_json::from_str::<BinanceKline>(input).unwrap();
        let kline = Kline::try_from(raw).unwrap();

        assert_eq!(kline.open_time.timestamp_millis(), 1499040000000);
        assert_eq!(kline.close_time.timestamp_millis(), 1499644799999);
        assert_eq!(kline.open, 0.01634790);
        assert_eq!(kline.high, 0.8);
        assert_eq!(kline.low, 0.01575800);
        assert_eq!(kline.close, 0.01577100);
        assert_eq!(kline.volume, 148976.11427815);
        assert_eq!(kline.trades, 308);
        assert_eq!(kline.taker_buy_base, 1756.87402397);

        let candle = kline.candle();
        assert_eq!(candle.open_time, kline.open_time);
        assert_eq!(candle.close, kline.close);
        assert_eq!(kline.taker_flow().taker_buy_volume, 1756.87402397);
    }

    #[test]
    fn test_de_kline_invalid_number() {
        let input = r#"[1499040000000, "x", "0.8", "0.01", "0.01", "1", 1499644799999,
            "1", 1, "1", "1", "0"]"#;

        let raw = serde_json::from_str::<BinanceKline>(input).unwrap();
        assert!(matches!(
            Kline::try_from(raw),
            Err(DataError::Parse { .. })
        ));
    }

    #[test]
    fn test_de_ticker_24h() {
        let input = r#"{
            "symbol": "BTCUSDT",
            "priceChange": "-94.99999800",
            "priceChangePercent": "-95.960",
            "weightedAvgPrice": "0.29628482",
            "lastPrice": "4.00000200",
            "lastQty": "200.00000000",
            "openPrice": "99.00000000",
            "highPrice": "100.00000000",
            "lowPrice": "0.10000000",
            "volume": "8913.30000000",
            "quoteVolume": "15.30000000",
            "openTime": 1499783499040,
            "closeTime": 1499869899040,
            "firstId": 28385,
            "lastId": 28460,
            "count": 76
        }"#;

        let actual = serde_json::from_str::<Ticker24h>(input).unwrap();
        assert_eq!(
            actual,
            Ticker24h {
                symbol: "BTCUSDT".to_string(),
                price_change_pct: -95.96,
                last_price: 4.000002,
                volume: 8913.3,
                quote_volume: 15.3,
            }
        );
    }

    #[test]
    fn test_de_funding_rate() {
        let input = r#"[
            {"symbol": "BTCUSDT", "fundingRate": "-0.03750000", "fundingTime": 1570608000000, "markPrice": "34287.54619963"},
            {"symbol": "BTCUSDT", "fundingRate": "0.00010000", "fundingTime": 1570636800000, "markPrice": ""}
        ]"#;

        let actual = serde_json::from_str::<Vec<FundingRate>>(input).unwrap();
        assert_eq!(actual.len(), 2);
        assert_eq!(actual[0].funding_rate, -0.0375);
        assert_eq!(actual[0].mark_price, Some(34287.54619963));
        assert_eq!(actual[1].funding_rate, 0.0001);
        assert_eq!(actual[1].mark_price, None);
        assert_eq!(actual[1].funding_time.timestamp_millis(), 1570636800000);
    }

    #[test]
    fn test_de_open_interest() {
        let input = r#"{"openInterest": "10659.509", "symbol": "BTCUSDT", "time": 1589437530011}"#;

        let actual = serde_json::from_str::<OpenInterest>(input).unwrap();
        assert_eq!(actual.symbol, "BTCUSDT");
        assert_eq!(actual.open_interest, 10659.509);
        assert_eq!(actual.time.timestamp_millis(), 1589437530011);
    }

    #[test]
    fn test_de_exchange_info() {
        let input = r#"{
            "timezone": "UTC",
            "symbols": [
                {"symbol": "BTCUSDT", "status": "TRADING", "contractType": "PERPETUAL", "quoteAsset": "USDT", "baseAsset": "BTC"},
                {"symbol": "BTCUSDT_250926", "status": "TRADING", "contractType": "CURRENT_QUARTER", "quoteAsset": "USDT", "baseAsset": "BTC"},
                {"symbol": "OLDUSDT", "status": "SETTLING", "contractType": "PERPETUAL", "quoteAsset": "USDT", "baseAsset": "OLD"}
            ]
        }"#;

        let info = serde_json::from_str::<ExchangeInfo>(input).unwrap();
        assert_eq!(info.tradable_perpetuals().collect::<Vec<_>>(), vec!["BTCUSDT"]);
    }
}
