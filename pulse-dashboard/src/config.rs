//! Environment driven dashboard configuration.
//!
//! Every knob has a default, so an empty environment yields a working dashboard. Parsing goes
//! through a lookup function so the same code serves `std::env` and test fixtures.

use crate::telegram::TelegramConfig;
use pulse_core::{PlanConfig, Thresholds};
use pulse_data::{
    BINANCE_FUTURES_BASE, BinanceConfig, Interval, UniverseConfig, universe::DEFAULT_EXCLUDED_SYMBOLS,
};
use std::{fmt::Display, str::FromStr, time::Duration};
use thiserror::Error;

/// Largest kline page Binance serves in one request.
const MAX_KLINE_LIMIT: u16 = 1500;

/// Invalid configuration value.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum ConfigError {
    #[error("{key}={value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(key: &'static str, value: impl Into<String>, reason: impl Display) -> Self {
        Self::Invalid {
            key,
            value: value.into(),
            reason: reason.to_string(),
        }
    }
}

/// Which CVD estimate feeds the classifier.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub enum CvdSource {
    /// Whole candle volume signed by candle direction
    #[default]
    Candle,
    /// Taker buy volume minus taker sell volume per candle
    Taker,
}

impl FromStr for CvdSource {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_ascii_lowercase().as_str() {
            "candle" => Ok(Self::Candle),
            "taker" => Ok(Self::Taker),
            other => Err(format!("expected candle or taker, got {other}")),
        }
    }
}

/// Full dashboard configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    pub universe: UniverseConfig,
    /// Kline interval used for ATR and the trade plan
    pub timeframe: Interval,
    /// Klines fetched per symbol for ATR
    pub kline_limit: u16,
    pub atr_period: usize,
    pub cvd_source: CvdSource,
    /// Kline interval summed into CVD
    pub cvd_interval: Interval,
    /// Klines summed into CVD
    pub cvd_limit: u16,
    pub refresh: Duration,
    pub fetch_concurrency: usize,
    pub thresholds: Thresholds,
    pub plan: PlanConfig,
    pub binance: BinanceConfig,
    /// Present when both Telegram credentials are set
    pub telegram: Option<TelegramConfig>,
    /// Send alerts on signal transitions (requires `telegram`)
    pub notify: bool,
    /// Headless loop prints one JSON line per analysis
    pub json_output: bool,
    /// Log file used by the terminal dashboard
    pub log_file: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            universe: UniverseConfig::default(),
            timeframe: Interval::M15,
            kline_limit: 50,
            atr_period: 14,
            cvd_source: CvdSource::Candle,
            cvd_interval: Interval::M1,
            cvd_limit: 60,
            refresh: Duration::from_secs(60),
            fetch_concurrency: 4,
            thresholds: Thresholds::default(),
            plan: PlanConfig::default(),
            binance: BinanceConfig::default(),
            telegram: None,
            notify: true,
            json_output: false,
            log_file: "pulse-dashboard.log".to_string(),
        }
    }
}

impl DashboardConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`, which maps a variable name to its value.
    ///
    /// Unset or blank variables take their default; set but malformed ones are an error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let top_n = parse_or(&get, "PULSE_TOP_N", defaults.universe.top_n)?;
        check_range("PULSE_TOP_N", top_n, 1, 50)?;

        let timeframe = parse_or(&get, "PULSE_TIMEFRAME", defaults.timeframe)?;

        let refresh_secs = parse_or(&get, "PULSE_REFRESH_SECS", defaults.refresh.as_secs())?;
        check_range("PULSE_REFRESH_SECS", refresh_secs, 10, 600)?;

        let atr_period = parse_or(&get, "PULSE_ATR_PERIOD", defaults.atr_period)?;
        check_range("PULSE_ATR_PERIOD", atr_period, 1, usize::from(MAX_KLINE_LIMIT) - 1)?;

        let kline_limit = parse_or(&get, "PULSE_KLINE_LIMIT", defaults.kline_limit)?;
        check_range("PULSE_KLINE_LIMIT", kline_limit, 2, MAX_KLINE_LIMIT)?;
        if usize::from(kline_limit) <= atr_period {
            return Err(ConfigError::invalid(
                "PULSE_KLINE_LIMIT",
                kline_limit.to_string(),
                format!("must exceed PULSE_ATR_PERIOD ({atr_period})"),
            ));
        }

        let cvd_source = parse_or(&get, "PULSE_CVD_SOURCE", defaults.cvd_source)?;
        let cvd_interval = parse_or(&get, "PULSE_CVD_INTERVAL", defaults.cvd_interval)?;
        let cvd_limit = parse_or(&get, "PULSE_CVD_LIMIT", defaults.cvd_limit)?;
        check_range("PULSE_CVD_LIMIT", cvd_limit, 1, MAX_KLINE_LIMIT)?;

        let fetch_concurrency =
            parse_or(&get, "PULSE_FETCH_CONCURRENCY", defaults.fetch_concurrency)?;
        check_range("PULSE_FETCH_CONCURRENCY", fetch_concurrency, 1, 32)?;

        let thresholds = Thresholds {
            min_price_change_pct_for_signal: parse_or(
                &get,
                "PULSE_MIN_PRICE_CHANGE_PCT",
                defaults.thresholds.min_price_change_pct_for_signal,
            )?,
            cvd_significance_threshold: parse_or(
                &get,
                "PULSE_CVD_THRESHOLD",
                defaults.thresholds.cvd_significance_threshold,
            )?,
            funding_rate_extreme: parse_or(
                &get,
                "PULSE_FUNDING_EXTREME",
                defaults.thresholds.funding_rate_extreme,
            )?,
            min_open_interest: parse_or(
                &get,
                "PULSE_MIN_OPEN_INTEREST",
                defaults.thresholds.min_open_interest,
            )?,
            max_atr: parse_opt(&get, "PULSE_MAX_ATR")?,
            max_atr_pct: parse_ceiling_or(
                &get,
                "PULSE_MAX_ATR_PCT",
                defaults.thresholds.max_atr_pct,
            )?,
        };
        thresholds
            .validate()
            .map_err(|error| ConfigError::invalid("thresholds", "", error))?;

        let excluded = match get("PULSE_EXCLUDED_SYMBOLS") {
            Some(list) => list
                .split(',')
                .map(|symbol| symbol.trim().to_ascii_uppercase())
                .filter(|symbol| !symbol.is_empty())
                .collect(),
            None => DEFAULT_EXCLUDED_SYMBOLS
                .iter()
                .map(|symbol| symbol.to_string())
                .collect(),
        };

        let cache_ttl_secs = parse_or(
            &get,
            "PULSE_CACHE_TTL_SECS",
            defaults.binance.cache_ttl.as_secs(),
        )?;
        let binance = BinanceConfig::new(
            get("BINANCE_FUTURES_BASE").unwrap_or_else(|| BINANCE_FUTURES_BASE.to_string()),
        )
        .with_cache_ttl(Duration::from_secs(cache_ttl_secs));

        let telegram = match (get("TG_BOT_TOKEN"), get("TG_CHAT_ID")) {
            (Some(bot_token), Some(chat_id)) => Some(TelegramConfig::new(bot_token, chat_id)),
            _ => None,
        };

        Ok(Self {
            universe: UniverseConfig {
                top_n,
                excluded,
                ..defaults.universe
            },
            timeframe,
            kline_limit,
            atr_period,
            cvd_source,
            cvd_interval,
            cvd_limit,
            refresh: Duration::from_secs(refresh_secs),
            fetch_concurrency,
            thresholds,
            plan: defaults.plan,
            binance,
            telegram,
            notify: parse_bool_or(&get, "PULSE_NOTIFY", defaults.notify)?,
            json_output: parse_bool_or(&get, "PULSE_JSON", defaults.json_output)?,
            log_file: get("PULSE_LOG_FILE").unwrap_or(defaults.log_file),
        })
    }

    /// Alerts are sent only when enabled and credentials are configured.
    pub fn alerts_enabled(&self) -> bool {
        self.notify && self.telegram.is_some()
    }
}

fn parse_or<G, T>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    G: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    Ok(parse_opt(get, key)?.unwrap_or(default))
}

fn parse_opt<G, T>(get: &G, key: &'static str) -> Result<Option<T>, ConfigError>
where
    G: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    get(key)
        .map(|value| {
            value
                .parse()
                .map_err(|error| ConfigError::invalid(key, value.as_str(), error))
        })
        .transpose()
}

/// Optional ceiling: `off` disables it, unset keeps `default`.
fn parse_ceiling_or<G>(
    get: &G,
    key: &'static str,
    default: Option<f64>,
) -> Result<Option<f64>, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(value) if value.eq_ignore_ascii_case("off") => Ok(None),
        Some(_) => parse_opt(get, key),
        None => Ok(default),
    }
}

fn parse_bool_or<G>(get: &G, key: &'static str, default: bool) -> Result<bool, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(default),
        Some(value) => match value.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::invalid(key, value, "expected a boolean")),
        },
    }
}

fn check_range<T>(key: &'static str, value: T, min: T, max: T) -> Result<(), ConfigError>
where
    T: PartialOrd + Display,
{
    if value < min || value > max {
        return Err(ConfigError::invalid(
            key,
            value.to_string(),
            format!("must be within {min}..={max}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<DashboardConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        DashboardConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_from_empty_environment() {
        let actual = config(&[]).unwrap();
        assert_eq!(actual, DashboardConfig::default());
        assert_eq!(actual.universe.top_n, 10);
        assert_eq!(actual.timeframe, Interval::M15);
        assert_eq!(actual.refresh, Duration::from_secs(60));
        assert_eq!(actual.universe.excluded, vec!["COCOSUSDT", "BEAMUSDT"]);
        assert!(!actual.alerts_enabled());
    }

    #[test]
    fn test_overrides() {
        let actual = config(&[
            ("PULSE_TOP_N", "5"),
            ("PULSE_TIMEFRAME", " 1h "),
            ("PULSE_REFRESH_SECS", "30"),
            ("PULSE_CVD_SOURCE", "Taker"),
            ("PULSE_MAX_ATR", "250.5"),
            ("PULSE_EXCLUDED_SYMBOLS", "foousdt, ,BARUSDT"),
            ("PULSE_JSON", "yes"),
            ("TG_BOT_TOKEN", "123:abc"),
            ("TG_CHAT_ID", "-100"),
        ])
        .unwrap();

        assert_eq!(actual.universe.top_n, 5);
        assert_eq!(actual.timeframe, Interval::H1);
        assert_eq!(actual.refresh, Duration::from_secs(30));
        assert_eq!(actual.cvd_source, CvdSource::Taker);
        assert_eq!(actual.thresholds.max_atr, Some(250.5));
        assert_eq!(actual.thresholds.max_atr_pct, Some(3.0));
        assert_eq!(actual.universe.excluded, vec!["FOOUSDT", "BARUSDT"]);
        assert!(actual.json_output);
        assert!(actual.alerts_enabled());
    }

    #[test]
    fn test_max_atr_pct() {
        struct TestCase {
            input: Vec<(&'static str, &'static str)>,
            expected: Option<f64>,
        }

        let tests = vec![
            TestCase {
                // TC0: default ceiling
                input: vec![],
                expected: Some(3.0),
            },
            TestCase {
                // TC1: override
                input: vec![("PULSE_MAX_ATR_PCT", "5.5")],
                expected: Some(5.5),
            },
            TestCase {
                // TC2: disabled
                input: vec![("PULSE_MAX_ATR_PCT", "OFF")],
                expected: None,
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let actual = config(&test.input).unwrap();
            assert_eq!(actual.thresholds.max_atr_pct, test.expected, "TC{} failed", index);
        }
    }

    #[test]
    fn test_blank_values_take_defaults() {
        let actual = config(&[("PULSE_TOP_N", "  "), ("TG_CHAT_ID", "")]).unwrap();
        assert_eq!(actual.universe.top_n, 10);
        assert!(actual.telegram.is_none());
    }

    #[test]
    fn test_invalid_values() {
        struct TestCase {
            input: Vec<(&'static str, &'static str)>,
            expected_key: &'static str,
        }

        let tests = vec![
            TestCase {
                // TC0: top N below range
                input: vec![("PULSE_TOP_N", "0")],
                expected_key: "PULSE_TOP_N",
            },
            TestCase {
                // TC1: top N above range
                input: vec![("PULSE_TOP_N", "51")],
                expected_key: "PULSE_TOP_N",
            },
            TestCase {
                // TC2: refresh too fast
                input: vec![("PULSE_REFRESH_SECS", "5")],
                expected_key: "PULSE_REFRESH_SECS",
            },
            TestCase {
                // TC3: unknown interval
                input: vec![("PULSE_TIMEFRAME", "7m")],
                expected_key: "PULSE_TIMEFRAME",
            },
            TestCase {
                // TC4: not enough klines for the ATR period
                input: vec![("PULSE_ATR_PERIOD", "14"), ("PULSE_KLINE_LIMIT", "14")],
                expected_key: "PULSE_KLINE_LIMIT",
            },
            TestCase {
                // TC5: negative threshold
                input: vec![("PULSE_FUNDING_EXTREME", "-0.1")],
                expected_key: "thresholds",
            },
            TestCase {
                // TC6: malformed boolean
                input: vec![("PULSE_NOTIFY", "maybe")],
                expected_key: "PULSE_NOTIFY",
            },
            TestCase {
                // TC7: unknown CVD source
                input: vec![("PULSE_CVD_SOURCE", "orderbook")],
                expected_key: "PULSE_CVD_SOURCE",
            },
            TestCase {
                // TC8: malformed ATR percentage ceiling
                input: vec![("PULSE_MAX_ATR_PCT", "high")],
                expected_key: "PULSE_MAX_ATR_PCT",
            },
            TestCase {
                // TC9: negative ATR percentage ceiling
                input: vec![("PULSE_MAX_ATR_PCT", "-1")],
                expected_key: "thresholds",
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            match config(&test.input) {
                Err(ConfigError::Invalid { key, .. }) => {
                    assert_eq!(key, test.expected_key, "TC{} failed", index)
                }
                Ok(_) => panic!("TC{} failed: expected error", index),
            }
        }
    }

    #[test]
    fn test_alerts_require_credentials_and_flag() {
        let credentials = [("TG_BOT_TOKEN", "t"), ("TG_CHAT_ID", "c")];
        assert!(config(&credentials).unwrap().alerts_enabled());

        let muted = [credentials[0], credentials[1], ("PULSE_NOTIFY", "off")];
        assert!(!config(&muted).unwrap().alerts_enabled());

        assert!(!config(&[("TG_BOT_TOKEN", "t")]).unwrap().alerts_enabled());
    }
}
