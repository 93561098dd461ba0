//! Deserialisation helpers for Binance payloads, which encode most numbers as JSON strings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, de::Error};
use std::{fmt::Display, str::FromStr};

/// Deserialize a `String` as the desired type.
pub fn de_str<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let data: &str = Deserialize::deserialize(deserializer)?;
    data.parse::<T>().map_err(D::Error::custom)
}

/// Deserialize an optional `String` as the desired type. Empty strings become `None`.
pub fn de_opt_str<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let data: Option<&str> = Deserialize::deserialize(deserializer)?;
    match data {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw.parse::<T>().map(Some).map_err(D::Error::custom),
    }
}

/// Deserialize a `u64` milliseconds epoch as a `DateTime<Utc>`.
pub fn de_u64_epoch_ms_as_datetime_utc<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let epoch_ms = u64::deserialize(deserializer)?;
    datetime_utc_from_epoch_ms(epoch_ms).ok_or_else(|| {
        D::Error::custom(format!("epoch ms {epoch_ms} is out of range for DateTime<Utc>"))
    })
}

/// Convert a milliseconds epoch into a `DateTime<Utc>`, if representable.
pub fn datetime_utc_from_epoch_ms(epoch_ms: u64) -> Option<DateTime<Utc>> {
    i64::try_from(epoch_ms)
        .ok()
        .and_then(DateTime::from_timestamp_millis)
}
