//! Field-level deserializers for upstream payloads.
//!
//! Upstream APIs are inconsistent about numeric encoding: chain RPC sends heights
//! as strings, the admin API sends weights as numbers, some proxies send both.
//! Every scalar goes through one of these helpers so that a single bad field
//! decodes to `None` instead of failing the whole record. Collections and nested
//! objects use [`lenient_default`] and [`lenient_seq`]: Go services encode empty
//! maps and slices as `null`, which must not discard sibling fields.

use chrono::{DateTime, Utc};
use log::warn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(|v| coerce_i64(&v)))
}

pub fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(|v| coerce_f64(&v)))
}

pub fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(|v| coerce_bool(&v)))
}

pub fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(|v| coerce_string(&v)))
}

pub fn lenient_time<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(|v| coerce_time(&v)))
}

/// `null` or a value of the wrong shape decodes to `T::default()`.
pub fn lenient_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(T::default());
    }
    match serde_json::from_value(value) {
        Ok(parsed) => Ok(parsed),
        Err(e) => {
            warn!("Ignoring malformed field: {e}");
            Ok(T::default())
        }
    }
}

/// Like [`lenient_default`] for lists, but drops malformed elements one at a time.
pub fn lenient_seq<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let items = match Value::deserialize(deserializer)? {
        Value::Null => return Ok(Vec::new()),
        Value::Array(items) => items,
        other => {
            warn!("Ignoring non-array value {other}");
            return Ok(Vec::new());
        }
    };
    Ok(items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!("Skipping malformed entry: {e}");
                None
            }
        })
        .collect())
}

pub fn coerce_i64(value: &Value) -> Option<i64> {
    let parsed = match value {
        Value::Null => return None,
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    if parsed.is_none() {
        warn!("Ignoring non-integer value {value}");
    }
    parsed
}

pub fn coerce_f64(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Null => return None,
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite());
    if parsed.is_none() {
        warn!("Ignoring non-numeric value {value}");
    }
    parsed
}

pub fn coerce_bool(value: &Value) -> Option<bool> {
    let parsed = match value {
        Value::Null => return None,
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        Value::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        _ => None,
    };
    if parsed.is_none() {
        warn!("Ignoring non-boolean value {value}");
    }
    parsed
}

pub fn coerce_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Null => None,
        other => {
            warn!("Ignoring non-string value {other}");
            None
        }
    }
}

pub fn coerce_time(value: &Value) -> Option<DateTime<Utc>> {
    let Value::String(raw) = value else {
        if !value.is_null() {
            warn!("Ignoring non-string timestamp {value}");
        }
        return None;
    };
    if raw.is_empty() {
        return None;
    }
    match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => Some(dt.with_timezone(&Utc)),
        Err(e) => {
            warn!("Ignoring unparseable timestamp {raw}: {e}");
            None
        }
    }
}
