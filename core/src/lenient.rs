//! Forgiving field readers for catalog records and settings.
//!
//! Catalog files and admin requests come from outside the process. A field
//! holding `null` or a value of the wrong JSON type reads as a fallback
//! instead of failing the whole record. Use with `#[serde(deserialize_with)]`
//! together with `#[serde(default)]` so that absent fields also fall back.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

fn finite_number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
    .filter(|n| n.is_finite())
}

/// Strings pass through, numbers and booleans are printed, anything else is empty.
pub fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    })
}

/// Numbers and numeric strings; anything else, or a non-finite value, is `0.0`.
pub fn float<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(finite_number(&Value::deserialize(deserializer)?).unwrap_or(0.0))
}

/// Non-negative whole count. Fractions are truncated, negatives and garbage read as `0`.
pub fn count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(finite_number(&Value::deserialize(deserializer)?).map_or(0, |n| n.max(0.0).trunc() as u64))
}

pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        _ => false,
    })
}

/// RFC 3339 timestamp, or `None` when the value is missing or unparsable.
pub fn timestamp<'de, D>(deserializer: D) -> Result<Option<OffsetDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => OffsetDateTime::parse(&s, &Rfc3339).ok(),
        _ => None,
    })
}

/// Only a JSON number counts. Fractions are truncated toward zero; strings,
/// booleans and `null` read as unset.
pub fn whole_number<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        _ => None,
    })
}

/// Strict optional text: a JSON string or nothing.
pub fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

/// Strict optional number for validation. A present field that is not a JSON
/// number, `null` included, reads as `Some(NaN)` so a finiteness check rejects it.
pub fn number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64().or(Some(f64::NAN)),
        _ => Some(f64::NAN),
    })
}

/// Deserialize `T` if the value has the right shape, else fall back to `T::default()`.
pub fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(serde_json::from_value(Value::deserialize(deserializer)?).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    struct Fields {
        #[serde(deserialize_with = "string")]
        s: String,
        #[serde(deserialize_with = "count")]
        c: u64,
        #[serde(deserialize_with = "float")]
        f: f64,
        #[serde(deserialize_with = "whole_number")]
        w: Option<i64>,
        #[serde(deserialize_with = "number")]
        n: Option<f64>,
    }

    fn read(json: &str) -> Fields {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn nulls_fall_back() {
        let p = read(r#"{"s":null,"c":null,"f":null,"w":null}"#);
        assert_eq!(p.s, "");
        assert_eq!(p.c, 0);
        assert_eq!(p.f, 0.0);
        assert_eq!(p.w, None);
    }

    #[test]
    fn counts_truncate_and_clamp() {
        assert_eq!(read(r#"{"c":12.9}"#).c, 12);
        assert_eq!(read(r#"{"c":-4}"#).c, 0);
        assert_eq!(read(r#"{"c":"7"}"#).c, 7);
        assert_eq!(read(r#"{"c":"lots"}"#).c, 0);
    }

    #[test]
    fn whole_numbers_ignore_non_numbers() {
        assert_eq!(read(r#"{"w":10.5}"#).w, Some(10));
        assert_eq!(read(r#"{"w":"10"}"#).w, None);
        assert_eq!(read(r#"{"w":true}"#).w, None);
    }

    #[test]
    fn strict_numbers_mark_wrong_types() {
        assert_eq!(read(r#"{}"#).n, None);
        assert!(read(r#"{"n":"abc"}"#).n.is_some_and(f64::is_nan));
        assert!(read(r#"{"n":null}"#).n.is_some_and(f64::is_nan));
        assert_eq!(read(r#"{"n":3}"#).n, Some(3.0));
    }
}
