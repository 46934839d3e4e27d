//! Lenient field decoders for Xtream panel JSON.
//!
//! Panels disagree on whether numeric fields are sent as numbers, strings or
//! `null`, so every numeric-looking field goes through these helpers.

use serde::{de::Error as _, Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum NumOrString {
    Int(i64),
    Float(f64),
    Str(String),
}

impl NumOrString {
    fn as_i64(&self) -> Option<i64> {
        match self {
            NumOrString::Int(n) => Some(*n),
            NumOrString::Float(f) => Some(*f as i64),
            NumOrString::Str(s) => s.trim().parse().ok(),
        }
    }

    fn into_string(self) -> String {
        match self {
            NumOrString::Int(n) => n.to_string(),
            NumOrString::Float(f) => f.to_string(),
            NumOrString::Str(s) => s,
        }
    }
}

pub fn opt_i32<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<NumOrString>::deserialize(deserializer)?;
    Ok(value
        .and_then(|v| v.as_i64())
        .and_then(|n| i32::try_from(n).ok()))
}

pub fn i32_or_zero<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(opt_i32(deserializer)?.unwrap_or(0))
}

pub fn i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    NumOrString::deserialize(deserializer)?
        .as_i64()
        .ok_or_else(|| D::Error::custom("expected an integer"))
}

pub fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(NumOrString::deserialize(deserializer)?.into_string())
}

/// Display text: numbers are stringified, `null` becomes empty.
pub fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<NumOrString>::deserialize(deserializer)?;
    Ok(value.map(NumOrString::into_string).unwrap_or_default())
}

/// Empty strings are treated as absent.
pub fn opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<NumOrString>::deserialize(deserializer)?;
    Ok(value.map(NumOrString::into_string).filter(|s| !s.is_empty()))
}

/// `tv_archive`-style 0/1 flags.
pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(opt_i32(deserializer)?.map(|n| n != 0).unwrap_or(false))
}
