//! Human-readable durations and byte sizes for configuration values
//!
//! Durations accept `ms`, `s`, `m` and `h` suffixes (`"500ms"`, `"1s"`,
//! `"2m"`); a bare integer is read as seconds. Sizes accept `B`, `KB`,
//! `MB` and `GB` (binary multiples); a bare integer is read as bytes.

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Invalid number: {0}")]
    InvalidNumber(#[from] std::num::ParseIntError),

    #[error("Invalid unit: {0}")]
    InvalidUnit(String),
}

/// Split `"10MB"` into `(10, "MB")`
fn split_unit(s: &str) -> Result<(u64, &str), ParseError> {
    let pos = s
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(s.len());
    if pos == 0 {
        return Err(ParseError::InvalidFormat(s.to_string()));
    }
    let num = s[..pos].parse()?;
    Ok((num, s[pos..].trim()))
}

/// `num * factor`, rejecting values that do not fit in a u64
fn scale(num: u64, factor: u64, raw: &str) -> Result<u64, ParseError> {
    num.checked_mul(factor)
        .ok_or_else(|| ParseError::InvalidFormat(raw.to_string()))
}

/// Accepts a string with unit or a plain integer
fn deserialize_human<'de, D, T>(deserializer: D, expecting: &'static str) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: FromStr + From<u64>,
    T::Err: fmt::Display,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(u64),
        Str(String),
    }

    match Raw::deserialize(deserializer) {
        Ok(Raw::Int(n)) => Ok(T::from(n)),
        Ok(Raw::Str(s)) => s.parse().map_err(serde::de::Error::custom),
        Err(_) => Err(serde::de::Error::custom(format!("expected {expecting}"))),
    }
}

/// Duration with human-readable parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct HumanDuration(pub Duration);

impl HumanDuration {
    pub const fn from_secs(secs: u64) -> Self {
        Self(Duration::from_secs(secs))
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }
}

impl From<u64> for HumanDuration {
    fn from(secs: u64) -> Self {
        Self::from_secs(secs)
    }
}

impl FromStr for HumanDuration {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        let (num, unit) = split_unit(&s)?;

        let duration = match unit {
            "ms" => Duration::from_millis(num),
            "" | "s" => Duration::from_secs(num),
            "m" => Duration::from_secs(scale(num, 60, &s)?),
            "h" => Duration::from_secs(scale(num, 3600, &s)?),
            other => return Err(ParseError::InvalidUnit(other.to_string())),
        };

        Ok(Self(duration))
    }
}

impl fmt::Display for HumanDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let millis = self.0.as_millis();
        if millis % 1000 != 0 {
            write!(f, "{millis}ms")
        } else {
            let secs = self.0.as_secs();
            match secs {
                s if s != 0 && s % 3600 == 0 => write!(f, "{}h", s / 3600),
                s if s != 0 && s % 60 == 0 => write!(f, "{}m", s / 60),
                s => write!(f, "{s}s"),
            }
        }
    }
}

impl Serialize for HumanDuration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for HumanDuration {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserialize_human(deserializer, "a duration (e.g. \"1s\", \"500ms\") or seconds")
    }
}

/// Byte size wrapper with human-readable parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ByteSize(pub u64);

impl ByteSize {
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    pub fn as_usize(&self) -> usize {
        usize::try_from(self.0).unwrap_or(usize::MAX)
    }
}

impl From<u64> for ByteSize {
    fn from(bytes: u64) -> Self {
        Self(bytes)
    }
}

impl FromStr for ByteSize {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_uppercase();
        let (num, unit) = split_unit(&s)?;

        let multiplier = match unit {
            "" | "B" => 1,
            "K" | "KB" | "KIB" => 1024,
            "M" | "MB" | "MIB" => 1024 * 1024,
            "G" | "GB" | "GIB" => 1024 * 1024 * 1024,
            other => return Err(ParseError::InvalidUnit(other.to_string())),
        };

        Ok(ByteSize(scale(num, multiplier, &s)?))
    }
}

impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const UNITS: &[(&str, u64)] = &[("GB", 1 << 30), ("MB", 1 << 20), ("KB", 1 << 10)];
        for &(unit, divisor) in UNITS {
            if self.0 >= divisor && self.0 % divisor == 0 {
                return write!(f, "{}{}", self.0 / divisor, unit);
            }
        }
        write!(f, "{}B", self.0)
    }
}

impl Serialize for ByteSize {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ByteSize {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserialize_human(deserializer, "a byte size (e.g. \"1MB\") or integer")
    }
}
