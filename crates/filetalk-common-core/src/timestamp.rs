//! Timestamp utilities.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A UTC instant with microsecond precision.
///
/// On the wire it is a decimal string of seconds since the Unix epoch with a
/// six-digit fraction (`"1718000000.123456"`), never a JSON number.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Current time, truncated to microseconds.
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    /// From a DateTime (sub-microsecond precision is dropped).
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        let micros = dt.timestamp_micros();
        Self(Utc.timestamp_micros(micros).single().unwrap_or(dt))
    }

    /// Get the inner DateTime.
    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }

    /// Render as `seconds.microseconds`.
    pub fn to_epoch_string(&self) -> String {
        let micros = self.0.timestamp_micros();
        let secs = micros.div_euclid(1_000_000);
        let frac = micros.rem_euclid(1_000_000);
        format!("{secs}.{frac:06}")
    }

    /// Parse `seconds` or `seconds.fraction` (fraction up to microseconds).
    pub fn parse_epoch(s: &str) -> Option<Self> {
        let (secs, frac) = match s.split_once('.') {
            Some((secs, frac)) => (secs, frac),
            None => (s, ""),
        };
        let secs: i64 = secs.parse().ok()?;
        if frac.len() > 9 || !frac.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let mut digits = frac.to_string();
        digits.truncate(6);
        while digits.len() < 6 {
            digits.push('0');
        }
        let frac: i64 = digits.parse().ok()?;
        let micros = secs.checked_mul(1_000_000)?.checked_add(frac)?;
        Utc.timestamp_micros(micros).single().map(Self)
    }

    /// ISO 8601 string.
    pub fn to_iso8601(&self) -> String {
        self.0.to_rfc3339()
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_epoch_string())
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.to_iso8601())
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_epoch_string())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse_epoch(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid epoch timestamp: {raw}")))
    }
}
