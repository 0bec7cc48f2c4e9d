//! Day-granularity expiry dates.
//!
//! Incoming records carry expiry either as a plain date (`2025-03-31`) or as a
//! timestamp. Timestamps keep only their UTC calendar date so that two lines
//! differing only in time of day compare equal.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{de, Deserialize, Deserializer};

/// Parses a date or timestamp string into its calendar date.
pub fn parse_expiry(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.naive_utc().date());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|ts| ts.date())
}

/// Serde adapter for `#[serde(deserialize_with = "expiry::deserialize")]`.
pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_expiry(&raw)
        .ok_or_else(|| de::Error::custom(format!("invalid expiry date '{}'", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("2025-03-31")]
    #[case("2025-03-31T00:00:00Z")]
    #[case("2025-03-31T17:45:12.250Z")]
    #[case("2025-03-31T23:10:00")]
    #[case("2025-03-31 08:00:00")]
    #[case("  2025-03-31  ")]
    fn time_of_day_is_discarded(#[case] raw: &str) {
        assert_eq!(
            parse_expiry(raw),
            NaiveDate::from_ymd_opt(2025, 3, 31),
            "input: {raw}"
        );
    }

    #[test]
    fn offsets_are_normalized_to_utc() {
        assert_eq!(
            parse_expiry("2025-04-01T01:30:00+05:00"),
            NaiveDate::from_ymd_opt(2025, 3, 31)
        );
    }

    #[rstest]
    #[case("")]
    #[case("31/03/2025")]
    #[case("not a date")]
    fn rejects_garbage(#[case] raw: &str) {
        assert_eq!(parse_expiry(raw), None);
    }
}
