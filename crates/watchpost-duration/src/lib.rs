//! Parses the restricted duration grammar the engine accepts in check
//! declarations and config files (`^(\d+)(s|m|h|d)$`), plus serde codecs so
//! config structs can carry either that string form or a plain integer
//! second count.

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serializer};
use watchpost_types::{CacheFor, WatchpostError};

/// Parse a duration string of the form `^(\d+)(s|m|h|d)$` (seconds, minutes,
/// hours, days). Any other shape is a configuration error; the grammar is
/// intentionally narrower than `humantime`'s full grammar.
pub fn parse(input: &str) -> Result<Duration, WatchpostError> {
    let bad = || WatchpostError::invalid_check_configuration("<duration>", format!("invalid duration: `{input}`"));

    if input.is_empty() {
        return Err(bad());
    }

    let unit = input.chars().last().ok_or_else(bad)?;
    let digits = &input[..input.len() - unit.len_utf8()];

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(bad());
    }

    let amount: u64 = digits.parse().map_err(|_| bad())?;

    let seconds = match unit {
        's' => amount,
        'm' => amount.checked_mul(60).ok_or_else(bad)?,
        'h' => amount.checked_mul(3600).ok_or_else(bad)?,
        'd' => amount.checked_mul(86_400).ok_or_else(bad)?,
        _ => return Err(bad()),
    };

    Ok(Duration::from_secs(seconds))
}

/// Human-readable rendering for logs and diagnostics (not a round-trip
/// inverse of [`parse`] — it uses `humantime`'s richer formatting).
pub fn format(duration: Duration) -> String {
    humantime::format_duration(duration).to_string()
}

/// Parse a `cache_for` declaration: `"none"` or a duration string.
pub fn parse_cache_for(input: &str) -> Result<CacheFor, WatchpostError> {
    if input.eq_ignore_ascii_case("none") {
        Ok(CacheFor::None)
    } else {
        parse(input).map(CacheFor::Duration)
    }
}

/// Deserialize a [`Duration`] from either a duration string or a plain
/// integer second count — mirrors config structs elsewhere in the workspace
/// that accept both forms for operator convenience.
pub fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Helper {
        String(String),
        Seconds(u64),
    }

    match Helper::deserialize(deserializer)? {
        Helper::String(s) => parse(&s).map_err(serde::de::Error::custom),
        Helper::Seconds(secs) => Ok(Duration::from_secs(secs)),
    }
}

/// Serialize a [`Duration`] as a whole second count.
pub fn serialize_duration<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u64(duration.as_secs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parses_seconds_minutes_hours_days() {
        assert_eq!(parse("5m").unwrap(), Duration::from_secs(300));
        assert_eq!(parse("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse("2h").unwrap(), Duration::from_secs(7200));
        assert_eq!(parse("1d").unwrap(), Duration::from_secs(86_400));
    }

    #[test]
    fn rejects_unknown_unit() {
        assert!(parse("5w").is_err());
    }

    #[test]
    fn rejects_missing_digits() {
        assert!(parse("m").is_err());
    }

    #[test]
    fn rejects_non_ascii_digit_prefix() {
        assert!(parse("5.5m").is_err());
        assert!(parse("-5m").is_err());
    }

    #[test]
    fn cache_for_none_is_case_insensitive() {
        assert_eq!(parse_cache_for("none").unwrap(), CacheFor::None);
        assert_eq!(parse_cache_for("NONE").unwrap(), CacheFor::None);
    }

    #[test]
    fn cache_for_duration_delegates_to_parse() {
        assert_eq!(
            parse_cache_for("5m").unwrap(),
            CacheFor::Duration(Duration::from_secs(300))
        );
    }

    proptest! {
        #[test]
        fn parse_is_a_one_shot_function_of_well_formed_input(amount in 0u32..100_000) {
            for (unit, mult) in [('s', 1u64), ('m', 60), ('h', 3600), ('d', 86_400)] {
                let input = format!("{amount}{unit}");
                let parsed = parse(&input).unwrap();
                prop_assert_eq!(parsed, Duration::from_secs(amount as u64 * mult));
            }
        }
    }
}
