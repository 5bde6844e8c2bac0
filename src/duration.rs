//! Compact duration tokens as reported by the video listing API
//! (`1h2m3s`, `90m`, `45s`, ...).

use crate::errors::GuideError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

// ASCII digits only; `\d` would also accept other Unicode digit classes.
static DURATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:([0-9]+)h)?(?:([0-9]+)m)?(?:([0-9]+)s)?$").expect("duration grammar is valid")
});

/// Parse a duration token into whole seconds.
///
/// Every component is optional, so `""` is zero seconds. Anything outside the
/// `<n>h<n>m<n>s` grammar, or a total that does not fit in a `u64`, is a
/// [`GuideError::MalformedDuration`].
pub fn parse_duration(token: &str) -> Result<u64, GuideError> {
    let malformed = || GuideError::MalformedDuration(token.to_string());
    let caps = DURATION_RE.captures(token).ok_or_else(malformed)?;

    let mut seconds: u64 = 0;
    for (group, unit) in [(1, 3600u64), (2, 60), (3, 1)] {
        if let Some(m) = caps.get(group) {
            let value: u64 = m.as_str().parse().map_err(|_| malformed())?;
            seconds = value
                .checked_mul(unit)
                .and_then(|v| seconds.checked_add(v))
                .ok_or_else(malformed)?;
        }
    }
    Ok(seconds)
}

/// Parse a duration straight out of a decoded JSON record.
///
/// Only strings are accepted; numbers, booleans, arrays and objects are
/// [`GuideError::InvalidInput`].
pub fn parse_duration_value(value: &Value) -> Result<u64, GuideError> {
    match value {
        Value::String(token) => parse_duration(token),
        other => Err(GuideError::InvalidInput(format!(
            "duration must be a string, got {}",
            json_type_name(other)
        ))),
    }
}

/// Sum a list of tokens. Fails on the first bad token.
pub fn total_runtime<'a, I>(tokens: I) -> Result<u64, GuideError>
where
    I: IntoIterator<Item = &'a str>,
{
    tokens.into_iter().try_fold(0u64, |acc, token| {
        let secs = parse_duration(token)?;
        acc.checked_add(secs)
            .ok_or_else(|| GuideError::MalformedDuration(token.to_string()))
    })
}

/// Render seconds as `HH:MM:SS`. Hours are not wrapped at 24.
pub fn format_hms(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_known_tokens() {
        assert_eq!(parse_duration("").unwrap(), 0);
        assert_eq!(parse_duration("1h30m").unwrap(), 5400);
        assert_eq!(parse_duration("90m").unwrap(), 5400);
        assert_eq!(parse_duration("2h0m15s").unwrap(), 7215);
        assert_eq!(parse_duration("45s").unwrap(), 45);
        assert_eq!(parse_duration("3h").unwrap(), 10800);
        assert_eq!(parse_duration("1h5s").unwrap(), 3605);
    }

    #[test]
    fn test_every_ordered_subset() {
        let (h, m, s) = (7u64, 13u64, 59u64);
        for mask in 0..8u8 {
            let mut token = String::new();
            let mut expected = 0;
            if mask & 1 != 0 {
                token.push_str(&format!("{}h", h));
                expected += 3600 * h;
            }
            if mask & 2 != 0 {
                token.push_str(&format!("{}m", m));
                expected += 60 * m;
            }
            if mask & 4 != 0 {
                token.push_str(&format!("{}s", s));
                expected += s;
            }
            assert_eq!(parse_duration(&token).unwrap(), expected, "token {:?}", token);
        }
    }

    #[test]
    fn test_multi_day_is_allowed() {
        assert_eq!(parse_duration("50h").unwrap(), 180_000);
    }

    #[test]
    fn test_malformed_tokens() {
        for bad in ["1x", "m", "30m1h", "1h1h", " 1h", "1h ", "1.5h", "-3s", "1H"] {
            assert_eq!(
                parse_duration(bad),
                Err(GuideError::MalformedDuration(bad.to_string())),
                "token {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_overflow_is_malformed() {
        let huge = format!("{}h", u64::MAX);
        assert!(matches!(parse_duration(&huge), Err(GuideError::MalformedDuration(_))));
    }

    #[test]
    fn test_non_string_value() {
        assert_eq!(parse_duration_value(&json!("2m")).unwrap(), 120);
        let err = parse_duration_value(&json!(120)).unwrap_err();
        assert_eq!(err, GuideError::InvalidInput("duration must be a string, got a number".into()));
    }

    #[test]
    fn test_runtime_and_format() {
        let total = total_runtime(["1h", "30m", "15s"]).unwrap();
        assert_eq!(total, 5415);
        assert_eq!(format_hms(total), "01:30:15");
        assert_eq!(format_hms(0), "00:00:00");
        assert_eq!(format_hms(100 * 3600 + 61), "100:01:01");
        assert!(total_runtime(["1h", "oops"]).is_err());
    }
}
