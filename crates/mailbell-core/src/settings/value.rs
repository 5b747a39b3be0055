//! Conversions from raw setting strings.

use std::time::Duration;

use super::DEFAULT_PERIOD;
use crate::error::{Error, Result};

pub(super) fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "yes" | "true" | "on" => Ok(true),
        "0" | "no" | "false" | "off" => Ok(false),
        _ => Err(Error::invalid(key, value)),
    }
}

pub(super) fn parse_port(key: &str, value: &str) -> Result<u16> {
    match value.trim().parse::<u16>() {
        Ok(port) if port > 0 => Ok(port),
        _ => Err(Error::invalid(key, value)),
    }
}

pub(super) fn parse_seconds(key: &str, value: &str) -> Result<Duration> {
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(Error::invalid(key, value)),
    }
}

/// `None` means check once and stop. A number is seconds, `0` disables.
pub(super) fn parse_period(key: &str, value: &str) -> Result<Option<Duration>> {
    if let Ok(secs) = value.trim().parse::<u64>() {
        return Ok((secs > 0).then(|| Duration::from_secs(secs)));
    }
    Ok(parse_bool(key, value)?.then_some(DEFAULT_PERIOD))
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("sticky", "Yes").unwrap());
        assert!(parse_bool("sticky", "on").unwrap());
        assert!(!parse_bool("sticky", "0").unwrap());
        assert!(matches!(
            parse_bool("sticky", "maybe"),
            Err(Error::InvalidSetting { ref key, .. }) if key == "sticky"
        ));
    }

    #[test]
    fn test_parse_port() {
        assert_eq!(parse_port("port", "993").unwrap(), 993);
        assert!(parse_port("port", "0").is_err());
        assert!(parse_port("port", "70000").is_err());
        assert!(parse_port("port", "imap").is_err());
    }

    #[test]
    fn test_parse_period() {
        assert_eq!(parse_period("period", "no").unwrap(), None);
        assert_eq!(parse_period("period", "0").unwrap(), None);
        assert_eq!(parse_period("period", "false").unwrap(), None);
        assert_eq!(parse_period("period", "yes").unwrap(), Some(DEFAULT_PERIOD));
        assert_eq!(
            parse_period("period", "120").unwrap(),
            Some(Duration::from_secs(120))
        );
        assert_eq!(parse_period("period", "1").unwrap(), Some(Duration::from_secs(1)));
        assert!(parse_period("period", "-5").is_err());
        assert!(parse_period("period", "soon").is_err());
    }
}
