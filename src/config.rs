use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::input::{BindSettings, DEFAULT_HOLD_THRESHOLD};
use crate::logging::LogLevel;

/// Longest accepted hold threshold
const MAX_HOLD_THRESHOLD: Duration = Duration::from_secs(60);

/// Application options that can be set via CLI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub hold_threshold: Duration,
    pub log_level: LogLevel,
    pub profile: Option<PathBuf>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            hold_threshold: DEFAULT_HOLD_THRESHOLD,
            log_level: LogLevel::Info,
            profile: None,
        }
    }
}

impl Options {
    /// Settings handed to a new bind registry
    pub fn bind_settings(&self) -> BindSettings {
        BindSettings {
            hold_threshold: self.hold_threshold,
        }
    }
}

/// Parse a hold threshold: "500ms", "0.5s", or a bare number of milliseconds
pub fn parse_hold_threshold(s: &str) -> Result<Duration> {
    let s = s.trim();
    let threshold = if let Some(ms) = s.strip_suffix("ms") {
        let ms: u64 = ms.trim().parse().context("Invalid millisecond value")?;
        Duration::from_millis(ms)
    } else if let Some(secs) = s.strip_suffix('s') {
        let secs: f64 = secs.trim().parse().context("Invalid seconds value")?;
        if !secs.is_finite() || secs < 0.0 {
            anyhow::bail!("Hold threshold must be a non-negative number of seconds");
        }
        Duration::try_from_secs_f64(secs).context("Hold threshold out of range")?
    } else {
        let ms: u64 = s.parse().context("Invalid hold threshold")?;
        Duration::from_millis(ms)
    };

    if threshold > MAX_HOLD_THRESHOLD {
        anyhow::bail!("Hold threshold out of range (0 to 60s)");
    }

    Ok(threshold)
}

/// Parse a log level name or number
pub fn parse_log_level(s: &str) -> Result<LogLevel> {
    s.parse::<LogLevel>().map_err(anyhow::Error::msg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("500ms", 500)]
    #[case(" 250 ms ", 250)]
    #[case("0.5s", 500)]
    #[case("2s", 2000)]
    #[case("750", 750)]
    #[case("0", 0)]
    fn test_parse_hold_threshold(#[case] input: &str, #[case] ms: u64) {
        assert_eq!(
            parse_hold_threshold(input).unwrap(),
            Duration::from_millis(ms)
        );
    }

    #[rstest]
    #[case("")]
    #[case("fast")]
    #[case("-1s")]
    #[case("-5")]
    #[case("5m")]
    #[case("61s")]
    #[case("90000ms")]
    fn test_parse_hold_threshold_invalid(#[case] input: &str) {
        assert!(parse_hold_threshold(input).is_err());
    }

    #[test]
    fn test_parse_log_level() {
        assert_eq!(parse_log_level("debug").unwrap(), LogLevel::Debug);
        let err = parse_log_level("chatty").unwrap_err();
        assert!(err.to_string().contains("chatty"));
    }

    #[test]
    fn test_options_default() {
        let opts = Options::default();
        assert_eq!(opts.hold_threshold, Duration::from_millis(500));
        assert_eq!(opts.log_level, LogLevel::Info);
        assert!(opts.profile.is_none());
        assert_eq!(opts.bind_settings(), BindSettings::default());
    }
}
