//! Logging setup
//!
//! The library logs through the `log` facade. Binaries call [`init`] to
//! install an `env_logger` backend filtered by a [`LogLevel`].

use std::str::FromStr;

use log::LevelFilter;

/// Verbosity levels, lowest to highest
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum LogLevel {
    Nothing = 0,
    User = 1,
    Error = 2,
    Warning = 3,
    #[default]
    Info = 4,
    Debug = 5,
    All = 6,
}

impl LogLevel {
    /// Create a LogLevel from an integer
    pub fn from_i32(level: i32) -> Self {
        match level {
            0 => LogLevel::Nothing,
            1 => LogLevel::User,
            2 => LogLevel::Error,
            3 => LogLevel::Warning,
            4 => LogLevel::Info,
            5 => LogLevel::Debug,
            6 => LogLevel::All,
            _ => LogLevel::Info,
        }
    }

    pub fn as_i32(&self) -> i32 {
        *self as i32
    }

    /// Filter for the `log` facade
    ///
    /// `User` messages are logged as errors, so both map to `Error`.
    pub fn to_level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Nothing => LevelFilter::Off,
            LogLevel::User | LogLevel::Error => LevelFilter::Error,
            LogLevel::Warning => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::All => LevelFilter::Trace,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            LogLevel::Nothing => "nothing",
            LogLevel::User => "user",
            LogLevel::Error => "error",
            LogLevel::Warning => "warning",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::All => "all",
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    /// Accepts a level name (with a few common spellings) or its number
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        let level = match s.as_str() {
            "nothing" | "off" | "none" => LogLevel::Nothing,
            "user" => LogLevel::User,
            "error" => LogLevel::Error,
            "warning" | "warn" => LogLevel::Warning,
            "info" => LogLevel::Info,
            "debug" => LogLevel::Debug,
            "all" | "trace" => LogLevel::All,
            _ => match s.parse::<i32>() {
                Ok(n @ 0..=6) => LogLevel::from_i32(n),
                _ => return Err(format!("unknown log level '{}'", s)),
            },
        };
        Ok(level)
    }
}

/// Install the stderr logger and set the filter
///
/// Safe to call more than once; later calls only change the filter. The
/// backend accepts every level and `log::max_level` does the filtering.
pub fn init(level: LogLevel) {
    let filter = level.to_level_filter();
    let installed = env_logger::Builder::new()
        .filter_level(LevelFilter::Trace)
        .format_timestamp(None)
        .try_init();
    log::set_max_level(filter);
    if installed.is_err() {
        log::trace!("Logger already installed, filter set to {}", filter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_log_level_from_i32() {
        assert_eq!(LogLevel::from_i32(0), LogLevel::Nothing);
        assert_eq!(LogLevel::from_i32(1), LogLevel::User);
        assert_eq!(LogLevel::from_i32(2), LogLevel::Error);
        assert_eq!(LogLevel::from_i32(3), LogLevel::Warning);
        assert_eq!(LogLevel::from_i32(4), LogLevel::Info);
        assert_eq!(LogLevel::from_i32(5), LogLevel::Debug);
        assert_eq!(LogLevel::from_i32(6), LogLevel::All);
    }

    #[test]
    fn test_log_level_as_i32() {
        assert_eq!(LogLevel::Nothing.as_i32(), 0);
        assert_eq!(LogLevel::Info.as_i32(), 4);
        assert_eq!(LogLevel::All.as_i32(), 6);
    }

    #[test]
    fn test_log_level_invalid() {
        // Invalid values should default to Info
        assert_eq!(LogLevel::from_i32(100), LogLevel::Info);
        assert_eq!(LogLevel::from_i32(-1), LogLevel::Info);
    }

    #[test]
    fn test_level_filters() {
        assert_eq!(LogLevel::Nothing.to_level_filter(), LevelFilter::Off);
        assert_eq!(LogLevel::User.to_level_filter(), LevelFilter::Error);
        assert_eq!(LogLevel::Warning.to_level_filter(), LevelFilter::Warn);
        assert_eq!(LogLevel::All.to_level_filter(), LevelFilter::Trace);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("warn".parse::<LogLevel>().unwrap(), LogLevel::Warning);
        assert_eq!(" DEBUG ".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert_eq!("trace".parse::<LogLevel>().unwrap(), LogLevel::All);
        assert_eq!("2".parse::<LogLevel>().unwrap(), LogLevel::Error);
        assert!("7".parse::<LogLevel>().is_err());
        assert!("loud".parse::<LogLevel>().is_err());

        for n in 0..=6 {
            let level = LogLevel::from_i32(n);
            assert_eq!(level.name().parse::<LogLevel>().unwrap(), level);
        }
    }

    #[test]
    #[serial]
    fn test_init_is_repeatable() {
        init(LogLevel::Debug);
        assert_eq!(log::max_level(), LevelFilter::Debug);

        init(LogLevel::Warning);
        assert_eq!(log::max_level(), LevelFilter::Warn);
        assert!(!log::log_enabled!(log::Level::Info));
        assert!(log::log_enabled!(log::Level::Warn));

        init(LogLevel::All);
        assert!(log::log_enabled!(log::Level::Trace));
        log::warn!("logging test message");
    }
}
