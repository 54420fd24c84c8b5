use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use slog::Logger;
use sloggers::terminal::{Destination, TerminalLoggerBuilder};
use sloggers::types::Severity;
use sloggers::Build;

use crate::error::ConfigError;

/// Instructions per second when nothing else is configured
pub const DEFAULT_CLOCK_HZ: u32 = 1000;

/// Window pixels per CHIP-8 pixel when nothing else is configured
pub const DEFAULT_SCALE: u32 = 8;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Info
    }
}

impl From<LogLevel> for Severity {
    fn from(level: LogLevel) -> Severity {
        match level {
            LogLevel::Trace => Severity::Trace,
            LogLevel::Debug => Severity::Debug,
            LogLevel::Info => Severity::Info,
            LogLevel::Warning => Severity::Warning,
            LogLevel::Error => Severity::Error,
            LogLevel::Critical => Severity::Critical,
        }
    }
}

/// Settings for a driver loop. Every field is optional in the JSON file
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// instructions executed per second
    pub clock_hz: u32,
    pub scale: u32,
    /// seed for the random op; entropy when unset
    pub seed: Option<u64>,
    /// 80 byte font file to load instead of the built-in one
    pub font: Option<PathBuf>,
    pub log_level: LogLevel,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            clock_hz: DEFAULT_CLOCK_HZ,
            scale: DEFAULT_SCALE,
            seed: None,
            font: None,
            log_level: LogLevel::default(),
        }
    }
}

impl Config {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.clock_hz == 0 {
            return Err(ConfigError::Invalid("clock_hz must be at least 1".into()));
        }
        if self.scale == 0 {
            return Err(ConfigError::Invalid("scale must be at least 1".into()));
        }
        Ok(())
    }

    /// Build a terminal logger writing to stderr at the configured level
    pub fn logger(&self) -> Result<Logger, ConfigError> {
        let mut builder = TerminalLoggerBuilder::new();
        builder.level(self.log_level.into());
        builder.destination(Destination::Stderr);

        Ok(builder.build()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_is_default() {
        let config = Config::from_json_str("{}").expect("valid config");
        assert_eq!(config, Config::default());
        assert_eq!(config.clock_hz, 1000);
        assert_eq!(config.log_level, LogLevel::Info);
    }

    #[test]
    fn json_overrides() {
        let json = r#"{ "clock_hz": 500, "seed": 7, "log_level": "trace", "font": "std/font.ch8" }"#;
        let config = Config::from_json_str(json).expect("valid config");

        assert_eq!(config.clock_hz, 500);
        assert_eq!(config.scale, DEFAULT_SCALE);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.log_level, LogLevel::Trace);
        assert_eq!(config.font, Some(PathBuf::from("std/font.ch8")));
    }

    #[test]
    fn zero_clock_is_rejected() {
        let err = Config::from_json_str(r#"{ "clock_hz": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn malformed_json_is_rejected() {
        let err = Config::from_json_str("{ clock_hz: ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file() {
        let err = Config::from_json_file("/nonexistent/chip8vm.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn builds_logger() {
        let config = Config::default();
        assert!(config.logger().is_ok());
    }
}
