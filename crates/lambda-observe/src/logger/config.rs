use std::io::IsTerminal;

use serde::{Deserialize, Serialize};

use crate::logger::{
    error::{LoggerError, LoggerResult},
    object::{LoggerFormat, LoggerLevel, LoggerTimeZone},
};

/// Logger configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Output format.
    pub format: LoggerFormat,
    /// Filter expression, e.g. `"info"` or `"lambda_core=debug,info"`.
    pub level: LoggerLevel,
    /// Timezone for timestamps.
    pub tz: LoggerTimeZone,
    /// Include module targets in log lines.
    pub with_targets: bool,
    /// Colored output; only honored when stdout is a terminal.
    pub use_color: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            format: LoggerFormat::default(),
            level: LoggerLevel::default(),
            tz: LoggerTimeZone::default(),
            with_targets: true,
            use_color: true,
        }
    }
}

impl LoggerConfig {
    /// Defaults overlaid with `LAMBDA_LOG_*` variables.
    pub fn from_env() -> LoggerResult<Self> {
        let mut cfg = Self::default();
        cfg.overlay(|key| std::env::var(key).ok())?;
        Ok(cfg)
    }

    /// Override fields from a variable lookup.
    ///
    /// Reads `LAMBDA_LOG_FORMAT`, `LAMBDA_LOG_LEVEL`, `LAMBDA_LOG_TZ` and `LAMBDA_LOG_COLOR`.
    pub fn overlay<F>(&mut self, lookup: F) -> LoggerResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("LAMBDA_LOG_FORMAT") {
            self.format = v.parse()?;
        }
        if let Some(v) = lookup("LAMBDA_LOG_LEVEL") {
            self.level = v.parse()?;
        }
        if let Some(v) = lookup("LAMBDA_LOG_TZ") {
            self.tz = v.parse()?;
        }
        if let Some(v) = lookup("LAMBDA_LOG_COLOR") {
            self.use_color = parse_flag("LAMBDA_LOG_COLOR", &v)?;
        }
        Ok(())
    }

    /// Whether to emit ANSI colors: requested and stdout is a terminal.
    pub fn should_use_color(&self) -> bool {
        self.use_color && std::io::stdout().is_terminal()
    }
}

fn parse_flag(key: &'static str, value: &str) -> LoggerResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(LoggerError::InvalidValue {
            key,
            value: value.to_string(),
        }),
    }
}
