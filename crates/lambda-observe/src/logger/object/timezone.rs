use std::{fmt, str::FromStr, sync::RwLock};

use serde::{Deserialize, Serialize};
use time::UtcOffset;

use crate::logger::error::LoggerError;

/// Offset used for `LoggerTimeZone::Local`, captured by [`init_local_offset`].
static LOCAL_OFFSET: RwLock<Option<UtcOffset>> = RwLock::new(None);

/// Timezone of log timestamps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum LoggerTimeZone {
    #[default]
    Utc,
    /// System timezone; falls back to UTC when it cannot be detected.
    Local,
}

impl LoggerTimeZone {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoggerTimeZone::Utc => "utc",
            LoggerTimeZone::Local => "local",
        }
    }

    pub(crate) fn offset(&self) -> UtcOffset {
        match self {
            LoggerTimeZone::Utc => UtcOffset::UTC,
            LoggerTimeZone::Local => local_offset(),
        }
    }
}

impl FromStr for LoggerTimeZone {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "utc" => Ok(Self::Utc),
            "local" => Ok(Self::Local),
            _ => Err(LoggerError::InvalidTimeZone(s.to_string())),
        }
    }
}

impl TryFrom<String> for LoggerTimeZone {
    type Error = LoggerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<LoggerTimeZone> for String {
    fn from(value: LoggerTimeZone) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for LoggerTimeZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capture the local UTC offset.
///
/// Call from `main` before the tokio runtime starts: offset detection
/// refuses to run once the process is multi-threaded on most Unix systems.
///
/// ```no_run
/// fn main() {
///     lambda_observe::init_local_offset();
///
///     tokio::runtime::Runtime::new()
///         .unwrap()
///         .block_on(async { /* ... */ });
/// }
/// ```
pub fn init_local_offset() {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    let mut guard = LOCAL_OFFSET.write().unwrap_or_else(|p| p.into_inner());
    *guard = Some(offset);
}

/// Captured offset, or a best-effort detection when `init_local_offset` was never called.
fn local_offset() -> UtcOffset {
    let cached = *LOCAL_OFFSET.read().unwrap_or_else(|p| p.into_inner());
    match cached {
        Some(offset) => offset,
        None => UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC),
    }
}
