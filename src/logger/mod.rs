use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};

static GLOBAL_LOG_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Info as u8);

// A logger holding this value follows the global level.
const INHERIT: u8 = u8::MAX;

/// A named logger. Records that pass the level check go to the [`log`] facade with the logger
/// name as target, so the host application picks the backend.
pub struct Logger {
    name: String,
    log_level: AtomicU8,
}

impl Logger {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            log_level: AtomicU8::new(INHERIT),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The logger's own level if one was set, otherwise the global level.
    pub fn log_level(&self) -> LogLevel {
        match self.log_level.load(Ordering::Relaxed) {
            INHERIT => LogLevel::from_u8(GLOBAL_LOG_LEVEL.load(Ordering::Relaxed)),
            level => LogLevel::from_u8(level),
        }
    }

    pub fn set_log_level(&self, level: LogLevel) {
        self.log_level.store(level as u8, Ordering::Relaxed);
    }

    pub fn debug(&self, message: impl fmt::Display) {
        self.dispatch(LogLevel::Debug, message);
    }

    pub fn warn(&self, message: impl fmt::Display) {
        self.dispatch(LogLevel::Warn, message);
    }

    fn dispatch(&self, level: LogLevel, message: impl fmt::Display) {
        if !self.enabled(level) {
            return;
        }
        let level = match level {
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Info => log::Level::Info,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Error | LogLevel::Silent => log::Level::Error,
        };
        log::log!(target: self.name.as_str(), level, "{message}");
    }

    fn enabled(&self, level: LogLevel) -> bool {
        level != LogLevel::Silent && level >= self.log_level()
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("log_level", &self.log_level())
            .finish()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum LogLevel {
    Debug = 0,
    Info = 1,
    Warn = 2,
    Error = 3,
    Silent = 4,
}

impl LogLevel {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => LogLevel::Debug,
            1 => LogLevel::Info,
            2 => LogLevel::Warn,
            3 => LogLevel::Error,
            _ => LogLevel::Silent,
        }
    }
}

impl FromStr for LogLevel {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            "silent" => Ok(LogLevel::Silent),
            other => Err(LogError::InvalidLogLevel(other.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub enum LogError {
    InvalidLogLevel(String),
}

impl fmt::Display for LogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogError::InvalidLogLevel(level) => {
                write!(f, "Invalid value \"{level}\" assigned to `logLevel`")
            }
        }
    }
}

impl std::error::Error for LogError {}

/// Sets the level of every logger that has no level of its own.
pub fn set_log_level(level: LogLevel) {
    GLOBAL_LOG_LEVEL.store(level as u8, Ordering::Relaxed);
}
