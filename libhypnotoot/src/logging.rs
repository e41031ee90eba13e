//! Logging setup
//!
//! The binary builds one [`tracing::Dispatch`] at startup from a
//! [`LoggingConfig`] and installs it as the global default. It writes to:
//! - stdout, unless quiet
//! - a size-rotated log file, if one is configured
//!
//! # Examples
//!
//! ```no_run
//! use libhypnotoot::logging::{LogFormat, LogLevel, LoggingConfig};
//!
//! let config = LoggingConfig {
//!     level: LogLevel::Info,
//!     format: LogFormat::Text,
//!     quiet: true,
//!     log_file: Some("/var/log/hypnotoot.log".into()),
//! };
//! config.init().expect("logging");
//! ```

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;

use tracing::level_filters::LevelFilter;
use tracing::Dispatch;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{Layer, Registry};

use crate::config::LogConfig;
use crate::error::{HypnotootError, Result};

/// Size at which the log file is rotated
pub const MAX_LOG_BYTES: u64 = 1024 * 1024;

/// Number of rotated log files kept
pub const LOG_BACKUPS: usize = 1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    /// Reserved for errors that end the run; filters like `Error`
    Fatal,
}

impl LogLevel {
    pub fn level_filter(&self) -> LevelFilter {
        match self {
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error | LogLevel::Fatal => LevelFilter::ERROR,
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" | "WARNING" => Ok(LogLevel::Warn),
            "ERROR" => Ok(LogLevel::Error),
            "FATAL" => Ok(LogLevel::Fatal),
            _ => Err(format!(
                "Invalid log level: '{}'. Valid options: DEBUG, INFO, WARN, ERROR, FATAL",
                s
            )),
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warn => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
            LogLevel::Fatal => write!(f, "FATAL"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable text lines
    #[default]
    Text,
    /// Machine-parseable JSON (one JSON object per line)
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!(
                "Invalid log format: '{}'. Valid options: text, json",
                s
            )),
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

/// Configuration for logging initialization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    /// Suppress console output
    pub quiet: bool,
    pub log_file: Option<PathBuf>,
}

impl From<&LogConfig> for LoggingConfig {
    fn from(config: &LogConfig) -> Self {
        Self {
            level: config.level,
            format: config.format,
            quiet: config.quiet,
            log_file: config.file.clone(),
        }
    }
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

impl LoggingConfig {
    /// Build the logging dispatcher without installing it
    ///
    /// # Errors
    ///
    /// Returns `HypnotootError::Logging` if the log file cannot be opened.
    pub fn build(&self) -> Result<Dispatch> {
        let filter = self.level.level_filter();
        let mut layers: Vec<BoxedLayer> = Vec::new();

        if !self.quiet {
            layers.push(self.fmt_layer(io::stdout, true).with_filter(filter).boxed());
        }

        if let Some(path) = &self.log_file {
            let writer = RotatingFileWriter::open(path, MAX_LOG_BYTES, LOG_BACKUPS).map_err(|e| {
                HypnotootError::Logging(format!(
                    "Failed to open log file {}: {}",
                    path.display(),
                    e
                ))
            })?;
            layers.push(
                self.fmt_layer(Mutex::new(writer), false)
                    .with_filter(filter)
                    .boxed(),
            );
        }

        Ok(Dispatch::new(tracing_subscriber::registry().with(layers)))
    }

    /// Build the dispatcher and install it for the whole process
    ///
    /// This should be called once at the start of the program.
    pub fn init(&self) -> Result<()> {
        let dispatch = self.build()?;
        tracing::dispatcher::set_global_default(dispatch)
            .map_err(|e| HypnotootError::Logging(e.to_string()))
    }

    fn fmt_layer<W>(&self, writer: W, ansi: bool) -> BoxedLayer
    where
        W: for<'w> tracing_subscriber::fmt::MakeWriter<'w> + Send + Sync + 'static,
    {
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_target(false)
            .with_level(true);

        match self.format {
            LogFormat::Text => layer.with_ansi(ansi).boxed(),
            LogFormat::Json => layer.json().boxed(),
        }
    }
}

/// A log file that rolls over to `<file>.1` once it would exceed a size cap
#[derive(Debug)]
pub struct RotatingFileWriter {
    path: PathBuf,
    max_bytes: u64,
    backups: usize,
    file: File,
    size: u64,
}

impl RotatingFileWriter {
    /// Open (or create) the log file for appending
    pub fn open(path: &Path, max_bytes: u64, backups: usize) -> io::Result<Self> {
        let file = Self::open_append(path)?;
        let size = file.metadata()?.len();

        Ok(Self {
            path: path.to_path_buf(),
            max_bytes,
            backups,
            file,
            size,
        })
    }

    fn open_append(path: &Path) -> io::Result<File> {
        OpenOptions::new().create(true).append(true).open(path)
    }

    /// Path of the `n`th backup, e.g. `hypnotoot.log.1`
    pub fn backup_path(&self, n: usize) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(format!(".{}", n));
        PathBuf::from(name)
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;

        if self.backups == 0 {
            self.file = OpenOptions::new()
                .write(true)
                .truncate(true)
                .open(&self.path)?;
        } else {
            for n in (1..self.backups).rev() {
                let from = self.backup_path(n);
                if from.exists() {
                    std::fs::rename(&from, self.backup_path(n + 1))?;
                }
            }
            std::fs::rename(&self.path, self.backup_path(1))?;
            self.file = Self::open_append(&self.path)?;
        }

        self.size = 0;
        Ok(())
    }
}

impl Write for RotatingFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.max_bytes > 0 && self.size > 0 && self.size + buf.len() as u64 > self.max_bytes {
            self.rotate()?;
        }
        let written = self.file.write(buf)?;
        self.size += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}
