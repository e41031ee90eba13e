//! Error types for Hypnotoot

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, HypnotootError>;

#[derive(Error, Debug)]
pub enum HypnotootError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Corpus error: {0}")]
    Corpus(#[from] CorpusError),

    #[error("History error: {0}")]
    History(#[from] HistoryError),

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("Logging error: {0}")]
    Logging(String),
}

impl HypnotootError {
    /// Returns the process exit code for this error
    ///
    /// Every error that reaches the top level is fatal for the run.
    pub fn exit_code(&self) -> i32 {
        match self {
            HypnotootError::Config(_) => 1,
            HypnotootError::Corpus(_) => 1,
            HypnotootError::History(_) => 1,
            HypnotootError::Platform(_) => 1,
            HypnotootError::Logging(_) => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Credential error: {0}")]
    Credential(String),
}

#[derive(Error, Debug)]
pub enum CorpusError {
    #[error("Quote corpus {path} is unavailable: {reason}")]
    Unavailable { path: PathBuf, reason: String },

    #[error("Quote corpus is empty")]
    Empty,
}

#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("Failed to write history to {path}: {reason}")]
    Write { path: PathBuf, reason: String },
}

#[derive(Error, Debug, Clone)]
pub enum PlatformError {
    #[error("Failed to create client: {0}")]
    Client(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),

    #[error("Could not post after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },
}
