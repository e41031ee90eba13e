//! Configuration management for Hypnotoot
//!
//! Settings come from three layers, highest precedence first:
//!
//! 1. Command-line flags (and their `HYPNOTOOT_*` environment variables)
//! 2. An optional TOML file (`--config`, `HYPNOTOOT_CONFIG`, or
//!    `~/.config/hypnotoot/config.toml` when it exists)
//! 3. Built-in defaults
//!
//! ```toml
//! token_file = "~/.config/hypnotoot/token"
//! api_base_url = "https://botsin.space"
//! quotes_file = "/srv/hypnotoot/quotes.json"
//! history_file = "/srv/hypnotoot/last_50.json"
//! log_file = "/var/log/hypnotoot.log"
//! log_level = "INFO"
//! quiet = true
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};
use crate::logging::{LogFormat, LogLevel};

pub const DEFAULT_QUOTES_FILE: &str = "quotes.json";
pub const DEFAULT_HISTORY_FILE: &str = "last_50.json";

/// Fully resolved configuration for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub mastodon: MastodonConfig,
    pub quotes_file: PathBuf,
    pub history_file: PathBuf,
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MastodonConfig {
    pub api_base_url: String,
    /// Path to a file holding the access token; `~` and `$VARS` are expanded
    pub token_file: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    pub file: Option<PathBuf>,
    pub quiet: bool,
}

/// One layer of partially specified settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigLayer {
    pub token_file: Option<String>,
    pub api_base_url: Option<String>,
    pub quotes_file: Option<String>,
    pub history_file: Option<String>,
    pub log_file: Option<String>,
    pub log_level: Option<String>,
    pub log_format: Option<String>,
    pub quiet: Option<bool>,
}

impl ConfigLayer {
    /// Load a layer from a TOML file
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Read)?;
        let layer: ConfigLayer = toml::from_str(&content).map_err(ConfigError::Parse)?;
        Ok(layer)
    }

    /// Fill every unset field from `lower`
    pub fn merge(self, lower: ConfigLayer) -> Self {
        Self {
            token_file: self.token_file.or(lower.token_file),
            api_base_url: self.api_base_url.or(lower.api_base_url),
            quotes_file: self.quotes_file.or(lower.quotes_file),
            history_file: self.history_file.or(lower.history_file),
            log_file: self.log_file.or(lower.log_file),
            log_level: self.log_level.or(lower.log_level),
            log_format: self.log_format.or(lower.log_format),
            quiet: self.quiet.or(lower.quiet),
        }
    }

    /// Apply defaults and validate
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingField` if the token file or API base URL is
    /// unset, and `ConfigError::InvalidValue` for an unknown log level or format.
    pub fn resolve(self) -> Result<Config> {
        let token_file = self
            .token_file
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingField("token_file".to_string()))?;
        let api_base_url = self
            .api_base_url
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingField("api_base_url".to_string()))?;

        let level = match self.log_level {
            Some(level) => level.parse::<LogLevel>().map_err(|reason| ConfigError::InvalidValue {
                field: "log_level".to_string(),
                reason,
            })?,
            None => LogLevel::default(),
        };
        let format = match self.log_format {
            Some(format) => format.parse::<LogFormat>().map_err(|reason| ConfigError::InvalidValue {
                field: "log_format".to_string(),
                reason,
            })?,
            None => LogFormat::default(),
        };

        Ok(Config {
            mastodon: MastodonConfig {
                api_base_url,
                token_file,
            },
            quotes_file: expand_path(self.quotes_file.as_deref().unwrap_or(DEFAULT_QUOTES_FILE)),
            history_file: expand_path(
                self.history_file.as_deref().unwrap_or(DEFAULT_HISTORY_FILE),
            ),
            log: LogConfig {
                level,
                format,
                file: self.log_file.as_deref().map(expand_path),
                quiet: self.quiet.unwrap_or(false),
            },
        })
    }
}

impl Config {
    /// Resolve configuration from command-line settings and the config file
    ///
    /// `explicit_path` is the `--config` value, if any.
    pub fn load(cli: ConfigLayer, explicit_path: Option<&Path>) -> Result<Self> {
        let file_layer = match resolve_config_path(explicit_path)? {
            Some(path) => ConfigLayer::load_from_path(&path)?,
            None => ConfigLayer::default(),
        };
        cli.merge(file_layer).resolve()
    }
}

/// Locate the configuration file, if one should be read
///
/// An explicit path or `HYPNOTOOT_CONFIG` must exist. The default location
/// under the XDG config directory is only used when present.
pub fn resolve_config_path(explicit_path: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit_path {
        return Ok(Some(expand_path(&path.to_string_lossy())));
    }

    if let Ok(path) = std::env::var("HYPNOTOOT_CONFIG") {
        return Ok(Some(expand_path(&path)));
    }

    let default_path = dirs::config_dir().map(|dir| dir.join("hypnotoot").join("config.toml"));

    Ok(default_path.filter(|path| path.exists()))
}

fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HypnotootError;
    use serial_test::serial;
    use tempfile::TempDir;

    fn required() -> ConfigLayer {
        ConfigLayer {
            token_file: Some("/etc/hypnotoot/token".to_string()),
            api_base_url: Some("https://botsin.space".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_resolve_defaults() {
        let config = required().resolve().unwrap();

        assert_eq!(config.mastodon.token_file, "/etc/hypnotoot/token");
        assert_eq!(config.mastodon.api_base_url, "https://botsin.space");
        assert_eq!(config.quotes_file, PathBuf::from("quotes.json"));
        assert_eq!(config.history_file, PathBuf::from("last_50.json"));
        assert_eq!(config.log.level, LogLevel::Info);
        assert_eq!(config.log.format, LogFormat::Text);
        assert_eq!(config.log.file, None);
        assert!(!config.log.quiet);
    }

    #[test]
    fn test_resolve_missing_token_file() {
        let layer = ConfigLayer {
            token_file: None,
            ..required()
        };

        match layer.resolve() {
            Err(HypnotootError::Config(ConfigError::MissingField(field))) => {
                assert_eq!(field, "token_file");
            }
            other => panic!("Expected missing token_file, got {other:?}"),
        }
    }

    #[test]
    fn test_resolve_blank_api_base_url() {
        let layer = ConfigLayer {
            api_base_url: Some("  ".to_string()),
            ..required()
        };

        match layer.resolve() {
            Err(HypnotootError::Config(ConfigError::MissingField(field))) => {
                assert_eq!(field, "api_base_url");
            }
            other => panic!("Expected missing api_base_url, got {other:?}"),
        }
    }

    #[test]
    fn test_resolve_invalid_log_level() {
        let layer = ConfigLayer {
            log_level: Some("LOUD".to_string()),
            ..required()
        };

        assert!(matches!(
            layer.resolve(),
            Err(HypnotootError::Config(ConfigError::InvalidValue { .. }))
        ));
    }

    #[test]
    fn test_merge_prefers_upper_layer() {
        let cli = ConfigLayer {
            log_level: Some("DEBUG".to_string()),
            ..required()
        };
        let file = ConfigLayer {
            api_base_url: Some("https://mastodon.social".to_string()),
            log_level: Some("ERROR".to_string()),
            quiet: Some(true),
            ..Default::default()
        };

        let config = cli.merge(file).resolve().unwrap();
        assert_eq!(config.mastodon.api_base_url, "https://botsin.space");
        assert_eq!(config.log.level, LogLevel::Debug);
        assert!(config.log.quiet);
    }

    #[test]
    fn test_load_from_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
token_file = "/srv/token"
api_base_url = "https://botsin.space"
history_file = "/srv/last_50.json"
log_level = "WARN"
quiet = true
"#,
        )
        .unwrap();

        let layer = ConfigLayer::load_from_path(&path).unwrap();
        assert_eq!(layer.token_file.as_deref(), Some("/srv/token"));
        assert_eq!(layer.history_file.as_deref(), Some("/srv/last_50.json"));
        assert_eq!(layer.quiet, Some(true));

        let config = layer.resolve().unwrap();
        assert_eq!(config.log.level, LogLevel::Warn);
        assert_eq!(config.history_file, PathBuf::from("/srv/last_50.json"));
    }

    #[test]
    fn test_load_from_path_rejects_unknown_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "tokenfile = \"/srv/token\"\n").unwrap();

        assert!(matches!(
            ConfigLayer::load_from_path(&path),
            Err(HypnotootError::Config(ConfigError::Parse(_)))
        ));
    }

    #[test]
    fn test_load_from_missing_path() {
        let dir = TempDir::new().unwrap();

        assert!(matches!(
            ConfigLayer::load_from_path(&dir.path().join("missing.toml")),
            Err(HypnotootError::Config(ConfigError::Read(_)))
        ));
    }

    #[test]
    #[serial]
    fn test_resolve_config_path_explicit_wins() {
        std::env::set_var("HYPNOTOOT_CONFIG", "/from/env.toml");
        let path = resolve_config_path(Some(Path::new("/explicit.toml"))).unwrap();
        std::env::remove_var("HYPNOTOOT_CONFIG");

        assert_eq!(path, Some(PathBuf::from("/explicit.toml")));
    }

    #[test]
    #[serial]
    fn test_resolve_config_path_from_env() {
        std::env::set_var("HYPNOTOOT_CONFIG", "/from/env.toml");
        let path = resolve_config_path(None).unwrap();
        std::env::remove_var("HYPNOTOOT_CONFIG");

        assert_eq!(path, Some(PathBuf::from("/from/env.toml")));
    }

    #[test]
    #[serial]
    fn test_config_load_merges_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "token_file = \"/srv/token\"\napi_base_url = \"https://botsin.space\"\n",
        )
        .unwrap();

        let cli = ConfigLayer {
            quotes_file: Some("/srv/quotes.json".to_string()),
            ..Default::default()
        };
        let config = Config::load(cli, Some(&path)).unwrap();

        assert_eq!(config.mastodon.token_file, "/srv/token");
        assert_eq!(config.quotes_file, PathBuf::from("/srv/quotes.json"));
    }
}
