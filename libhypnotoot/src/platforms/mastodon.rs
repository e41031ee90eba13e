//! Mastodon platform implementation
//!
//! Posts statuses to Mastodon and other Fediverse servers that implement the
//! Mastodon API, using the megalodon library.

use async_trait::async_trait;
use megalodon::entities::StatusVisibility;
use megalodon::error::Error as MegalodonError;
use megalodon::megalodon::{PostStatusInputOptions, PostStatusOutput};
use megalodon::{Megalodon, SNS};
use secrecy::{ExposeSecret, SecretString};

use crate::config::MastodonConfig;
use crate::error::{ConfigError, PlatformError, Result};
use crate::platforms::Platform;
use crate::types::{PostOutcome, PostParams, Visibility};

/// Mastodon platform client
pub struct MastodonClient {
    /// The megalodon client for API interactions
    client: Box<dyn Megalodon + Send + Sync>,

    /// The instance URL (e.g., "https://botsin.space")
    instance_url: String,
}

impl MastodonClient {
    /// Create a new Mastodon client
    ///
    /// # Arguments
    ///
    /// * `instance_url` - The base URL of the instance (e.g., "https://botsin.space")
    /// * `access_token` - OAuth access token for authentication
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Client` if megalodon rejects the instance URL.
    pub fn new(instance_url: String, access_token: SecretString) -> Result<Self> {
        let client = megalodon::generator(
            SNS::Mastodon,
            instance_url.clone(),
            Some(access_token.expose_secret().to_string()),
            None,
        )
        .map_err(|e| PlatformError::Client(format!("Failed to create Mastodon client: {:?}", e)))?;

        Ok(Self {
            client,
            instance_url,
        })
    }

    /// Create a Mastodon client from configuration
    ///
    /// Reads the access token from the configured token file, trimming
    /// surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Credential` if the token file cannot be read or
    /// is empty.
    pub fn from_config(config: &MastodonConfig) -> Result<Self> {
        let token_path = shellexpand::full(&config.token_file).map_err(|e| {
            ConfigError::Credential(format!("Failed to expand token file path: {}", e))
        })?;

        let token = std::fs::read_to_string(token_path.as_ref())
            .map_err(|e| {
                ConfigError::Credential(format!(
                    "Failed to read token file {}: {}",
                    token_path, e
                ))
            })?
            .trim()
            .to_string();

        if token.is_empty() {
            return Err(
                ConfigError::Credential(format!("Token file {} is empty", token_path)).into(),
            );
        }

        Self::new(normalize_instance_url(&config.api_base_url), SecretString::from(token))
    }

    pub fn instance_url(&self) -> &str {
        &self.instance_url
    }
}

#[async_trait]
impl Platform for MastodonClient {
    async fn create_post(&self, params: &PostParams) -> PostOutcome {
        if params.status.trim().is_empty() {
            return PostOutcome::Unexpected("Refusing to post an empty status".to_string());
        }

        let options = PostStatusInputOptions {
            spoiler_text: params.spoiler_text.clone(),
            visibility: Some(match params.visibility {
                Visibility::Public => StatusVisibility::Public,
                Visibility::Unlisted => StatusVisibility::Unlisted,
            }),
            ..Default::default()
        };

        match self
            .client
            .post_status(params.status.clone(), Some(&options))
            .await
        {
            Ok(response) => {
                let post_id = match response.json {
                    PostStatusOutput::Status(status) => status.id,
                    PostStatusOutput::ScheduledStatus(scheduled) => scheduled.id,
                };
                PostOutcome::Posted(post_id)
            }
            Err(e) => classify_error(&e),
        }
    }

    fn name(&self) -> &str {
        "mastodon"
    }
}

/// Prefix `https://` when the URL has no scheme
fn normalize_instance_url(url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{}", url)
    }
}

/// Sort a megalodon error into a retry category
///
/// - HTTP 429 → `RateLimited`
/// - Any other HTTP status → `ServiceError`
/// - A 2xx response whose body could not be read or decoded → `Unexpected`
///   (the status was created, so a retry would post it twice)
/// - Connection failures, timeouts and the rest → `ServiceError`
fn classify_error(error: &MegalodonError) -> PostOutcome {
    let detail = format!("{} ({:?})", error, error);

    match error {
        MegalodonError::OwnError(own) => match own.status {
            Some(429) => PostOutcome::RateLimited(detail),
            Some(_) => PostOutcome::ServiceError(detail),
            None if mentions_rate_limit(&own.message) => PostOutcome::RateLimited(detail),
            None => PostOutcome::ServiceError(detail),
        },
        MegalodonError::RequestError(e) => {
            if e.status().map(|s| s.as_u16()) == Some(429) {
                PostOutcome::RateLimited(detail)
            } else if e.is_decode() || e.is_body() {
                PostOutcome::Unexpected(detail)
            } else {
                PostOutcome::ServiceError(detail)
            }
        }
        MegalodonError::JsonError(_) => PostOutcome::Unexpected(detail),
        _ => PostOutcome::ServiceError(detail),
    }
}

/// Rate-limit wording, for errors that carry no HTTP status
fn mentions_rate_limit(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("rate limit") || lower.contains("too many requests")
}
