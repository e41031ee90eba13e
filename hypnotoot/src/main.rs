//! hypnotoot - Post a random quote to Mastodon
//!
//! Meant to be run periodically (e.g. from cron). Each run posts one quote
//! and remembers the last 50 so they are not repeated soon.

use std::path::PathBuf;

use clap::Parser;
use libhypnotoot::bot::run_once;
use libhypnotoot::config::ConfigLayer;
use libhypnotoot::logging::LoggingConfig;
use libhypnotoot::platforms::mastodon::MastodonClient;
use libhypnotoot::{Config, JsonHistoryStore, Result, RetryPolicy};
use tracing::{debug, error, info};

#[derive(Parser, Debug)]
#[command(name = "hypnotoot")]
#[command(version)]
#[command(about = "Post a random Hypnospace Outlaw quote to Mastodon")]
#[command(long_about = "\
hypnotoot - Post a random Hypnospace Outlaw quote to Mastodon

DESCRIPTION:
    Picks a quote that has not been used in the last 50 runs and posts it.
    Quotes with a content warning are posted unlisted behind the warning;
    all others are posted publicly with #hypnospace #hypnospaceoutlaw.

    Rate limits and server errors are retried up to 5 times with backoff.

USAGE:
    hypnotoot --token-file ~/.config/hypnotoot/token \\
              --api-base-url https://botsin.space

CONFIGURATION:
    Settings may also come from HYPNOTOOT_* environment variables or a
    TOML file (--config, HYPNOTOOT_CONFIG, ~/.config/hypnotoot/config.toml).

EXIT CODES:
    0 - Posted
    1 - Any error
")]
struct Cli {
    /// Path to a file containing the access token
    #[arg(long, env = "HYPNOTOOT_TOKEN_FILE")]
    token_file: Option<String>,

    /// Mastodon API base URL
    #[arg(long, env = "HYPNOTOOT_API_BASE_URL")]
    api_base_url: Option<String>,

    /// Path to log file (rotated at 1 MiB, one backup kept)
    #[arg(long, env = "HYPNOTOOT_LOG_FILE")]
    log_file: Option<String>,

    /// Set log level: DEBUG, INFO, WARN, ERROR, FATAL (default: INFO)
    #[arg(long, env = "HYPNOTOOT_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log output format: text or json (default: text)
    #[arg(long, env = "HYPNOTOOT_LOG_FORMAT")]
    log_format: Option<String>,

    /// Don't log to stdout
    #[arg(short, long)]
    quiet: bool,

    /// Quote corpus (default: quotes.json)
    #[arg(long, env = "HYPNOTOOT_QUOTES_FILE")]
    quotes_file: Option<String>,

    /// Recently used quotes (default: last_50.json)
    #[arg(long, env = "HYPNOTOOT_HISTORY_FILE")]
    history_file: Option<String>,

    /// Configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

impl Cli {
    fn layer(&self) -> ConfigLayer {
        ConfigLayer {
            token_file: self.token_file.clone(),
            api_base_url: self.api_base_url.clone(),
            quotes_file: self.quotes_file.clone(),
            history_file: self.history_file.clone(),
            log_file: self.log_file.clone(),
            log_level: self.log_level.clone(),
            log_format: self.log_format.clone(),
            quiet: self.quiet.then_some(true),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let config = match Config::load(cli.layer(), cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(e.exit_code());
        }
    };

    if let Err(e) = LoggingConfig::from(&config.log).init() {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
    debug!("Got config: {:?}", config);

    match run(&config).await {
        Ok(()) => {}
        Err(e) => {
            error!("Run failed: {}", e);
            std::process::exit(e.exit_code());
        }
    }
}

async fn run(config: &Config) -> Result<()> {
    // Credentials are checked before a quote is used up
    let client = MastodonClient::from_config(&config.mastodon)?;
    let store = JsonHistoryStore::new(&config.history_file);

    let receipt = run_once(
        &config.quotes_file,
        &store,
        &client,
        RetryPolicy::default(),
        &mut rand::thread_rng(),
    )
    .await?;

    info!("Posted quote \"{}\" as {}", receipt.quote_id, receipt.post_id);
    Ok(())
}
