//! Configuration file support for repostats.
//!
//! Configuration is loaded with the following precedence (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (prefixed with `REPOSTATS_`, e.g., `REPOSTATS_GITHUB_TOKEN`;
//!    keys containing an underscore use a double underscore after the section,
//!    e.g., `REPOSTATS_HARVEST__MAX_RETRIES`)
//! 3. Config file (~/.config/repostats/config.toml or ./repostats.toml)
//! 4. Built-in defaults
//!
//! Example config file:
//! ```toml
//! [github]
//! owner = "acme"       # the account whose repositories are harvested
//! token = "ghp_..."    # or use REPOSTATS_GITHUB_TOKEN env var
//!
//! [output]
//! dir = "./metrics"    # CSV destination directory (default: current directory)
//!
//! [harvest]
//! concurrency = 4
//! max_retries = 3
//! retry_delay_secs = 2
//! requests_per_second = 10
//! ```

use std::path::PathBuf;
use std::time::Duration;

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use directories::ProjectDirs;
use repostats::FetchConfig;
use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// GitHub configuration.
    pub github: GitHubConfig,
    /// Output configuration.
    pub output: OutputConfig,
    /// Harvest tuning knobs.
    pub harvest: HarvestConfig,
}

/// GitHub configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// The account whose repositories are harvested.
    /// Can also be set via REPOSTATS_GITHUB_OWNER environment variable.
    pub owner: Option<String>,
    /// GitHub API token.
    /// Can also be set via REPOSTATS_GITHUB_TOKEN environment variable.
    pub token: Option<String>,
}

/// Output configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Destination directory for the CSV tables.
    /// Defaults to the current directory.
    pub dir: Option<PathBuf>,
}

/// Harvest tuning knobs.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    /// Maximum concurrent repository tasks.
    pub concurrency: usize,
    /// Retry attempts for transient request failures.
    pub max_retries: usize,
    /// Delay between retry attempts, in seconds.
    pub retry_delay_secs: u64,
    /// Proactive request pacing. Set to 0 to disable.
    pub requests_per_second: u32,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        let fetch = FetchConfig::default();
        Self {
            concurrency: 4,
            max_retries: fetch.max_retries,
            retry_delay_secs: fetch.retry_delay.as_secs(),
            requests_per_second: fetch.requests_per_second.unwrap_or(0),
        }
    }
}

impl Config {
    /// Load configuration using the config crate's layered approach.
    ///
    /// Sources are loaded in order (later sources override earlier):
    /// 1. Built-in defaults
    /// 2. XDG config file (~/.config/repostats/config.toml)
    /// 3. Local config file (./repostats.toml)
    /// 4. Environment variables with REPOSTATS_ prefix
    pub fn load() -> Self {
        let mut builder = ConfigBuilder::builder();

        if let Some(proj_dirs) = ProjectDirs::from("", "", "repostats") {
            let xdg_config = proj_dirs.config_dir().join("config.toml");
            if xdg_config.exists() {
                tracing::debug!("Loading config from {:?}", xdg_config);
                builder = builder.add_source(
                    File::from(xdg_config)
                        .format(FileFormat::Toml)
                        .required(false),
                );
            }
        }

        let local_config = PathBuf::from("repostats.toml");
        if local_config.exists() {
            tracing::debug!("Loading config from ./repostats.toml");
            builder = builder.add_source(
                File::from(local_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        // e.g., REPOSTATS_GITHUB_TOKEN -> github.token
        builder = builder.add_source(
            Environment::with_prefix("REPOSTATS")
                .separator("_")
                .try_parsing(true),
        );

        // Single-underscore splitting cannot address keys that themselves
        // contain an underscore, so a double-underscore form is accepted too:
        // REPOSTATS_HARVEST__MAX_RETRIES -> harvest.max_retries
        builder = builder.add_source(
            Environment::with_prefix("REPOSTATS")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        match builder.build() {
            Ok(settings) => match settings.try_deserialize::<Config>() {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Failed to deserialize config: {}", e);
                    Config::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to build config: {}", e);
                Config::default()
            }
        }
    }

    pub fn github_owner(&self) -> Option<String> {
        self.github.owner.clone()
    }

    pub fn github_token(&self) -> Option<String> {
        self.github.token.clone()
    }

    /// Destination directory for the CSV tables.
    pub fn output_dir(&self) -> PathBuf {
        self.output.dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    /// Fetch settings for the shared client.
    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            max_retries: self.harvest.max_retries,
            retry_delay: Duration::from_secs(self.harvest.retry_delay_secs),
            requests_per_second: match self.harvest.requests_per_second {
                0 => None,
                rps => Some(rps),
            },
        }
    }

    /// Get the default config file path.
    #[allow(dead_code)]
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "repostats").map(|dirs| dirs.config_dir().join("config.toml"))
    }
}
