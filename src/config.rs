//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.orgstats.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// GitHub API settings.
    #[serde(default)]
    pub github: GithubConfig,

    /// Collector settings.
    #[serde(default)]
    pub collect: CollectConfig,

    /// Chart renderer settings.
    #[serde(default)]
    pub render: RenderConfig,

    /// HTTP endpoint settings.
    #[serde(default)]
    pub serve: ServeConfig,
}

/// GitHub API settings. The bearer token is never stored here; it comes
/// from the GITHUB_TOKEN environment variable or --token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    /// API base URL (point at a GitHub Enterprise instance if needed).
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Organization login.
    #[serde(default)]
    pub org: String,

    /// Page size for paginated list endpoints.
    #[serde(default = "default_per_page")]
    pub per_page: usize,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Number of retries for rate-limited or 5xx responses.
    #[serde(default = "default_retries")]
    pub retries: usize,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            org: String::new(),
            per_page: default_per_page(),
            timeout_seconds: default_timeout(),
            retries: default_retries(),
        }
    }
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_per_page() -> usize {
    100
}

fn default_timeout() -> u64 {
    30
}

fn default_retries() -> usize {
    4
}

/// Collector settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectConfig {
    /// Output report path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Number of concurrent repository fetches.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Number of trailing one-month contribution windows.
    #[serde(default = "default_months")]
    pub months: u32,
}

impl Default for CollectConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            concurrency: default_concurrency(),
            months: default_months(),
        }
    }
}

fn default_output() -> String {
    "data.json".to_string()
}

fn default_concurrency() -> usize {
    4
}

fn default_months() -> u32 {
    6
}

/// Chart renderer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Report JSON to read.
    #[serde(default = "default_output")]
    pub input: String,

    /// Directory the chart images are written into.
    #[serde(default = "default_out_dir")]
    pub out_dir: String,

    /// Chart width in pixels.
    #[serde(default = "default_width")]
    pub width: u32,

    /// Chart height in pixels.
    #[serde(default = "default_height")]
    pub height: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            input: default_output(),
            out_dir: default_out_dir(),
            width: default_width(),
            height: default_height(),
        }
    }
}

fn default_out_dir() -> String {
    "img".to_string()
}

fn default_width() -> u32 {
    600
}

fn default_height() -> u32 {
    400
}

/// HTTP endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServeConfig {
    /// Report JSON to expose.
    #[serde(default = "default_output")]
    pub input: String,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            input: default_output(),
            port: default_port(),
        }
    }
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(".orgstats.toml");

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// Only explicit CLI values override the config.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        match &args.command {
            crate::cli::Command::Collect(collect) => {
                if let Some(ref org) = collect.org {
                    self.github.org = org.clone();
                }
                if let Some(ref api_url) = collect.api_url {
                    self.github.api_url = api_url.clone();
                }
                if let Some(ref output) = collect.output {
                    self.collect.output = output.display().to_string();
                }
                if let Some(concurrency) = collect.concurrency {
                    self.collect.concurrency = concurrency;
                }
                if let Some(months) = collect.months {
                    self.collect.months = months;
                }
            }
            crate::cli::Command::Render(render) => {
                if let Some(ref input) = render.input {
                    self.render.input = input.display().to_string();
                }
                if let Some(ref out_dir) = render.out_dir {
                    self.render.out_dir = out_dir.display().to_string();
                }
                if let Some(width) = render.width {
                    self.render.width = width;
                }
                if let Some(height) = render.height {
                    self.render.height = height;
                }
            }
            crate::cli::Command::Serve(serve) => {
                if let Some(ref input) = serve.input {
                    self.serve.input = input.display().to_string();
                }
                if let Some(port) = serve.port {
                    self.serve.port = port;
                }
            }
            crate::cli::Command::InitConfig => {}
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
