//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// OrgStats - GitHub organization statistics collector and chart renderer
///
/// Collect repo, contributor, language, star and pull-request statistics
/// for a GitHub organization, aggregate them into a JSON report restricted
/// to the member roster, and render the report as static SVG charts.
///
/// Examples:
///   orgstats collect --org TickLabVN
///   orgstats collect --org TickLabVN --output data.json --concurrency 8
///   orgstats render --input data.json --out-dir img
///   orgstats serve --input data.json --port 3000
///   orgstats init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file
    ///
    /// If not specified, looks for .orgstats.toml in the current directory
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Collect organization statistics and write the report JSON
    Collect(CollectArgs),
    /// Render an existing report JSON as SVG charts
    Render(RenderArgs),
    /// Serve an existing report JSON on a single HTTP route
    Serve(ServeArgs),
    /// Generate a default .orgstats.toml configuration file
    InitConfig,
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct CollectArgs {
    /// GitHub organization login to collect statistics for
    #[arg(long, value_name = "NAME", env = "ORGSTATS_ORG")]
    pub org: Option<String>,

    /// GitHub API bearer token
    ///
    /// Required for private data and strongly recommended to avoid the
    /// unauthenticated rate limit.
    #[arg(long, value_name = "TOKEN", env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Output file path for the report JSON
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Number of concurrent repository fetches
    #[arg(long, value_name = "NUM")]
    pub concurrency: Option<usize>,

    /// Number of trailing one-month contribution windows
    #[arg(long, value_name = "COUNT")]
    pub months: Option<u32>,

    /// GitHub API base URL
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct RenderArgs {
    /// Report JSON file to render
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Directory the chart images are written into
    #[arg(long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Chart width in pixels
    #[arg(long, value_name = "PX")]
    pub width: Option<u32>,

    /// Chart height in pixels
    #[arg(long, value_name = "PX")]
    pub height: Option<u32>,
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct ServeArgs {
    /// Report JSON file to expose
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, value_name = "PORT", env = "PORT")]
    pub port: Option<u16>,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        match &self.command {
            Command::Collect(collect) => {
                if let Some(concurrency) = collect.concurrency {
                    if concurrency == 0 {
                        return Err("Concurrency must be at least 1".to_string());
                    }
                }
                if let Some(months) = collect.months {
                    if months == 0 {
                        return Err("Months must be at least 1".to_string());
                    }
                }
                if let Some(ref api_url) = collect.api_url {
                    if !api_url.starts_with("http://") && !api_url.starts_with("https://") {
                        return Err(
                            "API URL must start with 'http://' or 'https://'".to_string()
                        );
                    }
                }
            }
            Command::Render(render) => {
                if render.width == Some(0) || render.height == Some(0) {
                    return Err("Chart dimensions must be at least 1 pixel".to_string());
                }
            }
            Command::Serve(serve) => {
                if serve.port == Some(0) {
                    return Err("Port must be between 1 and 65535".to_string());
                }
            }
            Command::InitConfig => {}
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args(command: Command) -> Args {
        Args {
            command,
            config: None,
            verbose: false,
            quiet: false,
        }
    }

    #[test]
    fn test_validation_conflicting_verbosity() {
        let mut args = make_args(Command::InitConfig);
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_zero_concurrency() {
        let args = make_args(Command::Collect(CollectArgs {
            concurrency: Some(0),
            ..CollectArgs::default()
        }));
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_bad_api_url() {
        let args = make_args(Command::Collect(CollectArgs {
            api_url: Some("ftp://api.github.com".to_string()),
            ..CollectArgs::default()
        }));
        assert!(args.validate().is_err());

        let args = make_args(Command::Collect(CollectArgs {
            api_url: Some("https://ghe.example.com/api/v3".to_string()),
            ..CollectArgs::default()
        }));
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_zero_port() {
        let args = make_args(Command::Serve(ServeArgs {
            port: Some(0),
            ..ServeArgs::default()
        }));
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args(Command::InitConfig);
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }

    #[test]
    fn test_parse_collect_subcommand() {
        let args = Args::try_parse_from([
            "orgstats",
            "collect",
            "--org",
            "TickLabVN",
            "--concurrency",
            "8",
        ])
        .unwrap();

        match args.command {
            Command::Collect(collect) => {
                assert_eq!(collect.org.as_deref(), Some("TickLabVN"));
                assert_eq!(collect.concurrency, Some(8));
            }
            other => panic!("expected collect subcommand, got {:?}", other),
        }
    }
}
