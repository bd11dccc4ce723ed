//! OrgStats - GitHub Organization Statistics
//!
//! A CLI tool that collects organization statistics over the GitHub REST
//! API, aggregates them into a member-filtered JSON report, and renders
//! the report as static SVG charts.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (network, config, bad report file, etc.)

mod aggregate;
mod cli;
mod collect;
mod config;
mod github;
mod models;
mod render;
mod report;
mod server;

use anyhow::{bail, Context, Result};
use cli::{Args, Command};
use collect::{CollectOptions, Collector};
use config::Config;
use github::{GithubClient, GithubClientOptions};
use render::RenderOptions;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle init-config early (no logging needed)
    if matches!(args.command, Command::InitConfig) {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("OrgStats v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(args).await {
        error!("Run failed: {}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle init-config: generate a default .orgstats.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(".orgstats.toml");

    if path.exists() {
        eprintln!("⚠️  .orgstats.toml already exists. Remove it first or edit it manually.");
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).context("Failed to write .orgstats.toml")?;

    println!("✅ Created .orgstats.toml with default settings.");
    println!("   Edit it to customize the organization, output paths, and chart sizes.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Load configuration and dispatch the subcommand.
async fn run(args: Args) -> Result<()> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    match args.command.clone() {
        Command::Collect(collect_args) => {
            run_collect(config, collect_args.token, args.quiet).await
        }
        Command::Render(_) => run_render(config),
        Command::Serve(_) => run_serve(config).await,
        Command::InitConfig => handle_init_config(),
    }
}

/// Run the collection pipeline and print a summary.
async fn run_collect(config: Config, token: Option<String>, quiet: bool) -> Result<()> {
    let start_time = Instant::now();

    if config.github.org.is_empty() {
        bail!(
            "No organization given; pass --org, set ORGSTATS_ORG, \
             or set github.org in .orgstats.toml"
        );
    }
    if token.is_none() {
        warn!("No GITHUB_TOKEN set; unauthenticated requests are tightly rate-limited");
    }

    println!(
        "📊 Collecting statistics for organization: {}",
        config.github.org
    );
    println!("   API: {}", config.github.api_url);
    println!("   Output: {}", config.collect.output);
    println!(
        "   Windows: {} months, concurrency: {}",
        config.collect.months, config.collect.concurrency
    );

    let client = GithubClient::new(GithubClientOptions {
        api_url: config.github.api_url.clone(),
        token,
        per_page: config.github.per_page,
        timeout: Duration::from_secs(config.github.timeout_seconds),
        retries: config.github.retries,
    })?;

    let collector = Collector::new(
        client,
        CollectOptions {
            org: config.github.org.clone(),
            output: PathBuf::from(&config.collect.output),
            concurrency: config.collect.concurrency,
            months: config.collect.months,
            quiet,
        },
    );

    let report = collector.run().await?;

    println!("\n📈 Collection Summary:");
    println!("   Members: {}", report.members.len());
    println!("   Repositories retained: {}", report.repos.len());
    println!("   Total contributions: {}", report.total_contributions);
    println!(
        "   Stars: {} | PRs: {} | Merged PRs: {}",
        report.total_stars, report.total_prs, report.total_merged_prs
    );
    println!("   Duration: {:.1}s", start_time.elapsed().as_secs_f64());
    println!("\n✅ Report saved to: {}", config.collect.output);

    Ok(())
}

/// Render the six charts from an existing report.
fn run_render(config: Config) -> Result<()> {
    let input = PathBuf::from(&config.render.input);

    println!("🎨 Rendering charts from: {}", input.display());
    let report = report::load_report(&input)?;

    let written = render::render_all(
        &report,
        &RenderOptions {
            out_dir: PathBuf::from(&config.render.out_dir),
            width: config.render.width,
            height: config.render.height,
        },
    )?;

    println!(
        "✅ Wrote {} charts to: {}",
        written.len(),
        config.render.out_dir
    );
    Ok(())
}

/// Expose the report on the single HTTP route.
async fn run_serve(config: Config) -> Result<()> {
    println!(
        "🌐 Serving {} on port {}",
        config.serve.input, config.serve.port
    );
    server::serve(Path::new(&config.serve.input), config.serve.port).await
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from .orgstats.toml");
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
