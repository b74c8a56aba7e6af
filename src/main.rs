//! Moodle-Mirror main entry point
//!
//! This is the command-line interface for the Moodle course mirror.

use anyhow::{bail, Context, Result};
use clap::Parser;
use moodle_mirror::config::{
    load_config_with_hash, load_dotenv, validate, Config, CourseConfig, CrawlerConfig, OutputConfig,
    SessionConfig,
};
use moodle_mirror::crawler::{crawl, RunContext};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const DEFAULT_OUTPUT_DIR: &str = "./output";

/// Moodle-Mirror: an authenticated Moodle course mirror
///
/// Moodle-Mirror crawls one course starting from its landing page, saves the
/// main content of every course page and every file it links to, and lists
/// the external resources it found in `summary.txt`.
#[derive(Parser, Debug)]
#[command(name = "moodle-mirror")]
#[command(version)]
#[command(about = "Mirror a Moodle course to disk", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Course id to mirror
    #[arg(long)]
    id: Option<u64>,

    /// Moodle host; the base URL becomes https://<DOMAIN>
    #[arg(long, conflicts_with = "base_url")]
    domain: Option<String>,

    /// Full base URL of the Moodle instance, including any path prefix
    #[arg(long)]
    base_url: Option<String>,

    /// Output directory [default: ./output]
    #[arg(long)]
    dir: Option<PathBuf>,

    /// Session cookie name (also read from COOKIE_NAME, including a `.env` file)
    #[arg(long, env = "COOKIE_NAME")]
    cookie_name: Option<String>,

    /// Session cookie value (also read from COOKIE_VALUE, including a `.env` file)
    #[arg(long, env = "COOKIE_VALUE", hide_env_values = true)]
    cookie_value: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,
}

impl Cli {
    fn base_url(&self) -> Option<String> {
        self.base_url
            .clone()
            .or_else(|| self.domain.as_ref().map(|d| format!("https://{}", d)))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Before parsing, so the cookie flags can fall back to `.env` values
    let dotenv = load_dotenv();
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    match dotenv {
        Ok(Some(path)) => tracing::info!("Loaded environment from {}", path.display()),
        Ok(None) => {}
        Err(e) => tracing::warn!("{}", e),
    }

    let config = resolve_config(&cli)?;

    if cli.dry_run {
        handle_dry_run(&config)?;
        return Ok(());
    }

    let stats = crawl(config).await.context("Crawl aborted")?;
    tracing::info!(
        "Mirrored {} resources ({} failed)",
        stats.total_processed(),
        stats.total_errors()
    );

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("moodle_mirror=info,warn"),
            1 => EnvFilter::new("moodle_mirror=debug,info"),
            2 => EnvFilter::new("moodle_mirror=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Builds the configuration from the file, if any, and the command line
///
/// Command-line values (and the cookie environment variables) win over
/// values from the file.
fn resolve_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => config_from_flags(cli)?,
    };

    if let Some(id) = cli.id {
        config.course.course_id = id;
    }
    if let Some(base_url) = cli.base_url() {
        config.course.base_url = base_url;
    }
    if let Some(dir) = &cli.dir {
        config.output.directory = dir.to_string_lossy().into_owned();
    }
    if let Some(name) = &cli.cookie_name {
        config.session.cookie_name = name.clone();
    }
    if let Some(value) = &cli.cookie_value {
        config.session.cookie_value = value.clone();
    }

    validate(&config).context("Invalid configuration")?;
    Ok(config)
}

/// Configuration for a run without a config file
fn config_from_flags(cli: &Cli) -> Result<Config> {
    let Some(course_id) = cli.id else {
        bail!("No config file given: --id is required");
    };
    let Some(base_url) = cli.base_url() else {
        bail!("No config file given: --domain or --base-url is required");
    };
    let (Some(cookie_name), Some(cookie_value)) = (&cli.cookie_name, &cli.cookie_value) else {
        bail!("No config file given: set COOKIE_NAME and COOKIE_VALUE in the environment or a .env file");
    };

    Ok(Config {
        course: CourseConfig {
            base_url,
            course_id,
        },
        session: SessionConfig {
            cookie_name: cookie_name.clone(),
            cookie_value: cookie_value.clone(),
        },
        output: OutputConfig {
            directory: DEFAULT_OUTPUT_DIR.to_string(),
        },
        crawler: CrawlerConfig::default(),
    })
}

/// Handles the --dry-run mode: shows what would be crawled
fn handle_dry_run(config: &Config) -> Result<()> {
    let context = RunContext::from_config(config).context("Failed to prepare run")?;

    println!("=== Moodle-Mirror Dry Run ===\n");

    println!("Course:");
    println!("  Base URL: {}", context.base());
    println!("  Course id: {}", context.course_id());
    println!("  Seed URL: {}", context.seed_url());

    println!("\nSession:");
    println!("  Cookie: {}=<{} chars>", config.session.cookie_name, config.session.cookie_value.len());

    println!("\nCrawler Configuration:");
    println!("  Stall timeout: {}s", config.crawler.request_timeout_secs);
    println!("  Connect timeout: {}s", config.crawler.connect_timeout_secs);
    println!("  User agent: {}", config.crawler.user_agent);
    println!("  Content class: {}", config.crawler.content_class);
    println!("  Abort on error: {}", config.crawler.abort_on_error);

    println!("\nOutput:");
    println!("  Course root: {}", context.layout().root().display());
    println!("  Summary: {}", context.summary_path().display());

    println!("\n✓ Configuration is valid");
    Ok(())
}
