//! CLI definition, config resolution, and tracing setup.

use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;
use clap::Parser;
use color_eyre::eyre::{Result, WrapErr, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use resultgen_core::pipeline::{GeneratedPost, ProgressReporter, RunReport, SkippedFile};
use resultgen_shared::{AppConfig, GenerateConfig, load_config, load_config_from};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// resultgen: publish fencing tournament results to a Jekyll site.
#[derive(Parser, Debug)]
#[command(
    name = "resultgen",
    version,
    about = "Convert CSV tournament results into Jekyll posts and a results index.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Site root; all configured paths are relative to it.
    #[arg(long, default_value = ".", env = "RESULTGEN_SITE")]
    pub site: PathBuf,

    /// Config file (defaults to resultgen.toml in the site root, if present).
    #[arg(long, env = "RESULTGEN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory containing the result CSV files.
    #[arg(long)]
    pub source: Option<String>,

    /// Directory generated posts are written to.
    #[arg(long)]
    pub posts: Option<String>,

    /// Path of the generated index page.
    #[arg(long)]
    pub index: Option<String>,

    /// Date used for records without one (YYYY-MM-DD, defaults to today).
    #[arg(long, value_parser = parse_date)]
    pub date: Option<NaiveDate>,

    /// Print the run report as JSON instead of a summary.
    #[arg(long)]
    pub json: bool,

    /// Print the resolved configuration as TOML and exit.
    #[arg(long)]
    pub print_config: bool,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text")]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

fn parse_date(raw: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}

// ---------------------------------------------------------------------------
// Tracing
// ---------------------------------------------------------------------------

/// Initialize the tracing subscriber based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "resultgen=info",
        1 => "resultgen=debug",
        _ => "resultgen=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

/// Resolve configuration and run the generator.
pub(crate) fn run(cli: Cli) -> Result<()> {
    let config = resolve_config(&cli)?;

    if cli.print_config {
        println!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    let today = cli.date.unwrap_or_else(|| chrono::Local::now().date_naive());
    let generate_config = GenerateConfig::new(&config, &cli.site);

    info!(
        site = %cli.site.display(),
        source = %generate_config.source_dir.display(),
        posts = %generate_config.posts_dir.display(),
        %today,
        "generating results"
    );

    let reporter = CliProgress::new(cli.json);
    let outcome = resultgen_core::generate_with_progress(&generate_config, today, &reporter);
    reporter.finish();
    let report = outcome?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }
    Ok(())
}

/// Config file, then flag overrides.
fn resolve_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            if !path.is_file() {
                return Err(eyre!("config file not found: {}", path.display()));
            }
            load_config_from(path)
                .wrap_err_with(|| format!("loading config from {}", path.display()))?
        }
        None => load_config(&cli.site)
            .wrap_err_with(|| format!("loading config for site {}", cli.site.display()))?,
    };
    apply_overrides(&mut config, cli);
    Ok(config)
}

fn apply_overrides(config: &mut AppConfig, cli: &Cli) {
    if let Some(source) = &cli.source {
        config.paths.source_dir = source.clone();
    }
    if let Some(posts) = &cli.posts {
        config.paths.posts_dir = posts.clone();
    }
    if let Some(index) = &cli.index {
        config.paths.index_path = index.clone();
    }
}

fn print_summary(report: &RunReport) {
    println!();
    println!("  Generated: {}", report.generated_count());
    println!("  Skipped:   {}", report.skipped_count());
    println!("  Warnings:  {}", report.warning_count());
    println!("  Index:     {}", report.index_path.display());

    if !report.skipped.is_empty() {
        println!();
        for skipped in &report.skipped {
            println!("  skipped {}: {}", skipped.source.display(), skipped.reason);
        }
    }
    if !report.warnings.is_empty() {
        println!();
        for warning in &report.warnings {
            println!("  warning: {warning}");
        }
    }
    println!();
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// Spinner on stderr; hidden when machine-readable output is requested.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new(quiet: bool) -> Self {
        if quiet {
            return Self {
                spinner: ProgressBar::hidden(),
            };
        }

        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(Duration::from_millis(80));
        Self { spinner }
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn post_written(&self, post: &GeneratedPost, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Writing [{current}/{total}] {}", post.title));
    }

    fn skipped(&self, skipped: &SkippedFile) {
        self.spinner
            .set_message(format!("Skipped {}", skipped.source.display()));
    }
}
