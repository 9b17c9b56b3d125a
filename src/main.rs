//! Postats - per-channel social post statistics
//!
//! A CLI tool that aggregates impressions, engagements and link clicks
//! per publishing channel and renders them as a styled PNG table.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (missing column, unreadable input, render failure, etc.)

mod cli;
mod config;

use anyhow::{Context, Result};
use cli::{Args, SummaryFormat};
use config::{Config, CONFIG_FILE};
use postats::ingest::RawTable;
use postats::models::{Channel, Partition};
use postats::report::{self, OverallStats};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("Postats v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(&args) {
        error!("Statistics failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .postats.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to customize DPI, fonts, colors and row striping.");
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
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Load, aggregate, render and write the outputs.
fn run(args: &Args) -> Result<()> {
    let start_time = Instant::now();

    let mut config = load_config(args)?;
    config.merge_with_args(args);
    config.validate()?;

    let input = args
        .input
        .as_deref()
        .context("An --input file is required")?;
    let format = args.effective_input_format();

    if !args.quiet {
        println!("📥 Loading posts: {}", input.display());
    }
    let table = RawTable::load(input, format)
        .with_context(|| format!("Failed to load {}", input.display()))?;
    info!("Loaded {} rows, {} columns", table.len(), table.headers.len());

    let stats = report::compute_overall_stats(&table)?;
    let viz = report::render_overall_stats(&stats, &config.render)?;

    let output = PathBuf::from(&config.general.output);
    std::fs::write(&output, &viz.img)
        .with_context(|| format!("Failed to write image to {}", output.display()))?;

    if let Some(ref summary_path) = args.summary {
        write_summary(&stats, summary_path, args.summary_format, &config)?;
    }

    if !args.quiet {
        print_summary(&stats);
        println!("   Duration: {:.2}s", start_time.elapsed().as_secs_f64());
        println!("\n✅ {} saved to: {}", viz.title, output.display());
    }

    Ok(())
}

fn write_summary(
    stats: &OverallStats,
    path: &Path,
    format: SummaryFormat,
    config: &Config,
) -> Result<()> {
    let content = match format {
        SummaryFormat::Json => report::generate_json_summary(stats)?,
        SummaryFormat::Markdown => {
            report::generate_markdown_summary(stats, config.render.orientation)
        }
    };

    std::fs::write(path, content)
        .with_context(|| format!("Failed to write summary to {}", path.display()))?;
    info!("Summary written to {}", path.display());
    Ok(())
}

fn print_summary(stats: &OverallStats) {
    println!("\n📊 Post Summary:");
    for channel in Channel::ALL {
        if let Some(p) = stats.partition(Partition::Channel(channel)) {
            println!(
                "   {:<9} {:>6} posts | CTR {:>8} | wEng {:>8}",
                channel.label(),
                p.stats.total_posts,
                p.avg_ctr,
                p.avg_weng_rate
            );
        }
    }
    if let Some(overall) = stats.partition(Partition::Overall) {
        println!(
            "   {:<9} {:>6} posts | CTR {:>8} | wEng {:>8}",
            "Overall", overall.stats.total_posts, overall.avg_ctr, overall.avg_weng_rate
        );
    }
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
            info!("Loaded default config from {}", CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {:#}", e);
            Ok(Config::default())
        }
    }
}
