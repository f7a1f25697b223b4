//! CyclePlot - Simulation Statistics Plotter
//!
//! A CLI tool that aggregates per-cycle simulation statistics across
//! experiment directories and renders comparison plots with
//! confidence intervals.
//!
//! Exit codes:
//!   0 - Success (all requested plots written)
//!   1 - Runtime error, or one or more statistics failed to plot

mod analysis;
mod cli;
mod config;
mod models;
mod parser;
mod plot;
mod report;
mod scanner;

use analysis::aggregator::{AggregateOptions, StatsAggregator};
use anyhow::{bail, Context, Result};
use cli::Args;
use config::Config;
use indicatif::{ProgressBar, ProgressStyle};
use models::StatSelector;
use parser::ParseMode;
use plot::PlotSettings;
use scanner::{ExperimentDir, ExperimentScanner};
use std::path::PathBuf;
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

    info!("CyclePlot v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    // Run the plotting pipeline
    match run_plots(args) {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Plotting failed: {}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .cycleplot.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(config::CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            config::CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", config::CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", config::CONFIG_FILE_NAME);
    println!("   Edit it to customize pattern, exclusions, confidence, and plot styles.");
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

/// Run the complete plotting workflow. Returns exit code (0 or 1).
fn run_plots(args: Args) -> Result<i32> {
    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    // Set up experiment discovery
    let scan_config = scanner::ScanConfig::from(&config.input);
    let experiment_scanner = ExperimentScanner::new(args.data_dir.clone(), scan_config);

    // Handle --dry-run: discover directories and exit
    if args.dry_run {
        return handle_dry_run(&experiment_scanner);
    }

    // Step 1: Discover the experimental conditions
    let dirs = experiment_scanner.scan()?;
    if dirs.is_empty() {
        bail!(
            "no experiment directories with data files under {}",
            args.data_dir.display()
        );
    }

    println!("📂 Found {} experiment directories:", dirs.len());
    for dir in &dirs {
        println!("   {} ({} files)", dir.name, dir.files.len());
    }

    let out_dir = PathBuf::from(&config.general.out_dir);
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("Failed to create output directory {}", out_dir.display()))?;

    // Step 2: Set up the aggregator
    let mode = if args.lenient {
        ParseMode::Lenient
    } else {
        ParseMode::Strict
    };
    let aggregator = StatsAggregator::new(AggregateOptions {
        confidence: config.stats.confidence,
        mode,
        exclusions: config.input.exclusions.clone(),
    });

    // Step 3: One plot per requested statistic, plus the fixed
    // dropped-packets plot
    let mut selectors: Vec<StatSelector> = args
        .stats_name
        .iter()
        .map(|name| StatSelector::column(name))
        .collect();
    if !args.skip_dropped {
        selectors.push(StatSelector::dropped_packets());
    }

    println!(
        "\n📊 Plotting {} statistics at {:.0}% confidence...\n",
        selectors.len(),
        config.stats.confidence * 100.0
    );

    let progress = if args.quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(selectors.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("#>-"),
        );
        pb
    };

    let mut failures = 0;
    for selector in &selectors {
        progress.set_message(selector.name().to_string());

        match run_statistic(&aggregator, &dirs, selector, &config, &args, &out_dir) {
            Ok(()) => {
                info!("plotted `{}`", selector.name());
            }
            Err(e) => {
                failures += 1;
                error!("statistic `{}` failed: {:#}", selector.name(), e);
            }
        }

        progress.inc(1);
    }
    progress.finish_and_clear();

    // Print summary
    let plotted = selectors.len() - failures;
    println!("\n✅ Done: {} of {} plots written to {}", plotted, selectors.len(), out_dir.display());

    if failures > 0 {
        eprintln!("⛔ {} statistics failed; see the log above.", failures);
        return Ok(1);
    }

    Ok(0)
}

/// Aggregate, render, and optionally dump one statistic.
fn run_statistic(
    aggregator: &StatsAggregator,
    dirs: &[ExperimentDir],
    selector: &StatSelector,
    config: &Config,
    args: &Args,
    out_dir: &PathBuf,
) -> Result<()> {
    let series = aggregator
        .aggregate(dirs, selector)
        .with_context(|| format!("aggregation failed for `{}`", selector.name()))?;

    if series.is_empty() {
        bail!("every directory is excluded for `{}`", selector.name());
    }

    // Flat-zero series must stay visible on the dropped-packets plot.
    let y_min = if selector.name() == "droppedPackets" {
        -0.000001
    } else {
        0.0
    };
    let settings = PlotSettings::for_stat(&config.plot, selector.name(), y_min);

    let (png, svg) = plot::render_stat_plots(
        &series,
        selector.name(),
        &settings,
        &config.plot.styles,
        out_dir,
    )?;
    println!("   📈 {}", png.display());
    println!("   📈 {}", svg.display());

    if args.dump_series {
        let dump = report::write_dump(
            &series,
            selector.name(),
            &settings.x_label,
            &settings.y_label,
            args.format,
            out_dir,
        )?;
        println!("   📝 {}", dump.display());
    }

    Ok(())
}

/// Handle --dry-run: discover directories, print what would be plotted, exit.
fn handle_dry_run(experiment_scanner: &ExperimentScanner) -> Result<i32> {
    println!("\n🔍 Dry run: discovering experiment directories...\n");

    let dirs = experiment_scanner.scan()?;

    if dirs.is_empty() {
        println!("   No experiment directories with data files found.");
    } else {
        println!("   Found {} experiment directories:\n", dirs.len());
        for dir in &dirs {
            println!("     📁 {} ({} files)", dir.name, dir.files.len());
            for file in &dir.files {
                println!("        📄 {}", file.display());
            }
        }
    }

    println!("\n✅ Dry run complete. No plots were generated.");
    Ok(0)
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
            info!("Loaded default config from {}", config::CONFIG_FILE_NAME);
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
