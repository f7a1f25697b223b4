//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// CyclePlot - per-cycle simulation statistics plotter
///
/// Aggregates the statistics files found in each subdirectory of the data
/// directory into per-cycle mean/confidence-interval curves, one curve per
/// experimental condition, and renders comparison plots.
///
/// Examples:
///   cycleplot
///   cycleplot --stats-name numTxCells scheduleCollisions
///   cycleplot --data-dir ./results --out-dir ./plots --dump-series
///   cycleplot --dry-run
///   cycleplot --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Statistics to plot against the cycle axis
    ///
    /// Each name must match a column declared in the data-file headers.
    /// A dropped-packets plot is always produced in addition (see
    /// --skip-dropped).
    #[arg(
        short,
        long = "stats-name",
        value_name = "NAME",
        num_args = 1..,
        default_value = "numTxCells"
    )]
    pub stats_name: Vec<String>,

    /// Data directory whose immediate subdirectories are the conditions
    #[arg(
        short,
        long,
        default_value = ".",
        value_name = "DIR",
        env = "CYCLEPLOT_DATA_DIR"
    )]
    pub data_dir: PathBuf,

    /// Output directory for plots and series dumps
    ///
    /// Defaults to the config file setting, or the working directory.
    #[arg(short, long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Confidence level for the interval half-widths (0 < level < 1)
    #[arg(long, value_name = "LEVEL")]
    pub confidence: Option<f64>,

    /// Data-file extension to match, without the leading dot
    #[arg(long, value_name = "EXT")]
    pub pattern: Option<String>,

    /// Skip malformed data rows with a diagnostic instead of failing
    #[arg(long)]
    pub lenient: bool,

    /// Write a sidecar dump of the plotted series next to each plot
    #[arg(long)]
    pub dump_series: bool,

    /// Sidecar dump format (text, json)
    #[arg(long, default_value = "text", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Do not produce the fixed dropped-packets plot
    #[arg(long)]
    pub skip_dropped: bool,

    /// Path to configuration file
    ///
    /// If not specified, looks for .cycleplot.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Dry run: discover directories and files without parsing or plotting
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .cycleplot.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Sidecar dump format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Plain text (default)
    #[default]
    Text,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.stats_name.iter().any(|name| name.trim().is_empty()) {
            return Err("Statistic names must not be empty".to_string());
        }

        if let Some(confidence) = self.confidence {
            if !(confidence > 0.0 && confidence < 1.0) {
                return Err("Confidence level must be strictly between 0 and 1".to_string());
            }
        }

        if let Some(ref pattern) = self.pattern {
            if pattern.is_empty() || pattern.starts_with('.') || pattern.contains('/') {
                return Err(
                    "Pattern must be a bare file extension without the leading dot".to_string(),
                );
            }
        }

        if !self.data_dir.exists() {
            return Err(format!(
                "Data directory does not exist: {}",
                self.data_dir.display()
            ));
        }
        if !self.data_dir.is_dir() {
            return Err(format!(
                "Data path is not a directory: {}",
                self.data_dir.display()
            ));
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
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

    fn make_args() -> Args {
        Args {
            stats_name: vec!["numTxCells".to_string()],
            data_dir: PathBuf::from("."),
            out_dir: None,
            confidence: None,
            pattern: None,
            lenient: false,
            dump_series: false,
            format: OutputFormat::Text,
            skip_dropped: false,
            config: None,
            verbose: false,
            quiet: false,
            dry_run: false,
            init_config: false,
        }
    }

    #[test]
    fn test_defaults_from_parser() {
        let args = Args::try_parse_from(["cycleplot"]).unwrap();
        assert_eq!(args.stats_name, vec!["numTxCells".to_string()]);
        assert_eq!(args.data_dir, PathBuf::from("."));
        assert_eq!(args.format, OutputFormat::Text);
        assert!(!args.lenient);
    }

    #[test]
    fn test_multiple_stats_names() {
        let args =
            Args::try_parse_from(["cycleplot", "--stats-name", "numTxCells", "scheduleCollisions"])
                .unwrap();
        assert_eq!(args.stats_name.len(), 2);
    }

    #[test]
    fn test_validation_bad_confidence() {
        let mut args = make_args();
        args.confidence = Some(1.0);
        assert!(args.validate().is_err());

        args.confidence = Some(0.0);
        assert!(args.validate().is_err());

        args.confidence = Some(0.95);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_bad_pattern() {
        let mut args = make_args();
        args.pattern = Some(".dat".to_string());
        assert!(args.validate().is_err());

        args.pattern = Some("dat".to_string());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_missing_data_dir() {
        let mut args = make_args();
        args.data_dir = PathBuf::from("/definitely/not/a/real/path");
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
