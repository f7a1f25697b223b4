//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.cycleplot.toml` files.

use crate::analysis::aggregator::{default_exclusions, ExclusionRule};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".cycleplot.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Input discovery settings.
    #[serde(default)]
    pub input: InputConfig,

    /// Statistics settings.
    #[serde(default)]
    pub stats: StatsConfig,

    /// Plot settings.
    #[serde(default)]
    pub plot: PlotConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Directory plots and dumps are written to.
    #[serde(default = "default_out_dir")]
    pub out_dir: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            out_dir: default_out_dir(),
            verbose: false,
        }
    }
}

fn default_out_dir() -> String {
    ".".to_string()
}

/// Input discovery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Data-file extension to match (without dot).
    #[serde(default = "default_pattern")]
    pub pattern: String,

    /// Directory basenames skipped during discovery.
    #[serde(default)]
    pub excludes: Vec<String>,

    /// Per-statistic directory exclusions.
    #[serde(default = "default_exclusions")]
    pub exclusions: Vec<ExclusionRule>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            pattern: default_pattern(),
            excludes: Vec::new(),
            exclusions: default_exclusions(),
        }
    }
}

fn default_pattern() -> String {
    "dat".to_string()
}

/// Statistics settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsConfig {
    /// Confidence level for interval half-widths, in (0, 1).
    #[serde(default = "default_confidence")]
    pub confidence: f64,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            confidence: default_confidence(),
        }
    }
}

fn default_confidence() -> f64 {
    0.95
}

/// Plot settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotConfig {
    /// Chart width in pixels.
    #[serde(default = "default_width")]
    pub width: u32,

    /// Chart height in pixels.
    #[serde(default = "default_height")]
    pub height: u32,

    /// X-axis label shared by all plots.
    #[serde(default = "default_x_label")]
    pub x_label: String,

    /// Y-axis label overrides, keyed by statistic name.
    #[serde(default)]
    pub y_labels: HashMap<String, String>,

    /// Palette-index overrides, keyed by directory name.
    #[serde(default)]
    pub styles: HashMap<String, usize>,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            x_label: default_x_label(),
            y_labels: HashMap::new(),
            styles: HashMap::new(),
        }
    }
}

fn default_width() -> u32 {
    1200
}

fn default_height() -> u32 {
    800
}

fn default_x_label() -> String {
    "slotframe cycles".to_string()
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
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref out_dir) = args.out_dir {
            self.general.out_dir = out_dir.display().to_string();
        }

        if let Some(ref pattern) = args.pattern {
            self.input.pattern = pattern.clone();
        }

        if let Some(confidence) = args.confidence {
            self.stats.confidence = confidence;
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
