//! Comparison-plot rendering.
//!
//! One chart per statistic, one line per experiment directory, written as
//! both PNG and SVG. Charts use the [`plotters`] crate with the bitmap
//! backend's default font rendering so headless environments work without
//! system font dependencies.

use crate::config::PlotConfig;
use crate::models::DirectorySeries;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::series::DashedLineSeries;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during plot generation
#[derive(Error, Debug)]
pub enum PlotError {
    #[error("Failed to create drawing area: {0}")]
    DrawingArea(String),

    #[error("Failed to configure chart: {0}")]
    ChartConfig(String),

    #[error("Failed to draw chart elements: {0}")]
    Drawing(String),

    #[error("Failed to save plot to file: {0}")]
    FileSave(#[from] std::io::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

type Result<T> = core::result::Result<T, PlotError>;

/// Stroke pattern of a palette slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Solid,
    Dashed,
    DashDot,
    Dotted,
}

/// Fixed palette: the five condition colors with their stroke patterns.
const PALETTE: [(RGBColor, LineStyle); 5] = [
    (RGBColor(0x00, 0x00, 0xff), LineStyle::Dashed),
    (RGBColor(0xff, 0x00, 0x00), LineStyle::DashDot),
    (RGBColor(0x00, 0x80, 0x00), LineStyle::Dotted),
    (RGBColor(0xbf, 0x00, 0xbf), LineStyle::Solid),
    (RGBColor(0x00, 0x00, 0x00), LineStyle::Solid),
];

/// Fixed palette slot for the well-known condition names.
fn known_index(directory: &str) -> Option<usize> {
    match directory {
        "tx-housekeeping" => Some(0),
        "rx-housekeeping" => Some(1),
        "tx-rx-housekeeping" => Some(2),
        "no housekeeping" => Some(3),
        "no interference" => Some(4),
        _ => None,
    }
}

/// Default y-axis label for a statistic.
pub fn default_y_label(stat_name: &str) -> &str {
    match stat_name {
        "numTxCells" => "Tx cells",
        "scheduleCollisions" => "schedule collisions",
        "droppedAppFailedEnqueue" => "dropped packets due to full queue",
        "effectiveCollidedTxs" => "potentially colliding transmitters",
        "probableCollisions" => "probable collisions",
        "droppedPackets" => "dropped packets",
        other => other,
    }
}

/// Assign a palette index to every directory, deterministically.
///
/// Explicit overrides win, then the fixed slots of well-known names;
/// remaining directories take the lowest free slot in first-seen order,
/// wrapping once the palette is exhausted. No randomness: repeated runs
/// over the same directories always produce the same figure.
pub fn assign_styles(directories: &[&str], overrides: &HashMap<String, usize>) -> Vec<usize> {
    let fixed = |name: &str| -> Option<usize> {
        overrides
            .get(name)
            .map(|&idx| idx % PALETTE.len())
            .or_else(|| known_index(name))
    };

    let mut taken = [false; PALETTE.len()];
    for name in directories {
        if let Some(idx) = fixed(name) {
            taken[idx] = true;
        }
    }

    let mut cursor = 0usize;
    directories
        .iter()
        .map(|name| {
            if let Some(idx) = fixed(name) {
                return idx;
            }
            for _ in 0..PALETTE.len() {
                let candidate = cursor % PALETTE.len();
                cursor += 1;
                if !taken[candidate] {
                    taken[candidate] = true;
                    return candidate;
                }
            }
            // Palette exhausted; wrap.
            let candidate = cursor % PALETTE.len();
            cursor += 1;
            candidate
        })
        .collect()
}

/// Settings for one rendered chart.
#[derive(Debug, Clone)]
pub struct PlotSettings {
    pub width: u32,
    pub height: u32,
    pub x_label: String,
    pub y_label: String,
    /// Lower bound of the y range; slightly negative for plots where
    /// all-zero series must stay visible.
    pub y_min: f64,
}

impl PlotSettings {
    /// Build settings for a statistic from the plot configuration.
    pub fn for_stat(config: &PlotConfig, stat_name: &str, y_min: f64) -> Self {
        let y_label = config
            .y_labels
            .get(stat_name)
            .cloned()
            .unwrap_or_else(|| default_y_label(stat_name).to_string());

        Self {
            width: config.width,
            height: config.height,
            x_label: config.x_label.clone(),
            y_label,
            y_min,
        }
    }
}

/// Output file names for a statistic, relative to the output directory.
pub fn output_file_names(stat_name: &str) -> (String, String) {
    let base = format!("output_{}_cycle", stat_name);
    (format!("{base}.png"), format!("{base}.svg"))
}

/// Render the comparison chart for one statistic as PNG and SVG.
///
/// Returns the paths of the two written files.
pub fn render_stat_plots(
    series_set: &[DirectorySeries],
    stat_name: &str,
    settings: &PlotSettings,
    style_overrides: &HashMap<String, usize>,
    out_dir: &Path,
) -> Result<(PathBuf, PathBuf)> {
    if series_set.is_empty() {
        return Err(PlotError::InvalidData(format!(
            "no series to plot for `{stat_name}`"
        )));
    }

    let directories: Vec<&str> = series_set.iter().map(|s| s.directory.as_str()).collect();
    let styles = assign_styles(&directories, style_overrides);

    let (png_name, svg_name) = output_file_names(stat_name);
    let png_path = out_dir.join(png_name);
    let svg_path = out_dir.join(svg_name);

    let size = (settings.width, settings.height);
    {
        let root = BitMapBackend::new(&png_path, size).into_drawing_area();
        draw_chart(&root, series_set, &styles, settings)?;
    }
    {
        let root = SVGBackend::new(&svg_path, size).into_drawing_area();
        draw_chart(&root, series_set, &styles, settings)?;
    }

    Ok((png_path, svg_path))
}

fn draw_chart<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    series_set: &[DirectorySeries],
    styles: &[usize],
    settings: &PlotSettings,
) -> Result<()> {
    root.fill(&WHITE)
        .map_err(|e| PlotError::DrawingArea(e.to_string()))?;

    let x_max = series_set
        .iter()
        .flat_map(|s| s.series.cycles())
        .max()
        .unwrap_or(0) as f64;
    let x_max = x_max.max(1.0);

    let y_max = series_set
        .iter()
        .filter_map(|s| s.series.max_mean())
        .fold(f64::NEG_INFINITY, f64::max);
    let y_max = if y_max.is_finite() && y_max > settings.y_min {
        y_max * 1.05
    } else {
        settings.y_min + 1.0
    };

    let mut chart = ChartBuilder::on(root)
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(85)
        .build_cartesian_2d(0.0..x_max, settings.y_min..y_max)
        .map_err(|e| PlotError::ChartConfig(e.to_string()))?;

    chart
        .configure_mesh()
        .x_desc(settings.x_label.as_str())
        .y_desc(settings.y_label.as_str())
        .label_style(("sans-serif", 18))
        .draw()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    for (series, &style_idx) in series_set.iter().zip(styles) {
        let (color, line_style) = PALETTE[style_idx];
        let stroke = color.stroke_width(2);
        let points: Vec<(f64, f64)> = series
            .series
            .points
            .iter()
            .map(|p| (p.cycle as f64, p.mean))
            .collect();

        let annotation = match line_style {
            LineStyle::Solid => chart.draw_series(LineSeries::new(points, stroke)),
            LineStyle::Dashed => chart.draw_series(DashedLineSeries::new(points, 12, 6, stroke)),
            LineStyle::DashDot => chart.draw_series(DashedLineSeries::new(points, 8, 5, stroke)),
            LineStyle::Dotted => chart.draw_series(DashedLineSeries::new(points, 3, 5, stroke)),
        }
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

        annotation
            .label(series.directory.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], stroke));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .label_font(("sans-serif", 16))
        .draw()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    root.present()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    Ok(())
}
