//! Sidecar series dump generation.
//!
//! For reproducibility the plotted x/y series of each chart can be written
//! next to the image files, either as plain text or as JSON.

use crate::cli::OutputFormat;
use crate::models::DirectorySeries;
use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// JSON shape of a series dump.
#[derive(Serialize)]
struct SeriesDump<'a> {
    statistic: &'a str,
    generated: String,
    x_label: &'a str,
    y_label: &'a str,
    series: &'a [DirectorySeries],
}

/// File name of the dump for a statistic.
pub fn dump_file_name(stat_name: &str, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format!("output_{stat_name}_cycle.dat"),
        OutputFormat::Json => format!("output_{stat_name}_cycle.json"),
    }
}

/// Generate a plain-text dump of the plotted series.
///
/// Per directory: the directory name, the x row, the y row, and the
/// confidence-interval half-widths.
pub fn generate_text_dump(
    stat_name: &str,
    x_label: &str,
    y_label: &str,
    series_set: &[DirectorySeries],
) -> String {
    let mut output = String::new();

    output.push_str(&format!("# cycleplot series dump: {stat_name}\n"));
    output.push_str(&format!("# generated: {}\n", Utc::now().to_rfc3339()));

    for dir_series in series_set {
        output.push_str(&dir_series.directory);
        output.push('\n');

        output.push_str(x_label);
        for cycle in dir_series.series.cycles() {
            output.push_str(&format!(" {cycle}"));
        }
        output.push('\n');

        output.push_str(y_label);
        for mean in dir_series.series.means() {
            output.push_str(&format!(" {mean}"));
        }
        output.push('\n');

        output.push_str("conf. interval");
        for point in &dir_series.series.points {
            output.push_str(&format!(" {}", point.ci));
        }
        output.push('\n');
    }

    output
}

/// Generate a JSON dump of the plotted series.
pub fn generate_json_dump(
    stat_name: &str,
    x_label: &str,
    y_label: &str,
    series_set: &[DirectorySeries],
) -> Result<String> {
    let dump = SeriesDump {
        statistic: stat_name,
        generated: Utc::now().to_rfc3339(),
        x_label,
        y_label,
        series: series_set,
    };
    serde_json::to_string_pretty(&dump).map_err(Into::into)
}

/// Write the series dump for one statistic, returning the file path.
pub fn write_dump(
    series_set: &[DirectorySeries],
    stat_name: &str,
    x_label: &str,
    y_label: &str,
    format: OutputFormat,
    out_dir: &Path,
) -> Result<PathBuf> {
    let path = out_dir.join(dump_file_name(stat_name, format));

    let content = match format {
        OutputFormat::Text => generate_text_dump(stat_name, x_label, y_label, series_set),
        OutputFormat::Json => generate_json_dump(stat_name, x_label, y_label, series_set)?,
    };

    std::fs::write(&path, content)
        .with_context(|| format!("Failed to write series dump to {}", path.display()))?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AggregatedSeries, SeriesPoint};

    fn test_series() -> Vec<DirectorySeries> {
        vec![DirectorySeries {
            directory: "tx-housekeeping".to_string(),
            series: AggregatedSeries {
                points: vec![
                    SeriesPoint { cycle: 0, mean: 6.0, ci: 1.5, n: 2 },
                    SeriesPoint { cycle: 1, mean: 6.5, ci: 0.0, n: 1 },
                ],
            },
            incomplete_runs: Vec::new(),
        }]
    }

    #[test]
    fn test_dump_file_name() {
        assert_eq!(
            dump_file_name("numTxCells", OutputFormat::Text),
            "output_numTxCells_cycle.dat"
        );
        assert_eq!(
            dump_file_name("numTxCells", OutputFormat::Json),
            "output_numTxCells_cycle.json"
        );
    }

    #[test]
    fn test_generate_text_dump() {
        let dump = generate_text_dump("numTxCells", "slotframe cycles", "Tx cells", &test_series());

        assert!(dump.contains("# cycleplot series dump: numTxCells"));
        assert!(dump.contains("tx-housekeeping\n"));
        assert!(dump.contains("slotframe cycles 0 1\n"));
        assert!(dump.contains("Tx cells 6 6.5\n"));
        assert!(dump.contains("conf. interval 1.5 0\n"));
    }

    #[test]
    fn test_generate_json_dump() {
        let json =
            generate_json_dump("numTxCells", "slotframe cycles", "Tx cells", &test_series())
                .unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["statistic"], "numTxCells");
        assert_eq!(value["series"][0]["directory"], "tx-housekeeping");
        assert_eq!(value["series"][0]["series"]["points"][0]["mean"], 6.0);
    }

    #[test]
    fn test_write_dump() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = write_dump(
            &test_series(),
            "numTxCells",
            "slotframe cycles",
            "Tx cells",
            OutputFormat::Text,
            temp.path(),
        )
        .unwrap();

        assert!(path.exists());
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("tx-housekeeping"));
    }
}
