//! Data models for the statistics plotter.
//!
//! This module contains the core data structures shared across the
//! application: statistic selectors, aggregated series, and diagnostics.

use serde::Serialize;
use std::fmt;

/// Column names every data file must declare alongside the statistics.
pub const CYCLE_COLUMN: &str = "cycle";
pub const RUN_NUM_COLUMN: &str = "runNum";

/// Selects which statistic to aggregate from a data row.
///
/// Most statistics are a single named column. A few are derived from
/// several columns combined through a reduction function, e.g. the total
/// dropped-packets count summed from two queue-drop counters.
#[derive(Clone)]
pub enum StatSelector {
    /// A single named column.
    Column(String),
    /// A statistic derived from several columns.
    Derived {
        /// Name used for output files, labels, and exclusion rules.
        name: String,
        /// Columns that must be present in the file header.
        columns: Vec<String>,
        /// Reduction over the selected column values of one row.
        combine: fn(&[f64]) -> f64,
    },
}

fn sum_columns(values: &[f64]) -> f64 {
    values.iter().sum()
}

impl StatSelector {
    /// Selector for a single named column.
    pub fn column(name: &str) -> Self {
        StatSelector::Column(name.to_string())
    }

    /// The built-in derived statistic: packets dropped on enqueue failure
    /// plus packets dropped after exhausting MAC retries.
    pub fn dropped_packets() -> Self {
        StatSelector::Derived {
            name: "droppedPackets".to_string(),
            columns: vec![
                "droppedDataFailedEnqueue".to_string(),
                "droppedDataMacRetries".to_string(),
            ],
            combine: sum_columns,
        }
    }

    /// Name of the statistic (output files are keyed by this).
    pub fn name(&self) -> &str {
        match self {
            StatSelector::Column(name) => name,
            StatSelector::Derived { name, .. } => name,
        }
    }

    /// Columns this selector reads from a data row.
    pub fn columns(&self) -> Vec<&str> {
        match self {
            StatSelector::Column(name) => vec![name.as_str()],
            StatSelector::Derived { columns, .. } => columns.iter().map(String::as_str).collect(),
        }
    }

    /// Compute the statistic value from the selected column values of a row.
    ///
    /// `values` must be in the same order as [`StatSelector::columns`].
    pub fn value(&self, values: &[f64]) -> f64 {
        match self {
            StatSelector::Column(_) => values[0],
            StatSelector::Derived { combine, .. } => combine(values),
        }
    }
}

impl fmt::Debug for StatSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatSelector::Column(name) => f.debug_tuple("Column").field(name).finish(),
            StatSelector::Derived { name, columns, .. } => f
                .debug_struct("Derived")
                .field("name", name)
                .field("columns", columns)
                .finish(),
        }
    }
}

impl fmt::Display for StatSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One aggregated point of a per-cycle series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    /// Simulation cycle (x axis).
    pub cycle: u32,
    /// Arithmetic mean of all samples at this cycle.
    pub mean: f64,
    /// Two-sided confidence-interval half-width around the mean.
    pub ci: f64,
    /// Number of samples behind this point.
    pub n: usize,
}

/// Per-cycle summary curve for one experiment directory, ordered by cycle.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AggregatedSeries {
    pub points: Vec<SeriesPoint>,
}

impl AggregatedSeries {
    /// Number of distinct cycles in the series.
    #[allow(dead_code)] // Utility accessor (points field is used directly)
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[allow(dead_code)] // Utility accessor
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Cycle values, in ascending order.
    pub fn cycles(&self) -> impl Iterator<Item = u32> + '_ {
        self.points.iter().map(|p| p.cycle)
    }

    /// Mean values, ordered by cycle.
    pub fn means(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.mean)
    }

    /// Largest mean in the series, if any point exists.
    pub fn max_mean(&self) -> Option<f64> {
        self.points
            .iter()
            .map(|p| p.mean)
            .fold(None, |acc, m| Some(acc.map_or(m, |a: f64| a.max(m))))
    }
}

/// A run flagged as likely truncated: its cycle sequence reset to 0 before
/// reaching `numCyclesPerRun - 1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IncompleteRun {
    /// The run whose data ended early.
    pub run_num: u32,
    /// File the truncated run was observed in.
    pub file: String,
}

impl fmt::Display for IncompleteRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "runNum({}) in {} is incomplete data",
            self.run_num, self.file
        )
    }
}

/// Aggregation result for one experiment directory.
#[derive(Debug, Clone, Serialize)]
pub struct DirectorySeries {
    /// Directory basename; doubles as the plot legend label.
    pub directory: String,
    /// The per-cycle summary curve.
    pub series: AggregatedSeries,
    /// Runs flagged as incomplete while parsing this directory's files.
    pub incomplete_runs: Vec<IncompleteRun>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_selector() {
        let sel = StatSelector::column("numTxCells");
        assert_eq!(sel.name(), "numTxCells");
        assert_eq!(sel.columns(), vec!["numTxCells"]);
        assert_eq!(sel.value(&[7.0]), 7.0);
    }

    #[test]
    fn test_dropped_packets_selector_sums_columns() {
        let sel = StatSelector::dropped_packets();
        assert_eq!(sel.name(), "droppedPackets");
        assert_eq!(
            sel.columns(),
            vec!["droppedDataFailedEnqueue", "droppedDataMacRetries"]
        );
        assert_eq!(sel.value(&[2.0, 3.0]), 5.0);
    }

    #[test]
    fn test_series_accessors() {
        let series = AggregatedSeries {
            points: vec![
                SeriesPoint { cycle: 0, mean: 6.0, ci: 1.0, n: 2 },
                SeriesPoint { cycle: 1, mean: 8.0, ci: 0.0, n: 1 },
            ],
        };
        assert_eq!(series.cycles().collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(series.means().collect::<Vec<_>>(), vec![6.0, 8.0]);
        assert_eq!(series.max_mean(), Some(8.0));
        assert_eq!(AggregatedSeries::default().max_mean(), None);
    }

    #[test]
    fn test_incomplete_run_display() {
        let run = IncompleteRun {
            run_num: 3,
            file: "output.dat".to_string(),
        };
        assert_eq!(run.to_string(), "runNum(3) in output.dat is incomplete data");
    }
}
