//! Per-cycle aggregation of simulation statistics.
//!
//! This module turns the data files of each experiment directory into one
//! summary curve per directory: samples are grouped by simulation cycle and
//! reduced to an arithmetic mean with a Student-t confidence interval.

use crate::analysis::stats;
use crate::models::{
    AggregatedSeries, DirectorySeries, IncompleteRun, SeriesPoint, StatSelector, CYCLE_COLUMN,
    RUN_NUM_COLUMN,
};
use crate::parser::{self, ParseError, ParseMode, ParsedFile};
use crate::scanner::ExperimentDir;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that abort a statistic's aggregation.
#[derive(Error, Debug)]
pub enum AggregateError {
    #[error("column `{column}` not found in {file}")]
    ColumnNotFound { column: String, file: String },

    #[error(transparent)]
    Parse(#[from] ParseError),
}

type Result<T> = core::result::Result<T, AggregateError>;

/// Excludes one directory from one statistic's aggregation.
///
/// Some conditions make a statistic meaningless by construction, e.g. the
/// no-interference baseline never produces collisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionRule {
    /// Statistic name the rule applies to.
    pub statistic: String,
    /// Directory basename to leave out.
    pub directory: String,
}

/// Built-in exclusions mirroring the simulation setup: collision metrics
/// are undefined for the interference-free baseline.
pub fn default_exclusions() -> Vec<ExclusionRule> {
    ["probableCollisions", "effectiveCollidedTxs"]
        .into_iter()
        .map(|statistic| ExclusionRule {
            statistic: statistic.to_string(),
            directory: "no interference".to_string(),
        })
        .collect()
}

/// Options controlling aggregation.
#[derive(Debug, Clone)]
pub struct AggregateOptions {
    /// Confidence level for the interval half-width, in (0, 1).
    pub confidence: f64,
    /// Strict or lenient row parsing.
    pub mode: ParseMode,
    /// Directory exclusions keyed by statistic name.
    pub exclusions: Vec<ExclusionRule>,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            confidence: 0.95,
            mode: ParseMode::Strict,
            exclusions: default_exclusions(),
        }
    }
}

/// Aggregates data files into per-cycle summary curves.
pub struct StatsAggregator {
    options: AggregateOptions,
}

impl StatsAggregator {
    pub fn new(options: AggregateOptions) -> Self {
        Self { options }
    }

    /// Whether a directory is excluded for the given statistic.
    pub fn is_excluded(&self, statistic: &str, directory: &str) -> bool {
        self.options
            .exclusions
            .iter()
            .any(|rule| rule.statistic == statistic && rule.directory == directory)
    }

    /// Aggregate the selected statistic across all experiment directories.
    ///
    /// Returns one series per non-excluded directory, in input order. Any
    /// column-lookup or (strict-mode) parse failure aborts the whole
    /// statistic so no partial output is produced for it.
    pub fn aggregate(
        &self,
        dirs: &[ExperimentDir],
        selector: &StatSelector,
    ) -> Result<Vec<DirectorySeries>> {
        let mut results = Vec::new();

        for dir in dirs {
            if self.is_excluded(selector.name(), &dir.name) {
                debug!(
                    "excluding directory `{}` for statistic `{}`",
                    dir.name,
                    selector.name()
                );
                continue;
            }

            let series = self.aggregate_dir(dir, selector)?;
            for run in &series.incomplete_runs {
                warn!("{}", run);
            }
            results.push(series);
        }

        Ok(results)
    }

    fn aggregate_dir(
        &self,
        dir: &ExperimentDir,
        selector: &StatSelector,
    ) -> Result<DirectorySeries> {
        let mut buckets: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
        let mut incomplete_runs = Vec::new();

        for file in &dir.files {
            let parsed = parser::parse_file(file, self.options.mode)?;
            let file_name = file.display().to_string();

            if parsed.skipped_rows > 0 {
                warn!(
                    "{}: skipped {} malformed rows",
                    file_name, parsed.skipped_rows
                );
            }

            if parsed.columns.is_empty() && parsed.rows.is_empty() {
                debug!("{} contains no data, skipping", file_name);
                continue;
            }

            self.accumulate_file(
                &parsed,
                &file_name,
                selector,
                &mut buckets,
                &mut incomplete_runs,
            )?;
        }

        let points = buckets
            .into_iter()
            .map(|(cycle, values)| {
                let (mean, ci) = stats::summarize(&values, self.options.confidence);
                SeriesPoint { cycle, mean, ci, n: values.len() }
            })
            .collect();

        Ok(DirectorySeries {
            directory: dir.name.clone(),
            series: AggregatedSeries { points },
            incomplete_runs,
        })
    }

    fn accumulate_file(
        &self,
        parsed: &ParsedFile,
        file_name: &str,
        selector: &StatSelector,
        buckets: &mut BTreeMap<u32, Vec<f64>>,
        incomplete_runs: &mut Vec<IncompleteRun>,
    ) -> Result<()> {
        let resolve = |column: &str| {
            parsed
                .column_index(column)
                .ok_or_else(|| AggregateError::ColumnNotFound {
                    column: column.to_string(),
                    file: file_name.to_string(),
                })
        };

        let stat_indices: Vec<usize> = selector
            .columns()
            .into_iter()
            .map(resolve)
            .collect::<Result<_>>()?;
        let cycle_idx = resolve(CYCLE_COLUMN)?;
        let run_idx = resolve(RUN_NUM_COLUMN)?;

        // Run-boundary tracking is per file; a cycle reset to 0 before
        // reaching numCyclesPerRun - 1 flags the previous run as truncated.
        let mut previous_cycle: Option<u32> = None;
        let mut stat_values = Vec::with_capacity(stat_indices.len());

        for row in &parsed.rows {
            let cycle = row[cycle_idx] as u32;
            let run_num = row[run_idx] as u32;

            stat_values.clear();
            stat_values.extend(stat_indices.iter().map(|&i| row[i]));
            let value = selector.value(&stat_values);

            buckets.entry(cycle).or_default().push(value);

            if cycle == 0 {
                if let (Some(prev), Some(cycles_per_run)) =
                    (previous_cycle, parsed.num_cycles_per_run)
                {
                    if prev != cycles_per_run.saturating_sub(1) {
                        incomplete_runs.push(IncompleteRun {
                            run_num: run_num.saturating_sub(1),
                            file: file_name.to_string(),
                        });
                    }
                }
            }
            previous_cycle = Some(cycle);
        }

        Ok(())
    }
}
