//! Data-file parsing.
//!
//! Simulation statistics files mix three kinds of lines: `##`-prefixed
//! metadata (`key = value` pairs), a single `# `-prefixed column-header
//! line, and whitespace-separated numeric data rows whose arity matches
//! the header. Everything is captured in one pass over the file.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

/// Metadata key declaring how many cycles one run spans.
const NUM_CYCLES_KEY: &str = "numCyclesPerRun";

/// Errors that can occur while parsing a data file.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Failed to read data file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("{file}:{line}: data row has {found} fields, expected {expected}")]
    ArityMismatch {
        file: String,
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("{file}:{line}: invalid numeric field `{field}`")]
    InvalidNumber {
        file: String,
        line: usize,
        field: String,
    },

    #[error("{file}:{line}: data row before column header")]
    RowBeforeHeader { file: String, line: usize },
}

type Result<T> = core::result::Result<T, ParseError>;

/// How to treat malformed data rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseMode {
    /// Any malformed row fails the parse.
    #[default]
    Strict,
    /// Malformed rows are skipped with a diagnostic.
    Lenient,
}

/// Fully parsed contents of one data file.
#[derive(Debug, Clone, Default)]
pub struct ParsedFile {
    /// `numCyclesPerRun` from the metadata lines, if declared.
    ///
    /// The value never carries over from another file; absence means the
    /// run-completeness check cannot be applied to this file.
    pub num_cycles_per_run: Option<u32>,
    /// Column names from the header line, in declaration order.
    pub columns: Vec<String>,
    /// Data rows; each row has exactly `columns.len()` fields.
    pub rows: Vec<Vec<f64>>,
    /// Rows dropped in lenient mode.
    pub skipped_rows: usize,
}

impl ParsedFile {
    /// Index of a named column, if declared.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

/// Parse a data file from disk.
pub fn parse_file(path: &Path, mode: ParseMode) -> Result<ParsedFile> {
    let file = File::open(path)?;
    parse_reader(BufReader::new(file), &path.display().to_string(), mode)
}

/// Parse a data file from any buffered reader.
///
/// `name` is only used in diagnostics and error messages.
pub fn parse_reader<R: BufRead>(reader: R, name: &str, mode: ParseMode) -> Result<ParsedFile> {
    let mut parsed = ParsedFile::default();

    for (idx, line) in reader.lines().enumerate() {
        let line_num = idx + 1;
        let line = line?;
        let trimmed = line.trim();

        if trimmed.is_empty() {
            continue;
        }

        if let Some(meta) = trimmed.strip_prefix("##") {
            if let Some(value) = metadata_value(meta, NUM_CYCLES_KEY) {
                parsed.num_cycles_per_run = Some(value);
            }
            continue;
        }

        if let Some(header) = trimmed.strip_prefix("# ") {
            if parsed.columns.is_empty() {
                parsed.columns = header.split_whitespace().map(String::from).collect();
            }
            continue;
        }

        if trimmed.starts_with('#') {
            continue;
        }

        // Data row.
        if parsed.columns.is_empty() {
            match mode {
                ParseMode::Strict => {
                    return Err(ParseError::RowBeforeHeader {
                        file: name.to_string(),
                        line: line_num,
                    });
                }
                ParseMode::Lenient => {
                    warn!("{}:{}: skipping data row before column header", name, line_num);
                    parsed.skipped_rows += 1;
                    continue;
                }
            }
        }

        match parse_row(trimmed, parsed.columns.len(), name, line_num) {
            Ok(row) => parsed.rows.push(row),
            Err(err) => match mode {
                ParseMode::Strict => return Err(err),
                ParseMode::Lenient => {
                    warn!("skipping malformed row: {}", err);
                    parsed.skipped_rows += 1;
                }
            },
        }
    }

    debug!(
        "parsed {}: {} columns, {} rows, numCyclesPerRun {:?}",
        name,
        parsed.columns.len(),
        parsed.rows.len(),
        parsed.num_cycles_per_run
    );

    Ok(parsed)
}

/// Scan a metadata line for a `<key> = <value>` token window.
///
/// Whitespace is required around the `=`, matching the format the
/// simulator emits (`## numCyclesPerRun = 200`).
fn metadata_value(meta_line: &str, key: &str) -> Option<u32> {
    let tokens: Vec<&str> = meta_line.split_whitespace().collect();
    for window in tokens.windows(3) {
        if window[0] == key && window[1] == "=" {
            if let Ok(value) = window[2].parse::<f64>() {
                if value.is_finite() && value >= 0.0 {
                    return Some(value as u32);
                }
            }
        }
    }
    None
}

fn parse_row(line: &str, expected: usize, file: &str, line_num: usize) -> Result<Vec<f64>> {
    let fields: Vec<&str> = line.split_whitespace().collect();

    if fields.len() != expected {
        return Err(ParseError::ArityMismatch {
            file: file.to_string(),
            line: line_num,
            expected,
            found: fields.len(),
        });
    }

    fields
        .iter()
        .map(|field| {
            field.parse::<f64>().map_err(|_| ParseError::InvalidNumber {
                file: file.to_string(),
                line: line_num,
                field: field.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const SAMPLE: &str = "\
## numCyclesPerRun = 4
## seed = 42
# cycle runNum numTxCells
0 0 5
0 1 7
1 0 6
";

    fn parse_str(input: &str, mode: ParseMode) -> Result<ParsedFile> {
        parse_reader(Cursor::new(input), "test.dat", mode)
    }

    #[test]
    fn test_parse_well_formed_file() {
        let parsed = parse_str(SAMPLE, ParseMode::Strict).unwrap();
        assert_eq!(parsed.num_cycles_per_run, Some(4));
        assert_eq!(parsed.columns, vec!["cycle", "runNum", "numTxCells"]);
        assert_eq!(parsed.rows.len(), 3);
        assert_eq!(parsed.rows[0], vec![0.0, 0.0, 5.0]);
        assert_eq!(parsed.skipped_rows, 0);
    }

    #[test]
    fn test_column_index_lookup() {
        let parsed = parse_str(SAMPLE, ParseMode::Strict).unwrap();
        assert_eq!(parsed.column_index("cycle"), Some(0));
        assert_eq!(parsed.column_index("numTxCells"), Some(2));
        assert_eq!(parsed.column_index("nope"), None);
    }

    #[test]
    fn test_later_metadata_overrides_earlier() {
        let input = "## numCyclesPerRun = 4\n## numCyclesPerRun = 8\n# cycle runNum a\n0 0 1\n";
        let parsed = parse_str(input, ParseMode::Strict).unwrap();
        assert_eq!(parsed.num_cycles_per_run, Some(8));
    }

    #[test]
    fn test_missing_metadata_is_none() {
        let input = "# cycle runNum a\n0 0 1\n";
        let parsed = parse_str(input, ParseMode::Strict).unwrap();
        assert_eq!(parsed.num_cycles_per_run, None);
    }

    #[test]
    fn test_comments_after_header_ignored() {
        let input = "# cycle runNum a\n0 0 1\n# another comment\n#also this\n1 0 2\n";
        let parsed = parse_str(input, ParseMode::Strict).unwrap();
        assert_eq!(parsed.columns, vec!["cycle", "runNum", "a"]);
        assert_eq!(parsed.rows.len(), 2);
    }

    #[test]
    fn test_blank_lines_ignored() {
        let input = "\n# cycle runNum a\n\n0 0 1\n\n";
        let parsed = parse_str(input, ParseMode::Strict).unwrap();
        assert_eq!(parsed.rows.len(), 1);
    }

    #[test]
    fn test_arity_mismatch_strict() {
        let input = "# cycle runNum a\n0 0\n";
        let err = parse_str(input, ParseMode::Strict).unwrap_err();
        assert!(matches!(
            err,
            ParseError::ArityMismatch { expected: 3, found: 2, .. }
        ));
    }

    #[test]
    fn test_arity_mismatch_lenient_skips() {
        let input = "# cycle runNum a\n0 0\n0 0 1\n";
        let parsed = parse_str(input, ParseMode::Lenient).unwrap();
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.skipped_rows, 1);
    }

    #[test]
    fn test_invalid_number_strict() {
        let input = "# cycle runNum a\n0 0 abc\n";
        let err = parse_str(input, ParseMode::Strict).unwrap_err();
        assert!(matches!(err, ParseError::InvalidNumber { .. }));
    }

    #[test]
    fn test_row_before_header() {
        let input = "0 0 1\n# cycle runNum a\n";
        let err = parse_str(input, ParseMode::Strict).unwrap_err();
        assert!(matches!(err, ParseError::RowBeforeHeader { line: 1, .. }));

        let parsed = parse_str(input, ParseMode::Lenient).unwrap();
        assert!(parsed.rows.is_empty());
        assert_eq!(parsed.skipped_rows, 1);
    }

    #[test]
    fn test_empty_file() {
        let parsed = parse_str("", ParseMode::Strict).unwrap();
        assert!(parsed.columns.is_empty());
        assert!(parsed.rows.is_empty());
    }

    #[test]
    fn test_metadata_requires_spaced_equals() {
        // The simulator always pads the `=`; a glued pair is not metadata.
        let input = "## numCyclesPerRun=4\n# cycle runNum a\n0 0 1\n";
        let parsed = parse_str(input, ParseMode::Strict).unwrap();
        assert_eq!(parsed.num_cycles_per_run, None);
    }

    #[test]
    fn test_float_rows_parse() {
        let input = "# cycle runNum a\n0 0 1.5\n";
        let parsed = parse_str(input, ParseMode::Strict).unwrap();
        assert_eq!(parsed.rows[0][2], 1.5);
    }
}
