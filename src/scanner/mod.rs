//! Experiment discovery.
//!
//! The immediate subdirectories of the data root are the experimental
//! conditions; each is expected to contain at least one data file with
//! the configured extension.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Configuration for experiment discovery.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Data-file extension to match (without dot).
    pub extension: String,
    /// Directory basenames to skip entirely.
    pub excludes: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extension: "dat".to_string(),
            excludes: Vec::new(),
        }
    }
}

impl From<&crate::config::InputConfig> for ScanConfig {
    fn from(config: &crate::config::InputConfig) -> Self {
        Self {
            extension: config.pattern.clone(),
            excludes: config.excludes.clone(),
        }
    }
}

/// One experimental condition: a named directory of data files.
#[derive(Debug, Clone)]
pub struct ExperimentDir {
    /// Directory basename; used as the legend label and style key.
    pub name: String,
    /// Full path to the directory.
    pub path: PathBuf,
    /// Matching data files, sorted by name.
    pub files: Vec<PathBuf>,
}

/// Scanner for experiment directories under a data root.
pub struct ExperimentScanner {
    config: ScanConfig,
    root: PathBuf,
}

impl ExperimentScanner {
    /// Create a new scanner rooted at `root`.
    pub fn new(root: PathBuf, config: ScanConfig) -> Self {
        Self { config, root }
    }

    /// Discover all experiment directories.
    ///
    /// Directories without a single matching data file are skipped with a
    /// diagnostic. The result is sorted by directory name so downstream
    /// output is deterministic.
    pub fn scan(&self) -> Result<Vec<ExperimentDir>> {
        if !self.root.exists() {
            bail!("data directory does not exist: {}", self.root.display());
        }
        if !self.root.is_dir() {
            bail!("data path is not a directory: {}", self.root.display());
        }

        let mut dirs = Vec::new();

        for entry in WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry
                .with_context(|| format!("failed to read data directory {}", self.root.display()))?;
            if !entry.file_type().is_dir() {
                continue;
            }

            let name = entry.file_name().to_string_lossy().to_string();
            if self.is_excluded(&name) {
                debug!("skipping excluded directory: {}", name);
                continue;
            }

            let files = self.data_files(entry.path())?;
            if files.is_empty() {
                warn!(
                    "directory `{}` has no .{} files, skipping",
                    name, self.config.extension
                );
                continue;
            }

            dirs.push(ExperimentDir {
                name,
                path: entry.path().to_path_buf(),
                files,
            });
        }

        Ok(dirs)
    }

    /// Matching data files directly inside one experiment directory.
    fn data_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry =
                entry.with_context(|| format!("failed to read directory {}", dir.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let matches = entry
                .path()
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e == self.config.extension);
            if matches {
                files.push(entry.path().to_path_buf());
            }
        }

        Ok(files)
    }

    /// Check if a directory name is excluded from discovery.
    fn is_excluded(&self, name: &str) -> bool {
        // Hidden directories
        if name.starts_with('.') {
            return true;
        }

        self.config.excludes.iter().any(|pattern| name == pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn scanner_for(root: &Path) -> ExperimentScanner {
        ExperimentScanner::new(root.to_path_buf(), ScanConfig::default())
    }

    #[test]
    fn test_discovers_subdirectories_with_data() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("tx-housekeeping")).unwrap();
        fs::write(temp.path().join("tx-housekeeping/output.dat"), "# a\n").unwrap();
        fs::create_dir(temp.path().join("no housekeeping")).unwrap();
        fs::write(temp.path().join("no housekeeping/output.dat"), "# a\n").unwrap();

        let dirs = scanner_for(temp.path()).scan().unwrap();
        let names: Vec<_> = dirs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["no housekeeping", "tx-housekeeping"]);
    }

    #[test]
    fn test_skips_directories_without_data_files() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("empty")).unwrap();
        fs::create_dir(temp.path().join("full")).unwrap();
        fs::write(temp.path().join("full/output.dat"), "# a\n").unwrap();
        fs::write(temp.path().join("full/notes.txt"), "ignored").unwrap();

        let dirs = scanner_for(temp.path()).scan().unwrap();
        assert_eq!(dirs.len(), 1);
        assert_eq!(dirs[0].name, "full");
        assert_eq!(dirs[0].files.len(), 1);
    }

    #[test]
    fn test_skips_hidden_and_excluded() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join(".cache")).unwrap();
        fs::write(temp.path().join(".cache/x.dat"), "# a\n").unwrap();
        fs::create_dir(temp.path().join("old-results")).unwrap();
        fs::write(temp.path().join("old-results/x.dat"), "# a\n").unwrap();
        fs::create_dir(temp.path().join("keep")).unwrap();
        fs::write(temp.path().join("keep/x.dat"), "# a\n").unwrap();

        let config = ScanConfig {
            excludes: vec!["old-results".to_string()],
            ..ScanConfig::default()
        };
        let dirs = ExperimentScanner::new(temp.path().to_path_buf(), config)
            .scan()
            .unwrap();
        assert_eq!(dirs.len(), 1);
        assert_eq!(dirs[0].name, "keep");
    }

    #[test]
    fn test_files_sorted_by_name() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("cond")).unwrap();
        fs::write(temp.path().join("cond/b.dat"), "# a\n").unwrap();
        fs::write(temp.path().join("cond/a.dat"), "# a\n").unwrap();

        let dirs = scanner_for(temp.path()).scan().unwrap();
        let names: Vec<_> = dirs[0]
            .files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.dat", "b.dat"]);
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope");
        assert!(scanner_for(&missing).scan().is_err());
    }

    #[test]
    fn test_custom_extension() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("cond")).unwrap();
        fs::write(temp.path().join("cond/stats.txt"), "# a\n").unwrap();

        let config = ScanConfig {
            extension: "txt".to_string(),
            ..ScanConfig::default()
        };
        let dirs = ExperimentScanner::new(temp.path().to_path_buf(), config)
            .scan()
            .unwrap();
        assert_eq!(dirs[0].files.len(), 1);
    }
}
