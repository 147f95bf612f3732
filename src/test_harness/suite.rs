//! YAML-described parse case suites.
//!
//! A suite file is a YAML list of cases:
//!
//! ```yaml
//! - name: "struct without description"
//!   document: |
//!     structs:
//!       foo:
//!         fields:
//!           a: int
//!   expect_error: missing_field   # omit for cases that must parse cleanly
//!   allow_multiple: false         # optional, defaults to false
//!   skip: false                   # optional, defaults to false
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use walkdir::WalkDir;

use crate::parser::IdlParser;
use crate::test_harness::{HarnessFailure, ParseHarness};

/// A single case loaded from a suite file.
#[derive(Debug, Clone, Deserialize)]
pub struct SuiteCase {
    pub name: String,
    pub document: String,
    pub expect_error: Option<String>,
    #[serde(default)]
    pub allow_multiple: bool,
    #[serde(default)]
    pub skip: bool,
}

#[derive(Debug, Error)]
pub enum SuiteError {
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse suite {}: {source}", .path.display())]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseOutcome {
    Passed,
    Failed(HarnessFailure),
    Skipped,
}

/// Totals for a suite run.
#[derive(Debug, Default)]
pub struct SuiteReport {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    /// `file::case name` and the failure, in run order.
    pub failures: Vec<(String, HarnessFailure)>,
}

impl SuiteReport {
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// Discovers all YAML files recursively under the given root directory, in path order.
pub fn discover_yaml_files<P: AsRef<Path>>(root: P) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.file_type().is_file()
                && e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
        })
        .map(|e| e.path().to_path_buf())
        .collect();
    files.sort();
    files
}

/// Load the cases of one suite file.
pub fn load_suite(path: &Path) -> Result<Vec<SuiteCase>, SuiteError> {
    let content = fs::read_to_string(path).map_err(|source| SuiteError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&content).map_err(|source| SuiteError::Yaml {
        path: path.to_path_buf(),
        source,
    })
}

/// Runs one case through the harness without panicking.
pub fn run_case<P: IdlParser>(harness: &ParseHarness<P>, case: &SuiteCase) -> CaseOutcome {
    if case.skip {
        return CaseOutcome::Skipped;
    }
    let result = match case.expect_error.as_deref() {
        Some(error_id) => harness
            .check_parse_fails(&case.document, error_id, case.allow_multiple)
            .map(|_| ()),
        None => harness.check_parse_succeeds(&case.document).map(|_| ()),
    };
    match result {
        Ok(()) => CaseOutcome::Passed,
        Err(failure) => CaseOutcome::Failed(failure),
    }
}

/// Runs every suite file under `root`.
pub fn run_suites<P: IdlParser>(
    harness: &ParseHarness<P>,
    root: &Path,
) -> Result<SuiteReport, SuiteError> {
    let mut report = SuiteReport::default();
    for path in discover_yaml_files(root) {
        let file = path.display().to_string();
        for case in load_suite(&path)? {
            match run_case(harness, &case) {
                CaseOutcome::Passed => report.passed += 1,
                CaseOutcome::Skipped => {
                    eprintln!("skipped {}::{}", file, case.name);
                    report.skipped += 1;
                }
                CaseOutcome::Failed(failure) => {
                    report.failed += 1;
                    report.failures.push((format!("{}::{}", file, case.name), failure));
                }
            }
        }
    }
    Ok(report)
}
