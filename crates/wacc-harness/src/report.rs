//! Run summary artifacts.
//!
//! - [`render_summary`] — the human-readable tally printed at the end of a run
//! - [`SuiteReport`] — machine-readable totals and failures (`--report <file>`)

use crate::stats::{FailureKind, FailureRecord, RunStats};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Render the end-of-run summary.
///
/// ```text
/// Passed 1 / 2 testcases
/// 1. In /suite/valid/exit.wacc
/// Expected:
/// Return code: 255
/// Actual:
/// Return code: 1
/// ```
pub fn render_summary(stats: &RunStats) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Passed {} / {} testcases",
        stats.passed(),
        stats.total()
    );
    for (index, failure) in stats.failures().iter().enumerate() {
        let _ = writeln!(out, "{}. In {}", index + 1, failure.fixture.display());
        let _ = writeln!(out, "Expected:\n{}", failure.expected.trim());
        let _ = writeln!(out, "Actual:\n{}", failure.actual.trim());
    }
    out
}

/// One failure in the JSON report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FailureEntry {
    pub fixture: PathBuf,
    pub kind: FailureKind,
    pub expected: String,
    pub actual: String,
}

impl From<&FailureRecord> for FailureEntry {
    fn from(record: &FailureRecord) -> Self {
        Self {
            fixture: record.fixture.clone(),
            kind: record.kind,
            expected: record.expected.clone(),
            actual: record.actual.clone(),
        }
    }
}

/// Machine-readable results for a whole run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SuiteReport {
    pub run_at: DateTime<Utc>,
    pub root: PathBuf,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub pass_rate: f32,
    pub failures: Vec<FailureEntry>,
}

impl SuiteReport {
    pub fn new(root: &Path, stats: &RunStats) -> Self {
        Self {
            run_at: Utc::now(),
            root: root.to_path_buf(),
            total: stats.total(),
            passed: stats.passed(),
            failed: stats.failed(),
            pass_rate: stats.pass_rate(),
            failures: stats.failures().iter().map(FailureEntry::from).collect(),
        }
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
