//! Per-run pass/fail accounting.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Why a fixture failed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    CompileTimeout,
    AssembleTimeout,
    AssembleFailure,
    ExecutionTimeout,
    OutputDecodeFailure,
    OutputMismatch,
    ExitCodeMismatch,
    MalformedExpectation,
    FixtureUnreadable,
    ToolchainUnavailable,
}

/// One failed fixture.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FailureRecord {
    pub fixture: PathBuf,
    pub kind: FailureKind,
    pub expected: String,
    pub actual: String,
}

impl FailureRecord {
    pub fn new(
        fixture: impl Into<PathBuf>,
        kind: FailureKind,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self {
            fixture: fixture.into(),
            kind,
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

/// Running totals for a suite run.
///
/// `passed` never exceeds `total`: both only move through [`RunStats::record_case`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunStats {
    total: usize,
    passed: usize,
    failures: Vec<FailureRecord>,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one visited fixture.
    pub fn record_case(&mut self, passed: bool) {
        self.total += 1;
        if passed {
            self.passed += 1;
        }
    }

    pub fn record_failure(&mut self, failure: FailureRecord) {
        self.failures.push(failure);
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn passed(&self) -> usize {
        self.passed
    }

    pub fn failed(&self) -> usize {
        self.total - self.passed
    }

    /// Fraction of cases passed; 0.0 for an empty run.
    pub fn pass_rate(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            self.passed as f32 / self.total as f32
        }
    }

    /// Failures in the order their fixtures were processed.
    pub fn failures(&self) -> &[FailureRecord] {
        &self.failures
    }

    /// Final totals and failures.
    pub fn summary(&self) -> (usize, usize, &[FailureRecord]) {
        (self.total, self.passed, &self.failures)
    }
}
