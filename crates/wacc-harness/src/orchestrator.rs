//! Suite orchestration: discover, filter, run, compare, tally.

use crate::annotation::Expectation;
use crate::compare::{CaseVerdict, OutputComparator};
use crate::error::{HarnessError, Result};
use crate::exclusion::{normalize_path, ExclusionSet};
use crate::pipeline::Pipeline;
use crate::stats::{FailureKind, FailureRecord, RunStats};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Extension that marks a fixture file.
pub const FIXTURE_EXTENSION: &str = "wacc";

/// Recursively list fixture files under `root`, sorted by path.
pub fn discover_fixtures(root: &Path) -> Result<Vec<PathBuf>> {
    let mut fixtures = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type().is_file()
            && path.extension().is_some_and(|ext| ext == FIXTURE_EXTENSION)
        {
            fixtures.push(normalize_path(path));
        }
    }
    Ok(fixtures)
}

/// Runs every fixture under a root through a pipeline, one at a time.
pub struct SuiteRunner<'a> {
    pipeline: &'a dyn Pipeline,
    exclusions: &'a ExclusionSet,
    comparator: OutputComparator,
}

impl<'a> SuiteRunner<'a> {
    pub fn new(
        pipeline: &'a dyn Pipeline,
        exclusions: &'a ExclusionSet,
        comparator: OutputComparator,
    ) -> Self {
        Self {
            pipeline,
            exclusions,
            comparator,
        }
    }

    /// Run the suite rooted at `root` and return its totals.
    ///
    /// Per-fixture problems are recorded as failures; only an unreadable
    /// fixture tree aborts the run. Build artifacts are swept once at the end.
    pub async fn run(&self, root: &Path) -> Result<RunStats> {
        let fixtures = discover_fixtures(root)?;
        info!(root = %root.display(), found = fixtures.len(), "Discovered fixtures");

        let mut stats = RunStats::new();
        for fixture in fixtures {
            if self.exclusions.is_excluded(&fixture) {
                debug!(fixture = %fixture.display(), "Skipping excluded fixture");
                continue;
            }

            info!(fixture = %fixture.display(), "Running fixture");
            match self.run_fixture(&fixture).await {
                CaseVerdict::Passed => stats.record_case(true),
                CaseVerdict::Failed(failure) => {
                    debug!(fixture = %fixture.display(), kind = ?failure.kind, "Fixture failed");
                    stats.record_case(false);
                    stats.record_failure(failure);
                }
            }
        }

        if let Err(e) = self.pipeline.sweep() {
            warn!(error = %e, "Failed to sweep build artifacts");
        }

        info!(
            passed = stats.passed(),
            total = stats.total(),
            "Suite run finished"
        );
        Ok(stats)
    }

    /// Parse, execute and compare a single fixture.
    pub async fn run_fixture(&self, fixture: &Path) -> CaseVerdict {
        let text = match std::fs::read_to_string(fixture) {
            Ok(text) => text,
            Err(e) => {
                return CaseVerdict::Failed(FailureRecord::new(
                    fixture,
                    FailureKind::FixtureUnreadable,
                    "readable UTF-8 fixture",
                    e.to_string(),
                ))
            }
        };

        let expectation = match Expectation::parse(&text) {
            Ok(expectation) => expectation,
            Err(HarnessError::MalformedExpectation { value, .. }) => {
                return CaseVerdict::Failed(FailureRecord::new(
                    fixture,
                    FailureKind::MalformedExpectation,
                    "Exit: <integer>",
                    format!("Exit: {}", value),
                ))
            }
            Err(e) => {
                return CaseVerdict::Failed(FailureRecord::new(
                    fixture,
                    FailureKind::MalformedExpectation,
                    "well-formed annotations",
                    e.to_string(),
                ))
            }
        };

        match self.pipeline.execute(fixture).await {
            Ok(outcome) => self.comparator.evaluate(fixture, &expectation, &outcome),
            Err(e) => {
                warn!(fixture = %fixture.display(), error = %e, "Toolchain could not be run");
                CaseVerdict::Failed(FailureRecord::new(
                    fixture,
                    FailureKind::ToolchainUnavailable,
                    "toolchain run",
                    e.to_string(),
                ))
            }
        }
    }
}
