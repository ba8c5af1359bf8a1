//! Expected-vs-actual evaluation for one fixture.

use crate::annotation::Expectation;
use crate::pipeline::ExecutionOutcome;
use crate::stats::{FailureKind, FailureRecord};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Expected output must be exactly empty.
pub const EMPTY_WILDCARD: &str = "#empty#";

/// Stands in for one non-deterministic token such as a printed address.
pub const ADDRS_WILDCARD: &str = "#addrs#";

/// Stands in for a runtime error message.
pub const RUNTIME_ERROR_WILDCARD: &str = "#runtime_error#";

/// How `#addrs#` and `#runtime_error#` are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WildcardMode {
    /// Trimmed expected and actual output must be identical; positional
    /// wildcards only match themselves.
    #[default]
    Strict,

    /// Whitespace-separated tokens are compared position by position and the
    /// positional wildcards match any actual token.
    Tolerant,
}

/// Outcome of comparing one fixture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseVerdict {
    Passed,
    Failed(FailureRecord),
}

impl CaseVerdict {
    pub fn passed(&self) -> bool {
        matches!(self, CaseVerdict::Passed)
    }
}

/// Decides whether an execution satisfies a fixture's expectation.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputComparator {
    mode: WildcardMode,
}

impl OutputComparator {
    pub fn new(mode: WildcardMode) -> Self {
        Self { mode }
    }

    /// Evaluate the output check (when `Output:` was declared), then the
    /// exit-code check. A failed output check skips the exit-code check.
    pub fn evaluate(
        &self,
        fixture: &Path,
        expectation: &Expectation,
        outcome: &ExecutionOutcome,
    ) -> CaseVerdict {
        let actual_output = outcome.stdout_text();

        if let Some(expected_output) = &expectation.output {
            if !self.output_matches(expected_output, actual_output) {
                return CaseVerdict::Failed(FailureRecord::new(
                    fixture,
                    outcome.failure_kind().unwrap_or(FailureKind::OutputMismatch),
                    expected_output.as_str(),
                    actual_output,
                ));
            }
        }

        let expected_exit = expectation.expected_exit_code();
        let actual_exit = outcome.exit_code();
        if expected_exit != actual_exit {
            return CaseVerdict::Failed(FailureRecord::new(
                fixture,
                outcome.failure_kind().unwrap_or(FailureKind::ExitCodeMismatch),
                format!("Return code: {}", expected_exit),
                format!("Return code: {}", actual_exit),
            ));
        }

        CaseVerdict::Passed
    }

    /// Whether actual stdout satisfies the expected output text.
    pub fn output_matches(&self, expected: &str, actual: &str) -> bool {
        if expected.contains(EMPTY_WILDCARD) {
            return actual.is_empty();
        }

        match self.mode {
            WildcardMode::Strict => expected.trim() == actual.trim(),
            WildcardMode::Tolerant => tokens_match(expected, actual),
        }
    }
}

fn is_positional_wildcard(token: &str) -> bool {
    token == ADDRS_WILDCARD || token == RUNTIME_ERROR_WILDCARD
}

/// Token-wise comparison. Counts must agree unless the expected text ends in
/// `#runtime_error#`, which may absorb any trailing tokens.
fn tokens_match(expected: &str, actual: &str) -> bool {
    let expected: Vec<&str> = expected.split_whitespace().collect();
    let actual: Vec<&str> = actual.split_whitespace().collect();

    let open_tail = expected.last() == Some(&RUNTIME_ERROR_WILDCARD);
    let counts_ok = if open_tail {
        actual.len() >= expected.len()
    } else {
        actual.len() == expected.len()
    };

    counts_ok
        && expected
            .iter()
            .zip(&actual)
            .all(|(e, a)| e == a || is_positional_wildcard(e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completed(stdout: &str, exit_code: i32) -> ExecutionOutcome {
        ExecutionOutcome::Completed {
            stdout: stdout.to_string(),
            exit_code,
        }
    }

    fn expect(output: Option<&str>, exit_code: Option<i32>) -> Expectation {
        Expectation {
            output: output.map(str::to_string),
            exit_code,
        }
    }

    fn fixture() -> &'static Path {
        Path::new("/suite/valid/case.wacc")
    }

    #[test]
    fn test_output_and_exit_pass() {
        let verdict = OutputComparator::default().evaluate(
            fixture(),
            &expect(Some("3\n"), Some(0)),
            &completed("3\n", 0),
        );
        assert!(verdict.passed());
    }

    #[test]
    fn test_empty_wildcard_rejects_stray_output() {
        let verdict = OutputComparator::default().evaluate(
            fixture(),
            &expect(Some("#empty#\n"), Some(3)),
            &completed("stray", 0),
        );
        // Exit check is skipped: the failure is the output one.
        match verdict {
            CaseVerdict::Failed(f) => {
                assert_eq!(f.kind, FailureKind::OutputMismatch);
                assert_eq!(f.expected, "#empty#\n");
                assert_eq!(f.actual, "stray");
            }
            CaseVerdict::Passed => panic!("expected failure"),
        }
    }

    #[test]
    fn test_empty_wildcard_is_a_length_check() {
        let cmp = OutputComparator::default();
        assert!(cmp.output_matches("#empty#\n", ""));
        assert!(!cmp.output_matches("#empty#\n", "\n"));
    }

    #[test]
    fn test_exit_only_mismatch_reports_return_codes() {
        let verdict = OutputComparator::default().evaluate(
            fixture(),
            &expect(None, Some(255)),
            &completed("ignored", 1),
        );
        assert_eq!(
            verdict,
            CaseVerdict::Failed(FailureRecord::new(
                fixture(),
                FailureKind::ExitCodeMismatch,
                "Return code: 255",
                "Return code: 1",
            ))
        );
    }

    #[test]
    fn test_matching_output_still_needs_matching_exit() {
        let verdict = OutputComparator::default().evaluate(
            fixture(),
            &expect(Some("3\n"), None),
            &completed("3\n", 1),
        );
        assert_eq!(
            verdict,
            CaseVerdict::Failed(FailureRecord::new(
                fixture(),
                FailureKind::ExitCodeMismatch,
                "Return code: 0",
                "Return code: 1",
            ))
        );
    }

    #[test]
    fn test_missing_exit_defaults_to_zero() {
        let cmp = OutputComparator::default();
        assert!(cmp
            .evaluate(fixture(), &Expectation::default(), &completed("", 0))
            .passed());
        assert!(!cmp
            .evaluate(fixture(), &Expectation::default(), &completed("", 2))
            .passed());
    }

    #[test]
    fn test_timeout_fails_exit_check_with_sentinel() {
        let verdict = OutputComparator::default().evaluate(
            fixture(),
            &expect(None, Some(0)),
            &ExecutionOutcome::ExecutionTimeout,
        );
        match verdict {
            CaseVerdict::Failed(f) => {
                assert_eq!(f.kind, FailureKind::ExecutionTimeout);
                assert_eq!(f.expected, "Return code: 0");
                assert_eq!(f.actual, "Return code: -1");
            }
            CaseVerdict::Passed => panic!("expected failure"),
        }
    }

    #[test]
    fn test_decode_failure_reports_sentinel_output() {
        let verdict = OutputComparator::default().evaluate(
            fixture(),
            &expect(Some("hi\n"), None),
            &ExecutionOutcome::DecodeFailure,
        );
        match verdict {
            CaseVerdict::Failed(f) => {
                assert_eq!(f.kind, FailureKind::OutputDecodeFailure);
                assert_eq!(f.actual, "failed");
            }
            CaseVerdict::Passed => panic!("expected failure"),
        }
    }

    #[test]
    fn test_strict_mode_trims_but_requires_equality() {
        let cmp = OutputComparator::new(WildcardMode::Strict);
        assert!(cmp.output_matches("a b\n", "  a b  \n\n"));
        assert!(!cmp.output_matches("a  b\n", "a b\n"));
        assert!(!cmp.output_matches("#addrs#\n", "0x21008\n"));
    }

    #[test]
    fn test_tolerant_mode_addrs_matches_any_token() {
        let cmp = OutputComparator::new(WildcardMode::Tolerant);
        assert!(cmp.output_matches("ptr: #addrs#\n", "ptr: 0x21008\n"));
        assert!(!cmp.output_matches("ptr: #addrs#\n", "val: 0x21008\n"));
        assert!(!cmp.output_matches("#addrs#\n", "0x1 0x2\n"));
    }

    #[test]
    fn test_tolerant_mode_runtime_error_absorbs_tail() {
        let cmp = OutputComparator::new(WildcardMode::Tolerant);
        assert!(cmp.output_matches(
            "before\n#runtime_error#\n",
            "before\nFatalError: integer overflow\n"
        ));
        assert!(!cmp.output_matches("before\n#runtime_error#\n", "before\n"));
    }

    #[test]
    fn test_absent_output_is_not_checked() {
        let verdict = OutputComparator::new(WildcardMode::Strict).evaluate(
            fixture(),
            &expect(None, None),
            &completed("anything at all", 0),
        );
        assert!(verdict.passed());
    }
}
