//! Expectation annotations embedded in fixture comments.
//!
//! A fixture declares what running it should produce through `#` comment
//! lines at the top of the file:
//!
//! ```text
//! # Output:
//! # 3
//!
//! # Exit:
//! # 0
//! ```
//!
//! Parsing happens in two passes. The first groups consecutive comment lines
//! into runs. The second looks for the first key line in each run; every
//! following line of that run is the key's value.

use crate::error::{HarnessError, Result};
use serde::{Deserialize, Serialize};

/// Marker that starts every annotation line.
pub const COMMENT_MARKER: char = '#';

/// Keys recognised in the second token of an annotation line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationKey {
    /// Expected stdout of the executed program.
    Output,

    /// Expected exit code of the executed program.
    Exit,
}

impl AnnotationKey {
    fn from_token(token: &str) -> Option<Self> {
        match token {
            "Output:" => Some(AnnotationKey::Output),
            "Exit:" => Some(AnnotationKey::Exit),
            _ => None,
        }
    }
}

/// What a fixture expects from the toolchain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expectation {
    /// Expected stdout, value lines concatenated with their newlines.
    /// `None` means stdout is not checked.
    pub output: Option<String>,

    /// Declared exit code. `None` means the default of 0.
    pub exit_code: Option<i32>,
}

impl Expectation {
    /// Parse the annotations of a fixture.
    ///
    /// Fails with [`HarnessError::MalformedExpectation`] when the `Exit:`
    /// value is not an integer.
    pub fn parse(text: &str) -> Result<Self> {
        let mut output = None;
        let mut exit_text: Option<String> = None;

        for run in annotation_runs(text) {
            let Some((start, key)) = run
                .iter()
                .enumerate()
                .find_map(|(i, line)| key_of(line).map(|k| (i, k)))
            else {
                continue;
            };

            let value: String = run[start + 1..].iter().map(|l| value_unit(l)).collect();
            // A repeated key replaces the earlier value.
            match key {
                AnnotationKey::Output => output = Some(value),
                AnnotationKey::Exit => exit_text = Some(value),
            }
        }

        let exit_code = match exit_text {
            Some(text) => {
                let trimmed = text.trim();
                let code = trimmed
                    .parse::<i32>()
                    .map_err(|source| HarnessError::MalformedExpectation {
                        value: trimmed.to_string(),
                        source,
                    })?;
                Some(code)
            }
            None => None,
        };

        Ok(Self { output, exit_code })
    }

    /// Exit code the program must return.
    pub fn expected_exit_code(&self) -> i32 {
        self.exit_code.unwrap_or(0)
    }
}

fn is_annotation(line: &str) -> bool {
    line.starts_with(COMMENT_MARKER)
}

/// First pass: maximal runs of consecutive annotation lines, newlines kept.
fn annotation_runs(text: &str) -> Vec<Vec<&str>> {
    let mut runs = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.split_inclusive('\n') {
        if is_annotation(line) {
            current.push(line);
        } else if !current.is_empty() {
            runs.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

/// The key named by the second space-separated token, if any.
fn key_of(line: &str) -> Option<AnnotationKey> {
    line.split(' ')
        .nth(1)
        .and_then(|token| AnnotationKey::from_token(token.trim()))
}

/// Text after the marker token.
fn value_unit(line: &str) -> &str {
    line.split_once(' ').map(|(_, rest)| rest).unwrap_or("")
}
