//! Compile, assemble and emulate one fixture.

use crate::error::{HarnessError, Result};
use crate::exclusion::normalize_path;
use crate::runner::{StageResult, StageRunner};
use crate::stage::{ToolchainConfig, ToolchainStage};
use crate::stats::FailureKind;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info, warn};

/// Observed text for any stage timeout.
pub const TIMEOUT_TEXT: &str = "timeout";

/// Observed text when stdout is not valid UTF-8.
pub const DECODE_FAILURE_TEXT: &str = "failed";

/// Observed text when the assembler rejects the compiler's output.
pub const ASSEMBLE_FAILURE_TEXT: &str = "assemble failed";

/// Exit code reported for every outcome other than `Completed`.
pub const SENTINEL_EXIT_CODE: i32 = -1;

/// How far a fixture got through the toolchain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExecutionOutcome {
    /// The emulator ran to completion.
    Completed { stdout: String, exit_code: i32 },

    CompileTimeout,

    AssembleTimeout,

    /// The assembler exited non-zero.
    AssembleFailure { exit_code: i32 },

    ExecutionTimeout,

    /// Emulator stdout was not valid UTF-8.
    DecodeFailure,
}

impl ExecutionOutcome {
    /// Stdout as compared against `Output:`; sentinel text for failures.
    pub fn stdout_text(&self) -> &str {
        match self {
            ExecutionOutcome::Completed { stdout, .. } => stdout,
            ExecutionOutcome::CompileTimeout
            | ExecutionOutcome::AssembleTimeout
            | ExecutionOutcome::ExecutionTimeout => TIMEOUT_TEXT,
            ExecutionOutcome::AssembleFailure { .. } => ASSEMBLE_FAILURE_TEXT,
            ExecutionOutcome::DecodeFailure => DECODE_FAILURE_TEXT,
        }
    }

    /// Exit code as compared against `Exit:`.
    pub fn exit_code(&self) -> i32 {
        match self {
            ExecutionOutcome::Completed { exit_code, .. } => *exit_code,
            _ => SENTINEL_EXIT_CODE,
        }
    }

    /// Failure kind to attribute a mismatch to, if the toolchain did not complete.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            ExecutionOutcome::Completed { .. } => None,
            ExecutionOutcome::CompileTimeout => Some(FailureKind::CompileTimeout),
            ExecutionOutcome::AssembleTimeout => Some(FailureKind::AssembleTimeout),
            ExecutionOutcome::AssembleFailure { .. } => Some(FailureKind::AssembleFailure),
            ExecutionOutcome::ExecutionTimeout => Some(FailureKind::ExecutionTimeout),
            ExecutionOutcome::DecodeFailure => Some(FailureKind::OutputDecodeFailure),
        }
    }
}

/// Something that can turn a fixture path into an outcome.
#[async_trait]
pub trait Pipeline: Send + Sync {
    /// Run one fixture through the toolchain.
    ///
    /// `Err` means the toolchain itself could not be driven (e.g. a tool is
    /// missing); timeouts and tool failures are outcomes, not errors.
    async fn execute(&self, fixture: &Path) -> Result<ExecutionOutcome>;

    /// Remove per-run artifacts. Called once, after the last fixture.
    fn sweep(&self) -> Result<()> {
        Ok(())
    }
}

/// The real compile → assemble → emulate pipeline.
///
/// Every fixture runs in its own directory under a run-scoped scratch
/// directory, so fixtures sharing a file name never share artifacts.
pub struct ToolchainPipeline {
    config: ToolchainConfig,
    scratch: TempDir,
}

impl ToolchainPipeline {
    /// Create a pipeline with a scratch directory under the system temp dir.
    pub fn new(config: ToolchainConfig) -> Result<Self> {
        let scratch = tempfile::Builder::new()
            .prefix("wacc-run-")
            .tempdir()
            .map_err(|e| HarnessError::io(std::env::temp_dir(), e))?;
        Ok(Self::with_scratch(config, scratch))
    }

    /// Create a pipeline using an existing scratch directory.
    pub fn with_scratch(config: ToolchainConfig, scratch: TempDir) -> Self {
        info!(scratch = %scratch.path().display(), "Using scratch directory");
        Self { config, scratch }
    }

    pub fn scratch_dir(&self) -> &Path {
        self.scratch.path()
    }

    /// Working directory for a fixture, named after a digest of its path.
    pub fn fixture_dir(&self, fixture: &Path) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(fixture.to_string_lossy().as_bytes());
        let digest = hex::encode(hasher.finalize());
        self.scratch.path().join(&digest[..12])
    }
}

#[async_trait]
impl Pipeline for ToolchainPipeline {
    async fn execute(&self, fixture: &Path) -> Result<ExecutionOutcome> {
        let fixture = normalize_path(fixture);
        let work_dir = self.fixture_dir(&fixture);
        std::fs::create_dir_all(&work_dir).map_err(|e| HarnessError::io(&work_dir, e))?;

        // Only finishing in time matters here; a compile error shows up as a
        // missing .s file at the assemble stage.
        let compile = self
            .config
            .stage(ToolchainStage::Compile, &fixture, &work_dir);
        match StageRunner::execute_stage(&compile).await {
            Ok(result) => match compile_diagnostic(&result) {
                Some(stderr) => warn!(
                    fixture = %fixture.display(),
                    exit_code = result.exit_code,
                    stderr = %stderr,
                    "Compiler exited non-zero"
                ),
                None => debug!(exit_code = result.exit_code, "Compiler returned"),
            },
            Err(HarnessError::StageTimeout { .. }) => {
                warn!(fixture = %fixture.display(), "Compile stage timed out");
                return Ok(ExecutionOutcome::CompileTimeout);
            }
            Err(e) => return Err(e),
        }

        let assemble = self
            .config
            .stage(ToolchainStage::Assemble, &fixture, &work_dir);
        match StageRunner::execute_stage(&assemble).await {
            Ok(result) if result.passed() => {}
            Ok(result) => {
                warn!(
                    fixture = %fixture.display(),
                    exit_code = result.exit_code,
                    stderr = %result.stderr.trim(),
                    "Assemble stage failed"
                );
                return Ok(ExecutionOutcome::AssembleFailure {
                    exit_code: result.exit_code,
                });
            }
            Err(HarnessError::StageTimeout { .. }) => {
                warn!(fixture = %fixture.display(), "Assemble stage timed out");
                return Ok(ExecutionOutcome::AssembleTimeout);
            }
            Err(e) => return Err(e),
        }

        let execute = self
            .config
            .stage(ToolchainStage::Execute, &fixture, &work_dir);
        let result = match StageRunner::execute_stage(&execute).await {
            Ok(result) => result,
            Err(HarnessError::StageTimeout { .. }) => {
                warn!(fixture = %fixture.display(), "Execute stage timed out");
                return Ok(ExecutionOutcome::ExecutionTimeout);
            }
            Err(e) => return Err(e),
        };

        match String::from_utf8(result.stdout) {
            Ok(stdout) => Ok(ExecutionOutcome::Completed {
                stdout,
                exit_code: result.exit_code,
            }),
            Err(_) => {
                warn!(fixture = %fixture.display(), "Emulator output is not valid UTF-8");
                Ok(ExecutionOutcome::DecodeFailure)
            }
        }
    }

    fn sweep(&self) -> Result<()> {
        let root = self.scratch.path();
        let entries = std::fs::read_dir(root).map_err(|e| HarnessError::io(root, e))?;
        for entry in entries {
            let path = entry.map_err(|e| HarnessError::io(root, e))?.path();
            let removed = if path.is_dir() {
                std::fs::remove_dir_all(&path)
            } else {
                std::fs::remove_file(&path)
            };
            removed.map_err(|e| HarnessError::io(&path, e))?;
        }
        debug!(scratch = %root.display(), "Swept build artifacts");
        Ok(())
    }
}

/// Compiler stderr worth surfacing: present only when the compiler failed.
fn compile_diagnostic(result: &StageResult) -> Option<&str> {
    if result.passed() {
        None
    } else {
        Some(result.stderr.trim())
    }
}
