//! Toolchain stage definitions and configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default per-stage timeout in seconds.
pub const DEFAULT_STAGE_TIMEOUT_SECS: u64 = 5;

/// Name of the binary the assembler leaves in the working directory.
pub const BINARY_NAME: &str = "a.out";

/// The three toolchain stages, in execution order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ToolchainStage {
    /// compile <fixture>  (writes <stem>.s)
    Compile,

    /// arm-gcc <stem>.s  (writes a.out)
    Assemble,

    /// arm-run a.out
    Execute,
}

impl ToolchainStage {
    /// Get the stage name as a string.
    pub fn name(&self) -> &'static str {
        match self {
            ToolchainStage::Compile => "compile",
            ToolchainStage::Assemble => "assemble",
            ToolchainStage::Execute => "execute",
        }
    }
}

/// Paths to the external tools and their time limits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolchainConfig {
    pub compiler: PathBuf,
    pub assembler: PathBuf,
    pub emulator: PathBuf,
    pub compile_timeout_secs: u64,
    pub assemble_timeout_secs: u64,
    pub execute_timeout_secs: u64,
}

impl ToolchainConfig {
    /// Default tool layout relative to a harness root: the compiler one level
    /// up, the assembler and emulator under `tools/`.
    pub fn from_harness_root(root: &Path) -> Self {
        Self {
            compiler: root.join("../compile"),
            assembler: root.join("tools/arm-gcc"),
            emulator: root.join("tools/arm-run"),
            compile_timeout_secs: DEFAULT_STAGE_TIMEOUT_SECS,
            assemble_timeout_secs: DEFAULT_STAGE_TIMEOUT_SECS,
            execute_timeout_secs: DEFAULT_STAGE_TIMEOUT_SECS,
        }
    }

    /// Build the stage configuration for one fixture.
    pub fn stage(&self, stage: ToolchainStage, fixture: &Path, working_dir: &Path) -> StageConfig {
        let (program, arg, timeout_secs) = match stage {
            ToolchainStage::Compile => (
                &self.compiler,
                fixture.display().to_string(),
                self.compile_timeout_secs,
            ),
            ToolchainStage::Assemble => (
                &self.assembler,
                assembly_file_name(fixture),
                self.assemble_timeout_secs,
            ),
            ToolchainStage::Execute => {
                (&self.emulator, BINARY_NAME.to_string(), self.execute_timeout_secs)
            }
        };

        StageConfig {
            name: stage.name().to_string(),
            command: vec![program.display().to_string(), arg],
            timeout_secs,
            working_dir: Some(working_dir.to_path_buf()),
        }
    }
}

/// File name the compiler writes for a fixture: its stem with `.s`.
pub fn assembly_file_name(fixture: &Path) -> String {
    let stem = fixture
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{}.s", stem)
}

/// Configuration for a single bounded process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageConfig {
    /// Human-readable stage name.
    pub name: String,

    /// Command to execute (first element is executable).
    pub command: Vec<String>,

    /// Timeout in seconds; 0 waits indefinitely.
    pub timeout_secs: u64,

    /// Directory the process runs in.
    pub working_dir: Option<PathBuf>,
}

impl StageConfig {
    /// Create a custom stage configuration.
    pub fn custom(name: String, command: Vec<String>, timeout_secs: u64) -> Self {
        Self {
            name,
            command,
            timeout_secs,
            working_dir: None,
        }
    }

    /// Run the stage inside `dir`.
    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }
}
