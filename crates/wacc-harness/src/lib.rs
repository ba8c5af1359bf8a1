//! WACC Harness - conformance oracle for the WACC toolchain
//!
//! Runs annotated `.wacc` fixtures through an external pipeline and checks
//! the results:
//! - Parses `# Output:` / `# Exit:` annotations into expectations
//! - Compiles, assembles and emulates each fixture with per-stage timeouts
//! - Compares stdout and exit code, honouring wildcard tokens
//! - Skips excluded fixtures and tallies the run

pub mod annotation;
pub mod compare;
pub mod error;
pub mod exclusion;
pub mod orchestrator;
pub mod pipeline;
pub mod report;
pub mod runner;
pub mod stage;
pub mod stats;
pub mod telemetry;

// Re-export key types
pub use annotation::Expectation;
pub use compare::{CaseVerdict, OutputComparator, WildcardMode};
pub use error::{HarnessError, Result};
pub use exclusion::{normalize_path, ExclusionSet};
pub use orchestrator::{discover_fixtures, SuiteRunner, FIXTURE_EXTENSION};
pub use pipeline::{ExecutionOutcome, Pipeline, ToolchainPipeline};
pub use report::{render_summary, SuiteReport};
pub use runner::{StageResult, StageRunner};
pub use stage::{StageConfig, ToolchainConfig, ToolchainStage};
pub use stats::{FailureKind, FailureRecord, RunStats};
pub use telemetry::init_tracing;
