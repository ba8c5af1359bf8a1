//! WACC conformance suite runner
//!
//! `wacc-test` walks a fixture directory, runs each `.wacc` fixture through
//! the compiler, assembler and emulator, and prints a pass/fail summary.
//! The exit status is 0 whenever the run completes, however many fixtures
//! failed.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{info, Level};

use wacc_harness::{
    normalize_path, render_summary, ExclusionSet, OutputComparator, SuiteReport, SuiteRunner,
    ToolchainConfig, ToolchainPipeline, WildcardMode,
};

#[derive(Parser, Debug)]
#[command(name = "wacc-test")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Run the WACC conformance suite", long_about = None)]
struct Cli {
    /// Fixture root to scan (default: <harness-root>/testsuite/valid)
    #[arg(short, long)]
    dir: Option<PathBuf>,

    /// Directory the default tool, fixture and exclusion paths hang off
    #[arg(long, env = "WACC_HARNESS_ROOT", default_value = ".")]
    harness_root: PathBuf,

    /// Compiler executable (default: <harness-root>/../compile)
    #[arg(long, env = "WACC_COMPILER")]
    compiler: Option<PathBuf>,

    /// Assembler executable (default: <harness-root>/tools/arm-gcc)
    #[arg(long, env = "WACC_ASSEMBLER")]
    assembler: Option<PathBuf>,

    /// Emulator executable (default: <harness-root>/tools/arm-run)
    #[arg(long, env = "WACC_EMULATOR")]
    emulator: Option<PathBuf>,

    /// Exclusion list (default: <harness-root>/testsuite/excluded)
    #[arg(long, env = "WACC_EXCLUDED")]
    excluded: Option<PathBuf>,

    /// Compile stage timeout in seconds
    #[arg(long, env = "WACC_COMPILE_TIMEOUT", default_value_t = 5)]
    compile_timeout: u64,

    /// Assemble stage timeout in seconds
    #[arg(long, env = "WACC_ASSEMBLE_TIMEOUT", default_value_t = 5)]
    assemble_timeout: u64,

    /// Execute stage timeout in seconds
    #[arg(long, env = "WACC_EXECUTE_TIMEOUT", default_value_t = 5)]
    execute_timeout: u64,

    /// Let #addrs# and #runtime_error# match any token instead of requiring
    /// an exact output match
    #[arg(long, env = "WACC_TOLERANT_WILDCARDS")]
    tolerant_wildcards: bool,

    /// Also write a JSON report to this file
    #[arg(long, env = "WACC_REPORT")]
    report: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,
}

/// Fully resolved settings for one run.
#[derive(Debug)]
struct RunSettings {
    fixture_root: PathBuf,
    exclusion_list: PathBuf,
    toolchain: ToolchainConfig,
    wildcard_mode: WildcardMode,
    report: Option<PathBuf>,
}

impl RunSettings {
    fn resolve(cli: &Cli) -> Self {
        let root = normalize_path(&cli.harness_root);
        let suite_dir = root.join("testsuite");

        let defaults = ToolchainConfig::from_harness_root(&root);
        let toolchain = ToolchainConfig {
            compiler: tool_or(&cli.compiler, defaults.compiler),
            assembler: tool_or(&cli.assembler, defaults.assembler),
            emulator: tool_or(&cli.emulator, defaults.emulator),
            compile_timeout_secs: cli.compile_timeout,
            assemble_timeout_secs: cli.assemble_timeout,
            execute_timeout_secs: cli.execute_timeout,
        };

        Self {
            fixture_root: absolute_or(&cli.dir, suite_dir.join("valid")),
            exclusion_list: absolute_or(&cli.excluded, suite_dir.join("excluded")),
            toolchain,
            wildcard_mode: if cli.tolerant_wildcards {
                WildcardMode::Tolerant
            } else {
                WildcardMode::Strict
            },
            report: cli.report.clone(),
        }
    }
}

fn absolute_or(path: &Option<PathBuf>, default: PathBuf) -> PathBuf {
    normalize_path(path.as_deref().unwrap_or(&default))
}

/// Like [`absolute_or`], but a bare program name is left for `PATH` lookup.
fn tool_or(path: &Option<PathBuf>, default: PathBuf) -> PathBuf {
    match path {
        Some(tool) if tool.components().count() == 1 && !tool.is_absolute() => tool.clone(),
        _ => absolute_or(path, default),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    wacc_harness::init_tracing(cli.json, level);

    let settings = RunSettings::resolve(&cli);
    cmd_run(&settings).await
}

/// Run the suite and print the summary
async fn cmd_run(settings: &RunSettings) -> Result<()> {
    info!(
        root = %settings.fixture_root.display(),
        compiler = %settings.toolchain.compiler.display(),
        mode = ?settings.wildcard_mode,
        "Starting suite run"
    );

    // Entries are relative to the directory actually scanned.
    let exclusions = ExclusionSet::load(&settings.exclusion_list, &settings.fixture_root)
        .context("Failed to load exclusion list")?;
    let pipeline = ToolchainPipeline::new(settings.toolchain.clone())
        .context("Failed to create scratch directory")?;
    let comparator = OutputComparator::new(settings.wildcard_mode);

    let stats = SuiteRunner::new(&pipeline, &exclusions, comparator)
        .run(&settings.fixture_root)
        .await
        .with_context(|| {
            format!(
                "Failed to run fixtures under {}",
                settings.fixture_root.display()
            )
        })?;

    print!("{}", render_summary(&stats));

    if let Some(path) = &settings.report {
        write_report(path, &SuiteReport::new(&settings.fixture_root, &stats))?;
    }

    Ok(())
}

fn write_report(path: &Path, report: &SuiteReport) -> Result<()> {
    let json = report
        .to_json_pretty()
        .context("Failed to serialize report")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write report to {}", path.display()))?;
    info!(report = %path.display(), "Wrote JSON report");
    Ok(())
}
