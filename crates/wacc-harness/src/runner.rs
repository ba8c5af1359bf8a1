//! Bounded execution of a single external process.

use crate::error::{HarnessError, Result};
use crate::stage::StageConfig;
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;
use tracing::debug;

/// Result of a stage execution.
#[derive(Debug, Clone)]
pub struct StageResult {
    /// Stage name.
    pub stage_name: String,

    /// Exit code; `-signum` when the process was killed by a signal.
    pub exit_code: i32,

    /// Raw stdout bytes, undecoded.
    pub stdout: Vec<u8>,

    /// Captured stderr.
    pub stderr: String,

    /// Duration in milliseconds.
    pub duration_ms: u64,
}

impl StageResult {
    /// Whether this stage passed (exit code 0).
    pub fn passed(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs one stage to completion or until its timeout.
pub struct StageRunner;

impl StageRunner {
    /// Execute a single stage and return the result.
    ///
    /// A stage that outlives its timeout is killed and reported as
    /// [`HarnessError::StageTimeout`].
    pub async fn execute_stage(config: &StageConfig) -> Result<StageResult> {
        let start = Instant::now();

        let Some((exe, args)) = config.command.split_first() else {
            return Err(HarnessError::EmptyCommand(config.name.clone()));
        };

        let mut command = Command::new(exe);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &config.working_dir {
            command.current_dir(dir);
        }

        let child = command.spawn().map_err(|source| HarnessError::Spawn {
            stage: config.name.clone(),
            program: exe.clone(),
            source,
        })?;

        // Dropping the wait future on timeout drops the child, which kills it.
        let waited = if config.timeout_secs > 0 {
            tokio::time::timeout(
                std::time::Duration::from_secs(config.timeout_secs),
                child.wait_with_output(),
            )
            .await
            .map_err(|_| HarnessError::StageTimeout {
                stage: config.name.clone(),
                limit_secs: config.timeout_secs,
            })?
        } else {
            child.wait_with_output().await
        };
        let output = waited.map_err(|source| HarnessError::Spawn {
            stage: config.name.clone(),
            program: exe.clone(),
            source,
        })?;

        let duration_ms = start.elapsed().as_millis() as u64;
        let exit_code = exit_code_of(&output.status);
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        debug!(
            stage = %config.name,
            exit_code,
            duration_ms,
            "Stage finished"
        );

        Ok(StageResult {
            stage_name: config.name.clone(),
            exit_code,
            stdout: output.stdout,
            stderr,
            duration_ms,
        })
    }
}

/// Exit code of a finished process; a signal death reports `-signum`.
fn exit_code_of(status: &std::process::ExitStatus) -> i32 {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return -signal;
        }
    }
    status.code().unwrap_or(-1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(name: &str, script: &str, timeout_secs: u64) -> StageConfig {
        StageConfig::custom(
            name.to_string(),
            vec!["sh".to_string(), "-c".to_string(), script.to_string()],
            timeout_secs,
        )
    }

    #[test]
    fn test_stage_result_passed() {
        let result = StageResult {
            stage_name: "execute".to_string(),
            exit_code: 0,
            stdout: Vec::new(),
            stderr: "".to_string(),
            duration_ms: 100,
        };
        assert!(result.passed());
    }

    #[test]
    fn test_stage_result_failed() {
        let result = StageResult {
            stage_name: "assemble".to_string(),
            exit_code: 1,
            stdout: Vec::new(),
            stderr: "error".to_string(),
            duration_ms: 100,
        };
        assert!(!result.passed());
    }

    #[tokio::test]
    async fn test_execute_simple_command() {
        let config = StageConfig::custom(
            "echo_test".to_string(),
            vec!["echo".to_string(), "hello".to_string()],
            60,
        );

        let result = StageRunner::execute_stage(&config)
            .await
            .expect("execute failed");
        assert_eq!(result.exit_code, 0);
        assert_eq!(result.stdout, b"hello\n");
    }

    #[tokio::test]
    async fn test_execute_reports_exit_code() {
        let result = StageRunner::execute_stage(&sh("exit_test", "exit 3", 60))
            .await
            .expect("execute failed");
        assert!(!result.passed());
        assert_eq!(result.exit_code, 3);
    }

    #[tokio::test]
    async fn test_signal_death_reports_negative_signal() {
        let result = StageRunner::execute_stage(&sh("segv", "kill -SEGV $$", 60))
            .await
            .expect("execute failed");
        assert_eq!(result.exit_code, -11);
    }

    #[tokio::test]
    async fn test_execute_keeps_raw_stdout_bytes() {
        let result = StageRunner::execute_stage(&sh("bytes", "printf '\\377'", 60))
            .await
            .expect("execute failed");
        assert_eq!(result.stdout, vec![0xff]);
    }

    #[tokio::test]
    async fn test_execute_times_out() {
        let err = StageRunner::execute_stage(&sh("sleepy", "sleep 5", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, HarnessError::StageTimeout { limit_secs: 1, .. }));
    }

    #[tokio::test]
    async fn test_execute_in_working_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = sh("pwd", "pwd", 60).in_dir(dir.path());
        let result = StageRunner::execute_stage(&config)
            .await
            .expect("execute failed");
        let printed = String::from_utf8(result.stdout).expect("utf8");
        let expected = dir.path().canonicalize().expect("canonicalize");
        assert_eq!(
            std::path::Path::new(printed.trim()).canonicalize().expect("canonicalize"),
            expected
        );
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let config = StageConfig::custom(
            "missing".to_string(),
            vec!["/definitely/not/a/tool".to_string()],
            60,
        );
        let err = StageRunner::execute_stage(&config).await.unwrap_err();
        assert!(matches!(err, HarnessError::Spawn { .. }));
    }

    #[tokio::test]
    async fn test_empty_command_rejected() {
        let config = StageConfig::custom("empty".to_string(), Vec::new(), 60);
        let err = StageRunner::execute_stage(&config).await.unwrap_err();
        assert!(matches!(err, HarnessError::EmptyCommand(_)));
    }
}
