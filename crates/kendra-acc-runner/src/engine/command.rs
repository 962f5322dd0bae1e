//! Child process execution with streamed, captured output
//!
//! Every line the engine prints is forwarded to `tracing` at DEBUG while the
//! full stdout and stderr are kept for error reporting and JSON parsing.

use super::EngineError;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Configuration for command execution
#[derive(Debug, Clone)]
pub struct CommandConfig {
    /// Command timeout (kills process if exceeded)
    pub timeout: Duration,
    /// Time to wait for output readers to drain after the process exits
    pub stream_flush_timeout: Duration,
    /// Extra environment variables
    pub env: Vec<(String, String)>,
}

impl CommandConfig {
    /// Create with custom timeout, default stream flush timeout
    pub fn with_timeout_secs(timeout_secs: u64) -> Self {
        Self {
            timeout: Duration::from_secs(timeout_secs),
            stream_flush_timeout: Duration::from_secs(5),
            env: Vec::new(),
        }
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

/// Exit status and captured output of a finished command
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// Exit code, `None` when killed by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

fn collect_lines<R>(reader: R, stream: &'static str) -> tokio::task::JoinHandle<String>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        let mut captured = String::new();
        while let Ok(Some(line)) = lines.next_line().await {
            debug!(target: "kendra_acc_runner::engine::output", stream, "{}", line);
            captured.push_str(&line);
            captured.push('\n');
        }
        captured
    })
}

/// Wait for a reader to hit EOF. A stream held open past `flush` (by a
/// leftover grandchild, say) is an error rather than silently short output.
async fn join_output(
    handle: Option<tokio::task::JoinHandle<String>>,
    flush: Duration,
    command: &str,
    stream: &'static str,
) -> Result<String, EngineError> {
    let Some(handle) = handle else {
        return Ok(String::new());
    };
    let truncated = || EngineError::OutputTruncated {
        command: command.to_string(),
        stream,
        secs: flush.as_secs(),
    };
    match tokio::time::timeout(flush, handle).await {
        Ok(Ok(captured)) => Ok(captured),
        Ok(Err(e)) => {
            warn!(command = %command, stream, error = %e, "Output reader task failed");
            Err(truncated())
        }
        Err(_) => {
            warn!(command = %command, stream, "Output stream still open after flush timeout");
            Err(truncated())
        }
    }
}

/// Run `program args...` in `workdir`, returning its exit status and output.
///
/// A non-zero exit is not an error here; callers decide what exit codes mean.
pub async fn run_command(
    program: &Path,
    args: &[&str],
    workdir: &Path,
    config: &CommandConfig,
) -> Result<CommandOutput, EngineError> {
    let command = format!("{} {}", program.display(), args.join(" "));
    info!(
        command = %command,
        workdir = %workdir.display(),
        timeout_secs = config.timeout.as_secs(),
        "Running command"
    );

    let mut child = Command::new(program)
        .args(args)
        .current_dir(workdir)
        .envs(config.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| EngineError::Spawn {
            program: PathBuf::from(program),
            source,
        })?;

    let stdout = child.stdout.take().map(|s| collect_lines(s, "stdout"));
    let stderr = child.stderr.take().map(|s| collect_lines(s, "stderr"));

    let status = match tokio::time::timeout(config.timeout, child.wait()).await {
        Ok(Ok(status)) => status,
        Ok(Err(e)) => return Err(EngineError::Io(e)),
        Err(_) => {
            warn!(
                command = %command,
                timeout_secs = config.timeout.as_secs(),
                "Command timed out, killing process"
            );
            if let Err(e) = child.kill().await {
                warn!(error = %e, "Failed to kill timed-out process");
            }
            return Err(EngineError::Timeout {
                command,
                secs: config.timeout.as_secs(),
            });
        }
    };

    let stdout = join_output(stdout, config.stream_flush_timeout, &command, "stdout").await?;
    let stderr = join_output(stderr, config.stream_flush_timeout, &command, "stderr").await?;

    debug!(command = %command, code = ?status.code(), "Command finished");

    Ok(CommandOutput {
        code: status.code(),
        stdout,
        stderr,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh() -> PathBuf {
        PathBuf::from("sh")
    }

    #[tokio::test]
    async fn captures_both_streams_and_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let out = run_command(
            &sh(),
            &["-c", "echo hello; echo oops >&2; exit 3"],
            dir.path(),
            &CommandConfig::with_timeout_secs(10),
        )
        .await
        .unwrap();

        assert_eq!(out.code, Some(3));
        assert!(!out.success());
        assert_eq!(out.stdout, "hello\n");
        assert_eq!(out.stderr, "oops\n");
    }

    #[tokio::test]
    async fn passes_env_and_workdir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker"), "x").unwrap();
        let config = CommandConfig::with_timeout_secs(10).env("TF_IN_AUTOMATION", "1");

        let out = run_command(
            &sh(),
            &["-c", "ls; echo \"auto=$TF_IN_AUTOMATION\""],
            dir.path(),
            &config,
        )
        .await
        .unwrap();

        assert!(out.success());
        assert!(out.stdout.contains("marker"));
        assert!(out.stdout.contains("auto=1"));
    }

    #[tokio::test]
    async fn timeout_kills_process() {
        let dir = tempfile::tempdir().unwrap();
        let config = CommandConfig {
            timeout: Duration::from_millis(100),
            ..CommandConfig::with_timeout_secs(0)
        };
        let err = run_command(&sh(), &["-c", "sleep 10"], dir.path(), &config)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Timeout { .. }));
    }

    #[tokio::test]
    async fn stream_held_open_is_truncation_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = CommandConfig {
            stream_flush_timeout: Duration::from_millis(100),
            ..CommandConfig::with_timeout_secs(10)
        };
        // The background sleep inherits stdout and keeps it open
        let err = run_command(&sh(), &["-c", "sleep 5 & echo partial"], dir.path(), &config)
            .await
            .unwrap_err();
        match err {
            EngineError::OutputTruncated { stream, .. } => assert_eq!(stream, "stdout"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_binary_is_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_command(
            Path::new("/nonexistent/terraform"),
            &["version"],
            dir.path(),
            &CommandConfig::with_timeout_secs(10),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, EngineError::Spawn { .. }));
        assert!(err.to_string().contains("/nonexistent/terraform"));
    }
}
