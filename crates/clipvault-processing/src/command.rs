//! External command execution.
//!
//! Media tools are reached through [`CommandRunner`] so the probe and remux
//! steps can be exercised without ffmpeg installed.

use crate::error::ProcessingError;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

/// A fully specified tool invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<OsString>,
    pub working_dir: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }
}

/// Captured result of a finished process
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// `None` when the process was terminated by a signal
    pub status_code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status_code == Some(0)
    }

    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim().to_string()
    }
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run the command to completion. A non-zero exit is not an error here;
    /// callers inspect [`CommandOutput::success`].
    async fn run(&self, spec: CommandSpec) -> Result<CommandOutput, ProcessingError>;
}

/// Runs commands with `tokio::process`.
///
/// Children are spawned with `kill_on_drop`, so dropping the future returned
/// by [`CommandRunner::run`] (on timeout or cancellation) kills the process.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioCommandRunner;

#[async_trait]
impl CommandRunner for TokioCommandRunner {
    async fn run(&self, spec: CommandSpec) -> Result<CommandOutput, ProcessingError> {
        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(ref dir) = spec.working_dir {
            command.current_dir(dir);
        }

        let output = command
            .output()
            .await
            .map_err(|source| ProcessingError::Spawn {
                tool: spec.program.clone(),
                source,
            })?;

        Ok(CommandOutput {
            status_code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_spec_builder() {
        let spec = CommandSpec::new("ffprobe")
            .args(["-v", "error"])
            .arg("/tmp/in.mp4")
            .working_dir("/tmp");

        assert_eq!(spec.program, "ffprobe");
        assert_eq!(spec.args, vec!["-v", "error", "/tmp/in.mp4"]);
        assert_eq!(spec.working_dir, Some(PathBuf::from("/tmp")));
    }

    #[tokio::test]
    async fn test_tokio_runner_captures_output() {
        let dir = tempdir().unwrap();
        let spec = CommandSpec::new("sh")
            .args(["-c", "pwd; echo oops >&2; exit 3"])
            .working_dir(dir.path());

        let output = TokioCommandRunner.run(spec).await.unwrap();

        assert!(!output.success());
        assert_eq!(output.status_code, Some(3));
        assert_eq!(output.stderr_lossy(), "oops");
        let cwd = String::from_utf8(output.stdout).unwrap();
        let expected = dir.path().canonicalize().unwrap();
        assert_eq!(
            std::path::Path::new(cwd.trim()).canonicalize().unwrap(),
            expected
        );
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let result = TokioCommandRunner
            .run(CommandSpec::new("clipvault-definitely-not-installed"))
            .await;

        assert!(matches!(result, Err(ProcessingError::Spawn { .. })));
    }
}
