//! Bounded execution of media tools.

use crate::command::{CommandOutput, CommandRunner, CommandSpec, TokioCommandRunner};
use crate::error::ProcessingError;
use clipvault_core::Config;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Caps how many tool processes run at once and how long each may take.
///
/// Cloning shares the same permits.
#[derive(Clone)]
pub struct ToolPool {
    runner: Arc<dyn CommandRunner>,
    semaphore: Arc<Semaphore>,
    timeout: Duration,
}

impl ToolPool {
    pub fn new(runner: Arc<dyn CommandRunner>, max_concurrent: usize, timeout: Duration) -> Self {
        Self {
            runner,
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
            timeout,
        }
    }

    /// Pool backed by real processes, sized from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(TokioCommandRunner),
            config.max_concurrent_tools(),
            config.tool_timeout(),
        )
    }

    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Wait for a permit, then run `spec` under the timeout.
    ///
    /// On timeout the in-flight run future is dropped, which kills the child.
    pub async fn run(&self, spec: CommandSpec) -> Result<CommandOutput, ProcessingError> {
        let tool = spec.program.clone();

        let Ok(_permit) = self.semaphore.acquire().await else {
            unreachable!("tool pool semaphore is never closed");
        };

        let start = std::time::Instant::now();
        match tokio::time::timeout(self.timeout, self.runner.run(spec)).await {
            Ok(result) => {
                tracing::debug!(
                    tool = %tool,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Tool finished"
                );
                result
            }
            Err(_) => {
                tracing::warn!(
                    tool = %tool,
                    timeout_secs = self.timeout.as_secs(),
                    "Tool timed out, killing process"
                );
                Err(ProcessingError::Timeout {
                    tool,
                    timeout_secs: self.timeout.as_secs(),
                })
            }
        }
    }
}
