//! Linear task graph of a pipeline run: `fetch_data >> transform_data >> load_data`.
//!
//! Each task is retried as a whole under a [`RetryPolicy`]; the transformer
//! itself never retries.

use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::RetryConfig;
use crate::constants::{FETCH_TASK, LOAD_TASK, TRANSFORM_TASK};
use crate::error::Result;
use crate::observability::metrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskId {
    FetchData,
    TransformData,
    LoadData,
}

impl TaskId {
    /// Execution order of the graph
    pub const ORDER: [TaskId; 3] = [TaskId::FetchData, TaskId::TransformData, TaskId::LoadData];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskId::FetchData => FETCH_TASK,
            TaskId::TransformData => TRANSFORM_TASK,
            TaskId::LoadData => LOAD_TASK,
        }
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retries: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 1,
            delay: Duration::from_secs(300),
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            retries: 0,
            delay: Duration::ZERO,
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            retries: config.retries,
            delay: config.delay(),
        }
    }
}

/// Runs `attempt` until it succeeds, fails with a non-retryable error, or the
/// policy's retries are used up. The last error is returned.
pub async fn run_task<T, F, Fut>(task: TaskId, policy: &RetryPolicy, mut attempt: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut tries = 0u32;
    loop {
        tries += 1;
        match attempt().await {
            Ok(value) => {
                info!(task = %task, attempt = tries, "Task succeeded");
                return Ok(value);
            }
            Err(e) if e.is_retryable() && tries <= policy.retries => {
                warn!(
                    task = %task,
                    attempt = tries,
                    retry_in_secs = policy.delay.as_secs_f64(),
                    "Task failed, retrying: {}",
                    e
                );
                metrics::run::task_retried(task.as_str());
                tokio::time::sleep(policy.delay).await;
            }
            Err(e) => {
                warn!(task = %task, attempt = tries, "Task failed: {}", e);
                return Err(e);
            }
        }
    }
}
