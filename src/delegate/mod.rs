use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum DelegateError {
    #[error("Delegate unavailable: {0}")]
    Unavailable(String),

    #[error("Task rejected: {0}")]
    Rejected(String),

    #[error("Task failed: {0}")]
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Normal,
    High,
}

/// A unit of work submitted to the prediction service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDescriptor {
    #[serde(rename = "type")]
    pub task_type: String,
    pub payload: Value,
    pub priority: TaskPriority,
}

impl TaskDescriptor {
    pub fn new(task_type: &str, payload: Value, priority: TaskPriority) -> Self {
        Self {
            task_type: task_type.to_string(),
            payload,
            priority,
        }
    }
}

/// Raw series returned by the prediction service, one value per horizon step
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PredictionResult {
    pub values: Vec<f64>,
}

impl PredictionResult {
    /// Values mapped into [0, 1]; non-finite entries become 0
    pub fn bounded_values(&self) -> Vec<f64> {
        self.values
            .iter()
            .map(|v| if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 })
            .collect()
    }
}

/// External statistical/ML worker
#[async_trait]
pub trait PredictionDelegate: Send + Sync {
    async fn submit(&self, task: TaskDescriptor) -> Result<PredictionResult, DelegateError>;
}

/// Delegate used when no prediction service is configured
#[derive(Debug, Default)]
pub struct UnavailableDelegate;

#[async_trait]
impl PredictionDelegate for UnavailableDelegate {
    async fn submit(&self, task: TaskDescriptor) -> Result<PredictionResult, DelegateError> {
        Err(DelegateError::Unavailable(format!(
            "no prediction service configured for {}",
            task.task_type
        )))
    }
}

/// Best-effort wrapper that bounds every submission by a timeout.
///
/// Failures and timeouts are logged and reported as `None`; nothing is retried.
#[derive(Clone)]
pub struct BoundedDelegate {
    delegate: Arc<dyn PredictionDelegate>,
    timeout: Duration,
}

impl BoundedDelegate {
    pub fn new(delegate: Arc<dyn PredictionDelegate>, timeout: Duration) -> Self {
        Self { delegate, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn submit(&self, task: TaskDescriptor) -> Option<PredictionResult> {
        let task_type = task.task_type.clone();

        match tokio::time::timeout(self.timeout, self.delegate.submit(task)).await {
            Ok(Ok(result)) => {
                debug!(task_type = %task_type, points = result.values.len(), "Delegate returned prediction");
                Some(result)
            }
            Ok(Err(err)) => {
                warn!(task_type = %task_type, error = %err, "Delegate task failed");
                None
            }
            Err(_) => {
                warn!(
                    task_type = %task_type,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Delegate task timed out"
                );
                None
            }
        }
    }
}
