use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use player_scoring::{
    DelegateError, InMemoryScoreCache, PredictionDelegate, PredictionResult, ScoreCache,
    TaskDescriptor,
};

// ============================================================================
// Prediction delegates
// ============================================================================

/// Answers every task with the same series and counts submissions
pub struct FixedDelegate {
    values: Vec<f64>,
    submissions: AtomicUsize,
}

impl FixedDelegate {
    pub fn new(values: Vec<f64>) -> Self {
        Self {
            values,
            submissions: AtomicUsize::new(0),
        }
    }

    pub fn submissions(&self) -> usize {
        self.submissions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PredictionDelegate for FixedDelegate {
    async fn submit(&self, _task: TaskDescriptor) -> Result<PredictionResult, DelegateError> {
        self.submissions.fetch_add(1, Ordering::SeqCst);
        Ok(PredictionResult {
            values: self.values.clone(),
        })
    }
}

/// Never answers within any reasonable bound
pub struct SlowDelegate {
    pub delay: Duration,
}

#[async_trait]
impl PredictionDelegate for SlowDelegate {
    async fn submit(&self, _task: TaskDescriptor) -> Result<PredictionResult, DelegateError> {
        tokio::time::sleep(self.delay).await;
        Ok(PredictionResult {
            values: vec![0.9; 30],
        })
    }
}

pub struct FailingDelegate;

#[async_trait]
impl PredictionDelegate for FailingDelegate {
    async fn submit(&self, task: TaskDescriptor) -> Result<PredictionResult, DelegateError> {
        Err(DelegateError::Failed(format!(
            "{} worker crashed",
            task.task_type
        )))
    }
}

// ============================================================================
// Cache
// ============================================================================

/// In-memory cache that counts hits and writes
#[derive(Default)]
pub struct CountingCache {
    inner: InMemoryScoreCache,
    hits: AtomicUsize,
    writes: AtomicUsize,
}

impl CountingCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScoreCache for CountingCache {
    async fn get(&self, key: &str) -> Option<Value> {
        let value = self.inner.get(key).await;
        if value.is_some() {
            self.hits.fetch_add(1, Ordering::SeqCst);
        }
        value
    }

    async fn set(&self, key: &str, value: Value, ttl: Duration) {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.set(key, value, ttl).await;
    }
}
