use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("Invalid subject '{subject_id}': {reason}")]
    InvalidSubject { subject_id: String, reason: String },

    #[error("Invalid weight vector: {0}")]
    InvalidWeights(String),

    #[error("Invalid lookback window: {0} days")]
    InvalidLookback(u32),
}

impl ScoringError {
    pub fn invalid_subject(subject_id: &str, reason: impl Into<String>) -> Self {
        ScoringError::InvalidSubject {
            subject_id: subject_id.to_string(),
            reason: reason.into(),
        }
    }
}
