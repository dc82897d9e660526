use thiserror::Error;

/// Why a single score record was left out of its entity's statistics.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum InvalidRecordError {
    #[error("max score must be positive, got {max_score}")]
    NonPositiveMax { max_score: f64 },
    #[error("score is not a finite number: {score}")]
    NonFiniteScore { score: f64 },
    #[error("max score is not a finite number: {max_score}")]
    NonFiniteMax { max_score: f64 },
}
