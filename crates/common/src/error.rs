use thiserror::Error;

/// Top-level error type for triage operations.
#[derive(Debug, Error)]
pub enum TriageError {
    // --- Caller-facing conditions (propagate as distinct errors) ---
    #[error("not found: {0}")]
    NotFound(String),

    #[error("no applicable rule for appliance type '{0}'")]
    NoApplicableRule(String),

    #[error("no answers recorded for case {0}")]
    NoAnswers(String),

    // --- External reasoner failures (recovered locally via fallback) ---
    #[error("reasoner unavailable: {0}")]
    ReasonerUnavailable(String),

    #[error("reasoner timed out after {0}s")]
    ReasonerTimeout(u64),

    #[error("reasoner output malformed: {0}")]
    ReasonerOutput(String),

    // --- Operational errors ---
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Internal(String),
}

impl TriageError {
    /// Whether this error came from the external reasoner path.
    /// These are never surfaced to the caller — finalize falls back to the
    /// deterministic rule evaluator instead.
    pub fn is_reasoner(&self) -> bool {
        matches!(
            self,
            Self::ReasonerUnavailable(_) | Self::ReasonerTimeout(_) | Self::ReasonerOutput(_)
        )
    }
}

/// Result type alias for triage operations.
pub type Result<T> = std::result::Result<T, TriageError>;
