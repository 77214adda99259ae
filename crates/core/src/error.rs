use serde::Serialize;

/// One failed value in a measurement batch.
///
/// Batch submissions collect every per-parameter failure before rejecting,
/// so the caller sees the complete picture in a single response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValueIssue {
    /// Parameter code the issue applies to (or the submitted code verbatim
    /// when it does not resolve to a known parameter).
    pub parameter: String,
    /// Human-readable description of what was wrong with the value.
    pub message: String,
}

impl ValueIssue {
    pub fn new(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            parameter: parameter.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    /// A measurement batch failed validation. Carries every per-parameter
    /// issue; no partial snapshot set exists when this is returned.
    #[error("Validation failed for {} parameter value(s)", .0.len())]
    BatchValidation(Vec<ValueIssue>),

    /// A data-setup problem (e.g. an enum parameter without a verdict
    /// mapping). Never downgraded to a passing status.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// An illegal lifecycle transition, naming current and requested stage.
    #[error("Illegal transition from '{current}' to '{requested}'")]
    State { current: String, requested: String },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
