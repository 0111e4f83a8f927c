use thiserror::Error;

/// Failure taxonomy for store and loyalty operations. Validation, not-found
/// and insufficient-resource refusals leave state unchanged; callers render
/// them to the invoking user.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("insufficient points: have {have}, need {need}")]
    InsufficientPoints { have: u64, need: u64 },

    #[error("ticket cooldown active, {remaining} remaining")]
    CooldownActive { remaining: chrono::Duration },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        StoreError::Validation(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        StoreError::NotFound(what.into())
    }
}
