//! Error types for the chore engine.

/// Top-level error type for the chore economy engine.
#[derive(Debug, thiserror::Error)]
pub enum ChoreError {
    /// Unknown id for a child, task, category, or shop item.
    #[error("not found: {0}")]
    NotFound(String),

    /// Status change not allowed from the current state.
    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    /// Fastest-wins race lost: another child already completed the task.
    #[error("already claimed: {0}")]
    AlreadyClaimed(String),

    /// Purchase attempt on a deactivated shop item.
    #[error("shop item inactive: {0}")]
    Inactive(String),

    /// Balance too low for the requested debit.
    #[error("insufficient points: have {have}, need {need}")]
    InsufficientPoints {
        /// Current balance.
        have: i64,
        /// Points the operation requires.
        need: i64,
    },

    /// Malformed input (empty name, negative price/points, unknown status).
    #[error("validation error: {0}")]
    Validation(String),

    /// Durable-write fence failure. The mutation was not committed.
    #[error("persist error: {0}")]
    Persist(String),

    /// Configuration load/parse error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, ChoreError>;
