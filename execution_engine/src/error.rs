use thiserror::Error;
use types::primitives::ExecutionBlockHash;

/// Failures reported by an execution engine.
///
/// Transient errors mean the engine could not give an answer and the call may be retried.
/// Only [`EngineError::InvalidPayload`] is a verdict on the payload itself.
#[derive(Clone, PartialEq, Eq, Debug, Error)]
pub enum EngineError {
    #[error("execution engine is temporarily unavailable: {message}")]
    Transient { message: String },
    #[error("execution payload {block_hash:?} is invalid: {reason}")]
    InvalidPayload {
        block_hash: ExecutionBlockHash,
        reason: String,
    },
}

impl EngineError {
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }
}
