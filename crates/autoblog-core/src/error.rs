//! Error taxonomy for the AutoBlog engine.
//!
//! Generation failures are split into transient (retried with backoff inside
//! the generator) and hard (surfaced immediately). Store failures always
//! surface immediately; callers log and retry on the record's next natural
//! write.

use thiserror::Error;

/// All errors produced by AutoBlog components.
#[derive(Debug, Error)]
pub enum AutoblogError {
    /// Upstream generative API is rate-limited or overloaded. Retryable.
    #[error("transient generation error: {0}")]
    TransientGeneration(String),

    /// Any other generation failure (malformed response, timeout, auth).
    /// Not retried.
    #[error("generation error: {0}")]
    HardGeneration(String),

    /// Persistence failure.
    #[error("store error: {0}")]
    Store(String),

    /// Record lookup miss.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Attempted mutation of a slot already in its terminal state.
    #[error("slot {0} is already published")]
    SlotPublished(String),

    /// The single-flight publish guard is held by another pipeline.
    #[error("another generation pipeline is already in flight")]
    Busy,

    /// Configuration file problems.
    #[error("config error: {0}")]
    Config(String),

    /// HTTP transport failure talking to the generative API.
    #[error("http error: {0}")]
    Http(String),
}

impl AutoblogError {
    /// Whether this error is worth an automatic retry with backoff.
    pub fn is_transient(&self) -> bool {
        matches!(self, AutoblogError::TransientGeneration(_))
    }
}

/// Convenience result alias used across all AutoBlog crates.
pub type Result<T> = std::result::Result<T, AutoblogError>;
