//! Error taxonomy shared across the workspace.
//!
//! Transient embedder/LLM failures are not represented here: those map to
//! `None` returns at the client boundary and never surface as errors.

pub type KbResult<T> = Result<T, KbError>;

#[derive(Debug, thiserror::Error)]
pub enum KbError {
    /// Bad input shape or out-of-set enum value. Surfaced to the caller.
    #[error("validation failed: {message}")]
    Validation { message: String },

    /// Unknown or inactive entry id. Surfaced to the caller.
    #[error("entry {id} not found")]
    NotFound { id: String },

    /// SQLite or serialization failure inside the store.
    #[error("storage error: {message}")]
    Storage { message: String },

    /// Stored data that fails its own invariants (vector dimension
    /// mismatch, malformed JSON properties). The offending step is
    /// skipped; the entry itself remains stored.
    #[error("corrupt data: {details}")]
    Corruption { details: String },
}

impl KbError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn corruption(details: impl Into<String>) -> Self {
        Self::Corruption {
            details: details.into(),
        }
    }
}
