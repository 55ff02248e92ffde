//! # Error Taxonomy
//!
//! Every step returns [`StepResult`]. Failures carry an [`ErrorKind`] so the
//! orchestrator can decide whether to degrade or fail the turn.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Result type for step and collaborator operations
pub type StepResult<T> = Result<T, StepError>;

/// Classification of a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed structured output from a collaborator
    ParseError,
    /// Weather unavailable
    LookupError,
    /// No wardrobe candidates
    RetrievalEmpty,
    /// Language-model call failed
    CompletionError,
    /// Collaborator call exceeded its deadline
    Timeout,
    /// Conversation memory unreachable or corrupt
    ThreadStoreError,
    /// Wardrobe store could not be read
    StoreUnavailable,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ParseError => "parse_error",
            ErrorKind::LookupError => "lookup_error",
            ErrorKind::RetrievalEmpty => "retrieval_empty",
            ErrorKind::CompletionError => "completion_error",
            ErrorKind::Timeout => "timeout",
            ErrorKind::ThreadStoreError => "thread_store_error",
            ErrorKind::StoreUnavailable => "store_unavailable",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure half of a step result
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct StepError {
    pub kind: ErrorKind,
    pub message: String,
}

impl StepError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ParseError, message)
    }

    pub fn lookup(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::LookupError, message)
    }

    pub fn retrieval_empty(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RetrievalEmpty, message)
    }

    pub fn store_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::StoreUnavailable, message)
    }

    pub fn completion(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CompletionError, message)
    }

    pub fn timeout(operation: &str, after: Duration) -> Self {
        Self::new(
            ErrorKind::Timeout,
            format!("{} timed out after {}ms", operation, after.as_millis()),
        )
    }
}

/// Storage failure in the thread store or wardrobe store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("lock poisoned: {0}")]
    Lock(String),

    #[error("corrupt record: {0}")]
    Corrupt(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid seed data: {0}")]
    Seed(#[from] serde_json::Error),
}

/// Turn-level failure. Only these reach the caller as `success: false`.
#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    #[error("thread store failure: {0}")]
    ThreadStore(#[from] StoreError),

    #[error("conversation step failed: {0}")]
    Conversation(StepError),

    #[error("field `{0}` was already written this turn")]
    FieldOverwrite(&'static str),
}

impl TurnError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TurnError::ThreadStore(_) => ErrorKind::ThreadStoreError,
            TurnError::Conversation(e) => e.kind,
            // Invariant breaches are reported like storage corruption.
            TurnError::FieldOverwrite(_) => ErrorKind::ThreadStoreError,
        }
    }

    /// Message safe to show an end user
    pub fn user_message(&self) -> &'static str {
        match self {
            TurnError::Conversation(_) => {
                "Sorry, I couldn't put together a reply just now. Please try again in a moment."
            }
            TurnError::ThreadStore(_) | TurnError::FieldOverwrite(_) => {
                "Sorry, something went wrong on our side while handling your message. Please try again."
            }
        }
    }
}
