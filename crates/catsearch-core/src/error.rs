//! Error types for the catalog search engine.

use thiserror::Error;

/// Result type alias using SearchError.
pub type Result<T> = std::result::Result<T, SearchError>;

/// Errors that can occur in the search engine.
///
/// Only `Connectivity` is fatal, and only at construction time. Failures
/// during a query (a store call, an embedding call, a timeout) are caught
/// inside the retrievers and degrade to an empty contribution from that
/// source; they never surface through `search()`.
#[derive(Error, Debug)]
pub enum SearchError {
    /// A backing store or the embedding service was unreachable when the
    /// engine was constructed.
    #[error("Connectivity error in {component}: {message}")]
    Connectivity { component: String, message: String },

    /// Lexical or vector store query error.
    #[error("Store error: {message}")]
    Store { message: String },

    /// Embedding generation error.
    #[error("Embedding error: {message}")]
    Embedding { message: String },

    /// Invalid argument provided.
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error (unexpected).
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl SearchError {
    /// Create a connectivity error for a named component.
    pub fn connectivity(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connectivity {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a store error.
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// Create an embedding error.
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding {
            message: message.into(),
        }
    }

    /// Create an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether this error aborts engine startup.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Connectivity { .. } | Self::Config { .. })
    }
}
