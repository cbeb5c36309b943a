//! Unified error type for data layer
//!
//! Every span/evaluation store reports failures through [`DataError`] so the
//! API layer can sanitize them uniformly.

use thiserror::Error;

/// Unified error type for data layer operations
#[derive(Error, Debug)]
pub enum DataError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed stored or fixture data
    #[error("Invalid data: {0}")]
    InvalidData(#[from] serde_json::Error),

    /// Query timeout
    #[error("Query timeout after {timeout_secs}s on {backend}")]
    Timeout {
        backend: &'static str,
        timeout_secs: u64,
    },

    /// Backend not available.
    ///
    /// The in-memory store never raises this. It is reserved for repository
    /// implementations backed by a remote service that can refuse connections.
    #[error("Backend {backend} is not available: {reason}")]
    BackendUnavailable {
        backend: &'static str,
        reason: String,
    },
}

impl DataError {
    /// Create a timeout error
    pub fn timeout(backend: &'static str, timeout_secs: u64) -> Self {
        Self::Timeout {
            backend,
            timeout_secs,
        }
    }

    /// Create a backend unavailable error
    pub fn backend_unavailable(backend: &'static str, reason: impl Into<String>) -> Self {
        Self::BackendUnavailable {
            backend,
            reason: reason.into(),
        }
    }

    /// Check if this is a connection-related error that might be transient
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::BackendUnavailable { .. }
        )
    }

    /// Get the backend name that generated this error
    pub fn backend(&self) -> &'static str {
        match self {
            Self::Timeout { backend, .. } => *backend,
            Self::BackendUnavailable { backend, .. } => *backend,
            Self::Io(_) | Self::InvalidData(_) => "unknown",
        }
    }
}
