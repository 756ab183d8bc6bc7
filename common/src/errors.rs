//! Error taxonomy shared by every backend and the transfer pipeline
//!
//! Transient network failures are retried inside the request layer and only
//! surface here (as [`TransferError::Network`]) once retries are exhausted.
//! Every other variant aborts the affected transfer; none of them may lead to
//! a commit call for that object.

/// Error type for all transfer, stat and glob operations.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    /// The stat/glob target does not resolve.
    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed credential, e.g. an account key that is not valid base64.
    #[error("auth configuration error: {0}")]
    AuthConfig(String),

    /// Block count or block size out of provider bounds.
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    /// Network failure that persisted after the retry layer gave up.
    #[error("network error: {0}")]
    Network(String),

    /// Non-2xx response after retries, or a malformed response body.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Local read/write failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Operation the backend does not implement (e.g. blob download).
    #[error("unsupported: {0}")]
    Unsupported(&'static str),
}

impl TransferError {
    /// Failure of one block upload, identified by object and ordinal.
    pub fn block(name: &str, ordinal: usize, detail: impl std::fmt::Display) -> Self {
        TransferError::Protocol(format!("block {ordinal} of {name:?}: {detail}"))
    }
}
