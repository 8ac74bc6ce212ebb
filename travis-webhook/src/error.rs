//! Error types for each stage of the relay.
//!
//! None of these ever reach the webhook sender; they exist so the handler
//! can log precisely what went wrong and tests can assert on it.

use thiserror::Error;

/// Startup configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable missing or empty.
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    /// Environment variable is not a valid URL.
    #[error("invalid URL in {name}: {source}")]
    InvalidUrl {
        name: &'static str,
        #[source]
        source: url::ParseError,
    },
}

/// Reasons a webhook signature is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("signature header missing")]
    MissingSignature,

    #[error("signature is not valid base64")]
    MalformedSignature,

    /// Network failure or non-success status from the key service.
    #[error("public key fetch failed: {0}")]
    KeyFetch(String),

    #[error("key service returned malformed JSON: {0}")]
    MalformedKeyResponse(String),

    #[error("key service response has no public key")]
    MissingKey,

    #[error("public key is not a valid PEM key: {0}")]
    MalformedKey(String),

    #[error("signature does not match payload")]
    Mismatch,
}

/// Failures posting the chat card.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("chat webhook returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
}
