//! Shared error taxonomy for the Switchboard crates.
//!
//! - `SwitchboardError`: every failure the parser, factory, adapters and
//!   attachment formatter can produce
//! - `Result`: convenience alias used throughout

/// Unified error type for all Switchboard subsystems.
#[derive(Debug, thiserror::Error)]
pub enum SwitchboardError {
    // === Specification Errors ===
    #[error("{0}")]
    InvalidSpecification(String),

    #[error("{operation} not supported for {provider} models yet.")]
    UnsupportedOperation { provider: String, operation: String },

    #[error("Environment variable {name} is not set")]
    MissingEnvVar { name: String },

    // === LLM Provider Errors ===
    #[error("Authentication failed for provider {provider}")]
    AuthError { provider: String },

    #[error("Rate limited by {provider}, retry after {retry_after_ms}ms")]
    RateLimited {
        provider: String,
        retry_after_ms: u64,
    },

    #[error("Provider {provider} returned HTTP {status}: {message}")]
    ProviderError {
        provider: String,
        status: u16,
        message: String,
    },

    // === Generic ===
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SwitchboardError {
    /// Shorthand for an [`InvalidSpecification`](Self::InvalidSpecification) error.
    pub fn invalid(message: impl Into<String>) -> Self {
        SwitchboardError::InvalidSpecification(message.into())
    }

    /// Returns `true` for errors raised while resolving configuration, before
    /// any provider was contacted.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            SwitchboardError::InvalidSpecification(_)
                | SwitchboardError::UnsupportedOperation { .. }
                | SwitchboardError::MissingEnvVar { .. }
        )
    }

    /// Maps the error to an HTTP status code for callers that serve uploads.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            SwitchboardError::InvalidSpecification(_) => Some(400),
            SwitchboardError::UnsupportedOperation { .. } => Some(501),
            SwitchboardError::RateLimited { .. } => Some(429),
            SwitchboardError::AuthError { .. } => Some(401),
            SwitchboardError::ProviderError { status, .. } if *status != 0 => Some(*status),
            SwitchboardError::ProviderError { .. } => Some(502),
            _ => None,
        }
    }
}

/// A convenience alias for `Result<T, SwitchboardError>`.
pub type Result<T> = std::result::Result<T, SwitchboardError>;
