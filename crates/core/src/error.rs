//! Error types for the TickerLens domain.
//!
//! Uses `thiserror` for ergonomic error definitions. Each bounded context
//! has its own error type.

use thiserror::Error;

/// A transport or service fault from a single request to the model endpoint.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed response body: {0}")]
    MalformedResponse(String),
}

/// How a provider fault should be treated by a retrying caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultClass {
    /// The endpoint asked us to slow down (HTTP 429).
    RateLimit,
    /// The request never completed (DNS, connect, reset, timeout).
    Connection,
    /// The service failed (5xx, or an unreadable success body).
    Server,
    /// The request itself was rejected (4xx other than 429).
    Client,
}

impl ProviderError {
    /// Classify this fault.
    pub fn class(&self) -> FaultClass {
        match self {
            Self::RateLimited { .. } => FaultClass::RateLimit,
            Self::ApiError { status_code: 429, .. } => FaultClass::RateLimit,
            Self::ApiError { status_code, .. } if *status_code >= 500 => FaultClass::Server,
            Self::ApiError { .. } => FaultClass::Client,
            Self::Network(_) | Self::Timeout(_) => FaultClass::Connection,
            Self::MalformedResponse(_) => FaultClass::Server,
            Self::AuthenticationFailed(_) | Self::ModelNotFound(_) | Self::NotConfigured(_) => {
                FaultClass::Client
            }
        }
    }

    /// Whether another attempt could succeed.
    pub fn is_retryable(&self) -> bool {
        self.class() != FaultClass::Client
    }
}

/// A fatal outcome of a model invocation. Both variants stop the run.
#[derive(Debug, Clone, Error)]
pub enum InvokeError {
    /// The endpoint rejected the request; retrying cannot help.
    #[error("non-retryable rejection on attempt {attempt}: {source}")]
    Rejected {
        attempt: u32,
        #[source]
        source: ProviderError,
    },

    /// Every attempt ended in a retryable transport or service fault.
    #[error("no retries left after {attempts} attempts, last error: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: ProviderError,
    },
}

impl InvokeError {
    /// The provider fault that ended the invocation.
    pub fn last_error(&self) -> &ProviderError {
        match self {
            Self::Rejected { source, .. } | Self::RetriesExhausted { source, .. } => source,
        }
    }
}
