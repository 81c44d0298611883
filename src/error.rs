// Error taxonomy shared by the provider adapters, the aggregator and the retry executor

use serde::Serialize;
use thiserror::Error;

// Failures of a single provider call
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timeout: {0}")]
    Timeout(String),

    #[error("HTTP error: status {status}")]
    Http { status: u16 },

    #[error("Decode error for {context}: {reason}")]
    Decode { context: String, reason: String },

    #[error("Invalid provider configuration: {0}")]
    InvalidConfig(String),
}

impl ProviderError {
    /// Stable machine-readable code attached to reported error records.
    pub fn code(&self) -> String {
        match self {
            ProviderError::Network(_) => "NETWORK".to_string(),
            ProviderError::Timeout(_) => "TIMEOUT".to_string(),
            ProviderError::Http { status } => format!("HTTP_{status}"),
            ProviderError::Decode { .. } => "DECODE".to_string(),
            ProviderError::InvalidConfig(_) => "INVALID_CONFIG".to_string(),
        }
    }
}

// URLs are stripped: provider hostnames must not feed the message classifier
impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return ProviderError::Http {
                status: status.as_u16(),
            };
        }
        let err = err.without_url();
        if err.is_timeout() {
            return ProviderError::Timeout(err.to_string());
        }
        if err.is_decode() {
            return ProviderError::Decode {
                context: "response body".to_string(),
                reason: err.to_string(),
            };
        }
        ProviderError::Network(err.to_string())
    }
}

// Malformed caller input; the message always carries "validation" so it is never retried
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("validation failed for {field}: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// One entry of the exhaustion report: which adapter failed and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderFailure {
    pub provider: String,
    pub reason: String,
}

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("No provider available: no adapters are configured")]
    NoProviderAvailable,

    // Provider names stay out of the message so classification only sees the causes
    #[error("All providers exhausted ({})", join_reasons(.failures))]
    AllProvidersExhausted { failures: Vec<ProviderFailure> },
}

fn join_reasons(failures: &[ProviderFailure]) -> String {
    failures
        .iter()
        .map(|f| f.reason.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// The only error shape that may reach an end user.
///
/// Carries no source and no internal detail: the variant is picked from the
/// final internal error message and the original error is dropped.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserFacingError {
    #[error("Please check your internet connection and try again.")]
    Connectivity,

    #[error("The request is taking longer than expected. Please try again.")]
    SlowResponse,

    #[error("You don't have permission to perform this action.")]
    PermissionDenied,

    #[error("The requested resource could not be found.")]
    NotFound,

    #[error("Please check your input and try again.")]
    InvalidInput,

    #[error("An unexpected error occurred. Please try again or contact support if the problem persists.")]
    Unexpected,
}

impl UserFacingError {
    /// Maps an internal error message onto one of the fixed user messages.
    pub fn from_internal(message: &str) -> Self {
        let message = message.to_lowercase();
        let has = |needle: &str| message.contains(needle);

        if has("network") || has("fetch failed") {
            UserFacingError::Connectivity
        } else if has("timeout") {
            UserFacingError::SlowResponse
        } else if has("unauthorized") || has("403") {
            UserFacingError::PermissionDenied
        } else if has("not found") || has("404") {
            UserFacingError::NotFound
        } else if has("validation") {
            UserFacingError::InvalidInput
        } else {
            UserFacingError::Unexpected
        }
    }
}

// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
