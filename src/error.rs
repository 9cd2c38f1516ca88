//! Error types for the generation adapter layer
//!
//! The taxonomy separates "fix your input" failures (`Config`, `Validation`)
//! from transport failures (`Http`, `Network`) and malformed provider output
//! (`ResponseFormat`, `Parse`), so callers can branch on the variant instead
//! of matching on message strings.

use thiserror::Error;

/// Errors produced by adapters, the transport and the streaming decoder.
#[derive(Error, Debug)]
pub enum GenError {
    /// Provider configuration is unusable (missing API key or base URL).
    /// Raised at adapter construction, before any network call.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Request parameters are invalid (missing prompt and reference images,
    /// or missing model). Raised before any network call.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The selected strategy does not offer the requested capability.
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// The provider answered with a non-2xx status.
    #[error("HTTP error {status}: {message}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Response body (or status text when the body could not be read)
        message: String,
    },

    /// The provider answered 2xx but the payload is missing an expected
    /// field, or the result array is empty.
    #[error("Response format error: {0}")]
    ResponseFormat(String),

    /// A 2xx payload that is not valid JSON at all.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Transport-level failure (connection refused, aborted, DNS, TLS).
    #[error("Network error: {0}")]
    Network(String),
}

impl GenError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a response format error.
    pub fn response_format(message: impl Into<String>) -> Self {
        Self::ResponseFormat(message.into())
    }

    /// The HTTP status code, if this error carries one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether retrying the same request later could plausibly succeed.
    ///
    /// Input-shaped errors (`Config`, `Validation`, `UnsupportedOperation`)
    /// are never retryable; the caller has to change something first.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http { status, .. } => matches!(status, 429 | 500 | 502 | 503),
            Self::Network(_) => true,
            _ => false,
        }
    }

    /// A human-readable message with fixed guidance for well-known HTTP
    /// statuses; other errors fall back to their `Display` form.
    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::Http { status, message } => match status {
                401 => "Authentication failed. Check that your API key is valid.".to_string(),
                403 => "Access denied. Your API key may lack permission for this model."
                    .to_string(),
                404 => "Endpoint not found. Check the base URL and model name.".to_string(),
                429 => "Rate limited. Too many requests, try again later.".to_string(),
                500 => "The provider reported an internal error. Try again later.".to_string(),
                502 => "Bad gateway. The provider is temporarily unreachable.".to_string(),
                503 => "Service unavailable. The provider is overloaded, try again later."
                    .to_string(),
                _ => format!("HTTP error {status}: {message}"),
            },
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for GenError {
    fn from(error: reqwest::Error) -> Self {
        if let Some(status) = error.status() {
            Self::Http {
                status: status.as_u16(),
                message: error.to_string(),
            }
        } else {
            Self::Network(error.to_string())
        }
    }
}

impl From<serde_json::Error> for GenError {
    fn from(error: serde_json::Error) -> Self {
        Self::Parse(error.to_string())
    }
}
