//! Error types for calls against the Moira API.

/// Errors that can occur while talking to the Moira API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a response (connection refused, timeout, TLS).
    #[error("Request to {url} failed: {source}")]
    Transport {
        /// The URL that was requested.
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The API answered with a non-success status code.
    #[error("HTTP {status} from {url}")]
    Status {
        /// The URL that was requested.
        url: String,
        /// The HTTP status code.
        status: u16,
        /// The raw response body.
        body: String,
    },

    /// The response body was not the JSON document we expected.
    #[error("Invalid JSON in response: {message}")]
    InvalidJson {
        /// Parser message.
        message: String,
        /// The raw response body.
        body: String,
    },

    /// The response was valid JSON but lacked a required key.
    #[error("Invalid API response: {message}")]
    ResponseStructure {
        /// What was missing or unexpected.
        message: String,
        /// The raw response body.
        body: String,
    },

    /// The HTTP client could not be constructed from the configuration.
    #[error("Unable to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    /// The configured API URL cannot be used.
    #[error("Invalid API url: {0}")]
    InvalidUrl(String),

    /// An auth header name or value is not a valid HTTP header.
    #[error("Invalid auth header {name}: {message}")]
    InvalidHeader {
        /// Header name as configured.
        name: String,
        /// Why it was rejected.
        message: String,
    },
}

impl ApiError {
    /// Creates a new `InvalidJson` error.
    #[must_use]
    pub fn invalid_json(message: impl Into<String>, body: impl Into<String>) -> Self {
        Self::InvalidJson {
            message: message.into(),
            body: body.into(),
        }
    }

    /// Creates a new `ResponseStructure` error.
    #[must_use]
    pub fn response_structure(message: impl Into<String>, body: impl Into<String>) -> Self {
        Self::ResponseStructure {
            message: message.into(),
            body: body.into(),
        }
    }

    /// Stable category name, reported as `failed.error`.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "TransportError",
            Self::Status { .. } => "ResponseStatusError",
            Self::InvalidJson { .. } => "InvalidJsonError",
            Self::ResponseStructure { .. } => "ResponseStructureError",
            Self::ClientBuild(_) | Self::InvalidUrl(_) | Self::InvalidHeader { .. } => {
                "ClientConfigError"
            }
        }
    }

    /// Raw response text, when the error came back from the server.
    #[must_use]
    pub fn response_body(&self) -> Option<&str> {
        match self {
            Self::Status { body, .. }
            | Self::InvalidJson { body, .. }
            | Self::ResponseStructure { body, .. } => Some(body),
            Self::Transport { .. }
            | Self::ClientBuild(_)
            | Self::InvalidUrl(_)
            | Self::InvalidHeader { .. } => None,
        }
    }
}

/// Result type for Moira API calls.
pub type ApiResult<T> = Result<T, ApiError>;
