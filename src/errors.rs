//! Error and validation-outcome types shared across the crate. Token
//! validation failures are typed so callers can distinguish "the backend
//! rejected this credential" from "the backend could not be reached";
//! routing treats both as not authenticated.

use std::fmt;

/// Maximum number of error body characters surfaced to callers.
const MAX_ERROR_CHARS: usize = 200;

#[derive(Clone, Debug)]
pub enum ApiError {
    Config(String),
    Network(String),
    Timeout(String),
    Http { status: u16, message: String },
    /// The backend answered 2xx but the response envelope carried
    /// `"status": "error"`.
    Backend(String),
    Parse(String),
    Serialization(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Config(message) => write!(formatter, "Config error: {message}"),
            ApiError::Network(message) => write!(formatter, "Network error: {message}"),
            ApiError::Timeout(message) => write!(formatter, "Timeout: {message}"),
            ApiError::Http { status, message } => {
                write!(formatter, "Request failed ({status}): {message}")
            }
            ApiError::Backend(message) => write!(formatter, "Backend error: {message}"),
            ApiError::Parse(message) => write!(formatter, "Response error: {message}"),
            ApiError::Serialization(message) => write!(formatter, "Request error: {message}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    /// Whether this error means the backend examined the credential and
    /// rejected it, as opposed to the backend being unreachable or broken.
    ///
    /// Auth middlewares answer 401/403; some deployments also report token
    /// problems inside a 200 envelope, so the message is checked as well.
    #[must_use]
    pub fn is_auth_rejection(&self) -> bool {
        match self {
            ApiError::Http { status, message } => {
                matches!(*status, 401 | 403) || message_names_token(message)
            }
            ApiError::Backend(message) => message_names_token(message),
            _ => false,
        }
    }

    /// Whether the failure is transport-level: the request never produced a
    /// usable answer from the backend.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Network(_) | ApiError::Timeout(_))
    }
}

fn message_names_token(message: &str) -> bool {
    let lowered = message.to_lowercase();
    lowered.contains("token is expired")
        || lowered.contains("invalid token")
        || lowered.contains("authentication failed")
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout("Request timed out. Please try again.".to_string())
        } else if err.is_connect() || err.is_request() {
            ApiError::Network(format!("Unable to reach the server: {err}"))
        } else if err.is_decode() {
            ApiError::Parse(format!("Failed to decode response: {err}"))
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

/// Sanitizes HTTP error bodies for user-facing messages by trimming and truncating.
pub(crate) fn sanitize_body(body: String) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "Request failed.".to_string()
    } else {
        trimmed.chars().take(MAX_ERROR_CHARS).collect()
    }
}

/// Outcome of probing the stored access token against the backend.
///
/// `Invalid` means the credential was examined and rejected: local teardown
/// is warranted. `NetworkError` means the backend never gave an answer; the
/// session fails closed for routing but stored tokens are kept so a later
/// probe can retry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenValidity {
    Valid,
    Invalid,
    NetworkError,
}

impl TokenValidity {
    #[must_use]
    pub fn is_valid(self) -> bool {
        matches!(self, TokenValidity::Valid)
    }
}
