//! Error types for transport operations.

use std::fmt;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Error type for a single HTTP exchange.
///
/// Describes what went wrong without dictating recovery strategy.
/// The [`Transport`](super::Transport) decides which of these are retried.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Network connection failed.
    ///
    /// This includes DNS resolution failures, connection refused,
    /// and other network-level errors.
    #[error("Connection error: {0}")]
    Connection(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Request timed out.
    ///
    /// The server did not respond within the configured timeout period.
    #[error("Request timed out")]
    Timeout,

    /// The provided URL is invalid.
    ///
    /// This typically indicates a configuration error rather than
    /// a transient failure.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The underlying HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    Setup(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl HttpError {
    /// Returns true for network-level failures worth another attempt.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Connection(_) | Self::Timeout => true,
            Self::InvalidUrl(_) | Self::Setup(_) => false,
        }
    }
}

/// Structured error reported by the Graph API.
///
/// Built from the vendor's `{"error": {...}}` envelope when the body carries
/// one, otherwise from the raw status and body text.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiErrorDetail {
    /// HTTP status of the failed response.
    pub status: http::StatusCode,
    /// Human readable message.
    pub message: String,
    /// Vendor error type (e.g. `OAuthException`).
    pub error_type: Option<String>,
    /// Numeric vendor error code (e.g. 190 for an invalid token).
    pub code: Option<i64>,
    /// Optional vendor subcode.
    pub subcode: Option<i64>,
    /// `fbtrace_id` for support requests.
    pub trace_id: Option<String>,
    /// Additional vendor data (`error_data`), kept verbatim.
    pub error_data: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: VendorError,
}

#[derive(Deserialize)]
struct VendorError {
    message: Option<String>,
    #[serde(rename = "type")]
    error_type: Option<String>,
    code: Option<i64>,
    error_subcode: Option<i64>,
    fbtrace_id: Option<String>,
    error_data: Option<serde_json::Value>,
}

impl ApiErrorDetail {
    /// Vendor code for an invalid or expired access token.
    pub const INVALID_TOKEN_CODE: i64 = 190;

    /// Builds the detail for a failed response.
    #[must_use]
    pub fn from_response(status: http::StatusCode, body: &[u8]) -> Self {
        if let Ok(ErrorEnvelope { error }) = serde_json::from_slice::<ErrorEnvelope>(body) {
            return Self {
                status,
                message: error
                    .message
                    .unwrap_or_else(|| "Unknown API error".to_string()),
                error_type: error.error_type,
                code: error.code,
                subcode: error.error_subcode,
                trace_id: error.fbtrace_id,
                error_data: error.error_data,
            };
        }

        let text = String::from_utf8_lossy(body);
        let message = if text.trim().is_empty() {
            status
                .canonical_reason()
                .map_or_else(|| format!("HTTP {}", status.as_u16()), ToString::to_string)
        } else {
            text.trim().to_string()
        };

        Self {
            status,
            message,
            error_type: None,
            code: None,
            subcode: None,
            trace_id: None,
            error_data: None,
        }
    }

    /// Returns true if the vendor reported a credential problem.
    #[must_use]
    pub fn is_auth_failure(&self) -> bool {
        self.status == http::StatusCode::UNAUTHORIZED
            || self.status == http::StatusCode::FORBIDDEN
            || self.code == Some(Self::INVALID_TOKEN_CODE)
    }
}

impl fmt::Display for ApiErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (status {}", self.message, self.status.as_u16())?;
        if let Some(code) = self.code {
            write!(f, ", code {code}")?;
        }
        if let Some(subcode) = self.subcode {
            write!(f, ", subcode {subcode}")?;
        }
        if let Some(ref trace_id) = self.trace_id {
            write!(f, ", trace {trace_id}")?;
        }
        write!(f, ")")
    }
}

/// Broad failure categories a caller can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Connection, timeout or retryable status; retries were exhausted.
    Transient,
    /// Invalid or expired credentials. Never retried.
    Authentication,
    /// Vendor throttling (HTTP 429) persisted through all retries.
    RateLimit,
    /// Malformed input caught before any network attempt.
    Validation,
    /// A 2xx response whose body was not the expected JSON.
    Parse,
    /// Any other error reported by the API.
    Api,
}

/// Failure outcome of one logical transport call.
///
/// Produced once per call, after internal retries have resolved.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request was rejected before reaching the network.
    #[error("Invalid request: {0}")]
    Validation(String),

    /// A URL could not be built or parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Every attempt failed at the network level.
    #[error("Network failure after {attempts} attempt(s): {source}")]
    Network {
        /// Number of attempts made
        attempts: u32,
        /// Error from the last attempt
        #[source]
        source: HttpError,
    },

    /// The API kept answering 429.
    #[error("Rate limited after {attempts} attempt(s): {detail}")]
    RateLimited {
        /// Number of attempts made
        attempts: u32,
        /// Server-provided `Retry-After`, if any
        retry_after: Option<Duration>,
        /// Vendor error detail
        detail: ApiErrorDetail,
    },

    /// A retryable status persisted through all attempts.
    #[error("Request failed after {attempts} attempt(s): {detail}")]
    RetriesExhausted {
        /// Number of attempts made
        attempts: u32,
        /// Vendor error detail from the last attempt
        detail: ApiErrorDetail,
    },

    /// The API rejected the access token.
    #[error("Authentication failed: {detail}")]
    Authentication {
        /// Vendor error detail
        detail: ApiErrorDetail,
    },

    /// Non-retryable error reported by the API.
    #[error("API error: {detail}")]
    Api {
        /// Vendor error detail
        detail: ApiErrorDetail,
    },

    /// A successful response carried a body that is not a JSON object.
    #[error("Failed to parse response body (status {status}): {source}")]
    Parse {
        /// HTTP status of the response
        status: http::StatusCode,
        /// Underlying JSON error
        #[source]
        source: serde_json::Error,
    },
}

impl TransportError {
    /// Returns the taxonomy bucket of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::InvalidUrl(_) => ErrorKind::Validation,
            Self::Network { .. } | Self::RetriesExhausted { .. } => ErrorKind::Transient,
            Self::RateLimited { .. } => ErrorKind::RateLimit,
            Self::Authentication { .. } => ErrorKind::Authentication,
            Self::Api { .. } => ErrorKind::Api,
            Self::Parse { .. } => ErrorKind::Parse,
        }
    }

    /// Returns the vendor error detail, if the API answered.
    #[must_use]
    pub const fn detail(&self) -> Option<&ApiErrorDetail> {
        match self {
            Self::RateLimited { detail, .. }
            | Self::RetriesExhausted { detail, .. }
            | Self::Authentication { detail }
            | Self::Api { detail } => Some(detail),
            Self::Validation(_) | Self::InvalidUrl(_) | Self::Network { .. } | Self::Parse { .. } => {
                None
            }
        }
    }

    /// Returns the vendor error code, if any.
    #[must_use]
    pub fn code(&self) -> Option<i64> {
        self.detail().and_then(|d| d.code)
    }

    /// Returns the number of attempts for errors that went through retries.
    #[must_use]
    pub const fn attempts(&self) -> Option<u32> {
        match self {
            Self::Network { attempts, .. }
            | Self::RateLimited { attempts, .. }
            | Self::RetriesExhausted { attempts, .. } => Some(*attempts),
            _ => None,
        }
    }
}
