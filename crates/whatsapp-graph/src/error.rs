//! Errors returned by the Graph façade.

use serde::Deserialize;
use thiserror::Error;

/// The body of a non-2xx Graph API response.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphErrorBody {
    /// The structured error payload.
    pub error: GraphErrorDetail,
}

/// The `error` object nested in a Graph API error response.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphErrorDetail {
    /// Human-readable message, verbatim from the provider.
    pub message: String,
    /// Coarse error category string (e.g. `"OAuthException"`).
    #[serde(rename = "type")]
    pub error_type: String,
    /// Numeric error code; drives [`GraphErrorKind`] classification.
    pub code: i64,
    /// Finer-grained subcode, when the provider supplies one.
    pub error_subcode: Option<i64>,
    /// Opaque trace id for support requests.
    pub fbtrace_id: Option<String>,
    /// Additional structured detail (e.g. blocked-user specifics).
    pub error_data: Option<serde_json::Value>,
}

/// Closed classification of a [`GraphErrorDetail::code`], derived from the
/// numeric ranges Meta documents for the Cloud API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphErrorKind {
    /// Access token invalid, expired, or missing required permission.
    Authentication,
    /// Application hit a rate limit.
    RateLimit,
    /// The token's permissions don't cover the requested action.
    Permission,
    /// A request parameter was invalid or missing.
    InvalidParameter,
    /// Media upload/download specific failure.
    MediaUpload,
    /// Template create/update/delete specific failure.
    Template,
    /// Flow create/update/delete/deprecate/publish specific failure.
    Flow,
    /// The recipient has blocked the business or opted out.
    BlockedUser,
    /// Anything not covered by a more specific bucket.
    Generic,
}

impl GraphErrorKind {
    /// Classify a numeric Graph API error code.
    #[must_use]
    pub fn from_code(code: i64, subcode: Option<i64>) -> Self {
        match code {
            0 | 190 => Self::Authentication,
            4 | 32 | 613 => Self::RateLimit,
            10 | 200..=299 => Self::Permission,
            100 => match subcode {
                Some(2_494_055 | 2_593_006) => Self::BlockedUser,
                Some(_) => Self::InvalidParameter,
                None => Self::InvalidParameter,
            },
            131_000..=131_999 => Self::MediaUpload,
            132_000..=132_999 => Self::Template,
            133_000..=133_999 => Self::Flow,
            368 => Self::BlockedUser,
            _ => Self::Generic,
        }
    }
}

/// Errors raised by the Graph façade.
#[derive(Error, Debug)]
pub enum GraphError {
    /// The provider returned a structured `{error:{...}}` body.
    #[error("graph API error ({kind:?}, code {code}): {message}")]
    Provider {
        /// Classified error bucket.
        kind: GraphErrorKind,
        /// Provider's numeric code.
        code: i64,
        /// Provider's message, verbatim.
        message: String,
        /// Full structured detail, for callers that need more than the summary.
        detail: GraphErrorDetail,
    },

    /// The response was non-2xx but not a parseable `{error:{...}}` body.
    #[error("HTTP {status}: {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// Could not determine the MIME type or read the asset before upload.
    #[error("media resolution failed: {0}")]
    MediaResolution(String),

    /// Transport-level failure (DNS, TLS, connection reset, timeout).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body was not valid JSON.
    #[error("response decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Local I/O failure while reading a file to upload.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Outbound content violated a boundary limit before the request was sent.
    #[error("validation failed: {0}")]
    Validation(#[from] whatsapp_core::validation::ValidationError),
}

impl GraphError {
    pub(crate) fn from_body(status: u16, body: &str) -> Self {
        match serde_json::from_str::<GraphErrorBody>(body) {
            Ok(parsed) => Self::Provider {
                kind: GraphErrorKind::from_code(parsed.error.code, parsed.error.error_subcode),
                code: parsed.error.code,
                message: parsed.error.message.clone(),
                detail: parsed.error,
            },
            Err(_) => Self::Http {
                status,
                body: body.to_string(),
            },
        }
    }
}
