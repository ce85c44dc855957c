//! Error types for `sitekit-client`.
//!
//! Every failure a controller can hit ends up as one of these, and every one
//! of them is eventually rendered as plain status text. Nothing here carries
//! the access token.

/// Errors from a single backend round trip.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The server answered with a non-2xx status.
    #[error("server returned HTTP {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Http {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the error body (`detail` or `message`), if any.
        message: Option<String>,
    },

    /// The request never completed (connection refused, reset, DNS, TLS).
    #[error("request failed: {0}")]
    Transport(String),

    /// The configured request timeout elapsed.
    #[error("request timed out")]
    Timeout,

    /// The response body was not the JSON shape the endpoint promises.
    #[error("malformed response body: {0}")]
    Decode(String),

    /// The request body could not be built.
    #[error("failed to encode request body: {0}")]
    Encode(String),

    /// An authenticated endpoint was called without a stored token.
    #[error("endpoint {path} requires a bearer token")]
    MissingToken {
        /// Path of the endpoint that was refused.
        path: &'static str,
    },
}

impl ApiError {
    /// Server-supplied message for HTTP errors, `None` for everything else.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Http { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// Server-supplied message, falling back to the status reason phrase
    /// (e.g. `Payload Too Large`) for HTTP errors without a body.
    pub fn message_or_status_text(&self) -> Option<String> {
        match self {
            Self::Http { status, message } => message.clone().or_else(|| {
                reqwest::StatusCode::from_u16(*status)
                    .ok()
                    .and_then(|s| s.canonical_reason())
                    .map(str::to_owned)
            }),
            _ => None,
        }
    }
}

/// Errors from reading or writing the client-side session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The session file exists but could not be read.
    #[error("failed to read session from '{path}': {reason}")]
    Read { path: String, reason: String },

    /// The session file could not be written.
    #[error("failed to write session to '{path}': {reason}")]
    Write { path: String, reason: String },

    /// The session file is not a JSON object of strings.
    #[error("session file '{path}' is corrupt: {reason}")]
    Corrupt { path: String, reason: String },

    /// The cached user record could not be (de)serialized.
    #[error("cached user record is not valid JSON: {0}")]
    UserRecord(#[from] serde_json::Error),
}

/// Outcome of the admin gate when access is refused.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    /// No token is stored; the caller must go to the login page.
    #[error("not logged in, redirect to {to}")]
    Redirect { to: &'static str },

    /// The session store itself failed.
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Errors from building a [`ClientConfig`](crate::ClientConfig) or HTTP client.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The base URL is empty or not http(s).
    #[error("invalid base url '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// `SITEKIT_TIMEOUT_SECS` is not a whole number of seconds.
    #[error("invalid timeout '{value}': expected whole seconds")]
    InvalidTimeout { value: String },

    /// The underlying HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Umbrella error for controller callbacks and callers that mix layers.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Gate(#[from] GateError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The server answered 2xx but reported `success: false`.
    #[error("request rejected: {message}")]
    Rejected { message: String },
}

impl ClientError {
    /// The message the server gave for a refusal, if there was one.
    ///
    /// Covers both an explicit `success: false` and an HTTP error with a body.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Rejected { message } => Some(message),
            Self::Api(api) => api.server_message(),
            _ => None,
        }
    }

    /// Whether the server produced a response at all (as opposed to a
    /// transport, decode, or local failure).
    pub fn is_server_refusal(&self) -> bool {
        matches!(self, Self::Rejected { .. } | Self::Api(ApiError::Http { .. }))
    }
}
