use thiserror::Error;

/// Type alias for Result with ReportError
pub type Result<T> = std::result::Result<T, ReportError>;

/// Error types for the report downloader
#[derive(Error, Debug)]
pub enum ReportError {
    /// Gmail API returned an error
    #[error("Gmail API error: {0}")]
    ApiError(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    AuthError(String),

    /// The authorization server rejected the token request. Distinct from
    /// AuthError so recovery can target the cached token specifically.
    #[error("Token rejected: {0}")]
    TokenRejected(String),

    /// Configuration document missing, malformed, or invalid
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Subject line did not match an expected pattern
    #[error("Classification error: {0}")]
    ClassificationError(String),

    /// Attachment fetch or write failed
    #[error("Transfer error: {0}")]
    TransferError(String),

    /// Rate limit exceeded - should retry after specified seconds
    #[error("Rate limit exceeded, retry after {retry_after} seconds")]
    RateLimitExceeded { retry_after: u64 },

    /// Network-related error (connection issues, timeouts, etc.)
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Server returned 5xx error
    #[error("Server error (HTTP {status}): {message}")]
    ServerError { status: u16, message: String },

    /// Resource not found (404)
    #[error("Message not found: {0}")]
    MessageNotFound(String),

    /// Bad request (400)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Forbidden (403)
    #[error("Access forbidden: {0}")]
    Forbidden(String),

    /// Invalid message format or parsing error
    #[error("Invalid message format: {0}")]
    InvalidMessageFormat(String),

    /// IO error (file operations, etc.)
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Generic catch-all error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl ReportError {
    /// Check if the error is transient and should be retried
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ReportError::RateLimitExceeded { .. }
                | ReportError::ServerError { .. }
                | ReportError::NetworkError(_)
        )
    }

    /// Check if the error is permanent and should not be retried
    pub fn is_permanent(&self) -> bool {
        !self.is_transient()
    }
}

/// Parse the Retry-After header from an HTTP response.
///
/// Only the delay-seconds form is handled; a missing or unparseable header
/// falls back to a default of 5 seconds.
fn parse_retry_after_header<B>(response: &hyper::Response<B>) -> u64 {
    const DEFAULT_RETRY_AFTER: u64 = 5;

    response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER)
}

impl From<google_gmail1::Error> for ReportError {
    fn from(error: google_gmail1::Error) -> Self {
        match error {
            // HTTP response with status code (non-success responses)
            google_gmail1::Error::Failure(ref response) => {
                let status = response.status();
                let status_code = status.as_u16();
                let message = format!(
                    "HTTP {}: {}",
                    status_code,
                    status.canonical_reason().unwrap_or("Unknown")
                );

                match status_code {
                    // Rate limiting - transient
                    429 => {
                        let retry_after = parse_retry_after_header(response);
                        ReportError::RateLimitExceeded { retry_after }
                    }
                    // Not found
                    404 => ReportError::MessageNotFound("Resource not found".to_string()),
                    // Bad request
                    400 => ReportError::BadRequest(message),
                    // Forbidden
                    403 => ReportError::Forbidden(message),
                    // Server errors - transient
                    500..=599 => ReportError::ServerError {
                        status: status_code,
                        message,
                    },
                    // Other non-success status codes
                    _ => ReportError::ApiError(message),
                }
            }
            // BadRequest variant (request not understood by server)
            google_gmail1::Error::BadRequest(ref err) => {
                ReportError::BadRequest(format!("{}", err))
            }
            // Network/connection errors - transient
            google_gmail1::Error::HttpError(ref err) => {
                ReportError::NetworkError(format!("Connection error: {}", err))
            }
            // IO errors - transient
            google_gmail1::Error::Io(err) => ReportError::NetworkError(err.to_string()),
            // All other errors
            _ => ReportError::ApiError(error.to_string()),
        }
    }
}
