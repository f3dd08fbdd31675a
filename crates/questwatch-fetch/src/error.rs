//! Fetch error types.

use thiserror::Error;

/// Errors raised while fetching the tracked page.
///
/// Both variants are cycle-fatal: the cycle aborts before extraction and
/// the failure is reported through the alert channel.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure (DNS, TLS, timeout, connection)
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered, but not with a success status
    #[error("received invalid status code {status} from {url}")]
    Status {
        /// HTTP status code
        status: u16,
        /// URL that answered
        url: String,
    },
}

/// Result type alias for fetch operations.
pub type Result<T> = std::result::Result<T, FetchError>;
