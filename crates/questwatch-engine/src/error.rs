//! Cycle error types.
//!
//! Only cycle-fatal conditions appear here. Everything recoverable is
//! absorbed inside the cycle and surfaced through
//! [`CycleOutcome::soft_errors`](crate::CycleOutcome).

use questwatch_extract::ParseError;
use thiserror::Error;

/// Fatal errors that abort a reconciliation cycle.
///
/// All of them signal that the source page's format changed, and all are
/// reported through the same alert channel as watch-list alerts, under a
/// distinct subject.
#[derive(Debug, Error)]
pub enum CycleError {
    /// The quest-listing anchor phrase is absent from the page
    #[error("quest listing anchor not found in page body")]
    ListingNotFound,

    /// The listing span was located but does not decode
    #[error("quest listing block failed to parse: {0}")]
    ListingParse(#[from] ParseError),

    /// The listing decoded but does not have the expected shape
    #[error("quest listing block is malformed: {0}")]
    ListingFormat(String),
}

/// Result type alias for cycle operations.
pub type Result<T> = std::result::Result<T, CycleError>;
