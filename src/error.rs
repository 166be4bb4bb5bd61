//! Error types, classified by how callers recover:
//!
//! - Gateway failures on load paths are logged and degrade to empty
//!   collections — "no data" is a normal state, never fatal.
//! - Store-reported rejections (`success: false`) surface as a notice and
//!   leave in-memory state untouched.
//! - Ingest failures abort the upload workflow before anything persists.
//! - Validation failures abort a directory edit before any network call.

use thiserror::Error;

/// Failures talking to the remote sheet store.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("request failed: {0}")]
    Network(String),

    #[error("malformed response: {0}")]
    InvalidResponse(String),

    /// The backend answered, with `success: false`. The payload message is
    /// user-facing.
    #[error("{0}")]
    Rejected(String),

    #[error("invalid API URL: {0}")]
    BadUrl(String),
}

impl GatewayError {
    /// Transient errors are worth retrying on the next poll tick;
    /// everything else needs a config or backend fix.
    pub fn is_transient(&self) -> bool {
        matches!(self, GatewayError::Network(_))
    }
}

/// Failures decoding or shaping an uploaded attendance workbook.
/// All of them are fatal to the upload: nothing is persisted after one.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("could not decode workbook: {0}")]
    Decode(String),

    #[error("workbook has no sheets")]
    NoSheet,

    #[error("missing required column: {0}")]
    MissingColumn(&'static str),

    #[error("no rows with a retained attendance status")]
    NoRetainedRows,
}

/// Upload workflow failure: either the workbook never parsed (nothing
/// was sent) or the store rejected the persistence step.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error(transparent)]
    Ingest(#[from] IngestError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Directory/interview edit failure: rejected before the network by
/// validation, or by the store afterwards.
#[derive(Debug, Error)]
pub enum EditError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Pre-network validation of a directory edit.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("name is required")]
    NameRequired,

    #[error("main venue {0} has no profile URL")]
    MainVenueWithoutUrl(&'static str),

    #[error("priority tier requires a main venue")]
    PriorityWithoutMainVenue,
}
