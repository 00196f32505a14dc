//! Crate-level error types.

use thiserror::Error;

/// Everything that can end a submission early or fail a save.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("no data received for {0} seconds")]
    IdleTimeout(u64),

    #[error("submission cancelled")]
    Cancelled,

    #[error("a submission is already in progress")]
    SubmissionInProgress,

    #[error("save rejected by server: {0}")]
    SaveRejected(String),

    #[error("save control already used")]
    SaveAlreadyUsed,

    #[error("output error: {0}")]
    Output(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(String),
}

/// Why a structured line record was dropped.
///
/// Unparseable text and well-formed JSON of the wrong shape are kept apart
/// so diagnostics can tell a truncated write from a server-side schema change.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("line is not valid JSON: {0}")]
    Malformed(serde_json::Error),

    #[error("record has the wrong shape: {0}")]
    InvalidShape(serde_json::Error),
}

pub type Result<T, E = StreamError> = std::result::Result<T, E>;
