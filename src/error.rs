//! Error types for the pdf-quizgen library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`QuizGenError`] — **Boundary**: something failed at the edge of the
//!   crate (bad configuration, unreadable local file, a remote service that
//!   could not be reached or answered with garbage). Returned as
//!   `Err(QuizGenError)` from the pipeline functions and the
//!   [`crate::client::QuizBackend`] implementations.
//!
//! * [`StageError`] — **Recorded**: a pipeline stage failed for the current
//!   session. It never propagates; the session stores it so the presentation
//!   layer can show a notice and the user can retry.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// All boundary errors returned by the pdf-quizgen library.
#[derive(Debug, Error)]
pub enum QuizGenError {
    // ── Local file errors ─────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists but could not be read.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Remote service errors ─────────────────────────────────────────────
    /// The request could not be sent or the body could not be read.
    #[error("Request to '{endpoint}' failed: {reason}")]
    RequestFailed { endpoint: String, reason: String },

    /// The configured per-request timeout elapsed.
    #[error("Request to '{endpoint}' timed out after {secs}s")]
    RequestTimeout { endpoint: String, secs: u64 },

    /// The service answered with a non-success status.
    #[error("'{endpoint}' answered HTTP {status}")]
    HttpStatus { endpoint: String, status: u16 },

    /// The body did not match the expected JSON contract.
    #[error("Invalid response from '{endpoint}': {detail}")]
    InvalidResponse { endpoint: String, detail: String },

    /// The generation service returned no questions.
    #[error("'{endpoint}' returned an empty quiz")]
    EmptyQuiz { endpoint: String },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A stage failure recorded in the session state.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum StageError {
    /// Text extraction failed for the current file.
    #[error("Text extraction failed: {detail}")]
    ExtractionFailed { detail: String },

    /// Quiz generation failed for the current passage.
    #[error("Quiz generation failed: {detail}")]
    GenerationFailed { detail: String },
}

impl StageError {
    pub fn extraction(err: &QuizGenError) -> Self {
        StageError::ExtractionFailed {
            detail: err.to_string(),
        }
    }

    pub fn generation(err: &QuizGenError) -> Self {
        StageError::GenerationFailed {
            detail: err.to_string(),
        }
    }
}
