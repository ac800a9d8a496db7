//! Error types for the lessonlens library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`LessonLensError`] — **Fatal for the current action**: the assessment
//!   cannot proceed at all (unreadable upload, credential list unavailable,
//!   every generation attempt failed). Returned as `Err(LessonLensError)`
//!   from the top-level `assess*` functions and shown to the user directly.
//!
//! * [`AttemptError`] — **Non-fatal**: a single (credential, model) attempt
//!   failed. The fallback sweep logs it and moves on to the next combination;
//!   only when every combination has failed does the sweep surface a
//!   [`LessonLensError::Exhausted`] carrying the last attempt's message.
//!
//! The separation keeps "try next" control flow out of the error channel:
//! an attempt failure is a value the sweep consumes, not an exception that
//! escapes to the caller.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the lessonlens library.
///
/// Attempt-level failures use [`AttemptError`] and stay inside the
/// fallback sweep rather than being propagated here.
#[derive(Debug, Error)]
pub enum LessonLensError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Lesson plan not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// Neither the magic bytes nor the filename identify a PDF or Word file.
    #[error("Unsupported document format for '{hint}': only PDF and Word (.docx) are accepted")]
    UnsupportedFormat { hint: String },

    /// The PDF text layer could not be extracted.
    #[error("Failed to read PDF content: {detail}")]
    PdfRead { detail: String },

    /// The .docx package could not be opened or parsed.
    #[error("Failed to read Word content: {detail}")]
    DocxRead { detail: String },

    /// Extraction succeeded but produced no text to assess.
    #[error("The document contains no extractable text (scanned images are not supported)")]
    EmptyDocument,

    // ── Credential errors ─────────────────────────────────────────────────
    /// The share link does not embed a resource identifier.
    #[error("Credential share link is malformed: '{url}'\nExpected a '/d/<id>/' segment.")]
    BadShareLink { url: String },

    /// The credential download request failed at the network level.
    #[error("Failed to download the credential list: {reason}\nCheck your internet connection.")]
    KeyFetchFailed { reason: String },

    /// The credential host answered with a non-success status.
    #[error("Credential download rejected (HTTP {status})")]
    KeyFetchStatus { status: u16 },

    /// The fetched body is not a JSON array of strings.
    #[error("Credential file has the wrong shape: {detail}\nExpected a JSON array of key strings.")]
    KeyListInvalid { detail: String },

    /// The fetched array parses but holds no credentials.
    #[error("Credential file is empty — nothing to authenticate with")]
    KeyListEmpty,

    // ── Generation errors ─────────────────────────────────────────────────
    /// Every credential × model combination failed.
    #[error("All {attempts} generation attempts failed.\nLast error: {last_error}")]
    Exhausted { attempts: usize, last_error: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write the exported report file.
    #[error("Failed to write report file '{path}': {source}")]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The in-memory .docx package could not be assembled.
    #[error("Failed to build the Word report: {detail}")]
    DocxWrite { detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// A non-fatal error for a single (credential, model) generation attempt.
///
/// Consumed by the fallback sweep; the overall assessment continues unless
/// every attempt fails.
#[derive(Debug, Clone, Error)]
pub enum AttemptError {
    /// The API answered with an error status or error body.
    #[error("API error: {message}")]
    Api { message: String },

    /// The request never produced an HTTP response.
    #[error("network error: {detail}")]
    Network { detail: String },

    /// A 2xx response carried no candidate text.
    #[error("response contained no generated text")]
    EmptyBody,
}
