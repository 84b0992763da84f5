//! Error types for rowfetch
//!
//! This module provides the error handling for the pipeline, including:
//! - Domain-specific error types (Load, Lookup, Notify)
//! - The retryable/terminal split used by the lookup retry policy
//! - Context information (row id, file path, HTTP status)

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for rowfetch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for rowfetch
///
/// This is the primary error type used throughout the library. Each variant includes
/// contextual information to help diagnose issues. Every variant except notification
/// delivery failures (which are logged, never propagated) drives the pipeline into
/// its failed terminal state.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "API_URL")
        key: Option<String>,
    },

    /// Input loading error
    #[error("load error: {0}")]
    Load(#[from] LoadError),

    /// Remote lookup error, terminal after the retry budget is exhausted
    #[error("lookup error: {0}")]
    Lookup(#[from] LookupError),

    /// Failed to persist the aggregated dataset
    #[error("failed to write output '{path}': {source}")]
    Write {
        /// The output path that could not be written
        path: PathBuf,
        /// The underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Input loading errors
#[derive(Debug, Error)]
pub enum LoadError {
    /// Input file could not be opened or parsed as CSV
    #[error("failed to read '{path}': {source}")]
    Read {
        /// The input path that failed to load
        path: PathBuf,
        /// The underlying CSV/I-O failure
        #[source]
        source: csv::Error,
    },

    /// Input has no `id` column
    #[error("input '{path}' has no 'id' column")]
    MissingIdColumn {
        /// The input path missing the column
        path: PathBuf,
    },

    /// A row carries an empty id value
    #[error("row {row} has an empty id")]
    EmptyId {
        /// 1-based data row number (excluding the header)
        row: usize,
    },

    /// Two rows share the same id
    #[error("duplicate id '{id}' at row {row}")]
    DuplicateId {
        /// The id value that appeared twice
        id: String,
        /// 1-based data row number of the second occurrence
        row: usize,
    },
}

/// Remote lookup errors
///
/// `Request` and `Status` are transient and retried by the lookup client;
/// the remaining variants are terminal. A terminal error for any single row
/// aborts the whole run (all-or-nothing aggregation).
#[derive(Debug, Error)]
pub enum LookupError {
    /// Transport-level failure issuing the request (connect, timeout, DNS)
    #[error("lookup request failed for id '{id}': {source}")]
    Request {
        /// The row id being looked up
        id: String,
        /// The underlying transport failure
        #[source]
        source: reqwest::Error,
    },

    /// Endpoint answered with a non-success status
    #[error("lookup for id '{id}' returned status {status}")]
    Status {
        /// The row id being looked up
        id: String,
        /// The HTTP status returned by the endpoint
        status: reqwest::StatusCode,
    },

    /// Success response whose body was not parseable JSON
    #[error("lookup for id '{id}' returned a malformed body: {source}")]
    MalformedBody {
        /// The row id being looked up
        id: String,
        /// The underlying decode failure
        #[source]
        source: reqwest::Error,
    },

    /// Success response whose body parsed but was not a JSON object
    #[error("lookup for id '{id}' did not return a JSON object")]
    NotAnObject {
        /// The row id being looked up
        id: String,
    },

    /// Lookup abandoned after another row failed terminally
    #[error("lookup for id '{id}' was cancelled")]
    Cancelled {
        /// The row id whose lookup was abandoned
        id: String,
    },
}

impl LookupError {
    /// The row id this error is associated with
    pub fn id(&self) -> &str {
        match self {
            LookupError::Request { id, .. }
            | LookupError::Status { id, .. }
            | LookupError::MalformedBody { id, .. }
            | LookupError::NotAnObject { id }
            | LookupError::Cancelled { id } => id,
        }
    }
}

/// Notification delivery errors
///
/// Never wrapped into [`Error`]: the notifier is fire-and-forget, so these
/// are logged by the pipeline and discarded.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Transport-level failure sending the message
    #[error("failed to send notification: {0}")]
    Send(#[from] reqwest::Error),

    /// Channel did not accept the message
    #[error("notification rejected with status {status}")]
    Rejected {
        /// The HTTP status returned by the channel
        status: reqwest::StatusCode,
    },
}
