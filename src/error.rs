//! Error types for the drivebatch library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`DriveBatchError`] — **Fatal**: the run cannot start at all (spreadsheet
//!   missing, schema mismatch, browser failed to launch). Returned as
//!   `Err(DriveBatchError)` from the top-level `run_*` functions before any
//!   row is processed.
//!
//! * [`RowError`] — **Non-fatal**: a single row failed (blank URL, unparseable
//!   share-link, download never settled) but all other rows are fine. Caught
//!   at the row boundary, logged, and tallied in
//!   [`crate::output::RunSummary`] so a run always finishes with a report.
//!
//! The separation lets callers decide their own tolerance: inspect the tally,
//! re-run to pick up the stragglers (output-file presence doubles as the
//! resume checkpoint), or treat any failure as fatal themselves.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the drivebatch library.
///
/// Row-level failures use [`RowError`] and are tallied in
/// [`crate::output::RunSummary`] rather than propagated here.
#[derive(Debug, Error)]
pub enum DriveBatchError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input spreadsheet was not found at the given path.
    #[error("Spreadsheet not found: '{path}'\nCheck the path exists and is readable.")]
    SpreadsheetNotFound { path: PathBuf },

    /// The spreadsheet exists but could not be parsed.
    #[error("Failed to read spreadsheet '{path}': {detail}")]
    SpreadsheetRead { path: PathBuf, detail: String },

    /// The sheet has fewer positional columns than the selected mode expects.
    #[error("Spreadsheet '{path}' has {found} columns, expected at least {expected}")]
    MissingColumns {
        path: PathBuf,
        expected: usize,
        found: usize,
    },

    // ── Environment errors ────────────────────────────────────────────────
    /// An output directory could not be created or resolved.
    #[error("Failed to prepare output directory '{path}': {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The interactive browser session failed to start.
    #[error("Failed to launch browser session: {detail}")]
    BrowserLaunch { detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single spreadsheet row.
///
/// Stored in [`crate::output::RowReport`] when a row fails. The run always
/// continues to the next row.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum RowError {
    /// The URL column is blank; nothing to fetch.
    #[error("no URL provided")]
    MissingUrl,

    /// The code column is blank; nothing to encode.
    #[error("no barcode code provided")]
    MissingCode,

    /// The share-link did not contain a recognisable file identifier.
    #[error("could not extract a file id from '{input}'")]
    ExtractionFailed { input: String },

    /// Browser-level fault: navigation error, dead session, click failure.
    #[error("browser navigation failed: {detail}")]
    Navigation { detail: String },

    /// No settled file appeared in the download directory within the budget.
    #[error("no completed download appeared within {secs}s")]
    PollTimeout { secs: u64 },

    /// The settled download could not be moved to its destination.
    #[error("failed to move '{from}' to '{to}': {detail}")]
    Relocate {
        from: PathBuf,
        to: PathBuf,
        detail: String,
    },

    /// The captioned PDF could not be produced.
    #[error("document composition failed: {detail}")]
    Composition { detail: String },

    /// The barcode symbology rejected the code or the image write failed.
    #[error("barcode generation failed: {detail}")]
    BarcodeEncode { detail: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_columns_display() {
        let e = DriveBatchError::MissingColumns {
            path: PathBuf::from("July.xlsx"),
            expected: 6,
            found: 4,
        };
        let msg = e.to_string();
        assert!(msg.contains("4 columns"), "got: {msg}");
        assert!(msg.contains("at least 6"), "got: {msg}");
    }

    #[test]
    fn spreadsheet_not_found_display() {
        let e = DriveBatchError::SpreadsheetNotFound {
            path: PathBuf::from("missing.xlsx"),
        };
        assert!(e.to_string().contains("missing.xlsx"));
    }

    #[test]
    fn poll_timeout_display() {
        let e = RowError::PollTimeout { secs: 60 };
        assert!(e.to_string().contains("60s"));
    }

    #[test]
    fn extraction_failed_display() {
        let e = RowError::ExtractionFailed {
            input: "not a valid url!!".into(),
        };
        assert!(e.to_string().contains("not a valid url!!"));
    }

    #[test]
    fn relocate_display() {
        let e = RowError::Relocate {
            from: PathBuf::from("/dl/a.jpg"),
            to: PathBuf::from("/out/b.jpg"),
            detail: "cross-device link".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("/dl/a.jpg"));
        assert!(msg.contains("/out/b.jpg"));
    }
}
