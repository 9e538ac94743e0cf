//! Error types for the tracksheet library.
//!
//! Two error types reflect two layers of the pipeline:
//!
//! * [`ParseError`]: the source file could not be turned into a
//!   [`crate::model::RecordSet`]. Every variant is terminal for that attempt
//!   and no partial table is ever returned. Callers present all of them as
//!   one "failed to parse" condition via [`ParseError::user_message`].
//!
//! * [`TracksheetError`]: fatal errors from the orchestration layer
//!   (file access, rendering, writing the report). Wraps [`ParseError`].
//!
//! The layout engine has no error type: missing fields degrade to empty
//! cells and zero durations.

use std::path::PathBuf;
use thiserror::Error;

/// Message shown to end users for any ingestion failure.
pub const PARSE_FAILURE_MESSAGE: &str = "Failed to parse file. Ensure it is well-formed CSV or XML.";

/// Ingestion failures.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The file bytes are not valid UTF-8 text.
    #[error("File '{filename}' is not valid UTF-8 text: {source}")]
    Decode {
        filename: String,
        #[source]
        source: std::str::Utf8Error,
    },

    /// The CSV tokenizer rejected the input.
    #[error("Malformed CSV in '{filename}': {source}")]
    CsvSyntax {
        filename: String,
        #[source]
        source: csv::Error,
    },

    /// The markup parser rejected the input.
    #[error("Malformed XML in '{filename}': {source}")]
    XmlSyntax {
        filename: String,
        #[source]
        source: roxmltree::Error,
    },

    /// Reserved: extension dispatch treats every non-CSV file as XML, so
    /// this is never produced today.
    #[error("Unsupported source format for '{filename}'")]
    UnsupportedFormat { filename: String },
}

impl ParseError {
    /// The single user-facing message for every ingestion failure.
    pub fn user_message(&self) -> &'static str {
        PARSE_FAILURE_MESSAGE
    }
}

/// All fatal errors returned by the tracksheet library.
#[derive(Debug, Error)]
pub enum TracksheetError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Track list not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The source file could not be ingested.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Export was requested for a table with no rows.
    #[error("Nothing to export: '{source_name}' contains no tracks")]
    EmptyRecordSet { source_name: String },

    // ── Rendering errors ──────────────────────────────────────────────────
    /// The configured logo could not be read or decoded.
    #[error("Failed to load logo '{path}': {detail}")]
    LogoUnreadable { path: PathBuf, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
PDF output needs a pdfium shared library. You can:\n\
  • Install pdfium system-wide (libpdfium.so / libpdfium.dylib / pdfium.dll).\n\
  • Set PDFIUM_LIB_PATH=/path/to/dir-containing-libpdfium.\n\
  • Use --format text to skip PDF output entirely.\n"
    )]
    PdfiumBindingFailed(String),

    /// pdfium returned an error while drawing a page.
    #[error("Rendering failed for page {page}: {detail}")]
    RenderFailed { page: usize, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output report file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_parse_error_has_the_same_user_message() {
        let e = ParseError::UnsupportedFormat {
            filename: "tracks.txt".into(),
        };
        assert_eq!(e.user_message(), PARSE_FAILURE_MESSAGE);
        assert!(e.to_string().contains("tracks.txt"));
    }

    #[test]
    fn decode_error_display() {
        let bytes = vec![0xffu8, 0xfe, 0x00];
        let source = String::from_utf8(bytes).unwrap_err().utf8_error();
        let e = ParseError::Decode {
            filename: "side-a.xml".into(),
            source,
        };
        assert!(e.to_string().contains("side-a.xml"), "got: {e}");
    }

    #[test]
    fn parse_error_is_transparent_at_top_level() {
        let inner = ParseError::UnsupportedFormat {
            filename: "x.bin".into(),
        };
        let msg = inner.to_string();
        let outer: TracksheetError = inner.into();
        assert_eq!(outer.to_string(), msg);
    }

    #[test]
    fn render_failed_display() {
        let e = TracksheetError::RenderFailed {
            page: 3,
            detail: "font".into(),
        };
        assert!(e.to_string().contains("page 3"));
    }

    #[test]
    fn empty_record_set_display() {
        let e = TracksheetError::EmptyRecordSet {
            source_name: "empty.csv".into(),
        };
        assert!(e.to_string().contains("empty.csv"));
    }
}
