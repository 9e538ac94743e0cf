//! Input resolution: read a user-supplied track list into memory.
//!
//! Ingestion works on `(bytes, filename)` pairs so that callers which
//! already hold the file contents (an upload, a test fixture) never touch
//! the file system. This module is the thin async shim for everyone else.

use crate::error::TracksheetError;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

/// Extensions the upload surface accepts.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["csv", "xml"];

/// A source file loaded into memory.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub bytes: Vec<u8>,
    /// Final path component, used for format dispatch and report naming.
    pub filename: String,
}

/// `true` when `filename` ends in `.csv` or `.xml` (any case).
///
/// Advisory only: [`crate::pipeline::ingest::ingest`] dispatches purely on
/// the `.csv` suffix and treats anything else as XML.
pub fn is_supported(filename: &str) -> bool {
    let lower = filename.to_ascii_lowercase();
    SUPPORTED_EXTENSIONS
        .iter()
        .any(|ext| lower.ends_with(&format!(".{ext}")))
}

/// Read `path` fully, mapping I/O failures onto [`TracksheetError`].
pub async fn read_source(path: &Path) -> Result<SourceFile, TracksheetError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        ErrorKind::PermissionDenied => TracksheetError::PermissionDenied {
            path: path.to_path_buf(),
        },
        ErrorKind::NotFound => TracksheetError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => TracksheetError::Internal(format!("Failed to read '{}': {}", path.display(), e)),
    })?;

    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    debug!("Read {} bytes from {}", bytes.len(), path.display());
    Ok(SourceFile { bytes, filename })
}
