//! Source-to-report conversion entry points.
//!
//! The core stages ([`ingest`](crate::pipeline::ingest::ingest) and
//! [`layout`](crate::pipeline::layout::layout_with)) are synchronous and pure.
//! This module wraps them with file I/O, timing and logging, and hands PDF
//! rendering to tokio's blocking pool.

use crate::config::{OutputFormat, ReportConfig};
use crate::document::Document;
use crate::error::TracksheetError;
use crate::model::{RecordSet, ReportMetadata};
use crate::output::{ReportOutput, ReportStats, SourceSummary};
use crate::pipeline::render::{DocumentRenderer, PdfiumRenderer, TextRenderer};
use crate::pipeline::{ingest, input, layout};
use chrono::{Local, NaiveDate};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Read and ingest a track list from disk.
///
/// # Errors
/// - [`TracksheetError::FileNotFound`] / [`TracksheetError::PermissionDenied`]
/// - [`TracksheetError::Parse`] when the contents cannot be ingested
pub async fn ingest_file(
    path: impl AsRef<Path>,
) -> Result<(String, RecordSet, ReportMetadata), TracksheetError> {
    let path = path.as_ref();
    let source = input::read_source(path).await?;
    if !input::is_supported(&source.filename) {
        warn!(
            "'{}' is not a .csv or .xml file; parsing it as XML",
            source.filename
        );
    }

    let (records, metadata) = ingest::ingest(&source.bytes, &source.filename)?;
    debug!(
        "Ingested {}: {} records, columns {:?}",
        source.filename,
        records.len(),
        records.columns()
    );
    Ok((source.filename, records, metadata))
}

/// Ingest a source and summarise it without laying out or rendering.
pub async fn inspect(path: impl AsRef<Path>) -> Result<SourceSummary, TracksheetError> {
    let (filename, records, metadata) = ingest_file(path).await?;
    Ok(SourceSummary {
        filename,
        columns: records.columns(),
        record_count: records.len(),
        vinyl: metadata.is_vinyl(),
        total_duration: layout::total_duration(&records),
        metadata,
    })
}

/// Render a laid-out document with the backend selected by `config.format`.
///
/// PDF rendering runs inside `spawn_blocking` since pdfium is not async-safe.
pub async fn render_document(
    document: &Document,
    config: &ReportConfig,
) -> Result<Vec<u8>, TracksheetError> {
    match config.format {
        OutputFormat::Text => TextRenderer::default().render(document),
        OutputFormat::Pdf => {
            let renderer = PdfiumRenderer::from_config(config)?;
            let document = document.clone();
            tokio::task::spawn_blocking(move || renderer.render(&document))
                .await
                .map_err(|e| TracksheetError::Internal(format!("Render task panicked: {}", e)))?
        }
    }
}

/// Convert a track list to a rendered report dated today.
///
/// # Errors
/// Everything [`ingest_file`] returns, plus
/// [`TracksheetError::EmptyRecordSet`] when the source has no tracks and any
/// rendering failure.
pub async fn convert(
    path: impl AsRef<Path>,
    config: &ReportConfig,
) -> Result<ReportOutput, TracksheetError> {
    convert_dated(path, config, Local::now().date_naive()).await
}

/// [`convert`] with an explicit render date.
pub async fn convert_dated(
    path: impl AsRef<Path>,
    config: &ReportConfig,
    date: NaiveDate,
) -> Result<ReportOutput, TracksheetError> {
    let total_start = Instant::now();
    let path = path.as_ref();
    info!("Starting report: {}", path.display());

    // ── Step 1: Ingest ───────────────────────────────────────────────────
    let ingest_start = Instant::now();
    let (filename, records, metadata) = ingest_file(path).await?;
    let ingest_duration_ms = ingest_start.elapsed().as_millis() as u64;
    if records.is_empty() {
        return Err(TracksheetError::EmptyRecordSet {
            source_name: filename,
        });
    }
    info!(
        "Ingested {} tracks in {}ms ({} mode)",
        records.len(),
        ingest_duration_ms,
        if metadata.is_vinyl() { "vinyl" } else { "CD" }
    );

    // ── Step 2: Lay out ──────────────────────────────────────────────────
    let document = layout::layout_with(&records, &metadata, date, &config.layout_options());
    debug!(
        "Laid out {} rows over {} pages",
        document.row_count(),
        document.page_count()
    );

    // ── Step 3: Render ───────────────────────────────────────────────────
    let render_start = Instant::now();
    let bytes = render_document(&document, config).await?;
    let render_duration_ms = render_start.elapsed().as_millis() as u64;

    let stats = ReportStats {
        record_count: records.len(),
        page_count: document.page_count(),
        vinyl: document.vinyl,
        total_duration: layout::total_duration(&records),
        output_bytes: bytes.len(),
        ingest_duration_ms,
        render_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Report complete: {} tracks, {} pages, {}ms total",
        stats.record_count, stats.page_count, stats.total_duration_ms
    );

    Ok(ReportOutput {
        bytes,
        document,
        records,
        metadata,
        stats,
    })
}

/// Convert a track list and write the report directly to a file.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn convert_to_file(
    path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &ReportConfig,
) -> Result<ReportStats, TracksheetError> {
    let output = convert(path, config).await?;
    write_atomic(output_path.as_ref(), &output.bytes).await?;
    Ok(output.stats)
}

/// Write `bytes` to `path` via a sibling temp file and a rename.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), TracksheetError> {
    let write_err = |source| TracksheetError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    tokio::fs::write(&tmp_path, bytes).await.map_err(write_err)?;
    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(write_err(e));
    }
    debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    path: impl AsRef<Path>,
    config: &ReportConfig,
) -> Result<ReportOutput, TracksheetError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| TracksheetError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(path, config))
}

/// Download name for a report: sanitised album title (else `title`, else
/// `report`) followed by `-YYYY-MM-DD.pdf`.
///
/// Every character outside `[A-Za-z0-9_-]` becomes `_`.
pub fn report_filename(metadata: &ReportMetadata, date: NaiveDate) -> String {
    let base = [metadata.album_title.as_deref(), metadata.title.as_deref()]
        .into_iter()
        .flatten()
        .find(|s| !s.is_empty())
        .unwrap_or("report");
    let safe: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{}-{}.pdf", safe, date.format("%Y-%m-%d"))
}
