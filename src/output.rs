//! Result types returned by the conversion entry points.

use crate::document::Document;
use crate::model::{RecordSet, ReportMetadata};
use serde::Serialize;

/// Everything produced by one source-to-report conversion.
#[derive(Debug, Clone)]
pub struct ReportOutput {
    /// Rendered report (PDF or text, per the config).
    pub bytes: Vec<u8>,
    pub document: Document,
    pub records: RecordSet,
    pub metadata: ReportMetadata,
    pub stats: ReportStats,
}

/// Counts and timings for a conversion.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReportStats {
    pub record_count: usize,
    pub page_count: usize,
    pub vinyl: bool,
    /// Sum of track lengths as `m:ss`.
    pub total_duration: String,
    pub output_bytes: usize,
    pub ingest_duration_ms: u64,
    pub render_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Read-only view of an ingested source, printed by `--inspect-only`.
#[derive(Debug, Clone, Serialize)]
pub struct SourceSummary {
    pub filename: String,
    pub columns: Vec<String>,
    pub record_count: usize,
    pub vinyl: bool,
    pub total_duration: String,
    pub metadata: ReportMetadata,
}
