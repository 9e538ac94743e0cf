//! Explicit application state for interactive front-ends.
//!
//! A front-end drives the two-step flow (upload a file, then preview and
//! edit before export) by calling transitions on [`AppState`]. Every
//! transition is a plain method, so the whole flow is testable without a UI.
//!
//! ```text
//!            load(ok)
//!   Upload ───────────▶ Preview ──┐ set_field / metadata_mut
//!     ▲  ▲                │   ▲───┘
//!     │  └──── back ──────┘
//!     └─────── clear ─────┘ (drops data)
//! ```

use crate::convert::report_filename;
use crate::document::Document;
use crate::error::ParseError;
use crate::model::{MetaField, RecordSet, ReportMetadata};
use crate::pipeline::ingest::ingest;
use crate::pipeline::layout::{layout_with, LayoutOptions};
use chrono::NaiveDate;

/// Which screen the front-end shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Step {
    #[default]
    Upload,
    Preview,
}

/// Loaded data plus the current step.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    step: Step,
    filename: Option<String>,
    records: RecordSet,
    metadata: ReportMetadata,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    pub fn records(&self) -> &RecordSet {
        &self.records
    }

    pub fn metadata(&self) -> &ReportMetadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut ReportMetadata {
        &mut self.metadata
    }

    /// Ingest a file and move to [`Step::Preview`].
    ///
    /// On error the previous data, metadata and step are kept unchanged.
    pub fn load(&mut self, bytes: &[u8], filename: &str) -> Result<(), ParseError> {
        let (records, metadata) = ingest(bytes, filename)?;
        self.records = records;
        self.metadata = metadata;
        self.filename = Some(filename.to_string());
        self.step = Step::Preview;
        Ok(())
    }

    /// Edit one metadata field. An empty value clears it.
    pub fn set_field(&mut self, field: MetaField, value: &str) {
        self.metadata.set(field, value);
    }

    /// Return to the upload step, keeping loaded data.
    pub fn back(&mut self) {
        self.step = Step::Upload;
    }

    /// Drop all data and metadata and return to the upload step.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Export is only offered for a non-empty table.
    pub fn can_export(&self) -> bool {
        !self.records.is_empty()
    }

    /// Lay out the current data, or `None` when there is nothing to export.
    pub fn export(&self, date: NaiveDate, options: &LayoutOptions) -> Option<Document> {
        self.can_export()
            .then(|| layout_with(&self.records, &self.metadata, date, options))
    }

    /// Download name for a report rendered on `date`.
    pub fn suggested_filename(&self, date: NaiveDate) -> String {
        report_filename(&self.metadata, date)
    }
}
