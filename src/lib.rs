//! # tracksheet
//!
//! Turn CD track lists and vinyl-side exports into paginated mastering
//! reports.
//!
//! ## Why this crate?
//!
//! Mastering engineers hand clients a printed track sheet with every album:
//! running order, start times, lengths, ISRCs and the studio's details. The
//! numbers already live in a CSV or a WaveLab montage export. This crate
//! reads either format, mines WaveLab's free-text annotations for client,
//! catalogue and engineer details, and lays the result out as a fixed-width
//! table split over as many pages as needed.
//!
//! ## Pipeline Overview
//!
//! ```text
//! CSV / XML
//!  │
//!  ├─ 1. Input   read the source file
//!  ├─ 2. Ingest  rows → RecordSet, annotations → ReportMetadata (pure)
//!  ├─ 3. Layout  paginate into a Document of draw instructions (pure)
//!  └─ 4. Render  pdfium PDF (spawn_blocking) or plain text
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tracksheet::{convert_to_file, ReportConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ReportConfig::builder().logo("studio.png").build()?;
//!     let stats = convert_to_file("montage.xml", "report.pdf", &config).await?;
//!     eprintln!("{} tracks on {} pages", stats.record_count, stats.page_count);
//!     Ok(())
//! }
//! ```
//!
//! The pure core is usable without tokio or pdfium:
//!
//! ```rust
//! use chrono::NaiveDate;
//! use tracksheet::{ingest, layout};
//!
//! let (records, meta) = ingest(b"Title,Length\nIntro,1:05\n", "tracks.csv").unwrap();
//! let doc = layout(&records, &meta, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
//! assert_eq!(doc.page_count(), 1);
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `tracksheet` binary (clap + anyhow + tracing-subscriber) |
//!
//! ## CD vs. vinyl
//!
//! A report is in vinyl mode whenever `vinylSide` is set. Vinyl reports drop
//! the ISRC column, carry a side banner, and fit fewer rows on page 1.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod document;
pub mod error;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod state;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{OutputFormat, PaperSize, ReportConfig, ReportConfigBuilder};
pub use convert::{
    convert, convert_dated, convert_sync, convert_to_file, ingest_file, inspect, render_document,
    report_filename,
};
pub use document::{Block, Document, Page, TableRow};
pub use error::{ParseError, TracksheetError};
pub use model::{MetaField, Record, RecordSet, ReportMetadata, Value};
pub use output::{ReportOutput, ReportStats, SourceSummary};
pub use pipeline::ingest::ingest;
pub use pipeline::layout::{layout, layout_with, LayoutOptions};
pub use pipeline::render::{DocumentRenderer, PdfiumRenderer, TextRenderer};
pub use state::{AppState, Step};
