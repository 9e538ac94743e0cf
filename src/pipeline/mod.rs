//! Pipeline stages for track-list to report conversion.
//!
//! Each submodule implements exactly one transformation step. The middle of
//! the pipeline (`ingest` and `layout`) is pure and synchronous; only the
//! edges touch the file system or a native library.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ ingest ──▶ layout ──▶ render
//! (path)    (CSV/XML)  (pages)    (pdfium / text)
//! ```
//!
//! 1. [`input`]: read the source file into memory
//! 2. [`ingest`]: bytes → `RecordSet` + `ReportMetadata`, dispatched on the
//!    file extension; uses [`markup`] for XML and [`custom_text`] to mine
//!    WaveLab annotations
//! 3. [`layout`]: paginate records into a `Document`; uses [`duration`] for
//!    the total row
//! 4. [`render`]: draw the `Document` as PDF or plain text

pub mod custom_text;
pub mod duration;
pub mod ingest;
pub mod input;
pub mod layout;
pub mod markup;
pub mod render;
