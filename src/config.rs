//! Configuration types for track-sheet rendering.
//!
//! Everything that shapes a report lives in [`ReportConfig`], built via its
//! [`ReportConfigBuilder`]. Ingestion takes no configuration at all; these
//! knobs only affect layout capacities and the rendered output.

use crate::error::TracksheetError;
use crate::pipeline::layout::{
    is_valid_date_format, LayoutOptions, DEFAULT_DATE_FORMAT, FIRST_PAGE_ITEMS_CD,
    FIRST_PAGE_ITEMS_VINYL, SUBSEQUENT_ITEMS,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Configuration for a track-sheet export.
///
/// # Example
/// ```rust
/// use tracksheet::{OutputFormat, PaperSize, ReportConfig};
///
/// let config = ReportConfig::builder()
///     .paper(PaperSize::Letter)
///     .format(OutputFormat::Text)
///     .build()
///     .unwrap();
/// assert_eq!(config.layout_options().subsequent_items, 40);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Studio logo drawn in the header's logo area. `None` leaves it blank.
    pub logo: Option<PathBuf>,

    /// Physical page size of PDF output. Default: A4.
    pub paper: PaperSize,

    /// Output encoding. Default: PDF.
    pub format: OutputFormat,

    /// Rows on page 1 in CD mode. Default: 30.
    pub first_page_items_cd: usize,

    /// Rows on page 1 in vinyl mode. Default: 25.
    ///
    /// Lower than CD because the vinyl block pushes the table further down.
    pub first_page_items_vinyl: usize,

    /// Rows on every later page. Default: 40.
    pub subsequent_items: usize,

    /// `chrono` strftime pattern for the header date. Default: `%B %-d, %Y`.
    pub date_format: String,

    /// Base font size in points for table text. Range: 6–14. Default: 9.
    pub font_size: f32,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            logo: None,
            paper: PaperSize::default(),
            format: OutputFormat::default(),
            first_page_items_cd: FIRST_PAGE_ITEMS_CD,
            first_page_items_vinyl: FIRST_PAGE_ITEMS_VINYL,
            subsequent_items: SUBSEQUENT_ITEMS,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            font_size: 9.0,
        }
    }
}

impl ReportConfig {
    /// Create a new builder for `ReportConfig`.
    pub fn builder() -> ReportConfigBuilder {
        ReportConfigBuilder {
            config: Self::default(),
        }
    }

    /// Layout tunables derived from this config.
    pub fn layout_options(&self) -> LayoutOptions {
        LayoutOptions {
            first_page_items_cd: self.first_page_items_cd,
            first_page_items_vinyl: self.first_page_items_vinyl,
            subsequent_items: self.subsequent_items,
            date_format: self.date_format.clone(),
        }
    }
}

/// Builder for [`ReportConfig`].
#[derive(Debug)]
pub struct ReportConfigBuilder {
    config: ReportConfig,
}

impl ReportConfigBuilder {
    pub fn logo(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.logo = Some(path.into());
        self
    }

    pub fn paper(mut self, paper: PaperSize) -> Self {
        self.config.paper = paper;
        self
    }

    pub fn format(mut self, format: OutputFormat) -> Self {
        self.config.format = format;
        self
    }

    pub fn first_page_items_cd(mut self, n: usize) -> Self {
        self.config.first_page_items_cd = n;
        self
    }

    pub fn first_page_items_vinyl(mut self, n: usize) -> Self {
        self.config.first_page_items_vinyl = n;
        self
    }

    pub fn subsequent_items(mut self, n: usize) -> Self {
        self.config.subsequent_items = n;
        self
    }

    pub fn date_format(mut self, fmt: impl Into<String>) -> Self {
        self.config.date_format = fmt.into();
        self
    }

    pub fn font_size(mut self, pt: f32) -> Self {
        self.config.font_size = pt.clamp(6.0, 14.0);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ReportConfig, TracksheetError> {
        let c = &self.config;
        if c.first_page_items_cd == 0 || c.first_page_items_vinyl == 0 || c.subsequent_items == 0 {
            return Err(TracksheetError::InvalidConfig(
                "Page capacities must be ≥ 1".into(),
            ));
        }
        if c.date_format.trim().is_empty() {
            return Err(TracksheetError::InvalidConfig(
                "Date format must not be empty".into(),
            ));
        }
        if !is_valid_date_format(&c.date_format) {
            return Err(TracksheetError::InvalidConfig(format!(
                "Date format '{}' contains an unknown specifier",
                c.date_format
            )));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Physical page size for PDF output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaperSize {
    /// 210 × 297 mm (default).
    #[default]
    A4,
    /// 8.5 × 11 in.
    Letter,
}

impl PaperSize {
    /// Width and height in PDF points.
    pub fn points(self) -> (f32, f32) {
        match self {
            PaperSize::A4 => (595.28, 841.89),
            PaperSize::Letter => (612.0, 792.0),
        }
    }
}

impl FromStr for PaperSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "a4" => Ok(PaperSize::A4),
            "letter" => Ok(PaperSize::Letter),
            other => Err(format!("unknown paper size '{other}' (expected a4 or letter)")),
        }
    }
}

impl fmt::Display for PaperSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaperSize::A4 => f.write_str("a4"),
            PaperSize::Letter => f.write_str("letter"),
        }
    }
}

/// Encoding of the rendered report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// PDF via pdfium (default).
    #[default]
    Pdf,
    /// Fixed-width plain text, pages separated by form feeds.
    Text,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Pdf => "pdf",
            OutputFormat::Text => "txt",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pdf" => Ok(OutputFormat::Pdf),
            "text" | "txt" => Ok(OutputFormat::Text),
            other => Err(format!("unknown format '{other}' (expected pdf or text)")),
        }
    }
}
