//! Report rendering: [`Document`] → output bytes.
//!
//! Two backends share one trait:
//!
//! * [`PdfiumRenderer`] draws a real PDF with the pdfium C++ library.
//! * [`TextRenderer`] produces fixed-width text for terminals and tests.
//!
//! ## Why spawn_blocking?
//!
//! `pdfium-render` wraps a C++ library with thread-local state that must not
//! be driven from async worker threads. [`crate::convert::render_document`]
//! moves PDF rendering onto tokio's blocking pool; the renderers themselves
//! are plain synchronous code.
//!
//! ## Coordinate model
//!
//! Blocks are laid out top-down from the top margin. pdfium's origin is the
//! bottom-left corner, so every y coordinate is flipped against the page
//! height before drawing.

use crate::config::{PaperSize, ReportConfig};
use crate::document::{Align, Block, BlockRef, Document, Page, RowKind, TableRow, TextStyle};
use crate::error::TracksheetError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable naming a directory that contains the pdfium library.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// Turns a laid-out [`Document`] into bytes.
pub trait DocumentRenderer {
    fn render(&self, doc: &Document) -> Result<Vec<u8>, TracksheetError>;
}

/// Load and decode a logo image.
pub fn load_logo(path: &Path) -> Result<DynamicImage, TracksheetError> {
    image::open(path).map_err(|e| TracksheetError::LogoUnreadable {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })
}

// ── PDF ──────────────────────────────────────────────────────────────────

const MARGIN: f32 = 40.0;
const CELL_PADDING: f32 = 3.0;
/// Average Helvetica glyph advance as a fraction of the font size.
const GLYPH_WIDTH: f32 = 0.5;

const MUTED_GREY: u8 = 110;
/// Row pitch as a multiple of the table font size, when the page has room.
const ROW_LEADING: f32 = 1.6;
/// Gap under the column header's underline.
const HEADER_GAP: f32 = 2.0;

/// PDF backend built on `pdfium-render`.
#[derive(Debug, Clone)]
pub struct PdfiumRenderer {
    paper: PaperSize,
    font_size: f32,
    logo: Option<DynamicImage>,
    library_dir: Option<PathBuf>,
}

impl PdfiumRenderer {
    pub fn new(paper: PaperSize, font_size: f32) -> Self {
        Self {
            paper,
            font_size,
            logo: None,
            library_dir: std::env::var_os(PDFIUM_LIB_PATH_ENV).map(PathBuf::from),
        }
    }

    /// Build a renderer from a [`ReportConfig`], decoding the logo up front.
    ///
    /// # Errors
    /// [`TracksheetError::LogoUnreadable`] when the configured logo cannot be
    /// opened or decoded.
    pub fn from_config(config: &ReportConfig) -> Result<Self, TracksheetError> {
        let mut renderer = Self::new(config.paper, config.font_size);
        if let Some(path) = &config.logo {
            renderer.logo = Some(load_logo(path)?);
        }
        Ok(renderer)
    }

    pub fn with_logo(mut self, logo: DynamicImage) -> Self {
        self.logo = Some(logo);
        self
    }

    fn bind(&self) -> Result<Pdfium, TracksheetError> {
        let bindings = match &self.library_dir {
            Some(dir) => {
                debug!("Binding pdfium from {}", dir.display());
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir))
                    .or_else(|_| Pdfium::bind_to_system_library())
            }
            None => Pdfium::bind_to_system_library(),
        }
        .map_err(|e| TracksheetError::PdfiumBindingFailed(format!("{:?}", e)))?;
        Ok(Pdfium::new(bindings))
    }
}

impl DocumentRenderer for PdfiumRenderer {
    fn render(&self, doc: &Document) -> Result<Vec<u8>, TracksheetError> {
        let pdfium = self.bind()?;
        let internal = |e: PdfiumError| TracksheetError::Internal(format!("pdfium: {:?}", e));

        let mut pdf = pdfium.create_new_pdf().map_err(internal)?;
        let fonts = Fonts {
            regular: pdf.fonts_mut().helvetica(),
            bold: pdf.fonts_mut().helvetica_bold(),
        };
        let (width, height) = self.paper.points();

        for page in &doc.pages {
            let fail = |e: PdfiumError| TracksheetError::RenderFailed {
                page: page.number,
                detail: format!("{:?}", e),
            };
            let mut pdf_page = pdf
                .pages_mut()
                .create_page_at_end(PdfPagePaperSize::Custom(
                    PdfPoints::new(width),
                    PdfPoints::new(height),
                ))
                .map_err(fail)?;

            let mut canvas = Canvas {
                page: &mut pdf_page,
                fonts: &fonts,
                logo: self.logo.as_ref(),
                table_font: self.font_size,
                row_height: row_height(page, height, self.font_size),
                page_height: height,
                content_width: width - 2.0 * MARGIN,
                cursor: MARGIN,
            };
            canvas.draw_page(page).map_err(fail)?;
            debug!("Drew page {} ({} rows)", page.number, page.rows.len());
        }

        let bytes = pdf.save_to_bytes().map_err(internal)?;
        info!("Rendered {} pages to {} bytes of PDF", doc.page_count(), bytes.len());
        Ok(bytes)
    }
}

struct Fonts {
    regular: PdfFontToken,
    bold: PdfFontToken,
}

/// Top-down drawing cursor over one pdfium page.
struct Canvas<'p, 'a> {
    page: &'p mut PdfPage<'a>,
    fonts: &'p Fonts,
    logo: Option<&'p DynamicImage>,
    table_font: f32,
    row_height: f32,
    page_height: f32,
    content_width: f32,
    /// Distance from the top edge to the next free line.
    cursor: f32,
}

impl Canvas<'_, '_> {
    fn draw_page(&mut self, page: &Page) -> Result<(), PdfiumError> {
        for item in page.blocks() {
            match item {
                BlockRef::Block(block) => self.draw_block(block)?,
                BlockRef::Row(row) => self.draw_row(row)?,
            }
        }
        Ok(())
    }

    fn draw_block(&mut self, block: &Block) -> Result<(), PdfiumError> {
        match block {
            Block::Text(t) => {
                let size = t.style.size;
                let text = fit(&t.text, self.content_width, size);
                let slack = self.content_width - text_width(&text, size);
                let x = match t.style.align {
                    Align::Left => MARGIN,
                    Align::Center => MARGIN + slack / 2.0,
                    Align::Right => MARGIN + slack,
                };
                self.text(x, self.cursor + size, &text, t.style)?;
            }
            Block::Logo(area) => {
                if let Some(logo) = self.logo {
                    let scale = (area.width / logo.width() as f32)
                        .min(area.height / logo.height() as f32);
                    let w = logo.width() as f32 * scale;
                    let h = logo.height() as f32 * scale;
                    let x = MARGIN + (self.content_width - w) / 2.0;
                    let y = self.page_height - self.cursor - h;
                    self.page.objects_mut().create_image_object(
                        PdfPoints::new(x),
                        PdfPoints::new(y),
                        logo,
                        Some(PdfPoints::new(w)),
                        Some(PdfPoints::new(h)),
                    )?;
                }
            }
            Block::Rule(rule) => {
                self.cursor += 3.0;
                self.hline(rule.thickness)?;
                self.cursor -= 3.0;
            }
            Block::Spacer { .. } => {}
        }
        self.cursor += block_height(block);
        Ok(())
    }

    fn draw_row(&mut self, row: &TableRow) -> Result<(), PdfiumError> {
        let size = self.table_font;
        let style = TextStyle {
            bold: row.kind != RowKind::Data,
            ..TextStyle::body(size)
        };
        if row.kind == RowKind::Total {
            self.hline(0.5)?;
        }

        let mut x = MARGIN;
        for cell in &row.cells {
            let width = self.content_width * f32::from(cell.width_pct) / 100.0;
            let inner = width - 2.0 * CELL_PADDING;
            let text = fit(&cell.text, inner, size);
            let tx = match cell.align {
                Align::Left => x + CELL_PADDING,
                Align::Center => x + (width - text_width(&text, size)) / 2.0,
                Align::Right => x + width - CELL_PADDING - text_width(&text, size),
            };
            if !text.is_empty() {
                self.text(tx, self.cursor + size, &text, style)?;
            }
            x += width;
        }
        self.cursor += self.row_height;

        if row.kind == RowKind::Header {
            self.hline(1.0)?;
            self.cursor += HEADER_GAP;
        }
        Ok(())
    }

    fn text(&mut self, x: f32, baseline: f32, text: &str, style: TextStyle) -> Result<(), PdfiumError> {
        let font = if style.bold {
            self.fonts.bold
        } else {
            self.fonts.regular
        };
        let mut object = self.page.objects_mut().create_text_object(
            PdfPoints::new(x),
            PdfPoints::new(self.page_height - baseline),
            text,
            font,
            PdfPoints::new(style.size),
        )?;
        let color = if style.muted {
            PdfColor::new(MUTED_GREY, MUTED_GREY, MUTED_GREY, 255)
        } else {
            PdfColor::BLACK
        };
        object.set_fill_color(color)?;
        Ok(())
    }

    fn hline(&mut self, thickness: f32) -> Result<(), PdfiumError> {
        let y = PdfPoints::new(self.page_height - self.cursor);
        self.page.objects_mut().create_path_object_line(
            PdfPoints::new(MARGIN),
            y,
            PdfPoints::new(MARGIN + self.content_width),
            y,
            PdfColor::BLACK,
            PdfPoints::new(thickness),
        )?;
        Ok(())
    }
}

/// Vertical space a free-standing block takes on the canvas.
fn block_height(block: &Block) -> f32 {
    match block {
        Block::Text(t) => t.style.size * 1.4,
        Block::Logo(area) => area.height + 6.0,
        Block::Rule(rule) => rule.thickness + 6.0,
        Block::Spacer { height } => *height,
    }
}

/// Row pitch for `page`: `ROW_LEADING` times the font size, tightened so the
/// table, total and footer stay above the bottom margin. Never below the font
/// size itself.
fn row_height(page: &Page, page_height: f32, size: f32) -> f32 {
    let mut fixed = 2.0 * MARGIN + HEADER_GAP;
    let mut rows = 0usize;
    for item in page.blocks() {
        match item {
            BlockRef::Block(block) => fixed += block_height(block),
            BlockRef::Row(_) => rows += 1,
        }
    }
    let fitted = (page_height - fixed) / rows.max(1) as f32;
    (size * ROW_LEADING).min(fitted).max(size)
}

/// Approximate rendered width of `text` in points.
fn text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * GLYPH_WIDTH
}

/// Truncate `text` so it fits in `width` points, marking the cut with `…`.
fn fit(text: &str, width: f32, size: f32) -> String {
    let max_chars = (width / (size * GLYPH_WIDTH)).floor().max(0.0) as usize;
    truncate(text, max_chars)
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    if max_chars == 0 {
        return String::new();
    }
    let mut out: String = text.chars().take(max_chars - 1).collect();
    out.push('…');
    out
}

// ── Plain text ───────────────────────────────────────────────────────────

/// Form feed between pages, as line printers expect.
pub const PAGE_BREAK: char = '\u{0C}';

/// Fixed-width text backend.
#[derive(Debug, Clone)]
pub struct TextRenderer {
    width: usize,
}

impl Default for TextRenderer {
    fn default() -> Self {
        Self { width: 80 }
    }
}

impl TextRenderer {
    pub fn new(width: usize) -> Self {
        Self {
            width: width.max(20),
        }
    }

    /// Render straight to a `String`.
    pub fn render_string(&self, doc: &Document) -> String {
        doc.pages
            .iter()
            .map(|p| self.page(p))
            .collect::<Vec<_>>()
            .join(&PAGE_BREAK.to_string())
    }

    fn page(&self, page: &Page) -> String {
        let mut out = String::new();
        for item in page.blocks() {
            let line = match item {
                BlockRef::Block(Block::Text(t)) => self.align(&t.text, self.width, t.style.align),
                BlockRef::Block(Block::Logo(_)) => continue,
                BlockRef::Block(Block::Rule(r)) => {
                    let ch = if r.thickness >= 1.0 { "=" } else { "-" };
                    ch.repeat(self.width)
                }
                BlockRef::Block(Block::Spacer { .. }) => String::new(),
                BlockRef::Row(row) => self.row(row),
            };
            out.push_str(line.trim_end());
            out.push('\n');
            if let BlockRef::Row(row) = item {
                if row.kind == RowKind::Header {
                    out.push_str(&"-".repeat(self.width));
                    out.push('\n');
                }
            }
        }
        out
    }

    fn row(&self, row: &TableRow) -> String {
        row.cells
            .iter()
            .map(|c| {
                let w = self.width * usize::from(c.width_pct) / 100;
                self.align(&truncate(&c.text, w.saturating_sub(1)), w, c.align)
            })
            .collect()
    }

    fn align(&self, text: &str, width: usize, align: Align) -> String {
        let text = truncate(text, width);
        match align {
            Align::Left => format!("{text:<width$}"),
            Align::Center => format!("{text:^width$}"),
            Align::Right => format!("{text:>width$}"),
        }
    }
}

impl DocumentRenderer for TextRenderer {
    fn render(&self, doc: &Document) -> Result<Vec<u8>, TracksheetError> {
        Ok(self.render_string(doc).into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Record, RecordSet, ReportMetadata, Value};
    use crate::pipeline::layout::layout;
    use chrono::NaiveDate;

    fn doc(n: usize, meta: &ReportMetadata) -> Document {
        let records: RecordSet = (0..n)
            .map(|i| {
                vec![
                    ("Title", Value::text(format!("Song {}", i + 1))),
                    ("Length", Value::text("2:30")),
                ]
                .into_iter()
                .collect::<Record>()
            })
            .collect::<Vec<_>>()
            .into();
        layout(&records, meta, NaiveDate::from_ymd_opt(2026, 1, 5).unwrap())
    }

    /// Bottom edge of the last drawn element, measured from the top.
    fn content_bottom(page: &Page, page_height: f32, size: f32) -> f32 {
        let pitch = row_height(page, page_height, size);
        let mut cursor = MARGIN + HEADER_GAP;
        for item in page.blocks() {
            cursor += match item {
                BlockRef::Block(block) => block_height(block),
                BlockRef::Row(_) => pitch,
            };
        }
        cursor
    }

    #[test]
    fn largest_font_keeps_every_page_inside_the_margin() {
        let full = ReportMetadata {
            artist: Some("The Glass Orchard".into()),
            album_title: Some("Late Harvest".into()),
            subtitle: Some("Remastered Edition".into()),
            client: Some("Northern Lights Records".into()),
            catalog: Some("NLR-042".into()),
            vinyl_side: Some("B".into()),
            bits: Some("24bit".into()),
            sample_rate: Some("96khz".into()),
            per_side_note: Some("Single WAV file per side".into()),
            mastering_engineer_name: Some("Jane Doe".into()),
            mastering_engineer_email: Some("jane@studio.example".into()),
            ..Default::default()
        };
        for meta in [ReportMetadata::default(), full] {
            let d = doc(95, &meta);
            for paper in [PaperSize::A4, PaperSize::Letter] {
                let (_, height) = paper.points();
                for page in &d.pages {
                    let bottom = content_bottom(page, height, 14.0);
                    assert!(
                        bottom <= height - MARGIN + 0.01,
                        "{paper:?} page {}: bottom {bottom} of {height}",
                        page.number
                    );
                    assert!(row_height(page, height, 14.0) >= 14.0);
                }
            }
        }
    }

    #[test]
    fn default_font_keeps_full_leading() {
        let d = doc(95, &ReportMetadata::default());
        let (_, height) = PaperSize::A4.points();
        for page in &d.pages {
            assert_eq!(row_height(page, height, 9.0), 9.0 * ROW_LEADING);
        }
    }

    #[test]
    fn truncate_marks_cut() {
        assert_eq!(truncate("abcdef", 10), "abcdef");
        assert_eq!(truncate("abcdef", 4), "abc…");
        assert_eq!(truncate("abcdef", 0), "");
    }

    #[test]
    fn fit_respects_width() {
        let long = "x".repeat(200);
        let fitted = fit(&long, 100.0, 10.0);
        assert!(text_width(&fitted, 10.0) <= 100.0);
    }

    #[test]
    fn text_renderer_separates_pages_with_form_feed() {
        let d = doc(75, &ReportMetadata::default());
        let text = TextRenderer::default().render_string(&d);
        assert_eq!(text.split(PAGE_BREAK).count(), d.page_count());
        assert_eq!(d.page_count(), 3);
    }

    #[test]
    fn text_renderer_shows_header_rows_and_total() {
        let meta = ReportMetadata {
            artist: Some("The Band".into()),
            ..Default::default()
        };
        let text = TextRenderer::default().render_string(&doc(2, &meta));
        assert!(text.contains("Artist: The Band"));
        assert!(text.contains("Date: January 5, 2026"));
        assert!(text.contains("Song 2"));
        assert!(text.contains("Total duration"));
        assert!(text.contains("5:00"));
        assert!(!text.contains(PAGE_BREAK));
    }

    #[test]
    fn text_rows_stay_within_width() {
        let mut meta = ReportMetadata::default();
        meta.album_title = Some("A".repeat(300));
        let r = TextRenderer::new(60);
        for line in r.render_string(&doc(3, &meta)).lines() {
            assert!(line.chars().count() <= 60, "line too wide: {line}");
        }
    }

    #[test]
    fn missing_logo_is_reported() {
        let err = load_logo(Path::new("/definitely/not/here.png")).unwrap_err();
        assert!(matches!(err, TracksheetError::LogoUnreadable { .. }));
    }
}
