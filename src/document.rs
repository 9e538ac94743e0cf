//! Draw-instruction tree produced by the layout engine.
//!
//! A [`Document`] is a non-empty list of [`Page`]s. Every page is
//! self-contained: numbering and the total-duration aggregate are already
//! resolved, so a renderer can stream pages one at a time without looking at
//! neighbours.

use serde::Serialize;

/// Ordered, non-empty sequence of pages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub pages: Vec<Page>,
    /// `true` when the document was laid out in vinyl mode.
    pub vinyl: bool,
}

impl Document {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Number of data rows across every page.
    pub fn row_count(&self) -> usize {
        self.pages.iter().map(|p| p.rows.len()).sum()
    }

    /// The page carrying the total row (always the last one).
    pub fn last_page(&self) -> Option<&Page> {
        self.pages.last()
    }
}

/// One physical page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    /// 1-based page number.
    pub number: usize,
    /// Report header. Present on page 1 only.
    pub header: Option<Vec<Block>>,
    /// Column header row, repeated on every page.
    pub table_header: TableRow,
    pub rows: Vec<TableRow>,
    /// Total-duration row. Present on the final page only.
    pub total: Option<TableRow>,
    /// Closing block. Present on the final page only.
    pub footer: Option<Vec<Block>>,
}

impl Page {
    /// Every block in draw order: header, table header, rows, total, footer.
    pub fn blocks(&self) -> impl Iterator<Item = BlockRef<'_>> {
        let header = self.header.iter().flatten().map(BlockRef::Block);
        let table = std::iter::once(&self.table_header)
            .chain(self.rows.iter())
            .chain(self.total.iter())
            .map(BlockRef::Row);
        let footer = self.footer.iter().flatten().map(BlockRef::Block);
        header.chain(table).chain(footer)
    }
}

/// Borrowed view used when walking a page in draw order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BlockRef<'a> {
    Block(&'a Block),
    Row(&'a TableRow),
}

/// A free-standing draw instruction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Text(TextBlock),
    /// Reserved area for the studio logo; the renderer decides what fills it.
    Logo(LogoBlock),
    /// Horizontal bar across the content width.
    Rule(RuleBlock),
    /// Vertical gap in points.
    Spacer { height: f32 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextBlock {
    pub text: String,
    pub style: TextStyle,
}

impl TextBlock {
    pub fn new(text: impl Into<String>, style: TextStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TextStyle {
    /// Font size in points.
    pub size: f32,
    pub bold: bool,
    pub align: Align,
    /// Secondary (grey) text.
    pub muted: bool,
}

impl TextStyle {
    pub const fn body(size: f32) -> Self {
        Self {
            size,
            bold: false,
            align: Align::Left,
            muted: false,
        }
    }

    pub const fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub const fn centered(mut self) -> Self {
        self.align = Align::Center;
        self
    }

    pub const fn muted(mut self) -> Self {
        self.muted = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Align {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LogoBlock {
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RuleBlock {
    /// Stroke thickness in points.
    pub thickness: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowKind {
    Header,
    Data,
    Total,
}

/// Fixed-width table row; cell widths are percentages of the content width.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub kind: RowKind,
    pub cells: Vec<Cell>,
}

impl TableRow {
    pub fn texts(&self) -> Vec<&str> {
        self.cells.iter().map(|c| c.text.as_str()).collect()
    }

    pub fn widths(&self) -> Vec<u8> {
        self.cells.iter().map(|c| c.width_pct).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cell {
    pub text: String,
    pub width_pct: u8,
    pub align: Align,
}
