//! Report layout: ([`RecordSet`], [`ReportMetadata`], date) → [`Document`].
//!
//! Layout is a pure function. Calling it twice with the same inputs yields
//! structurally identical documents, and it never fails: a record missing a
//! field renders an empty cell and contributes zero to the total.
//!
//! ## Pagination
//!
//! ```text
//! page 1      FIRST_PAGE_ITEMS   (30 CD / 25 vinyl: the vinyl header is taller)
//! page 2..n   SUBSEQUENT_ITEMS   (40)
//! ```
//!
//! Records fill pages strictly in order. There is no rebalancing, so the
//! last page may hold a single row. An empty record set still yields one
//! page so the header, total and footer always render.
//!
//! ## Placement
//!
//! | Element            | Pages            |
//! |--------------------|------------------|
//! | Report header      | first only       |
//! | Column header row  | every page       |
//! | Total-duration row | last only        |
//! | Footer             | last only        |

use super::duration::{format_duration, parse_duration};
use crate::document::{
    Align, Block, Cell, Document, LogoBlock, Page, RowKind, RuleBlock, TableRow, TextBlock,
    TextStyle,
};
use crate::model::{Record, RecordSet, ReportMetadata};
use chrono::format::{Item, StrftimeItems};
use chrono::NaiveDate;
use std::fmt::Write;
use std::ops::Range;

/// Rows on page 1 in CD mode.
pub const FIRST_PAGE_ITEMS_CD: usize = 30;
/// Rows on page 1 in vinyl mode.
pub const FIRST_PAGE_ITEMS_VINYL: usize = 25;
/// Rows on every page after the first.
pub const SUBSEQUENT_ITEMS: usize = 40;
/// Default header date format, e.g. `October 17, 2026`.
pub const DEFAULT_DATE_FORMAT: &str = "%B %-d, %Y";

const BODY_SIZE: f32 = 9.0;
const HEAVY_RULE: f32 = 3.0;
const THIN_RULE: f32 = 0.5;
const LOGO_WIDTH: f32 = 140.0;
const LOGO_HEIGHT: f32 = 40.0;

/// Duration sources, in priority order.
const DURATION_KEYS: &[&str] = &["Length", "Duration"];

/// Tunables for [`layout_with`].
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutOptions {
    pub first_page_items_cd: usize,
    pub first_page_items_vinyl: usize,
    pub subsequent_items: usize,
    /// `chrono` format string for the header date.
    pub date_format: String,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            first_page_items_cd: FIRST_PAGE_ITEMS_CD,
            first_page_items_vinyl: FIRST_PAGE_ITEMS_VINYL,
            subsequent_items: SUBSEQUENT_ITEMS,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }
}

impl LayoutOptions {
    /// Page-1 capacity for the given mode. Never zero.
    pub fn first_page_items(&self, vinyl: bool) -> usize {
        let n = if vinyl {
            self.first_page_items_vinyl
        } else {
            self.first_page_items_cd
        };
        n.max(1)
    }

    fn subsequent(&self) -> usize {
        self.subsequent_items.max(1)
    }
}

// ── Columns ──────────────────────────────────────────────────────────────

/// One table column: header label, width share and record keys to read.
struct Column {
    label: &'static str,
    width_pct: u8,
    align: Align,
    keys: &'static [&'static str],
}

const COL_NUMBER: Column = Column {
    label: "#",
    width_pct: 8,
    align: Align::Right,
    keys: &[],
};
const COL_START: Column = Column {
    label: "Start",
    width_pct: 15,
    align: Align::Right,
    keys: &["StartM", "Start"],
};
const COL_LENGTH: Column = Column {
    label: "Length",
    width_pct: 15,
    align: Align::Right,
    keys: DURATION_KEYS,
};

const CD_COLUMNS: [Column; 5] = [
    COL_NUMBER,
    Column {
        label: "Title",
        width_pct: 42,
        align: Align::Left,
        keys: &["Title", "Name"],
    },
    COL_START,
    COL_LENGTH,
    Column {
        label: "ISRC",
        width_pct: 20,
        align: Align::Left,
        keys: &["ISRC"],
    },
];

const VINYL_COLUMNS: [Column; 4] = [
    COL_NUMBER,
    Column {
        label: "Title",
        width_pct: 62,
        align: Align::Left,
        keys: &["Title", "Name"],
    },
    COL_START,
    COL_LENGTH,
];

fn columns(vinyl: bool) -> &'static [Column] {
    if vinyl {
        &VINYL_COLUMNS
    } else {
        &CD_COLUMNS
    }
}

// ── Entry points ─────────────────────────────────────────────────────────

/// `true` when every specifier in `fmt` is one chrono understands.
pub fn is_valid_date_format(fmt: &str) -> bool {
    StrftimeItems::new(fmt).all(|item| !matches!(item, Item::Error))
}

/// Format `date` with `fmt`, or with [`DEFAULT_DATE_FORMAT`] when `fmt` is
/// not a usable pattern.
fn format_date(date: NaiveDate, fmt: &str) -> String {
    let mut out = String::new();
    if is_valid_date_format(fmt) && write!(out, "{}", date.format(fmt)).is_ok() {
        return out;
    }
    out.clear();
    let _ = write!(out, "{}", date.format(DEFAULT_DATE_FORMAT));
    out
}

/// Lay out a report with the default capacities and date format.
pub fn layout(records: &RecordSet, metadata: &ReportMetadata, render_date: NaiveDate) -> Document {
    layout_with(records, metadata, render_date, &LayoutOptions::default())
}

/// Lay out a report with explicit [`LayoutOptions`].
pub fn layout_with(
    records: &RecordSet,
    metadata: &ReportMetadata,
    render_date: NaiveDate,
    options: &LayoutOptions,
) -> Document {
    let vinyl = metadata.is_vinyl();
    let cols = columns(vinyl);
    let ranges = paginate(
        records.len(),
        options.first_page_items(vinyl),
        options.subsequent(),
    );
    let last = ranges.len() - 1;
    let total = total_duration(records);

    let pages = ranges
        .into_iter()
        .enumerate()
        .map(|(i, range)| {
            let rows = records.records()[range.clone()]
                .iter()
                .enumerate()
                .map(|(j, r)| data_row(cols, range.start + j + 1, r))
                .collect();

            Page {
                number: i + 1,
                header: (i == 0).then(|| header_blocks(metadata, render_date, options)),
                table_header: header_row(cols),
                rows,
                total: (i == last).then(|| total_row(vinyl, &total)),
                footer: (i == last).then(|| footer_blocks(metadata, records.len(), &total)),
            }
        })
        .collect();

    Document { pages, vinyl }
}

/// Split `len` records into page ranges.
///
/// Always returns at least one (possibly empty) range.
pub fn paginate(len: usize, first_page: usize, subsequent: usize) -> Vec<Range<usize>> {
    let first_page = first_page.max(1);
    let subsequent = subsequent.max(1);

    let mut ranges = vec![0..len.min(first_page)];
    let mut start = ranges[0].end;
    while start < len {
        let end = (start + subsequent).min(len);
        ranges.push(start..end);
        start = end;
    }
    ranges
}

/// Sum of every record's `Length` (else `Duration`) as `m:ss`.
pub fn total_duration(records: &RecordSet) -> String {
    let secs = records
        .iter()
        .map(|r| parse_duration(&r.first_present(DURATION_KEYS).unwrap_or_default()))
        .fold(0u64, u64::saturating_add);
    format_duration(secs)
}

// ── Rows ─────────────────────────────────────────────────────────────────

fn header_row(cols: &[Column]) -> TableRow {
    TableRow {
        kind: RowKind::Header,
        cells: cols
            .iter()
            .map(|c| Cell {
                text: c.label.to_string(),
                width_pct: c.width_pct,
                align: c.align,
            })
            .collect(),
    }
}

fn data_row(cols: &[Column], number: usize, record: &Record) -> TableRow {
    TableRow {
        kind: RowKind::Data,
        cells: cols
            .iter()
            .map(|c| Cell {
                text: if c.keys.is_empty() {
                    number.to_string()
                } else {
                    record.first_present(c.keys).unwrap_or_default()
                },
                width_pct: c.width_pct,
                align: c.align,
            })
            .collect(),
    }
}

fn total_row(vinyl: bool, total: &str) -> TableRow {
    let cell = |text: &str, width_pct, align| Cell {
        text: text.to_string(),
        width_pct,
        align,
    };
    let cells = if vinyl {
        vec![
            cell("Total duration", 85, Align::Right),
            cell(total, 15, Align::Right),
        ]
    } else {
        vec![
            cell("Total duration", 65, Align::Right),
            cell(total, 15, Align::Right),
            cell("", 20, Align::Left),
        ]
    };
    TableRow {
        kind: RowKind::Total,
        cells,
    }
}

// ── Header / footer ──────────────────────────────────────────────────────

fn text(s: impl Into<String>, style: TextStyle) -> Block {
    Block::Text(TextBlock::new(s, style))
}

fn labelled(label: &str, value: Option<&str>) -> Block {
    text(
        format!("{label}: {}", value.unwrap_or("")),
        TextStyle::body(BODY_SIZE + 1.0),
    )
}

fn header_blocks(meta: &ReportMetadata, date: NaiveDate, options: &LayoutOptions) -> Vec<Block> {
    let mut blocks = vec![Block::Logo(LogoBlock {
        width: LOGO_WIDTH,
        height: LOGO_HEIGHT,
    })];

    let engineer = meta.display_engineer();
    let email = meta.mastering_engineer_email.as_deref();
    let credit = match (engineer, email) {
        (Some(n), Some(e)) if n != e => Some(format!("{n} · {e}")),
        (Some(n), _) => Some(n.to_string()),
        (None, Some(e)) => Some(e.to_string()),
        (None, None) => None,
    };
    if let Some(credit) = credit {
        blocks.push(text(
            format!("Mastered by {credit}"),
            TextStyle::body(BODY_SIZE).centered().muted(),
        ));
    }

    blocks.push(Block::Rule(RuleBlock {
        thickness: HEAVY_RULE,
    }));
    blocks.push(labelled("Artist", meta.artist.as_deref()));
    blocks.push(labelled("Album", meta.display_album()));
    if let Some(sub) = meta.subtitle.as_deref() {
        blocks.push(text(sub, TextStyle::body(BODY_SIZE).muted()));
    }
    blocks.push(labelled("Client", meta.client.as_deref()));
    blocks.push(labelled("Catalog #", meta.catalog.as_deref()));
    blocks.push(labelled(
        "Date",
        Some(&format_date(date, &options.date_format)),
    ));
    blocks.push(Block::Rule(RuleBlock {
        thickness: HEAVY_RULE,
    }));

    if meta.is_vinyl() {
        blocks.extend(vinyl_blocks(meta));
    }
    blocks.push(Block::Spacer { height: 8.0 });
    blocks
}

fn vinyl_blocks(meta: &ReportMetadata) -> Vec<Block> {
    let side = meta.vinyl_side.as_deref().unwrap_or("").trim();
    let mut blocks = vec![text(
        format!("Vinyl Side {side}"),
        TextStyle::body(BODY_SIZE + 5.0).bold(),
    )];

    let format_line = [meta.bits.as_deref(), meta.sample_rate.as_deref()]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" / ");
    if !format_line.is_empty() {
        blocks.push(text(format_line, TextStyle::body(BODY_SIZE + 1.0)));
    }
    if let Some(note) = meta.per_side_note.as_deref() {
        blocks.push(text(note, TextStyle::body(BODY_SIZE).muted()));
    }
    blocks
}

fn footer_blocks(meta: &ReportMetadata, track_count: usize, total: &str) -> Vec<Block> {
    let album = meta.display_album().unwrap_or("Report");
    let tracks = if track_count == 1 { "track" } else { "tracks" };
    vec![
        Block::Spacer { height: 12.0 },
        Block::Rule(RuleBlock {
            thickness: THIN_RULE,
        }),
        text(
            format!("{album} · {track_count} {tracks} · {total}"),
            TextStyle::body(BODY_SIZE - 1.0).centered().muted(),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Value;

    fn tracks(n: usize) -> RecordSet {
        (0..n)
            .map(|i| {
                vec![
                    ("Title", Value::text(format!("Track {}", i + 1))),
                    ("Length", Value::text("3:00")),
                    ("ISRC", Value::text(format!("XX-000-00-{:05}", i))),
                ]
                .into_iter()
                .collect::<Record>()
            })
            .collect::<Vec<_>>()
            .into()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
    }

    fn vinyl(side: &str) -> ReportMetadata {
        ReportMetadata {
            vinyl_side: Some(side.into()),
            ..Default::default()
        }
    }

    #[test]
    fn paginate_ranges() {
        assert_eq!(paginate(0, 30, 40), vec![0..0]);
        assert_eq!(paginate(30, 30, 40), vec![0..30]);
        assert_eq!(paginate(31, 30, 40), vec![0..30, 30..31]);
        assert_eq!(paginate(70, 25, 40), vec![0..25, 25..65, 65..70]);
    }

    #[test]
    fn empty_set_yields_one_page_with_zero_total() {
        let doc = layout(&RecordSet::default(), &ReportMetadata::default(), date());
        assert_eq!(doc.page_count(), 1);
        let page = &doc.pages[0];
        assert!(page.rows.is_empty());
        assert!(page.header.is_some());
        assert!(page.footer.is_some());
        assert_eq!(page.total.as_ref().unwrap().cells[1].text, "0:00");
    }

    #[test]
    fn cd_mode_columns_and_split() {
        let doc = layout(&tracks(55), &ReportMetadata::default(), date());
        assert_eq!(doc.page_count(), 2);
        assert_eq!(doc.pages[0].rows.len(), 30);
        assert_eq!(doc.pages[1].rows.len(), 25);
        for page in &doc.pages {
            assert_eq!(page.table_header.texts(), vec!["#", "Title", "Start", "Length", "ISRC"]);
            assert_eq!(page.table_header.widths(), vec![8, 42, 15, 15, 20]);
        }
        assert!(doc.pages[0].header.is_some());
        assert!(doc.pages[1].header.is_none());
        assert!(doc.pages[0].total.is_none());
        let total = doc.pages[1].total.as_ref().unwrap();
        assert_eq!(total.widths(), vec![65, 15, 20]);
        assert_eq!(total.cells[1].text, "165:00");
    }

    #[test]
    fn numbering_is_continuous() {
        let doc = layout(&tracks(55), &ReportMetadata::default(), date());
        let numbers: Vec<usize> = doc
            .pages
            .iter()
            .flat_map(|p| p.rows.iter())
            .map(|r| r.cells[0].text.parse().unwrap())
            .collect();
        assert_eq!(numbers, (1..=55).collect::<Vec<_>>());
        assert_eq!(doc.pages[1].rows[0].cells[1].text, "Track 31");
    }

    #[test]
    fn vinyl_mode_split_and_columns() {
        let doc = layout(&tracks(70), &vinyl("B"), date());
        assert!(doc.vinyl);
        let sizes: Vec<usize> = doc.pages.iter().map(|p| p.rows.len()).collect();
        assert_eq!(sizes, vec![25, 40, 5]);
        for page in &doc.pages {
            assert!(!page.table_header.texts().contains(&"ISRC"));
            assert_eq!(page.table_header.widths(), vec![8, 62, 15, 15]);
            assert!(page.rows.iter().all(|r| r.cells.len() == 4));
        }
        assert_eq!(doc.pages[2].total.as_ref().unwrap().widths(), vec![85, 15]);
    }

    #[test]
    fn vinyl_block_only_on_first_page() {
        let mut meta = vinyl("B");
        meta.bits = Some("24bit".into());
        meta.sample_rate = Some("96khz".into());
        meta.per_side_note = Some("Single WAV file per side".into());
        let doc = layout(&tracks(70), &meta, date());

        let texts: Vec<String> = doc.pages[0]
            .header
            .as_ref()
            .unwrap()
            .iter()
            .filter_map(|b| match b {
                Block::Text(t) => Some(t.text.clone()),
                _ => None,
            })
            .collect();
        assert!(texts.contains(&"Vinyl Side B".to_string()));
        assert!(texts.contains(&"24bit / 96khz".to_string()));
        assert!(texts.contains(&"Single WAV file per side".to_string()));
        assert!(doc.pages[1..].iter().all(|p| p.header.is_none()));
    }

    #[test]
    fn header_has_two_heavy_rules_and_date() {
        let doc = layout(&tracks(1), &ReportMetadata::default(), date());
        let header = doc.pages[0].header.as_ref().unwrap();
        let heavy = header
            .iter()
            .filter(|b| matches!(b, Block::Rule(r) if r.thickness == HEAVY_RULE))
            .count();
        assert_eq!(heavy, 2);
        assert!(header
            .iter()
            .any(|b| matches!(b, Block::Text(t) if t.text == "Date: October 17, 2026")));
        assert!(matches!(header[0], Block::Logo(_)));
    }

    #[test]
    fn engineer_line_only_when_known() {
        let doc = layout(&tracks(1), &ReportMetadata::default(), date());
        let has_line = |doc: &Document| {
            doc.pages[0]
                .header
                .as_ref()
                .unwrap()
                .iter()
                .any(|b| matches!(b, Block::Text(t) if t.text.starts_with("Mastered by")))
        };
        assert!(!has_line(&doc));

        let meta = ReportMetadata {
            mastering_engineer_name: Some("Jane Doe".into()),
            mastering_engineer_email: Some("jane@x.com".into()),
            ..Default::default()
        };
        let doc = layout(&tracks(1), &meta, date());
        assert!(has_line(&doc));
    }

    #[test]
    fn missing_fields_degrade_to_empty_cells_and_zero() {
        let sparse: RecordSet = vec![
            vec![("Name", Value::text("Only name"))].into_iter().collect::<Record>(),
            vec![("Duration", Value::text("1:02:03"))].into_iter().collect::<Record>(),
            vec![("Length", Value::text("garbage"))].into_iter().collect::<Record>(),
        ]
        .into();
        let doc = layout(&sparse, &ReportMetadata::default(), date());
        let rows = &doc.pages[0].rows;
        assert_eq!(rows[0].texts(), vec!["1", "Only name", "", "", ""]);
        assert_eq!(rows[1].cells[3].text, "1:02:03");
        assert_eq!(doc.pages[0].total.as_ref().unwrap().cells[1].text, "62:03");
    }

    #[test]
    fn layout_is_idempotent() {
        let meta = vinyl("A");
        let a = layout(&tracks(45), &meta, date());
        let b = layout(&tracks(45), &meta, date());
        assert_eq!(a, b);
    }

    #[test]
    fn custom_capacities() {
        let options = LayoutOptions {
            first_page_items_cd: 2,
            subsequent_items: 3,
            ..Default::default()
        };
        let doc = layout_with(&tracks(6), &ReportMetadata::default(), date(), &options);
        let sizes: Vec<usize> = doc.pages.iter().map(|p| p.rows.len()).collect();
        assert_eq!(sizes, vec![2, 3, 1]);
    }

    #[test]
    fn footer_summarises_report() {
        let meta = ReportMetadata {
            album_title: Some("First Light".into()),
            ..Default::default()
        };
        let doc = layout(&tracks(2), &meta, date());
        let footer = doc.pages[0].footer.as_ref().unwrap();
        assert!(footer
            .iter()
            .any(|b| matches!(b, Block::Text(t) if t.text == "First Light · 2 tracks · 6:00")));
    }

    #[test]
    fn unusable_date_format_falls_back_to_default() {
        for fmt in ["%Q", "Date %", "%Y-%m-%"] {
            assert!(!is_valid_date_format(fmt), "{fmt}");
            let options = LayoutOptions {
                date_format: fmt.into(),
                ..Default::default()
            };
            let doc = layout_with(&RecordSet::default(), &ReportMetadata::default(), date(), &options);
            let header = doc.pages[0].header.as_ref().unwrap();
            assert!(
                header
                    .iter()
                    .any(|b| matches!(b, Block::Text(t) if t.text == "Date: October 17, 2026")),
                "{fmt}"
            );
        }
        assert!(is_valid_date_format(DEFAULT_DATE_FORMAT));
        assert!(is_valid_date_format("%d/%m/%Y"));
    }
}
