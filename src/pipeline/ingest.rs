//! Ingestion: raw file bytes → ([`RecordSet`], [`ReportMetadata`]).
//!
//! ## Format dispatch
//!
//! The filename extension is authoritative: `.csv` (any case) takes the CSV
//! path and everything else is parsed as XML. There is no content sniffing,
//! so a CSV saved as `tracks.txt` fails as malformed XML.
//!
//! ## CSV path
//!
//! First row is the header, blank lines are skipped and numeric-looking
//! fields are coerced to numbers. A repeated header name gets a `_1`, `_2`
//! suffix so no column is lost. CSV carries no metadata channel.
//!
//! ## XML path
//!
//! WaveLab exports a montage with a `CD-Tracks` container and a free-text
//! `CustomText` blob. Structured facts are mined from the blob (see
//! [`super::custom_text`]), then generic `<metadata>` and direct tags fill
//! what is still missing. Files without `CD-Tracks` fall back to treating
//! each top-level element as one record.

use super::{custom_text, duration, markup};
use crate::error::ParseError;
use crate::model::{MetaField, Record, RecordSet, ReportMetadata, Value};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

/// Field whose value is normalised to `m:ss` during XML record extraction.
const START_FIELD: &str = "StartM";

/// Largest magnitude kept as a number during dynamic typing (2^53).
const MAX_SAFE_NUMBER: f64 = 9_007_199_254_740_992.0;

static RE_FLOAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*-?(\d+\.?|\.\d+|\d+\.\d+)([eE][-+]?\d+)?\s*$").unwrap());

/// Source formats, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Xml,
}

impl SourceFormat {
    /// `.csv` (case-insensitive) is CSV; every other name is XML.
    pub fn from_filename(filename: &str) -> Self {
        if filename.to_ascii_lowercase().ends_with(".csv") {
            SourceFormat::Csv
        } else {
            SourceFormat::Xml
        }
    }
}

/// Convert a source file into a record set and its metadata.
///
/// # Errors
/// - [`ParseError::Decode`] when `bytes` is not UTF-8
/// - [`ParseError::CsvSyntax`] / [`ParseError::XmlSyntax`] when the
///   format-specific parser rejects the text
///
/// No partial result is returned on error.
pub fn ingest(bytes: &[u8], filename: &str) -> Result<(RecordSet, ReportMetadata), ParseError> {
    let text = decode(bytes, filename)?;
    match SourceFormat::from_filename(filename) {
        SourceFormat::Csv => Ok((ingest_csv(text, filename)?, ReportMetadata::default())),
        SourceFormat::Xml => ingest_xml(text, filename),
    }
}

fn decode<'a>(bytes: &'a [u8], filename: &str) -> Result<&'a str, ParseError> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    std::str::from_utf8(bytes).map_err(|source| ParseError::Decode {
        filename: filename.to_string(),
        source,
    })
}

// ── CSV ──────────────────────────────────────────────────────────────────

fn ingest_csv(text: &str, filename: &str) -> Result<RecordSet, ParseError> {
    let csv_err = |source: csv::Error| ParseError::CsvSyntax {
        filename: filename.to_string(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = unique_headers(reader.headers().map_err(csv_err)?);

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(csv_err)?;
        let record: Record = headers
            .iter()
            .zip(row.iter())
            .map(|(name, field)| (name.as_str(), coerce(field)))
            .collect();
        records.push(record);
    }

    Ok(RecordSet::new(records))
}

/// Header names with repeats renamed `name_1`, `name_2`, skipping any name
/// the header row already uses.
fn unique_headers(headers: &csv::StringRecord) -> Vec<String> {
    let mut taken: HashSet<String> = headers.iter().map(str::to_string).collect();
    let mut seen: HashMap<&str, usize> = HashMap::new();
    headers
        .iter()
        .map(|name| {
            let count = seen.entry(name).or_insert(0);
            *count += 1;
            if *count == 1 {
                return name.to_string();
            }
            let mut n = *count - 1;
            let mut candidate = format!("{name}_{n}");
            while taken.contains(&candidate) {
                n += 1;
                candidate = format!("{name}_{n}");
            }
            *count = n + 1;
            taken.insert(candidate.clone());
            candidate
        })
        .collect()
}

/// Dynamic typing: numeric-looking fields become numbers, empty fields
/// become [`Value::Empty`], the rest stays text.
pub fn coerce(field: &str) -> Value {
    if field.is_empty() {
        return Value::Empty;
    }
    if RE_FLOAT.is_match(field) {
        if let Ok(n) = field.trim().parse::<f64>() {
            if n.abs() < MAX_SAFE_NUMBER {
                return Value::Number(n);
            }
        }
    }
    Value::text(field)
}

// ── XML ──────────────────────────────────────────────────────────────────

fn ingest_xml(text: &str, filename: &str) -> Result<(RecordSet, ReportMetadata), ParseError> {
    let root = markup::parse(text).map_err(|source| ParseError::XmlSyntax {
        filename: filename.to_string(),
        source,
    })?;

    let metadata = extract_metadata(&root, text);
    let records = extract_records(&root);
    Ok((records, metadata))
}

fn extract_metadata(root: &markup::XmlNode, source: &str) -> ReportMetadata {
    let mut meta = ReportMetadata::default();

    if let Some(node) = root.find_first("CustomText") {
        let custom = markup::inner_text_from_source(source).unwrap_or(node.value.as_str());
        custom_text::apply_rules(custom, &mut meta);
    }

    if let Some(meta_node) = root.find_first("metadata") {
        if let Some(title) = meta_node.first_value("title") {
            meta.set_if_unset(MetaField::AlbumTitle, title);
        }
        if let Some(subtitle) = meta_node.first_value("subtitle") {
            meta.set(MetaField::Subtitle, subtitle);
        }
    }

    if let Some(group) = root.first_value("TrackGroup") {
        meta.set_if_unset(MetaField::VinylSide, group);
    }
    if let Some(d) = root.first_value("AlbumDuration") {
        meta.set(MetaField::AlbumDuration, d);
    }
    if let Some(d) = root.first_value("GroupDuration") {
        meta.set(MetaField::GroupDuration, d);
    }

    meta
}

fn extract_records(root: &markup::XmlNode) -> RecordSet {
    let tracks = root
        .find_first("CD-Tracks")
        .filter(|n| !n.children.is_empty());

    let records = match tracks {
        Some(container) => container.children.iter().map(node_to_record).collect(),
        None => root
            .children
            .iter()
            .filter(|c| c.name != "metadata")
            .map(node_to_record)
            .collect(),
    };
    RecordSet::new(records)
}

/// Attributes first, then each child element as `name → value`.
fn node_to_record(node: &markup::XmlNode) -> Record {
    let mut record = Record::new();
    for (name, value) in &node.attributes {
        record.insert(name.as_str(), Value::text(value.as_str()));
    }
    for child in &node.children {
        let value = if child.name == START_FIELD {
            duration::normalize_start_m(&child.value)
        } else {
            child.value.clone()
        };
        record.insert(child.name.as_str(), Value::Text(value));
    }
    record
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_is_by_extension_only() {
        assert_eq!(SourceFormat::from_filename("tracks.CSV"), SourceFormat::Csv);
        assert_eq!(SourceFormat::from_filename("a.b.csv"), SourceFormat::Csv);
        assert_eq!(SourceFormat::from_filename("tracks.xml"), SourceFormat::Xml);
        assert_eq!(SourceFormat::from_filename("tracks.txt"), SourceFormat::Xml);
        assert_eq!(SourceFormat::from_filename("csv"), SourceFormat::Xml);
        assert_eq!(SourceFormat::from_filename(".csv"), SourceFormat::Csv);
    }

    #[test]
    fn csv_rows_follow_header_order() {
        let csv = "Title,Length,ISRC\nOne,3:45,GB-ABC-24-00001\n\nTwo,4:00,\n";
        let (records, meta) = ingest(csv.as_bytes(), "list.csv").unwrap();
        assert!(meta.is_empty());
        assert_eq!(records.len(), 2);
        assert_eq!(records.columns(), vec!["Title", "Length", "ISRC"]);
        assert_eq!(records.records()[1].get("ISRC"), Some(&Value::Empty));
    }

    #[test]
    fn csv_dynamic_typing() {
        assert_eq!(coerce("42"), Value::Number(42.0));
        assert_eq!(coerce("-1.5"), Value::Number(-1.5));
        assert_eq!(coerce(".5"), Value::Number(0.5));
        assert_eq!(coerce("1e3"), Value::Number(1000.0));
        assert_eq!(coerce("3:45"), Value::text("3:45"));
        assert_eq!(coerce("007-A"), Value::text("007-A"));
        assert_eq!(coerce(""), Value::Empty);
        assert_eq!(coerce("99999999999999999999"), Value::text("99999999999999999999"));
    }

    #[test]
    fn csv_short_rows_are_sparse() {
        let csv = "A,B,C\n1,2\n1,2,3,4\n";
        let (records, _) = ingest(csv.as_bytes(), "x.csv").unwrap();
        assert_eq!(records.records()[0].len(), 2);
        assert_eq!(records.records()[1].len(), 3);
    }

    #[test]
    fn repeated_csv_headers_keep_every_column() {
        let csv = "Title,Note,Note,Note_1\nIntro,a,b,c\n";
        let (records, _) = ingest(csv.as_bytes(), "x.csv").unwrap();
        assert_eq!(records.columns(), vec!["Title", "Note", "Note_2", "Note_1"]);
        let record = &records.records()[0];
        assert_eq!(record.first_present(&["Note"]).as_deref(), Some("a"));
        assert_eq!(record.first_present(&["Note_2"]).as_deref(), Some("b"));
        assert_eq!(record.first_present(&["Note_1"]).as_deref(), Some("c"));
    }

    #[test]
    fn bom_is_stripped() {
        let mut bytes = b"\xEF\xBB\xBF".to_vec();
        bytes.extend_from_slice(b"Title\nOne\n");
        let (records, _) = ingest(&bytes, "x.csv").unwrap();
        assert_eq!(records.columns(), vec!["Title"]);
    }

    #[test]
    fn invalid_utf8_is_a_decode_error() {
        let err = ingest(&[0x66, 0xff, 0x6f], "x.csv").unwrap_err();
        assert!(matches!(err, ParseError::Decode { .. }));
    }

    #[test]
    fn malformed_xml_is_an_xml_error() {
        let err = ingest(b"<Montage><CD-Tracks></Montage>", "x.xml").unwrap_err();
        assert!(matches!(err, ParseError::XmlSyntax { .. }));
    }

    #[test]
    fn csv_under_other_extension_goes_to_xml() {
        let err = ingest(b"Title,Length\nOne,3:00\n", "tracks.txt").unwrap_err();
        assert!(matches!(err, ParseError::XmlSyntax { .. }));
    }

    #[test]
    fn xml_tracks_with_attributes_and_start_normalisation() {
        let xml = r#"<Montage>
  <CD-Tracks>
    <Track id="1"><Title>Intro</Title><StartM>125 s</StartM><Length>2:00</Length></Track>
    <Track id="2"><Title>Next</Title><StartM>1:30</StartM></Track>
  </CD-Tracks>
</Montage>"#;
        let (records, meta) = ingest(xml.as_bytes(), "m.xml").unwrap();
        assert!(meta.is_empty());
        assert_eq!(records.len(), 2);
        let first = &records.records()[0];
        assert_eq!(first.keys().collect::<Vec<_>>(), vec!["id", "Title", "StartM", "Length"]);
        assert_eq!(first.get("StartM"), Some(&Value::text("2:05")));
        assert_eq!(records.records()[1].get("StartM"), Some(&Value::text("1:30")));
    }

    #[test]
    fn generic_xml_fallback_skips_metadata() {
        let xml = r#"<rows>
  <metadata><title>Album</title><subtitle>Deluxe</subtitle></metadata>
  <row><Title>A</Title><StartM>34</StartM></row>
  <row><Title>B</Title></row>
</rows>"#;
        let (records, meta) = ingest(xml.as_bytes(), "rows.xml").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records.records()[0].get("StartM"), Some(&Value::text("0:34")));
        assert_eq!(meta.album_title.as_deref(), Some("Album"));
        assert_eq!(meta.subtitle.as_deref(), Some("Deluxe"));
    }

    #[test]
    fn empty_cd_tracks_falls_back_to_top_level_children() {
        let xml = "<Montage><CD-Tracks/><Note>x</Note></Montage>";
        let (records, _) = ingest(xml.as_bytes(), "m.xml").unwrap();
        // CD-Tracks itself and Note both become (mostly empty) records.
        assert_eq!(records.len(), 2);
        assert!(records.records()[0].is_empty());
        assert_eq!(records.records()[1].len(), 0);
    }

    #[test]
    fn custom_text_is_read_from_source_and_titles_fall_back() {
        let xml = "<Montage>\n<CustomText>Client: Acme\nVINYL SIDE B\nTitle: Real Title</CustomText>\n\
<metadata><title>Generic</title></metadata>\n<TrackGroup>C</TrackGroup>\n\
<AlbumDuration>40:00</AlbumDuration><GroupDuration>20:00</GroupDuration>\n</Montage>";
        let (_, meta) = ingest(xml.as_bytes(), "m.xml").unwrap();
        assert_eq!(meta.client.as_deref(), Some("Acme"));
        assert_eq!(meta.album_title.as_deref(), Some("Real Title"));
        assert_eq!(meta.vinyl_side.as_deref(), Some("B"));
        assert_eq!(meta.album_duration.as_deref(), Some("40:00"));
        assert_eq!(meta.group_duration.as_deref(), Some("20:00"));
    }

    #[test]
    fn track_group_fills_unset_side() {
        let xml = "<Montage><TrackGroup>Side 2</TrackGroup></Montage>";
        let (_, meta) = ingest(xml.as_bytes(), "m.xml").unwrap();
        assert_eq!(meta.vinyl_side.as_deref(), Some("Side 2"));
    }

    #[test]
    fn no_custom_text_means_no_free_text_fields() {
        let xml = "<Montage><CD-Tracks><Track><Title>Client: Acme</Title></Track></CD-Tracks></Montage>";
        let (_, meta) = ingest(xml.as_bytes(), "m.xml").unwrap();
        assert!(meta.is_empty());
    }
}
