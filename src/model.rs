//! Shared data model: the normalised track table and the report metadata.
//!
//! Both source formats (CSV rows, WaveLab XML tracks) land in the same two
//! types. [`RecordSet`] is an ordered table whose rows are *not* guaranteed to
//! share a column set; [`ReportMetadata`] is a bag of optional, well-known
//! string fields describing the whole report.
//!
//! The layout engine only ever reads these types. Mutation happens during
//! ingestion and through caller edits (see [`crate::state::AppState`]).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ── Value ────────────────────────────────────────────────────────────────

/// A single scalar cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Numeric-looking CSV field after dynamic typing.
    Number(f64),
    /// Raw text, stored verbatim.
    Text(String),
    /// Empty CSV field.
    Empty,
}

impl Value {
    /// Wrap raw text without any coercion.
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    /// `true` for [`Value::Empty`] and for whitespace-only text.
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Empty => true,
            Value::Text(s) => s.trim().is_empty(),
            Value::Number(_) => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => f.write_str(s),
            Value::Empty => Ok(()),
        }
    }
}

// ── Record ───────────────────────────────────────────────────────────────

/// One row of the normalised table, keyed by column name.
///
/// Keys keep their insertion order so that the effective column set of a
/// record matches the order fields appeared in the source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a field. A replaced field keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// First non-blank value among `keys`, rendered as text.
    pub fn first_present(&self, keys: &[&str]) -> Option<String> {
        keys.iter()
            .filter_map(|k| self.get(k))
            .find(|v| !v.is_blank())
            .map(|v| v.to_string())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

// ── RecordSet ────────────────────────────────────────────────────────────

/// The full ordered table produced by ingestion.
///
/// Order is physical track order and is preserved through pagination.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordSet {
    records: Vec<Record>,
}

impl RecordSet {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    /// Effective column set for tabular display.
    ///
    /// Taken from the first record only. Columns that appear solely in later
    /// records are not listed; those records render with missing cells.
    pub fn columns(&self) -> Vec<String> {
        self.records
            .first()
            .map(|r| r.keys().map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl From<Vec<Record>> for RecordSet {
    fn from(records: Vec<Record>) -> Self {
        Self::new(records)
    }
}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

// ── ReportMetadata ───────────────────────────────────────────────────────

/// Optional descriptive fields attached to the whole report.
///
/// Every field is optional; `None` means "unknown", never an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<String>,
    /// Presence switches the layout into vinyl mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vinyl_side: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bits: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_rate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_side_note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mastering_engineer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mastering_engineer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mastering_engineer_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album_duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_duration: Option<String>,
}

impl ReportMetadata {
    /// Vinyl mode: `vinylSide` is present and not blank.
    pub fn is_vinyl(&self) -> bool {
        self.vinyl_side
            .as_deref()
            .is_some_and(|s| !s.trim().is_empty())
    }

    /// `true` when no field is set (always the case for CSV input).
    pub fn is_empty(&self) -> bool {
        MetaField::ALL.iter().all(|f| self.get(*f).is_none())
    }

    pub fn get(&self, field: MetaField) -> Option<&str> {
        self.slot(field).as_deref()
    }

    /// Set a field; an empty value clears it.
    pub fn set(&mut self, field: MetaField, value: impl Into<String>) {
        let value = value.into();
        *self.slot_mut(field) = if value.is_empty() { None } else { Some(value) };
    }

    /// Set a field only if it is currently unset and `value` is non-empty.
    ///
    /// Returns `true` when the field was written.
    pub fn set_if_unset(&mut self, field: MetaField, value: &str) -> bool {
        let slot = self.slot_mut(field);
        if slot.is_some() || value.is_empty() {
            return false;
        }
        *slot = Some(value.to_string());
        true
    }

    /// Album name for display: `albumTitle`, else the generic `title`.
    pub fn display_album(&self) -> Option<&str> {
        self.album_title.as_deref().or(self.title.as_deref())
    }

    /// Engineer name for display: parsed name, else the raw engineer line.
    pub fn display_engineer(&self) -> Option<&str> {
        self.mastering_engineer_name
            .as_deref()
            .or(self.mastering_engineer.as_deref())
    }

    fn slot(&self, field: MetaField) -> &Option<String> {
        match field {
            MetaField::Artist => &self.artist,
            MetaField::AlbumTitle => &self.album_title,
            MetaField::Client => &self.client,
            MetaField::Catalog => &self.catalog,
            MetaField::VinylSide => &self.vinyl_side,
            MetaField::Bits => &self.bits,
            MetaField::SampleRate => &self.sample_rate,
            MetaField::PerSideNote => &self.per_side_note,
            MetaField::MasteringEngineer => &self.mastering_engineer,
            MetaField::MasteringEngineerName => &self.mastering_engineer_name,
            MetaField::MasteringEngineerEmail => &self.mastering_engineer_email,
            MetaField::Title => &self.title,
            MetaField::Subtitle => &self.subtitle,
            MetaField::AlbumDuration => &self.album_duration,
            MetaField::GroupDuration => &self.group_duration,
        }
    }

    fn slot_mut(&mut self, field: MetaField) -> &mut Option<String> {
        match field {
            MetaField::Artist => &mut self.artist,
            MetaField::AlbumTitle => &mut self.album_title,
            MetaField::Client => &mut self.client,
            MetaField::Catalog => &mut self.catalog,
            MetaField::VinylSide => &mut self.vinyl_side,
            MetaField::Bits => &mut self.bits,
            MetaField::SampleRate => &mut self.sample_rate,
            MetaField::PerSideNote => &mut self.per_side_note,
            MetaField::MasteringEngineer => &mut self.mastering_engineer,
            MetaField::MasteringEngineerName => &mut self.mastering_engineer_name,
            MetaField::MasteringEngineerEmail => &mut self.mastering_engineer_email,
            MetaField::Title => &mut self.title,
            MetaField::Subtitle => &mut self.subtitle,
            MetaField::AlbumDuration => &mut self.album_duration,
            MetaField::GroupDuration => &mut self.group_duration,
        }
    }
}

/// Names of the well-known [`ReportMetadata`] keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetaField {
    Artist,
    AlbumTitle,
    Client,
    Catalog,
    VinylSide,
    Bits,
    SampleRate,
    PerSideNote,
    MasteringEngineer,
    MasteringEngineerName,
    MasteringEngineerEmail,
    Title,
    Subtitle,
    AlbumDuration,
    GroupDuration,
}

impl MetaField {
    pub const ALL: [MetaField; 15] = [
        MetaField::Artist,
        MetaField::AlbumTitle,
        MetaField::Client,
        MetaField::Catalog,
        MetaField::VinylSide,
        MetaField::Bits,
        MetaField::SampleRate,
        MetaField::PerSideNote,
        MetaField::MasteringEngineer,
        MetaField::MasteringEngineerName,
        MetaField::MasteringEngineerEmail,
        MetaField::Title,
        MetaField::Subtitle,
        MetaField::AlbumDuration,
        MetaField::GroupDuration,
    ];

    /// The camelCase key used in serialised metadata.
    pub const fn as_str(&self) -> &'static str {
        match self {
            MetaField::Artist => "artist",
            MetaField::AlbumTitle => "albumTitle",
            MetaField::Client => "client",
            MetaField::Catalog => "catalog",
            MetaField::VinylSide => "vinylSide",
            MetaField::Bits => "bits",
            MetaField::SampleRate => "sampleRate",
            MetaField::PerSideNote => "perSideNote",
            MetaField::MasteringEngineer => "masteringEngineer",
            MetaField::MasteringEngineerName => "masteringEngineerName",
            MetaField::MasteringEngineerEmail => "masteringEngineerEmail",
            MetaField::Title => "title",
            MetaField::Subtitle => "subtitle",
            MetaField::AlbumDuration => "albumDuration",
            MetaField::GroupDuration => "groupDuration",
        }
    }
}

impl fmt::Display for MetaField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetaField {
    type Err = String;

    /// Accepts the camelCase key, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MetaField::ALL
            .iter()
            .copied()
            .find(|f| f.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown metadata field '{s}'"))
    }
}
