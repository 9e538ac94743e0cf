//! Line rules for WaveLab `CustomText` annotations.
//!
//! Mastering houses type client, catalogue and engineer details into a free
//! text box that WaveLab exports verbatim. This module mines that blob with a
//! declarative table of line rules.
//!
//! ## Rule semantics
//!
//! - Every rule scans every (trimmed, non-blank) line independently.
//! - A rule only writes fields it captured a non-empty value for.
//! - The first line to set a field wins; later matches never overwrite it.
//!
//! Precedence lives in the data ([`RULES`]) rather than in control flow, so
//! adding a pattern means adding a row.

use crate::model::{MetaField, ReportMetadata};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// A single line pattern and the fields it extracts from a match.
struct LineRule {
    pattern: &'static Lazy<Regex>,
    extract: fn(&str, &Captures<'_>) -> Vec<(MetaField, String)>,
}

static RE_CLIENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^Client:\s*(.*)$").unwrap());
static RE_CATALOG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:Cat\. No|Cat No|Catalog #|Catalog):\s*(.*)$").unwrap());
static RE_ARTIST: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^Artist:\s*(.*)$").unwrap());
static RE_TITLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^Title:\s*(.*)$").unwrap());
static RE_VINYL_SIDE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^VINYL\s+SIDE\s*([A-Z0-9-]+)?").unwrap());
static RE_BITS_RATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+)\s*bit\s*/\s*(\d+)\s*khz").unwrap());
static RE_PER_SIDE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^Single WAV file per").unwrap());
static RE_ENGINEER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:mastering(?:\s+engineer)?|mastered by):\s*(.*)$").unwrap()
});

static RE_EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}").unwrap());
static RE_TRAILING_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*[/:\-]\s*$").unwrap());

static RULES: &[LineRule] = &[
    LineRule {
        pattern: &RE_CLIENT,
        extract: |_, c| captured(MetaField::Client, c, 1),
    },
    LineRule {
        pattern: &RE_CATALOG,
        extract: |_, c| captured(MetaField::Catalog, c, 1),
    },
    LineRule {
        pattern: &RE_ARTIST,
        extract: |_, c| captured(MetaField::Artist, c, 1),
    },
    LineRule {
        pattern: &RE_TITLE,
        extract: |_, c| captured(MetaField::AlbumTitle, c, 1),
    },
    LineRule {
        pattern: &RE_VINYL_SIDE,
        extract: |_, c| {
            let side = c.get(1).map(|m| m.as_str().trim()).unwrap_or("");
            let side = if side.is_empty() { "A" } else { side };
            vec![(MetaField::VinylSide, side.to_string())]
        },
    },
    LineRule {
        pattern: &RE_BITS_RATE,
        extract: |_, c| {
            vec![
                (MetaField::Bits, format!("{}bit", &c[1])),
                (MetaField::SampleRate, format!("{}khz", &c[2])),
            ]
        },
    },
    LineRule {
        pattern: &RE_PER_SIDE,
        extract: |line, _| vec![(MetaField::PerSideNote, line.to_string())],
    },
    LineRule {
        pattern: &RE_ENGINEER,
        extract: |_, c| {
            let value = c.get(1).map(|m| m.as_str().trim()).unwrap_or("");
            if value.is_empty() {
                return Vec::new();
            }
            let mut out = vec![(MetaField::MasteringEngineer, value.to_string())];
            let contact = split_engineer(value);
            if let Some(email) = contact.email {
                out.push((MetaField::MasteringEngineerEmail, email));
            }
            if let Some(name) = contact.name {
                out.push((MetaField::MasteringEngineerName, name));
            }
            out
        },
    },
];

fn captured(field: MetaField, caps: &Captures<'_>, group: usize) -> Vec<(MetaField, String)> {
    caps.get(group)
        .map(|m| m.as_str().trim())
        .filter(|v| !v.is_empty())
        .map(|v| vec![(field, v.to_string())])
        .unwrap_or_default()
}

/// Name and email recovered from a mastering-engineer value.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct EngineerContact {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Split `"Jane Doe / jane@x.com"`-style values into name and email.
pub fn split_engineer(value: &str) -> EngineerContact {
    let segments: Vec<&str> = value
        .split('/')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    if let Some(m) = RE_EMAIL.find(value) {
        let remainder = value.replacen(m.as_str(), "", 1);
        let remainder = RE_TRAILING_SEPARATOR.replace(&remainder, "");
        let mut name = remainder.trim().to_string();
        if name.is_empty() {
            name = segments.first().map(|s| s.to_string()).unwrap_or_default();
        }
        return EngineerContact {
            name: Some(name).filter(|n| !n.is_empty()),
            email: Some(m.as_str().to_string()),
        };
    }

    match segments.as_slice() {
        [name, email] if email.contains('@') => EngineerContact {
            name: Some(name.to_string()),
            email: Some(email.to_string()),
        },
        [first, ..] => EngineerContact {
            name: Some(first.to_string()),
            email: None,
        },
        [] => EngineerContact {
            name: Some(value.to_string()).filter(|v| !v.is_empty()),
            email: None,
        },
    }
}

/// Apply every rule to every line of `text`, filling unset fields of `meta`.
pub fn apply_rules(text: &str, meta: &mut ReportMetadata) {
    let lines = text.lines().map(str::trim).filter(|l| !l.is_empty());

    for line in lines {
        for rule in RULES {
            let Some(caps) = rule.pattern.captures(line) else {
                continue;
            };
            for (field, value) in (rule.extract)(line, &caps) {
                meta.set_if_unset(field, &value);
            }
        }
    }
}
