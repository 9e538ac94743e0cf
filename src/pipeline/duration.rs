//! Duration strings: parsing, formatting and `StartM` normalisation.
//!
//! Two WaveLab dialects encode track start positions differently (`"34 s"`
//! vs. `"0:34"`), and track lengths arrive as `m:ss` or `h:mm:ss`. Everything
//! is reduced to whole seconds for arithmetic and printed back as `m:ss`.
//!
//! The formatter never emits an hour component: `1:02:03` parses to 3723 s
//! and prints as `62:03`.

use once_cell::sync::Lazy;
use regex::Regex;

static RE_SECONDS_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^(\d+)\s*s$").unwrap());
static RE_DIGITS_ONLY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)$").unwrap());

/// Parse `m:ss` or `h:mm:ss` into whole seconds.
///
/// Malformed input is treated as zero-length rather than rejected: empty
/// strings, non-numeric segments and any segment count other than 2 or 3
/// all yield `0`.
pub fn parse_duration(input: &str) -> u64 {
    let s = input.trim();
    if s.is_empty() {
        return 0;
    }

    let segments: Option<Vec<u64>> = s
        .split(':')
        .map(|seg| seg.trim().parse::<u64>().ok())
        .collect();

    match segments.as_deref() {
        Some([m, sec]) => m.saturating_mul(60).saturating_add(*sec),
        Some([h, m, sec]) => h
            .saturating_mul(3600)
            .saturating_add(m.saturating_mul(60))
            .saturating_add(*sec),
        _ => 0,
    }
}

/// Format whole seconds as `m:ss` (minutes unbounded, seconds zero-padded).
pub fn format_duration(total_secs: u64) -> String {
    format!("{}:{:02}", total_secs / 60, total_secs % 60)
}

/// Unify the two `StartM` encodings.
///
/// `"125 s"` and `"125"` are whole seconds and become `"2:05"`. Anything else
/// (already `m:ss`, or unrecognised) is returned as-is, trimmed.
pub fn normalize_start_m(raw: &str) -> String {
    let s = raw.trim();
    let caps = RE_SECONDS_SUFFIX
        .captures(s)
        .or_else(|| RE_DIGITS_ONLY.captures(s));

    match caps.and_then(|c| c[1].parse::<u64>().ok()) {
        Some(secs) => format_duration(secs),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minutes_seconds() {
        assert_eq!(parse_duration("3:45"), 225);
        assert_eq!(parse_duration(" 0:07 "), 7);
    }

    #[test]
    fn parses_hours_minutes_seconds() {
        assert_eq!(parse_duration("1:02:03"), 3723);
    }

    #[test]
    fn malformed_durations_are_zero() {
        assert_eq!(parse_duration(""), 0);
        assert_eq!(parse_duration("   "), 0);
        assert_eq!(parse_duration("225"), 0);
        assert_eq!(parse_duration("1:2:3:4"), 0);
        assert_eq!(parse_duration("3:4x"), 0);
        assert_eq!(parse_duration("abc"), 0);
    }

    #[test]
    fn formats_without_hours() {
        assert_eq!(format_duration(225), "3:45");
        assert_eq!(format_duration(0), "0:00");
        assert_eq!(format_duration(3723), "62:03");
    }

    #[test]
    fn mss_round_trip_is_identity() {
        for s in ["0:00", "3:45", "12:09", "125:59"] {
            assert_eq!(format_duration(parse_duration(s)), s);
        }
    }

    #[test]
    fn hour_component_is_narrowed_on_output() {
        assert_eq!(format_duration(parse_duration("1:00:00")), "60:00");
    }

    #[test]
    fn start_m_seconds_suffix() {
        assert_eq!(normalize_start_m("125 s"), "2:05");
        assert_eq!(normalize_start_m("0 s"), "0:00");
        assert_eq!(normalize_start_m("34S"), "0:34");
    }

    #[test]
    fn start_m_digits_only() {
        assert_eq!(normalize_start_m("34"), "0:34");
        assert_eq!(normalize_start_m("600"), "10:00");
    }

    #[test]
    fn start_m_other_shapes_pass_through() {
        assert_eq!(normalize_start_m("1:30"), "1:30");
        assert_eq!(normalize_start_m("00:01:30:12"), "00:01:30:12");
        assert_eq!(normalize_start_m(" 1:30 "), "1:30");
        assert_eq!(normalize_start_m("n/a"), "n/a");
    }
}
