//! End-to-end PDF rendering tests for tracksheet.
//!
//! These tests need a pdfium shared library. They are gated behind the
//! `E2E_ENABLED` environment variable so they do not run in CI unless
//! explicitly requested.
//!
//! Run with:
//!   E2E_ENABLED=1 PDFIUM_LIB_PATH=/opt/pdfium/lib cargo test --test e2e -- --nocapture

use chrono::NaiveDate;
use std::path::PathBuf;
use tracksheet::{
    convert_dated, convert_to_file, layout, DocumentRenderer, PaperSize, PdfiumRenderer,
    RecordSet, ReportConfig, ReportMetadata, TracksheetError,
};

// ── Test helpers ─────────────────────────────────────────────────────────────

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
}

/// Skip this test unless E2E_ENABLED is set.
macro_rules! e2e_skip_unless_enabled {
    () => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP: set E2E_ENABLED=1 to run e2e tests");
            return;
        }
    }};
}

/// Count `/Type /Page` objects, excluding the `/Pages` tree node.
fn pdf_page_count(bytes: &[u8]) -> usize {
    let needle = b"/Type /Page";
    bytes
        .windows(needle.len() + 1)
        .filter(|w| &w[..needle.len()] == needle && w[needle.len()] != b's')
        .count()
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_render_csv_album_pdf() {
    e2e_skip_unless_enabled!();

    let out = convert_dated(fixture("album.csv"), &ReportConfig::default(), date())
        .await
        .expect("conversion succeeds");

    assert!(out.bytes.starts_with(b"%PDF"), "output is not a PDF");
    assert_eq!(out.stats.page_count, 1);
    println!("album.csv → {} bytes", out.bytes.len());
}

#[tokio::test]
async fn test_render_multi_page_letter() {
    e2e_skip_unless_enabled!();

    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("long.csv");
    let mut csv = String::from("Title,Length\n");
    for i in 1..=95 {
        csv.push_str(&format!("Track {i},3:{:02}\n", i % 60));
    }
    std::fs::write(&src, csv).unwrap();

    let out_path = dir.path().join("long.pdf");
    let config = ReportConfig::builder()
        .paper(PaperSize::Letter)
        .build()
        .unwrap();
    let stats = convert_to_file(&src, &out_path, &config)
        .await
        .expect("conversion succeeds");

    // 30 + 40 + 25
    assert_eq!(stats.page_count, 3);
    let bytes = std::fs::read(&out_path).unwrap();
    assert!(bytes.starts_with(b"%PDF"));
    let pages = pdf_page_count(&bytes);
    if pages > 0 {
        assert_eq!(pages, 3);
    }
}

#[test]
fn test_render_empty_document() {
    e2e_skip_unless_enabled!();

    let doc = layout(&RecordSet::default(), &ReportMetadata::default(), date());
    let bytes = PdfiumRenderer::new(PaperSize::A4, 9.0)
        .render(&doc)
        .expect("empty report renders");
    assert!(bytes.starts_with(b"%PDF"));
}

#[test]
fn test_unreadable_logo_fails_before_binding() {
    // No pdfium needed: the logo is decoded before the library is bound.
    let config = ReportConfig::builder()
        .logo("/no/such/logo.png")
        .build()
        .unwrap();
    let err = PdfiumRenderer::from_config(&config).unwrap_err();
    assert!(matches!(err, TracksheetError::LogoUnreadable { .. }));
}
