//! CLI binary for tracksheet.
//!
//! A thin shim over the library crate that maps CLI flags to `ReportConfig`
//! and `AppState` transitions, then prints or writes the report.

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::warn;
use tracing_subscriber::EnvFilter;
use tracksheet::convert::write_atomic;
use tracksheet::error::PARSE_FAILURE_MESSAGE;
use tracksheet::pipeline::input::{is_supported, read_source};
use tracksheet::pipeline::layout::total_duration;
use tracksheet::{
    inspect, render_document, AppState, MetaField, OutputFormat, PaperSize, ReportConfig,
};

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # PDF report next to the current directory, named after the album
  tracksheet montage.xml

  # Explicit output path and studio logo
  tracksheet tracks.csv -o report.pdf --logo studio.png

  # Plain-text preview on the terminal
  tracksheet montage.xml --format text

  # Fill in details the export does not carry
  tracksheet tracks.csv --set artist="The Band" --set vinylSide=B

  # Show what was parsed, without rendering
  tracksheet --inspect-only montage.xml --json

METADATA KEYS (--set):
  artist, albumTitle, client, catalog, vinylSide, bits, sampleRate,
  perSideNote, masteringEngineer, masteringEngineerName,
  masteringEngineerEmail, title, subtitle, albumDuration, groupDuration

  Setting vinylSide switches the report to vinyl mode (no ISRC column,
  25 rows on the first page). An empty value clears a key.

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH         Directory containing libpdfium; falls back to the
                          system library when unset or not found
  RUST_LOG                Overrides the -v / -q log level
"#;

/// Render CD and vinyl track lists as paginated mastering reports.
#[derive(Parser, Debug)]
#[command(
    name = "tracksheet",
    version,
    about = "Render CD and vinyl track lists as paginated mastering reports",
    long_about = "Read a track list (CSV, or a WaveLab XML montage export) and render a \
paginated PDF report with a studio header, the running order and the total duration. \
WaveLab CustomText annotations are mined for client, catalogue and engineer details.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Track list: a .csv file or a WaveLab .xml export.
    input: PathBuf,

    /// Write the report to this file (default: <album>-<date>.pdf, or stdout for text).
    #[arg(short, long, env = "TRACKSHEET_OUTPUT")]
    output: Option<PathBuf>,

    /// Report date as YYYY-MM-DD (default: today).
    #[arg(long, env = "TRACKSHEET_DATE", value_parser = parse_date)]
    date: Option<NaiveDate>,

    /// Studio logo image (PNG or JPEG) drawn in the header.
    #[arg(long, env = "TRACKSHEET_LOGO")]
    logo: Option<PathBuf>,

    /// Paper size for PDF output.
    #[arg(long, env = "TRACKSHEET_PAPER", value_enum, default_value = "a4")]
    paper: PaperArg,

    /// Override a metadata field: key=value (repeatable).
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_assignment,
          env = "TRACKSHEET_SET", value_delimiter = ';')]
    set: Vec<(MetaField, String)>,

    /// Output format.
    #[arg(long, env = "TRACKSHEET_FORMAT", value_enum, default_value = "pdf")]
    format: FormatArg,

    /// Base font size for table text in points (6–14).
    #[arg(long, env = "TRACKSHEET_FONT_SIZE", default_value_t = 9.0)]
    font_size: f32,

    /// Print a JSON summary (stats and metadata) on stdout.
    #[arg(long, env = "TRACKSHEET_JSON")]
    json: bool,

    /// Print what was parsed from the input, without rendering.
    #[arg(long)]
    inspect_only: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "TRACKSHEET_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "TRACKSHEET_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum PaperArg {
    A4,
    Letter,
}

impl From<PaperArg> for PaperSize {
    fn from(v: PaperArg) -> Self {
        match v {
            PaperArg::A4 => PaperSize::A4,
            PaperArg::Letter => PaperSize::Letter,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Pdf,
    Text,
}

impl From<FormatArg> for OutputFormat {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Pdf => OutputFormat::Pdf,
            FormatArg::Text => OutputFormat::Text,
        }
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| format!("expected YYYY-MM-DD ({e})"))
}

fn parse_assignment(s: &str) -> Result<(MetaField, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    let field = key.trim().parse::<MetaField>()?;
    Ok((field, value.trim().to_string()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || cli.json {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let summary = inspect(&cli.input)
            .await
            .context("Failed to read track list")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&summary).context("Failed to serialize summary")?
            );
        } else {
            println!("File:         {}", summary.filename);
            println!("Tracks:       {}", summary.record_count);
            println!("Columns:      {}", summary.columns.join(", "));
            println!("Mode:         {}", if summary.vinyl { "vinyl" } else { "CD" });
            println!("Total:        {}", summary.total_duration);
            for field in MetaField::ALL {
                if let Some(v) = summary.metadata.get(field) {
                    println!("{:<13} {}", format!("{field}:"), v);
                }
            }
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let config = build_config(&cli)?;
    let date = cli.date.unwrap_or_else(|| Local::now().date_naive());

    // ── Ingest and apply overrides ───────────────────────────────────────
    let start = Instant::now();
    let source = read_source(&cli.input)
        .await
        .context("Failed to read track list")?;
    if !is_supported(&source.filename) {
        warn!(
            "'{}' is not a .csv or .xml file; parsing it as XML",
            source.filename
        );
    }

    let mut state = AppState::new();
    state
        .load(&source.bytes, &source.filename)
        .with_context(|| format!("{} ({})", PARSE_FAILURE_MESSAGE, source.filename))?;
    for (field, value) in &cli.set {
        state.set_field(*field, value);
    }

    // ── Lay out and render ───────────────────────────────────────────────
    let document = state
        .export(date, &config.layout_options())
        .with_context(|| format!("Nothing to export: '{}' contains no tracks", source.filename))?;
    let bytes = render_document(&document, &config)
        .await
        .context("Rendering failed")?;

    let target = match (&cli.output, config.format) {
        (Some(path), _) => Some(path.clone()),
        (None, OutputFormat::Pdf) => Some(default_output(&state, date, config.format)),
        (None, OutputFormat::Text) => None,
    };

    match &target {
        Some(path) => write_atomic(path, &bytes)
            .await
            .context("Failed to write report")?,
        None if !cli.json => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(&bytes)
                .context("Failed to write to stdout")?;
        }
        None => {}
    }

    // ── Summary ──────────────────────────────────────────────────────────
    let total = total_duration(state.records());
    if cli.json {
        let summary = serde_json::json!({
            "output": target.as_ref().map(|p| p.display().to_string()),
            "tracks": state.records().len(),
            "pages": document.page_count(),
            "vinyl": document.vinyl,
            "totalDuration": total,
            "bytes": bytes.len(),
            "metadata": state.metadata(),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?
        );
    } else if !cli.quiet {
        eprintln!(
            "{}  {} tracks  {} pages  {}  {}{}",
            green("✔"),
            state.records().len(),
            document.page_count(),
            cyan(&total),
            dim(&format!("{}ms", start.elapsed().as_millis())),
            target
                .as_ref()
                .map(|p| format!("  →  {}", bold(&p.display().to_string())))
                .unwrap_or_default(),
        );
    }

    Ok(())
}

/// Map CLI args to `ReportConfig`.
fn build_config(cli: &Cli) -> Result<ReportConfig> {
    let mut builder = ReportConfig::builder()
        .paper(cli.paper.into())
        .format(cli.format.into())
        .font_size(cli.font_size);
    if let Some(logo) = &cli.logo {
        builder = builder.logo(logo);
    }
    builder.build().context("Invalid configuration")
}

/// `<album>-<date>.<ext>` in the current directory.
fn default_output(state: &AppState, date: NaiveDate, format: OutputFormat) -> PathBuf {
    Path::new(&state.suggested_filename(date)).with_extension(format.extension())
}
