//! CLI binary for drivebatch.
//!
//! A thin shim over the library crate that maps CLI flags to `RunConfig`,
//! picks the pipeline mode, and prints the run summary.

use anyhow::{bail, Context, Result};
use clap::Parser;
use drivebatch::{
    run_barcodes, run_images, ProgressCallback, RowOutcome, RunConfig, RunProgressCallback,
    RunSummary,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
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

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a live bar anchored at the bottom plus one
/// printed line per row as it completes.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0); // length set in on_run_start

        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} rows  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Processing");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }
}

impl RunProgressCallback for CliProgressCallback {
    fn on_run_start(&self, total_rows: usize) {
        self.bar.set_length(total_rows as u64);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Processing {total_rows} rows…"))
        ));
    }

    fn on_row_start(&self, _row_num: usize, _total: usize, label: &str) {
        self.bar.set_message(label.to_string());
    }

    fn on_row_complete(&self, row_num: usize, total: usize, outcome: &RowOutcome) {
        let line = match outcome {
            RowOutcome::Fetched => format!("  {} Row {:>3}/{:<3}  fetched", green("✓"), row_num, total),
            RowOutcome::Generated => {
                format!("  {} Row {:>3}/{:<3}  generated", green("✓"), row_num, total)
            }
            RowOutcome::AlreadyPresent => format!(
                "  {} Row {:>3}/{:<3}  {}",
                green("✓"),
                row_num,
                total,
                dim("already present")
            ),
            RowOutcome::Failed { reason } => {
                // Truncate very long error messages to keep output tidy.
                let msg = if reason.len() > 80 {
                    format!("{}\u{2026}", &reason[..79])
                } else {
                    reason.clone()
                };
                format!("  {} Row {:>3}/{:<3}  {}", red("✗"), row_num, total, red(&msg))
            }
        };
        self.bar.println(line);
        self.bar.inc(1);
    }

    fn on_run_complete(&self, total_rows: usize, success_count: usize) {
        let failed = total_rows.saturating_sub(success_count);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} rows processed successfully",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} rows processed  ({} failed)",
                if failed == total_rows { red("✘") } else { cyan("⚠") },
                bold(&success_count.to_string()),
                total_rows,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Download images and compose captioned PDFs
  drivebatch July.xlsx

  # No argument: prompts for the spreadsheet filename
  drivebatch

  # Barcode mode (explicit, or automatic for Barcodes.xlsx)
  drivebatch --mode barcodes staff.xlsx
  drivebatch Barcodes.xlsx

  # Custom directories and a longer download budget
  drivebatch July.xlsx --image-dir downloads --document-dir documents --poll-budget 120

  # Headless run (browser profile must already carry Google cookies)
  drivebatch July.xlsx --headless

  # Machine-readable summary
  drivebatch July.xlsx --json > report.json

SPREADSHEET LAYOUT (first worksheet, no header row):
  Image mode     A: id           B: share link   C: participants
                 D: payer name   E: event        F: place
  Barcode mode   A: label        B: code

  A blank id cell continues the running sequence (starting at 1), so ids
  only need to be typed where the sequence jumps.

ENVIRONMENT VARIABLES:
  DRIVEBATCH_IMAGE_DIR       Download / image output directory
  DRIVEBATCH_DOCUMENT_DIR    Composed-PDF output directory
  DRIVEBATCH_BARCODE_DIR     Barcode PNG output directory
  DRIVEBATCH_FONT            Unicode TTF for the PDF header caption

SETUP:
  1. Run:     drivebatch July.xlsx
  2. Log in:  a browser window opens — sign in to Google once
  3. Wait:    rows are processed sequentially; re-run to pick up failures
"#;

/// Batch-download Drive images from a spreadsheet and build captioned PDFs.
#[derive(Parser, Debug)]
#[command(
    name = "drivebatch",
    version,
    about = "Batch-download Google Drive images from a spreadsheet, rename them, and compose captioned PDFs",
    long_about = "Reads a spreadsheet of Google Drive share links, downloads each image through \
an interactive browser session, renames it from the row's metadata columns, and composes a \
captioned single-page PDF. Barcode mode instead turns label/code rows into Code 128 PNGs.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Spreadsheet to process (xlsx). Prompted for when omitted.
    input: Option<PathBuf>,

    /// Pipeline mode. `auto` selects barcodes for a file named Barcodes.xlsx.
    #[arg(long, value_enum, default_value = "auto")]
    mode: ModeArg,

    /// Launch the browser without a window (requires pre-seeded cookies).
    #[arg(long, env = "DRIVEBATCH_HEADLESS")]
    headless: bool,

    /// Directory for downloaded images (also the browser download dir).
    #[arg(long, env = "DRIVEBATCH_IMAGE_DIR", default_value = "downloaded_images")]
    image_dir: PathBuf,

    /// Directory for composed PDF documents.
    #[arg(long, env = "DRIVEBATCH_DOCUMENT_DIR", default_value = "pdf_images")]
    document_dir: PathBuf,

    /// Directory for barcode PNGs.
    #[arg(long, env = "DRIVEBATCH_BARCODE_DIR", default_value = "barcodes")]
    barcode_dir: PathBuf,

    /// Unicode-capable TTF for the PDF header caption.
    #[arg(long, env = "DRIVEBATCH_FONT")]
    font: Option<PathBuf>,

    /// Seconds to wait for each download to settle.
    #[arg(long, env = "DRIVEBATCH_POLL_BUDGET", default_value_t = 60)]
    poll_budget: u64,

    /// Bar height in pixels for generated barcodes.
    #[arg(long, env = "DRIVEBATCH_BARCODE_HEIGHT", default_value_t = 80)]
    barcode_height: u32,

    /// Output the run summary as JSON on stdout.
    #[arg(long, env = "DRIVEBATCH_JSON")]
    json: bool,

    /// Disable the progress bar.
    #[arg(long, env = "DRIVEBATCH_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DRIVEBATCH_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DRIVEBATCH_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ModeArg {
    Auto,
    Images,
    Barcodes,
}

/// Reserved filename that `auto` mode treats as a barcode sheet.
const RESERVED_BARCODE_SHEET: &str = "Barcodes.xlsx";

fn select_mode(mode: ModeArg, input: &Path) -> ModeArg {
    match mode {
        ModeArg::Auto => {
            let is_barcode_sheet = input
                .file_name()
                .is_some_and(|n| n.eq_ignore_ascii_case(RESERVED_BARCODE_SHEET));
            if is_barcode_sheet {
                ModeArg::Barcodes
            } else {
                ModeArg::Images
            }
        }
        explicit => explicit,
    }
}

/// Prompt on the terminal for the spreadsheet filename.
fn prompt_for_input() -> Result<PathBuf> {
    eprint!("Enter spreadsheet filename (e.g. July.xlsx): ");
    io::stderr().flush().ok();
    let mut line = String::new();
    io::stdin()
        .read_line(&mut line)
        .context("Failed to read spreadsheet filename from stdin")?;
    let trimmed = line.trim();
    if trimmed.is_empty() {
        bail!("No spreadsheet filename given");
    }
    Ok(PathBuf::from(trimmed))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
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

    // ── Resolve input and mode ───────────────────────────────────────────
    let input = match cli.input.clone() {
        Some(path) => path,
        None => prompt_for_input()?,
    };
    let mode = select_mode(cli.mode, &input);

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn RunProgressCallback>)
    } else {
        None
    };

    let mut builder = RunConfig::builder()
        .image_dir(cli.image_dir.clone())
        .document_dir(cli.document_dir.clone())
        .barcode_dir(cli.barcode_dir.clone())
        .headless(cli.headless)
        .poll_budget_secs(cli.poll_budget)
        .barcode_height(cli.barcode_height);
    if let Some(ref font) = cli.font {
        builder = builder.unicode_font(font.clone());
    }
    if let Some(cb) = progress_cb {
        builder = builder.progress_callback(cb);
    }
    let config = builder.build().context("Invalid configuration")?;

    // ── Run the selected pipeline ────────────────────────────────────────
    let summary = match mode {
        ModeArg::Barcodes => run_barcodes(&input, &config)
            .await
            .context("Barcode run failed")?,
        _ => run_images(&input, &config)
            .await
            .context("Image run failed")?,
    };

    // ── Report ───────────────────────────────────────────────────────────
    if cli.json {
        let json =
            serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?;
        println!("{json}");
    } else if !cli.quiet && !show_progress {
        // Only print inline stats when the progress callback is disabled
        // (the callback already printed the final tick line).
        print_summary(&summary);
    }

    if summary.failed > 0 && summary.successful == 0 && summary.total > 0 {
        bail!("every row failed ({} rows)", summary.total);
    }

    Ok(())
}

/// Plain-text summary block for `--no-progress` runs.
fn print_summary(summary: &RunSummary) {
    eprintln!(
        "Processed {}/{} rows in {}ms",
        summary.successful, summary.total, summary.duration_ms
    );
    if summary.failed > 0 {
        eprintln!("  {} rows failed:", summary.failed);
        for row in summary.rows.iter().filter(|r| !r.outcome.is_success()) {
            if let RowOutcome::Failed { reason } = &row.outcome {
                eprintln!("    row {:>3}  {}  {}", row.row_num, row.label, reason);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_mode_reserves_barcode_sheet() {
        assert_eq!(
            select_mode(ModeArg::Auto, Path::new("Barcodes.xlsx")),
            ModeArg::Barcodes
        );
        assert_eq!(
            select_mode(ModeArg::Auto, Path::new("data/barcodes.XLSX")),
            ModeArg::Barcodes
        );
        assert_eq!(
            select_mode(ModeArg::Auto, Path::new("July.xlsx")),
            ModeArg::Images
        );
    }

    #[test]
    fn explicit_mode_wins() {
        assert_eq!(
            select_mode(ModeArg::Images, Path::new("Barcodes.xlsx")),
            ModeArg::Images
        );
        assert_eq!(
            select_mode(ModeArg::Barcodes, Path::new("July.xlsx")),
            ModeArg::Barcodes
        );
    }
}
