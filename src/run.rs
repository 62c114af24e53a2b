//! Run orchestration: the top-level entry points that walk a spreadsheet
//! through the image or barcode pipeline.
//!
//! Both modes follow the same shape: load rows, prepare output directories,
//! process rows strictly sequentially, and return a [`RunSummary`]. A row
//! failure never aborts the run; it is logged, tallied, and the run moves on.
//! Re-running the same spreadsheet is cheap because output-file presence is
//! the resume checkpoint.

use crate::config::RunConfig;
use crate::error::{DriveBatchError, RowError};
use crate::output::{RowOutcome, RowReport, RunSummary};
use crate::pipeline::barcode::generate_barcode;
use crate::pipeline::compose::compose_document;
use crate::pipeline::fetch::{BrowserFetcher, FileFetcher};
use crate::pipeline::naming::{document_filename, image_filename, sanitize};
use crate::session::DriveSession;
use crate::sheet::{
    read_barcode_rows, read_image_rows, resolve_identifier, BarcodeRow, ImageRow,
};
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

/// Download every image listed in `spreadsheet` and compose its captioned
/// document.
///
/// Launches one interactive browser session for the whole run (log in once,
/// reuse for every row) unless a fetcher was injected via
/// [`RunConfig::builder`], in which case no browser is started. The session
/// is always closed before returning, whatever the per-row outcomes were.
pub async fn run_images(
    spreadsheet: impl AsRef<Path>,
    config: &RunConfig,
) -> Result<RunSummary, DriveBatchError> {
    let spreadsheet = spreadsheet.as_ref();

    // ── Step 1: load the sheet and prepare directories ───────────────────
    let rows = read_image_rows(spreadsheet)?;
    info!("{}: {} rows to process", spreadsheet.display(), rows.len());

    for dir in [&config.image_dir, &config.document_dir] {
        std::fs::create_dir_all(dir).map_err(|e| DriveBatchError::OutputDir {
            path: dir.clone(),
            source: e,
        })?;
    }

    // ── Step 2: pick the fetcher ──────────────────────────────────────────
    if let Some(fetcher) = &config.fetcher {
        return Ok(process_image_rows(&rows, fetcher.as_ref(), config).await);
    }

    let session = DriveSession::launch(&config.image_dir, config.headless).await?;
    let summary = {
        let fetcher = BrowserFetcher::new(&session, config);
        process_image_rows(&rows, &fetcher, config).await
    };

    // ── Step 3: release the session ───────────────────────────────────────
    session.close().await;

    Ok(summary)
}

/// Process pre-loaded image rows through `fetcher`.
///
/// Exposed so embedders and tests can drive the row pipeline without a
/// spreadsheet on disk or a live browser.
pub async fn process_image_rows(
    rows: &[ImageRow],
    fetcher: &dyn FileFetcher,
    config: &RunConfig,
) -> RunSummary {
    let started = Instant::now();
    let total = rows.len();
    let mut summary = RunSummary::new(total);
    let mut last_id: Option<i64> = None;

    if let Some(cb) = &config.progress_callback {
        cb.on_run_start(total);
    }

    for (idx, row) in rows.iter().enumerate() {
        let row_num = idx + 1;
        let label = row.name.clone().unwrap_or_default();

        // The identifier sequence advances even when the row later fails, so
        // a re-run assigns every row the same id as the first run did.
        let (id, next_last) = resolve_identifier(row.id.as_deref(), last_id);
        last_id = next_last;

        if let Some(cb) = &config.progress_callback {
            cb.on_row_start(row_num, total, &label);
        }

        let image_name = image_filename(
            &id,
            row.place.as_deref(),
            row.event.as_deref(),
            row.name.as_deref(),
        );
        let image_path = config.image_dir.join(&image_name);
        let document_path = config.document_dir.join(document_filename(&image_name));
        let header = row.participants.clone().unwrap_or_default();

        let outcome = if row.url.is_none() {
            warn!("[{row_num}/{total}] skipped: {}", RowError::MissingUrl);
            RowOutcome::Failed {
                reason: RowError::MissingUrl.to_string(),
            }
        } else if image_path.exists() {
            info!("[{row_num}/{total}] {} already present", image_name);
            // Repair pass: the image survived an earlier run but the
            // document may not have.
            if !document_path.exists() {
                if let Err(e) = compose_document(
                    image_path.clone(),
                    document_path.clone(),
                    header.clone(),
                    config.unicode_font.clone(),
                )
                .await
                {
                    warn!("[{row_num}/{total}] document repair failed: {e}");
                }
            }
            RowOutcome::AlreadyPresent
        } else {
            match fetcher
                .fetch(row.url.as_deref().unwrap_or_default(), &image_path)
                .await
            {
                Ok(saved) => {
                    info!("[{row_num}/{total}] fetched {}", saved.display());
                    // Composition problems never fail the row; the image is
                    // already safe on disk and a re-run repairs the document.
                    if let Err(e) = compose_document(
                        saved,
                        document_path.clone(),
                        header.clone(),
                        config.unicode_font.clone(),
                    )
                    .await
                    {
                        warn!("[{row_num}/{total}] document composition failed: {e}");
                    }
                    RowOutcome::Fetched
                }
                Err(e) => {
                    warn!("[{row_num}/{total}] failed: {e}");
                    RowOutcome::Failed {
                        reason: e.to_string(),
                    }
                }
            }
        };

        if let Some(cb) = &config.progress_callback {
            cb.on_row_complete(row_num, total, &outcome);
        }
        summary.record(RowReport {
            row_num,
            label,
            outcome,
        });
    }

    summary.duration_ms = started.elapsed().as_millis() as u64;
    if let Some(cb) = &config.progress_callback {
        cb.on_run_complete(total, summary.successful);
    }
    info!(
        "run complete: {}/{} rows succeeded in {} ms",
        summary.successful, total, summary.duration_ms
    );
    summary
}

/// Generate a Code 128 barcode PNG for every row in `spreadsheet`.
pub async fn run_barcodes(
    spreadsheet: impl AsRef<Path>,
    config: &RunConfig,
) -> Result<RunSummary, DriveBatchError> {
    let spreadsheet = spreadsheet.as_ref();

    let rows = read_barcode_rows(spreadsheet)?;
    info!("{}: {} barcode rows", spreadsheet.display(), rows.len());

    std::fs::create_dir_all(&config.barcode_dir).map_err(|e| DriveBatchError::OutputDir {
        path: config.barcode_dir.clone(),
        source: e,
    })?;

    Ok(process_barcode_rows(&rows, config))
}

/// Process pre-loaded barcode rows. Synchronous: encoding is pure CPU and
/// each PNG is tiny.
pub fn process_barcode_rows(rows: &[BarcodeRow], config: &RunConfig) -> RunSummary {
    let started = Instant::now();
    let total = rows.len();
    let mut summary = RunSummary::new(total);

    if let Some(cb) = &config.progress_callback {
        cb.on_run_start(total);
    }

    for (idx, row) in rows.iter().enumerate() {
        let row_num = idx + 1;
        let label = match sanitize(row.name.as_deref()) {
            s if s.is_empty() => format!("barcode_{row_num}"),
            s => s,
        };

        if let Some(cb) = &config.progress_callback {
            cb.on_row_start(row_num, total, &label);
        }

        let dest = config.barcode_dir.join(format!("{label}.png"));
        let code = row.code.as_deref().map(str::trim).unwrap_or_default();

        let outcome = if code.is_empty() {
            warn!("[{row_num}/{total}] skipped: {}", RowError::MissingCode);
            RowOutcome::Failed {
                reason: RowError::MissingCode.to_string(),
            }
        } else if dest.exists() {
            info!("[{row_num}/{total}] {} already present", label);
            RowOutcome::AlreadyPresent
        } else {
            match generate_barcode(code, &dest, config.barcode_height, config.unicode_font.as_deref()) {
                Ok(()) => {
                    info!("[{row_num}/{total}] generated {}", dest.display());
                    RowOutcome::Generated
                }
                Err(e) => {
                    warn!("[{row_num}/{total}] failed: {e}");
                    RowOutcome::Failed {
                        reason: e.to_string(),
                    }
                }
            }
        };

        if let Some(cb) = &config.progress_callback {
            cb.on_row_complete(row_num, total, &outcome);
        }
        summary.record(RowReport {
            row_num,
            label,
            outcome,
        });
    }

    summary.duration_ms = started.elapsed().as_millis() as u64;
    if let Some(cb) = &config.progress_callback {
        cb.on_run_complete(total, summary.successful);
    }
    info!(
        "barcode run complete: {}/{} rows succeeded in {} ms",
        summary.successful, total, summary.duration_ms
    );
    summary
}
