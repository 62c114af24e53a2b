//! # drivebatch
//!
//! Batch-download images referenced by a spreadsheet of Google Drive share
//! links, file them under metadata-derived names, and compose each into a
//! captioned single-page PDF. An alternate mode turns a two-column sheet of
//! labels and codes into Code 128 barcode PNGs.
//!
//! ## Image pipeline
//!
//! ```text
//! ┌────────┐   ┌─────────┐   ┌──────────────────┐   ┌────────┐   ┌─────────┐
//! │  xlsx  │──▶│ extract │──▶│ fetch             │──▶│ naming │──▶│ compose │
//! │  rows  │   │ file id │   │ (browser + poll)  │   │ rename │   │ PDF     │
//! └────────┘   └─────────┘   └──────────────────┘   └────────┘   └─────────┘
//! ```
//!
//! One visible browser session is launched per run so the user logs in to
//! Google once; every row then navigates the same page, clicks the download
//! control, and the pipeline polls the download directory until the file
//! settles. Rows whose output file already exists are skipped, which makes a
//! re-run the natural way to pick up rows that failed the first time.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use drivebatch::{run_images, RunConfig};
//!
//! # async fn example() -> Result<(), drivebatch::DriveBatchError> {
//! let summary = run_images("July.xlsx", &RunConfig::default()).await?;
//! println!("{}/{} rows succeeded", summary.successful, summary.total);
//! # Ok(())
//! # }
//! ```
//!
//! ## Custom configuration
//!
//! ```rust,no_run
//! use drivebatch::{run_images, RunConfig};
//!
//! # async fn example() -> Result<(), drivebatch::DriveBatchError> {
//! let config = RunConfig::builder()
//!     .image_dir("downloads")
//!     .document_dir("documents")
//!     .poll_budget_secs(120)
//!     .build()?;
//! let summary = run_images("July.xlsx", &config).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Error model
//!
//! Fatal problems (missing spreadsheet, browser refused to launch) return
//! [`DriveBatchError`] before any row is touched. Everything that can go
//! wrong for a single row is a [`RowError`], tallied per row in the returned
//! [`RunSummary`] while the run continues.

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod run;
pub mod session;
pub mod sheet;

pub use config::{RunConfig, RunConfigBuilder};
pub use error::{DriveBatchError, RowError};
pub use output::{RowOutcome, RowReport, RunSummary};
pub use pipeline::fetch::FileFetcher;
pub use progress::{NoopProgressCallback, ProgressCallback, RunProgressCallback};
pub use run::{process_barcode_rows, process_image_rows, run_barcodes, run_images};
pub use session::DriveSession;
pub use sheet::{read_barcode_rows, read_image_rows, resolve_identifier, BarcodeRow, ImageRow};
