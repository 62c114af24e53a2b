//! Configuration types for a drivebatch run.
//!
//! All run behaviour is controlled through [`RunConfig`], built via its
//! [`RunConfigBuilder`]. Keeping every knob in one struct makes it trivial to
//! share a config between the image and barcode pipelines and to diff two
//! runs to understand why their outputs differ.
//!
//! # Design choice: builder over constructor
//! A dozen-field constructor is unreadable and breaks on every new field.
//! The builder pattern lets callers set only what they care about and rely on
//! well-documented defaults for the rest.

use crate::error::DriveBatchError;
use crate::pipeline::fetch::FileFetcher;
use crate::pipeline::poll::PollOptions;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Configuration for an image-mode or barcode-mode run.
///
/// Built via [`RunConfig::builder()`] or using [`RunConfig::default()`].
///
/// # Example
/// ```rust
/// use drivebatch::RunConfig;
///
/// let config = RunConfig::builder()
///     .image_dir("downloads")
///     .poll_budget_secs(120)
///     .headless(true)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct RunConfig {
    /// Directory where downloaded images land, and the browser's configured
    /// download directory. Default: `downloaded_images`.
    pub image_dir: PathBuf,

    /// Directory where captioned single-page PDFs are written.
    /// Default: `pdf_images`.
    pub document_dir: PathBuf,

    /// Directory where barcode PNGs are written. Default: `barcodes`.
    pub barcode_dir: PathBuf,

    /// Launch the browser without a window. Default: false.
    ///
    /// Image mode relies on an already-logged-in interactive Google session,
    /// so the default keeps the window visible for the user to log in once at
    /// run start. Headless only makes sense when cookies are pre-seeded.
    pub headless: bool,

    /// How long to wait for the viewer page's download control. Default: 60 s.
    pub control_timeout_secs: u64,

    /// How long to wait for the large-file confirmation control on the
    /// direct-download fallback. Default: 10 s.
    ///
    /// Small files skip the confirmation page entirely, so this window is
    /// deliberately short — expiring it is the common, non-error case.
    pub confirm_timeout_secs: u64,

    /// Pause after triggering a download before polling starts. Default: 3 s.
    pub start_delay_secs: u64,

    /// Total time budget for a download to settle. Default: 60 s.
    pub poll_budget_secs: u64,

    /// Interval between download-directory scans. Default: 1000 ms.
    pub poll_interval_ms: u64,

    /// Maximum age of a settled file for it to be accepted. Default: 60 s.
    ///
    /// Guards against picking up a stale leftover from a previous run: the
    /// download directory doubles as the image output directory, so files
    /// from earlier rows are always present.
    pub freshness_secs: u64,

    /// Bar height in pixels for generated barcodes. Default: 80.
    pub barcode_height: u32,

    /// Unicode-capable TTF for the PDF header and the barcode caption. If
    /// None, a list of standard system font locations is probed (the PDF
    /// header additionally falls back to builtin Helvetica-Bold).
    pub unicode_font: Option<PathBuf>,

    /// Pre-constructed fetcher. Takes precedence over launching a browser
    /// session; the injection seam used by tests and embedders.
    pub fetcher: Option<Arc<dyn FileFetcher>>,

    /// Per-row progress events. If None, no events are emitted.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            image_dir: PathBuf::from("downloaded_images"),
            document_dir: PathBuf::from("pdf_images"),
            barcode_dir: PathBuf::from("barcodes"),
            headless: false,
            control_timeout_secs: 60,
            confirm_timeout_secs: 10,
            start_delay_secs: 3,
            poll_budget_secs: 60,
            poll_interval_ms: 1000,
            freshness_secs: 60,
            barcode_height: 80,
            unicode_font: None,
            fetcher: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunConfig")
            .field("image_dir", &self.image_dir)
            .field("document_dir", &self.document_dir)
            .field("barcode_dir", &self.barcode_dir)
            .field("headless", &self.headless)
            .field("control_timeout_secs", &self.control_timeout_secs)
            .field("confirm_timeout_secs", &self.confirm_timeout_secs)
            .field("start_delay_secs", &self.start_delay_secs)
            .field("poll_budget_secs", &self.poll_budget_secs)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("freshness_secs", &self.freshness_secs)
            .field("barcode_height", &self.barcode_height)
            .field("unicode_font", &self.unicode_font)
            .field("fetcher", &self.fetcher.as_ref().map(|_| "<dyn FileFetcher>"))
            .finish()
    }
}

impl RunConfig {
    /// Create a new builder for `RunConfig`.
    pub fn builder() -> RunConfigBuilder {
        RunConfigBuilder {
            config: Self::default(),
        }
    }

    /// The poller knobs bundled for [`crate::pipeline::poll::wait_for_download`].
    pub fn poll_options(&self) -> PollOptions {
        PollOptions {
            budget: Duration::from_secs(self.poll_budget_secs),
            interval: Duration::from_millis(self.poll_interval_ms),
            freshness: Duration::from_secs(self.freshness_secs),
        }
    }
}

/// Builder for [`RunConfig`].
#[derive(Debug)]
pub struct RunConfigBuilder {
    config: RunConfig,
}

impl RunConfigBuilder {
    pub fn image_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.image_dir = dir.into();
        self
    }

    pub fn document_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.document_dir = dir.into();
        self
    }

    pub fn barcode_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.barcode_dir = dir.into();
        self
    }

    pub fn headless(mut self, v: bool) -> Self {
        self.config.headless = v;
        self
    }

    pub fn control_timeout_secs(mut self, secs: u64) -> Self {
        self.config.control_timeout_secs = secs;
        self
    }

    pub fn confirm_timeout_secs(mut self, secs: u64) -> Self {
        self.config.confirm_timeout_secs = secs;
        self
    }

    pub fn start_delay_secs(mut self, secs: u64) -> Self {
        self.config.start_delay_secs = secs;
        self
    }

    pub fn poll_budget_secs(mut self, secs: u64) -> Self {
        self.config.poll_budget_secs = secs.max(1);
        self
    }

    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.poll_interval_ms = ms.max(1);
        self
    }

    pub fn freshness_secs(mut self, secs: u64) -> Self {
        self.config.freshness_secs = secs.max(1);
        self
    }

    pub fn barcode_height(mut self, px: u32) -> Self {
        self.config.barcode_height = px.max(1);
        self
    }

    pub fn unicode_font(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.unicode_font = Some(path.into());
        self
    }

    pub fn fetcher(mut self, fetcher: Arc<dyn FileFetcher>) -> Self {
        self.config.fetcher = Some(fetcher);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<RunConfig, DriveBatchError> {
        let c = &self.config;
        if c.poll_interval_ms > c.poll_budget_secs * 1000 {
            return Err(DriveBatchError::InvalidConfig(format!(
                "poll interval ({} ms) exceeds the poll budget ({} s)",
                c.poll_interval_ms, c.poll_budget_secs
            )));
        }
        if c.image_dir == c.document_dir {
            return Err(DriveBatchError::InvalidConfig(
                "image_dir and document_dir must differ".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_builds() {
        let config = RunConfig::builder().build().expect("default is valid");
        assert_eq!(config.poll_budget_secs, 60);
        assert_eq!(config.image_dir, PathBuf::from("downloaded_images"));
        assert!(!config.headless);
    }

    #[test]
    fn interval_must_fit_in_budget() {
        let result = RunConfig::builder()
            .poll_budget_secs(2)
            .poll_interval_ms(5000)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn image_and_document_dirs_must_differ() {
        let result = RunConfig::builder()
            .image_dir("out")
            .document_dir("out")
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn poll_options_reflect_config() {
        let config = RunConfig::builder()
            .poll_budget_secs(10)
            .poll_interval_ms(250)
            .build()
            .unwrap();
        let opts = config.poll_options();
        assert_eq!(opts.budget, Duration::from_secs(10));
        assert_eq!(opts.interval, Duration::from_millis(250));
    }
}
