//! Fetch orchestration: drive the browser through a share page to trigger a
//! download, then collect and relocate the result.
//!
//! The [`FileFetcher`] trait is the pipeline's injection seam: the row
//! pipeline only sees the trait, so tests and embedders can supply a mock
//! while the real run uses [`BrowserFetcher`] over the shared
//! [`DriveSession`].
//!
//! ## Control flow per file
//!
//! 1. Extract the file id from the share-link; fail fast if unparseable.
//! 2. Open the viewer page and wait for a visible download control.
//! 3. If none appears, fall back to the direct-download URL; a large-file
//!    confirmation control may or may not show up there (small files start
//!    downloading immediately).
//! 4. Give the transfer a moment to start, then poll the download directory
//!    for a settled file and rename it to the destination.

use crate::config::RunConfig;
use crate::error::RowError;
use crate::pipeline::extract::extract_file_id;
use crate::pipeline::poll::{wait_for_download, PollOptions};
use crate::session::DriveSession;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info};

/// Selector for the viewer page's download control. Matched on the
/// aria-label because Drive's class names are build-generated.
pub const DOWNLOAD_CONTROL_SELECTOR: &str =
    r#"[aria-label*="Download"], [aria-label*="download"]"#;

/// Selector for the large-file confirmation control on the direct-download
/// fallback page.
pub const CONFIRM_CONTROL_SELECTOR: &str = "#uc-download-link";

/// Viewer page for a file id.
pub fn viewer_url(file_id: &str) -> String {
    format!("https://drive.google.com/file/d/{file_id}/view")
}

/// Direct-download URL variant for a file id.
pub fn direct_download_url(file_id: &str) -> String {
    format!("https://drive.google.com/uc?export=download&id={file_id}")
}

/// Fetches one remote file to a local destination path.
///
/// Implementations must be `Send + Sync`; the pipeline holds the fetcher for
/// the whole run.
#[async_trait]
pub trait FileFetcher: Send + Sync {
    /// Fetch the file behind `share_link` and leave it at `dest`.
    ///
    /// Returns the final path (normally `dest`) or a per-row error.
    async fn fetch(&self, share_link: &str, dest: &Path) -> Result<PathBuf, RowError>;
}

/// The production fetcher: an interactive browser session plus the poller.
pub struct BrowserFetcher<'a> {
    session: &'a DriveSession,
    control_timeout: Duration,
    confirm_timeout: Duration,
    start_delay: Duration,
    poll: PollOptions,
}

impl<'a> BrowserFetcher<'a> {
    pub fn new(session: &'a DriveSession, config: &RunConfig) -> Self {
        Self {
            session,
            control_timeout: Duration::from_secs(config.control_timeout_secs),
            confirm_timeout: Duration::from_secs(config.confirm_timeout_secs),
            start_delay: Duration::from_secs(config.start_delay_secs),
            poll: config.poll_options(),
        }
    }

    /// Trigger the download, preferring the viewer page's own control.
    async fn trigger_download(&self, file_id: &str) -> Result<(), RowError> {
        self.session.goto(&viewer_url(file_id)).await?;

        if let Some(control) = self
            .session
            .wait_for_element(DOWNLOAD_CONTROL_SELECTOR, self.control_timeout)
            .await
        {
            debug!("download control found, clicking");
            control.click().await.map_err(|e| RowError::Navigation {
                detail: format!("download control click: {e}"),
            })?;
            return Ok(());
        }

        debug!("download control not found, trying direct download URL");
        self.session.goto(&direct_download_url(file_id)).await?;

        // Only large files show the confirmation page; the common case is
        // that this window expires and the download has already started.
        if let Some(confirm) = self
            .session
            .wait_for_element(CONFIRM_CONTROL_SELECTOR, self.confirm_timeout)
            .await
        {
            debug!("large-file confirmation found, clicking");
            confirm.click().await.map_err(|e| RowError::Navigation {
                detail: format!("confirmation click: {e}"),
            })?;
        }

        Ok(())
    }
}

#[async_trait]
impl FileFetcher for BrowserFetcher<'_> {
    async fn fetch(&self, share_link: &str, dest: &Path) -> Result<PathBuf, RowError> {
        let file_id = extract_file_id(share_link).ok_or_else(|| RowError::ExtractionFailed {
            input: share_link.to_string(),
        })?;
        debug!("file id: {}", file_id);

        self.trigger_download(file_id).await?;

        // Let the transfer start before the first directory scan.
        sleep(self.start_delay).await;

        let downloaded = wait_for_download(self.session.download_dir(), &self.poll)
            .await
            .ok_or(RowError::PollTimeout {
                secs: self.poll.budget.as_secs(),
            })?;

        relocate(&downloaded, dest).await?;
        info!("saved as {}", dest.display());
        Ok(dest.to_path_buf())
    }
}

/// Move the settled download to its destination. No-op when the paths are
/// already identical; falls back to copy+remove across filesystems.
async fn relocate(from: &Path, to: &Path) -> Result<(), RowError> {
    if from == to {
        return Ok(());
    }
    if tokio::fs::rename(from, to).await.is_ok() {
        return Ok(());
    }
    tokio::fs::copy(from, to)
        .await
        .map_err(|e| RowError::Relocate {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            detail: e.to_string(),
        })?;
    if let Err(e) = tokio::fs::remove_file(from).await {
        debug!("could not remove relocated source {}: {e}", from.display());
    }
    Ok(())
}
