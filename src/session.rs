//! Shared interactive browser session.
//!
//! One [`DriveSession`] is launched at the start of an image-mode run and
//! reused for every row, so the user logs in to Google exactly once. The
//! session owns the browser process, the single page all navigation happens
//! on, and the background task that drains browser events.
//!
//! ## Why a visible window by default?
//!
//! Authentication is out of scope: the pipeline relies on the user logging in
//! interactively at run start. A headless launch is available for setups
//! where the profile already carries valid cookies.

use crate::error::{DriveBatchError, RowError};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::{
    SetDownloadBehaviorBehavior, SetDownloadBehaviorParams,
};
use chromiumoxide::{Element, Page};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

/// How often to re-probe the page while waiting for an element.
const ELEMENT_PROBE_INTERVAL: Duration = Duration::from_millis(500);

/// A live browser session configured to download into a fixed directory.
pub struct DriveSession {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
    download_dir: PathBuf,
}

impl DriveSession {
    /// Launch the browser and point its downloads at `download_dir`.
    ///
    /// The directory must already exist; it is canonicalised because the
    /// browser rejects relative download paths.
    pub async fn launch(download_dir: &Path, headless: bool) -> Result<Self, DriveBatchError> {
        let download_dir =
            std::fs::canonicalize(download_dir).map_err(|e| DriveBatchError::OutputDir {
                path: download_dir.to_path_buf(),
                source: e,
            })?;

        let mut builder = BrowserConfig::builder();
        if !headless {
            builder = builder.with_head();
        }
        let config = builder
            .build()
            .map_err(|detail| DriveBatchError::BrowserLaunch { detail })?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| DriveBatchError::BrowserLaunch {
                detail: e.to_string(),
            })?;

        // The handler stream must be drained for the CDP connection to make
        // progress; an error item means the browser is gone.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
            debug!("browser event loop ended");
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| DriveBatchError::BrowserLaunch {
                detail: e.to_string(),
            })?;

        let behavior = SetDownloadBehaviorParams::builder()
            .behavior(SetDownloadBehaviorBehavior::Allow)
            .download_path(download_dir.to_string_lossy().to_string())
            .build()
            .map_err(|detail| DriveBatchError::BrowserLaunch { detail })?;
        page.execute(behavior)
            .await
            .map_err(|e| DriveBatchError::BrowserLaunch {
                detail: format!("failed to set download directory: {e}"),
            })?;

        info!("browser session started, downloads → {}", download_dir.display());

        Ok(Self {
            browser,
            page,
            handler_task,
            download_dir,
        })
    }

    /// The directory the browser was configured to download into.
    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// Navigate the shared page.
    pub async fn goto(&self, url: &str) -> Result<(), RowError> {
        debug!("navigating to {}", url);
        self.page
            .goto(url)
            .await
            .map(|_| ())
            .map_err(|e| RowError::Navigation {
                detail: format!("goto '{url}': {e}"),
            })
    }

    /// Wait up to `budget` for an element matching `selector` to appear.
    ///
    /// Probes every half second; `None` when the budget expires. Probe
    /// failures are indistinguishable from "not there yet", so a dead
    /// session surfaces as a timeout here and as a navigation error on the
    /// next `goto`.
    pub async fn wait_for_element(&self, selector: &str, budget: Duration) -> Option<Element> {
        let deadline = Instant::now() + budget;
        loop {
            if let Ok(element) = self.page.find_element(selector).await {
                return Some(element);
            }
            if Instant::now() >= deadline {
                return None;
            }
            sleep(ELEMENT_PROBE_INTERVAL).await;
        }
    }

    /// Close the browser and stop the event loop.
    ///
    /// Consumes the session; failures are logged, not propagated, because
    /// close runs on every exit path and the process is about to drop the
    /// handle anyway.
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!("browser close failed: {e}");
        }
        if let Err(e) = self.browser.wait().await {
            debug!("browser wait failed: {e}");
        }
        self.handler_task.abort();
        info!("browser session closed");
    }
}
