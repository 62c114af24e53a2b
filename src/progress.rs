//! Progress-callback trait for per-row pipeline events.
//!
//! Inject an [`Arc<dyn RunProgressCallback>`] via
//! [`crate::config::RunConfigBuilder::progress_callback`] to receive events
//! as the pipeline works through the spreadsheet.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: callers can
//! forward events to a terminal progress bar, a log file, or a GUI without
//! the library knowing anything about how the host application communicates.
//! Rows are processed strictly sequentially, but the trait is still
//! `Send + Sync` so the same callback can be shared with other tasks (e.g. a
//! ticker updating a progress bar).

use crate::output::RowOutcome;
use std::sync::Arc;

/// Called by the pipeline as it processes each spreadsheet row.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait RunProgressCallback: Send + Sync {
    /// Called once before any row is processed.
    ///
    /// # Arguments
    /// * `total_rows` — number of rows loaded from the spreadsheet
    fn on_run_start(&self, total_rows: usize) {
        let _ = total_rows;
    }

    /// Called just before a row is processed.
    ///
    /// # Arguments
    /// * `row_num`    — 1-indexed row position
    /// * `total_rows` — total rows in the run
    /// * `label`      — human-readable row label (name column)
    fn on_row_start(&self, row_num: usize, total_rows: usize, label: &str) {
        let _ = (row_num, total_rows, label);
    }

    /// Called when a row finishes, whatever the outcome.
    fn on_row_complete(&self, row_num: usize, total_rows: usize, outcome: &RowOutcome) {
        let _ = (row_num, total_rows, outcome);
    }

    /// Called once after every row has been attempted.
    ///
    /// # Arguments
    /// * `total_rows`    — total rows in the run
    /// * `success_count` — rows that ended in a success outcome
    fn on_run_complete(&self, total_rows: usize, success_count: usize) {
        let _ = (total_rows, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// This is the default when no callback is configured.
pub struct NoopProgressCallback;

impl RunProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::RunConfig`].
pub type ProgressCallback = Arc<dyn RunProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct TrackingCallback {
        starts: AtomicUsize,
        completes: AtomicUsize,
        failures: AtomicUsize,
        final_success: AtomicUsize,
    }

    impl RunProgressCallback for TrackingCallback {
        fn on_row_start(&self, _row_num: usize, _total: usize, _label: &str) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_row_complete(&self, _row_num: usize, _total: usize, outcome: &RowOutcome) {
            self.completes.fetch_add(1, Ordering::SeqCst);
            if !outcome.is_success() {
                self.failures.fetch_add(1, Ordering::SeqCst);
            }
        }

        fn on_run_complete(&self, _total: usize, success_count: usize) {
            self.final_success.store(success_count, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_run_start(5);
        cb.on_row_start(1, 5, "Alice");
        cb.on_row_complete(1, 5, &RowOutcome::Fetched);
        cb.on_run_complete(5, 4);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback {
            starts: AtomicUsize::new(0),
            completes: AtomicUsize::new(0),
            failures: AtomicUsize::new(0),
            final_success: AtomicUsize::new(0),
        };

        tracker.on_run_start(2);
        tracker.on_row_start(1, 2, "Alice");
        tracker.on_row_complete(1, 2, &RowOutcome::Fetched);
        tracker.on_row_start(2, 2, "Bob");
        tracker.on_row_complete(
            2,
            2,
            &RowOutcome::Failed {
                reason: "no URL provided".into(),
            },
        );
        tracker.on_run_complete(2, 1);

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.failures.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.final_success.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: Arc<dyn RunProgressCallback> = Arc::new(NoopProgressCallback);
        cb.on_run_start(10);
        cb.on_row_complete(1, 10, &RowOutcome::AlreadyPresent);
    }
}
