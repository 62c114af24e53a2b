//! Run results: per-row reports and the final tally.
//!
//! A run never aborts on a row failure, so its result is a [`RunSummary`]
//! listing every row's outcome rather than a single `Result`. The summary is
//! serde-serialisable for the CLI's `--json` output and for callers that want
//! to persist a run report.

use serde::{Deserialize, Serialize};

/// What happened to one spreadsheet row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RowOutcome {
    /// Image was downloaded and saved under its derived filename.
    Fetched,
    /// Output file already existed; counted as success, no fetch performed.
    AlreadyPresent,
    /// Barcode image was generated and written.
    Generated,
    /// The row failed; `reason` is the human-readable [`crate::error::RowError`].
    Failed { reason: String },
}

impl RowOutcome {
    /// True for every variant that counts toward the success tally.
    pub fn is_success(&self) -> bool {
        !matches!(self, RowOutcome::Failed { .. })
    }
}

/// One row's position, label, and outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowReport {
    /// 1-indexed spreadsheet row position.
    pub row_num: usize,
    /// Human-readable label (recipient name or barcode label).
    pub label: String,
    pub outcome: RowOutcome,
}

/// Running tally of a pipeline run, reported at the end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Total rows in the spreadsheet.
    pub total: usize,
    /// Rows that produced (or already had) their output file.
    pub successful: usize,
    /// Rows that failed and were skipped.
    pub failed: usize,
    /// Wall-clock duration of the whole run.
    pub duration_ms: u64,
    /// Per-row reports in spreadsheet order.
    pub rows: Vec<RowReport>,
}

impl RunSummary {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            successful: 0,
            failed: 0,
            duration_ms: 0,
            rows: Vec::with_capacity(total),
        }
    }

    /// Record one row's outcome and update the tallies.
    pub fn record(&mut self, report: RowReport) {
        if report.outcome.is_success() {
            self.successful += 1;
        } else {
            self.failed += 1;
        }
        self.rows.push(report);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tallies_follow_outcomes() {
        let mut summary = RunSummary::new(3);
        summary.record(RowReport {
            row_num: 1,
            label: "Alice".into(),
            outcome: RowOutcome::Fetched,
        });
        summary.record(RowReport {
            row_num: 2,
            label: "Bob".into(),
            outcome: RowOutcome::AlreadyPresent,
        });
        summary.record(RowReport {
            row_num: 3,
            label: "Cara".into(),
            outcome: RowOutcome::Failed {
                reason: "no URL provided".into(),
            },
        });

        assert_eq!(summary.successful, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.rows.len(), 3);
    }

    #[test]
    fn already_present_counts_as_success() {
        assert!(RowOutcome::AlreadyPresent.is_success());
        assert!(RowOutcome::Generated.is_success());
        assert!(!RowOutcome::Failed { reason: "x".into() }.is_success());
    }

    #[test]
    fn summary_serialises_to_json() {
        let mut summary = RunSummary::new(1);
        summary.record(RowReport {
            row_num: 1,
            label: "Alice".into(),
            outcome: RowOutcome::Generated,
        });
        let json = serde_json::to_string(&summary).expect("serialise");
        assert!(json.contains("\"successful\":1"));
        assert!(json.contains("Generated"));
    }
}
