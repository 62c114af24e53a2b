//! Download polling: wait for a new, settled file to appear in a directory.
//!
//! The browser writes downloads as `<name>.crdownload` and renames the file
//! in place once the transfer finishes, so "the download is done" is observed
//! by scanning the directory until a non-temporary, recently-modified file
//! shows up.
//!
//! This heuristic is fragile by design: it assumes exactly one download is in
//! flight in the directory at a time, and the freshness window is what keeps
//! it from grabbing an output file left behind by a previous run (the
//! download directory doubles as the image output directory). Callers must
//! honour the single-writer convention; it is enforced only by the pipeline
//! being strictly sequential.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio::time::{sleep, Instant};
use tracing::{debug, trace};

/// Temporary-file suffix the browser gives in-progress downloads.
pub const IN_PROGRESS_SUFFIX: &str = ".crdownload";

/// Timing knobs for [`wait_for_download`].
#[derive(Debug, Clone)]
pub struct PollOptions {
    /// Total time to keep scanning before giving up.
    pub budget: Duration,
    /// Pause between directory scans.
    pub interval: Duration,
    /// Maximum age of a settled file for it to count as this download.
    pub freshness: Duration,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            budget: Duration::from_secs(60),
            interval: Duration::from_secs(1),
            freshness: Duration::from_secs(60),
        }
    }
}

/// True when a file name is no longer an in-progress or hidden entry.
pub fn is_settled(file_name: &str) -> bool {
    !file_name.ends_with(IN_PROGRESS_SUFFIX) && !file_name.starts_with('.')
}

/// Pick the most recently modified candidate, provided it is fresh enough.
///
/// A modification time in the future (clock skew, FAT timestamps) counts as
/// fresh rather than being discarded.
fn pick_latest(
    candidates: Vec<(PathBuf, SystemTime)>,
    now: SystemTime,
    freshness: Duration,
) -> Option<PathBuf> {
    let (path, modified) = candidates.into_iter().max_by_key(|(_, m)| *m)?;
    match now.duration_since(modified) {
        Ok(age) if age <= freshness => Some(path),
        Ok(_) => None,
        Err(_) => Some(path),
    }
}

/// One directory scan: settled, fresh files only.
fn scan_once(dir: &Path, freshness: Duration) -> Option<PathBuf> {
    let entries = std::fs::read_dir(dir).ok()?;
    let mut candidates = Vec::new();
    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().into_owned();
        if !is_settled(&name) {
            trace!("ignoring in-progress entry {}", name);
            continue;
        }
        let Ok(meta) = entry.metadata() else { continue };
        if !meta.is_file() {
            continue;
        }
        let Ok(modified) = meta.modified() else { continue };
        candidates.push((entry.path(), modified));
    }
    pick_latest(candidates, SystemTime::now(), freshness)
}

/// Wait for a settled download to appear in `dir`.
///
/// Scans immediately and then every `options.interval` until either a
/// qualifying file is found (returned) or `options.budget` expires (`None`).
pub async fn wait_for_download(dir: &Path, options: &PollOptions) -> Option<PathBuf> {
    let deadline = Instant::now() + options.budget;
    loop {
        if let Some(found) = scan_once(dir, options.freshness) {
            debug!("download settled: {}", found.display());
            return Some(found);
        }
        if Instant::now() >= deadline {
            debug!(
                "no settled download in {} after {:?}",
                dir.display(),
                options.budget
            );
            return None;
        }
        sleep(options.interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn short_options() -> PollOptions {
        PollOptions {
            budget: Duration::from_millis(1500),
            interval: Duration::from_millis(100),
            freshness: Duration::from_secs(60),
        }
    }

    #[test]
    fn settled_predicate() {
        assert!(is_settled("photo.jpg"));
        assert!(!is_settled("photo.jpg.crdownload"));
        assert!(!is_settled(".DS_Store"));
    }

    #[test]
    fn pick_latest_prefers_newest() {
        let now = SystemTime::now();
        let older = now - Duration::from_secs(30);
        let newer = now - Duration::from_secs(5);
        let picked = pick_latest(
            vec![
                (PathBuf::from("old.jpg"), older),
                (PathBuf::from("new.jpg"), newer),
            ],
            now,
            Duration::from_secs(60),
        );
        assert_eq!(picked, Some(PathBuf::from("new.jpg")));
    }

    #[test]
    fn pick_latest_rejects_stale_files() {
        let now = SystemTime::now();
        let stale = now - Duration::from_secs(600);
        let picked = pick_latest(
            vec![(PathBuf::from("leftover.jpg"), stale)],
            now,
            Duration::from_secs(60),
        );
        assert_eq!(picked, None);
    }

    #[test]
    fn pick_latest_accepts_future_mtime() {
        let now = SystemTime::now();
        let future = now + Duration::from_secs(5);
        let picked = pick_latest(
            vec![(PathBuf::from("skewed.jpg"), future)],
            now,
            Duration::from_secs(60),
        );
        assert_eq!(picked, Some(PathBuf::from("skewed.jpg")));
    }

    #[tokio::test]
    async fn times_out_on_in_progress_only() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("foo.jpg.crdownload"), b"partial").unwrap();

        let result = wait_for_download(dir.path(), &short_options()).await;
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn picks_up_rename_within_budget() {
        let dir = tempfile::tempdir().expect("tempdir");
        let temp_name = dir.path().join("foo.jpg.crdownload");
        let final_name = dir.path().join("foo.jpg");
        std::fs::write(&temp_name, b"partial").unwrap();

        let renamer = {
            let temp_name = temp_name.clone();
            let final_name = final_name.clone();
            tokio::spawn(async move {
                sleep(Duration::from_millis(300)).await;
                std::fs::rename(&temp_name, &final_name).unwrap();
            })
        };

        let result = wait_for_download(dir.path(), &short_options()).await;
        renamer.await.unwrap();
        assert_eq!(result, Some(final_name));
    }

    #[tokio::test]
    async fn empty_directory_times_out() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = wait_for_download(dir.path(), &short_options()).await;
        assert_eq!(result, None);
    }
}
