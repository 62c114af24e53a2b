//! End-to-end pipeline tests with an injected fetcher.
//!
//! The browser is the only component that cannot run in CI, so these tests
//! drive `process_image_rows` through a mock [`FileFetcher`] that writes a
//! real JPEG to the destination. Everything downstream of the fetch — naming,
//! skip-if-exists, document composition, tallying — runs for real.

use async_trait::async_trait;
use drivebatch::{
    process_barcode_rows, process_image_rows, BarcodeRow, FileFetcher, ImageRow, RowError,
    RunConfig,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Mock fetcher: counts calls and writes a small real JPEG to `dest`.
struct CountingFetcher {
    calls: AtomicUsize,
}

impl CountingFetcher {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FileFetcher for CountingFetcher {
    async fn fetch(&self, _share_link: &str, dest: &Path) -> Result<PathBuf, RowError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let img = image::RgbImage::from_pixel(40, 30, image::Rgb([200, 120, 40]));
        img.save(dest).map_err(|e| RowError::Relocate {
            from: PathBuf::from("<mock>"),
            to: dest.to_path_buf(),
            detail: e.to_string(),
        })?;
        Ok(dest.to_path_buf())
    }
}

fn test_config(root: &Path) -> RunConfig {
    RunConfig::builder()
        .image_dir(root.join("images"))
        .document_dir(root.join("documents"))
        .barcode_dir(root.join("barcodes"))
        .build()
        .expect("valid test config")
}

fn image_row(url: Option<&str>, id: Option<&str>, name: &str) -> ImageRow {
    ImageRow {
        url: url.map(str::to_string),
        place: Some("Tirana".to_string()),
        event: Some("Wedding".to_string()),
        name: Some(name.to_string()),
        id: id.map(str::to_string),
        participants: Some(format!("{name} & Co")),
    }
}

#[tokio::test]
async fn image_rows_fetch_skip_and_fail() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = test_config(dir.path());
    std::fs::create_dir_all(&config.image_dir).unwrap();
    std::fs::create_dir_all(&config.document_dir).unwrap();

    // Row 2's output already exists (a real image so the document repair
    // pass can run against it); rows get ids 5, 6, 7 from the sequence.
    let existing = config.image_dir.join("6_Tirana_Wedding_PaidBy_Bora.jpg");
    image::RgbImage::from_pixel(20, 20, image::Rgb([0, 0, 0]))
        .save(&existing)
        .unwrap();

    let rows = vec![
        image_row(None, Some("5"), "Ana"), // blank URL → failure
        image_row(Some("https://drive.google.com/file/d/AAA/view"), None, "Bora"),
        image_row(Some("https://drive.google.com/file/d/BBB/view"), None, "Cela"),
    ];

    let fetcher = CountingFetcher::new();
    let summary = process_image_rows(&rows, &fetcher, &config).await;

    assert_eq!(summary.total, 3);
    assert_eq!(summary.successful, 2);
    assert_eq!(summary.failed, 1);
    // Only the fresh row hit the fetcher.
    assert_eq!(fetcher.call_count(), 1);

    let fetched = config.image_dir.join("7_Tirana_Wedding_PaidBy_Cela.jpg");
    assert!(fetched.exists(), "fresh row's image missing");

    // Both surviving rows have a composed document.
    for name in [
        "6_Tirana_Wedding_PaidBy_Bora.pdf",
        "7_Tirana_Wedding_PaidBy_Cela.pdf",
    ] {
        let doc = config.document_dir.join(name);
        assert!(doc.exists(), "missing document {name}");
        let bytes = std::fs::read(&doc).unwrap();
        assert!(bytes.starts_with(b"%PDF"), "{name} lacks PDF magic");
    }
}

#[tokio::test]
async fn second_run_is_idempotent() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = test_config(dir.path());
    std::fs::create_dir_all(&config.image_dir).unwrap();
    std::fs::create_dir_all(&config.document_dir).unwrap();

    let rows = vec![
        image_row(Some("https://drive.google.com/file/d/AAA/view"), Some("1"), "Ana"),
        image_row(Some("https://drive.google.com/file/d/BBB/view"), None, "Bora"),
    ];

    let fetcher = CountingFetcher::new();
    let first = process_image_rows(&rows, &fetcher, &config).await;
    assert_eq!(first.successful, 2);
    assert_eq!(fetcher.call_count(), 2);

    // Re-run: output presence is the checkpoint, so nothing is re-fetched
    // and the tallies still count every row as a success.
    let second = process_image_rows(&rows, &fetcher, &config).await;
    assert_eq!(second.successful, 2);
    assert_eq!(second.failed, 0);
    assert_eq!(fetcher.call_count(), 2, "re-run must not fetch");
}

#[tokio::test]
async fn failed_rows_still_advance_the_id_sequence() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = test_config(dir.path());
    std::fs::create_dir_all(&config.image_dir).unwrap();
    std::fs::create_dir_all(&config.document_dir).unwrap();

    // Row 1 fails (blank URL) but still consumes id 1, so row 2 gets id 2.
    let rows = vec![
        image_row(None, None, "Ana"),
        image_row(Some("https://drive.google.com/file/d/AAA/view"), None, "Bora"),
    ];

    let fetcher = CountingFetcher::new();
    process_image_rows(&rows, &fetcher, &config).await;

    assert!(config
        .image_dir
        .join("2_Tirana_Wedding_PaidBy_Bora.jpg")
        .exists());
}

#[tokio::test]
async fn composed_document_for_unicode_header() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = test_config(dir.path());
    std::fs::create_dir_all(&config.image_dir).unwrap();
    std::fs::create_dir_all(&config.document_dir).unwrap();

    let mut row = image_row(Some("https://drive.google.com/file/d/AAA/view"), Some("3"), "Ana");
    row.participants = Some("Pajë për Anën".to_string());

    let fetcher = CountingFetcher::new();
    let summary = process_image_rows(&[row], &fetcher, &config).await;
    assert_eq!(summary.successful, 1);

    let doc = config.document_dir.join("3_Tirana_Wedding_PaidBy_Ana.pdf");
    let bytes = std::fs::read(&doc).expect("document written");
    assert!(bytes.starts_with(b"%PDF"));
}

#[test]
fn barcode_rows_generate_skip_and_fail() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = test_config(dir.path());
    std::fs::create_dir_all(&config.barcode_dir).unwrap();

    // Row 2's barcode already exists.
    std::fs::write(config.barcode_dir.join("Bora.png"), b"\x89PNGstub").unwrap();

    let rows = vec![
        BarcodeRow {
            name: Some("Ana".to_string()),
            code: None, // blank code → failure
        },
        BarcodeRow {
            name: Some("Bora".to_string()),
            code: Some("EMP-002".to_string()),
        },
        BarcodeRow {
            name: None, // falls back to the positional label
            code: Some("EMP-003".to_string()),
        },
    ];

    let summary = process_barcode_rows(&rows, &config);

    assert_eq!(summary.total, 3);
    assert_eq!(summary.successful, 2);
    assert_eq!(summary.failed, 1);

    let generated = config.barcode_dir.join("barcode_3.png");
    let bytes = std::fs::read(&generated).expect("generated barcode");
    assert!(bytes.starts_with(b"\x89PNG"));

    // The pre-existing file was left untouched.
    assert_eq!(
        std::fs::read(config.barcode_dir.join("Bora.png")).unwrap(),
        b"\x89PNGstub"
    );
}
