//! Spreadsheet input: positional-column row extraction from the first
//! worksheet of an xlsx file.
//!
//! There is no header row and no column-name matching; the first six columns
//! of image mode are, in order: identifier, share link, participants, payer
//! name, event, place. Barcode mode reads two columns: label and code.
//!
//! Identifiers auto-increment: a blank id cell continues from the last
//! numeric id seen (starting at 1), so a sheet only needs ids where the
//! sequence jumps.
//!
//! The parser's range is a bounding box anchored at the first non-empty
//! cell, so an entirely blank leading column (a valid sheet: every id left
//! to the sequence) is not part of the range at all. Cell access therefore
//! goes through absolute column positions, padding columns outside the
//! bounding box as blank.

use crate::error::DriveBatchError;
use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use std::path::Path;
use tracing::debug;

/// Columns an image-mode sheet must carry.
pub const IMAGE_COLUMNS: usize = 6;

/// Columns a barcode-mode sheet must carry.
pub const BARCODE_COLUMNS: usize = 2;

/// One image-mode row, columns in sheet order. Every field is optional:
/// blank cells are the norm, and which blanks matter is the pipeline's call.
#[derive(Debug, Clone, Default)]
pub struct ImageRow {
    /// Explicit identifier; blank continues the running sequence.
    pub id: Option<String>,
    /// Google Drive share link (or bare file id).
    pub url: Option<String>,
    /// Caption text for the composed document header.
    pub participants: Option<String>,
    /// Payer name, used in the filename and as the row label.
    pub name: Option<String>,
    pub event: Option<String>,
    pub place: Option<String>,
}

/// One barcode-mode row: a label and the code to encode.
#[derive(Debug, Clone, Default)]
pub struct BarcodeRow {
    pub name: Option<String>,
    pub code: Option<String>,
}

/// Read every row of the first worksheet as [`ImageRow`]s.
pub fn read_image_rows(path: &Path) -> Result<Vec<ImageRow>, DriveBatchError> {
    let (range, start_col) = first_sheet(path, IMAGE_COLUMNS)?;
    let rows = range
        .rows()
        .map(|row| image_row(row, start_col))
        .collect::<Vec<_>>();
    debug!("loaded {} image rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Read every row of the first worksheet as [`BarcodeRow`]s.
pub fn read_barcode_rows(path: &Path) -> Result<Vec<BarcodeRow>, DriveBatchError> {
    let (range, start_col) = first_sheet(path, BARCODE_COLUMNS)?;
    let rows = range
        .rows()
        .map(|row| barcode_row(row, start_col))
        .collect::<Vec<_>>();
    debug!("loaded {} barcode rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Map one bounding-box row, anchored at `start_col`, to absolute columns.
fn image_row(row: &[Data], start_col: usize) -> ImageRow {
    ImageRow {
        id: cell(row, start_col, 0),
        url: cell(row, start_col, 1),
        participants: cell(row, start_col, 2),
        name: cell(row, start_col, 3),
        event: cell(row, start_col, 4),
        place: cell(row, start_col, 5),
    }
}

fn barcode_row(row: &[Data], start_col: usize) -> BarcodeRow {
    BarcodeRow {
        name: cell(row, start_col, 0),
        code: cell(row, start_col, 1),
    }
}

/// The cell at absolute column `col` of a row whose slice starts at
/// `start_col`. Columns outside the bounding box are blank.
fn cell(row: &[Data], start_col: usize, col: usize) -> Option<String> {
    col.checked_sub(start_col)
        .and_then(|i| row.get(i))
        .and_then(cell_text)
}

/// Open `path` and return its first worksheet plus the absolute column the
/// bounding box starts at, verified to span enough columns.
fn first_sheet(path: &Path, min_columns: usize) -> Result<(Range<Data>, usize), DriveBatchError> {
    if !path.exists() {
        return Err(DriveBatchError::SpreadsheetNotFound {
            path: path.to_path_buf(),
        });
    }

    let mut workbook: Xlsx<_> =
        open_workbook(path).map_err(|e: calamine::XlsxError| DriveBatchError::SpreadsheetRead {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| DriveBatchError::SpreadsheetRead {
            path: path.to_path_buf(),
            detail: "workbook has no worksheets".into(),
        })?
        .map_err(|e| DriveBatchError::SpreadsheetRead {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;

    let start_col = range.start().map_or(0, |(_, col)| col as usize);
    // The span check uses the absolute end column: a blank leading column
    // shrinks the bounding box but not the sheet's column positions.
    let end_col = start_col + range.width();
    if range.height() > 0 && end_col < min_columns {
        return Err(DriveBatchError::MissingColumns {
            path: path.to_path_buf(),
            expected: min_columns,
            found: end_col,
        });
    }

    Ok((range, start_col))
}

/// Cell contents as trimmed text, `None` when effectively blank.
///
/// Whole-number floats print without the trailing `.0` because identifiers
/// and codes typed as numbers come back from the parser as floats.
pub fn cell_text(cell: &Data) -> Option<String> {
    let text = match cell {
        Data::Empty | Data::Error(_) => return None,
        Data::String(s) => s.clone(),
        Data::Float(f) if f.fract() == 0.0 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.as_f64().to_string(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
    };
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Resolve a row's identifier against the running sequence.
///
/// Blank continues the sequence (`last + 1`, starting at 1). Numeric input
/// is truncated to an integer and resets the sequence. Non-numeric input is
/// kept verbatim and leaves the sequence untouched.
pub fn resolve_identifier(raw: Option<&str>, last: Option<i64>) -> (String, Option<i64>) {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => {
            let next = last.map_or(1, |l| l + 1);
            (next.to_string(), Some(next))
        }
        Some(text) => match text.parse::<f64>() {
            Ok(value) => {
                let id = value as i64;
                (id.to_string(), Some(id))
            }
            Err(_) => (text.to_string(), last),
        },
    }
}
