//! Filename sanitisation and output-name derivation.
//!
//! Output filenames are built from spreadsheet metadata columns, so every
//! component passes through [`sanitize`] before joining. The derived name is
//! also the pipeline's resume checkpoint: a file already present under that
//! name means the row is done.

use std::path::Path;

/// Characters that are invalid in filenames on common filesystems.
const INVALID_CHARS: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Literal separator between the event block and the payer name.
pub const PAID_BY_SEPARATOR: &str = "_PaidBy_";

/// Extension given to every downloaded image.
pub const IMAGE_EXTENSION: &str = "jpg";

/// Extension of the captioned single-page document.
pub const DOCUMENT_EXTENSION: &str = "pdf";

/// Map arbitrary text to a filesystem-safe path segment.
///
/// Each invalid character becomes `-`; surrounding whitespace is trimmed.
/// Absent input yields an empty string. No length limit is enforced —
/// callers may produce arbitrarily long paths (accepted non-goal).
pub fn sanitize(value: Option<&str>) -> String {
    let Some(text) = value else {
        return String::new();
    };
    text.trim()
        .chars()
        .map(|c| if INVALID_CHARS.contains(&c) { '-' } else { c })
        .collect()
}

/// Derive the image filename for a row:
/// `{id}_{place}_{event}_PaidBy_{name}.jpg`.
pub fn image_filename(
    id: &str,
    place: Option<&str>,
    event: Option<&str>,
    name: Option<&str>,
) -> String {
    format!(
        "{}_{}_{}{}{}.{}",
        sanitize(Some(id)),
        sanitize(place),
        sanitize(event),
        PAID_BY_SEPARATOR,
        sanitize(name),
        IMAGE_EXTENSION
    )
}

/// The document filename sharing an image's base name, extension swapped.
pub fn document_filename(image_name: &str) -> String {
    Path::new(image_name)
        .with_extension(DOCUMENT_EXTENSION)
        .to_string_lossy()
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_replaces_invalid_chars() {
        assert_eq!(sanitize(Some("a/b:c*d")), "a-b-c-d");
        assert_eq!(sanitize(Some(r#"x<y>z"w|v?u\t"#)), "x-y-z-w-v-u-t");
    }

    #[test]
    fn sanitize_trims_whitespace() {
        assert_eq!(sanitize(Some("  Dita e Verës  ")), "Dita e Verës");
    }

    #[test]
    fn sanitize_absent_is_empty() {
        assert_eq!(sanitize(None), "");
        assert_eq!(sanitize(Some("   ")), "");
    }

    #[test]
    fn image_filename_layout() {
        let name = image_filename("5", Some("Tirana"), Some("Wedding"), Some("Ana Hoxha"));
        assert_eq!(name, "5_Tirana_Wedding_PaidBy_Ana Hoxha.jpg");
    }

    #[test]
    fn image_filename_sanitizes_components() {
        let name = image_filename("7", Some("A/B"), None, Some("C:D"));
        assert_eq!(name, "7_A-B__PaidBy_C-D.jpg");
    }

    #[test]
    fn document_filename_swaps_extension() {
        assert_eq!(
            document_filename("5_Tirana_Wedding_PaidBy_Ana.jpg"),
            "5_Tirana_Wedding_PaidBy_Ana.pdf"
        );
    }
}
