//! Share-link identifier extraction.
//!
//! Google Drive references a file by an opaque id that appears in several URL
//! shapes. The patterns are tried in a fixed order because a URL can contain
//! both forms at once: the `/d/` path segment must win over an `id=` query
//! parameter.

use once_cell::sync::Lazy;
use regex::Regex;

/// Path-style share link: `https://drive.google.com/file/d/<ID>/view`.
static PATH_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/d/([A-Za-z0-9_-]+)").expect("valid path-id regex"));

/// Query-style share link: `https://drive.google.com/open?id=<ID>`.
static QUERY_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"id=([A-Za-z0-9_-]+)").expect("valid query-id regex"));

/// A bare identifier pasted without any URL around it.
static BARE_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z0-9_-]+)$").expect("valid bare-id regex"));

/// Extract the file identifier from a share-link or bare id.
///
/// Returns the first match of, in order: the `/d/` path segment, the `id=`
/// query value, or the whole input when it is a plain identifier. `None`
/// when nothing matches.
pub fn extract_file_id(input: &str) -> Option<&str> {
    [&PATH_ID, &QUERY_ID, &BARE_ID]
        .iter()
        .find_map(|re| re.captures(input).and_then(|c| c.get(1)).map(|m| m.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_style_link() {
        assert_eq!(
            extract_file_id("https://drive.google.com/file/d/ABC123/view"),
            Some("ABC123")
        );
    }

    #[test]
    fn query_style_link() {
        assert_eq!(
            extract_file_id("https://drive.google.com/uc?export=download&id=XYZ9"),
            Some("XYZ9")
        );
    }

    #[test]
    fn bare_identifier() {
        assert_eq!(extract_file_id("QW12"), Some("QW12"));
    }

    #[test]
    fn garbage_is_not_found() {
        assert_eq!(extract_file_id("not a valid url!!"), None);
        assert_eq!(extract_file_id(""), None);
    }

    #[test]
    fn path_segment_wins_over_query_param() {
        // Both forms present: the /d/ capture must be preferred.
        assert_eq!(
            extract_file_id("https://drive.google.com/file/d/PATH1/view?id=QUERY2"),
            Some("PATH1")
        );
    }

    #[test]
    fn underscores_and_dashes_allowed() {
        assert_eq!(extract_file_id("a_B-c9"), Some("a_B-c9"));
    }
}
