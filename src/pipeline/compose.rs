//! Document composition: one raster image plus a header caption on a
//! single PDF page sized to the image.
//!
//! ## Why spawn_blocking?
//!
//! Decoding the image and serialising the PDF are CPU-bound; running them on
//! the blocking pool keeps the polling loops responsive. The async wrapper
//! mirrors the rest of the pipeline's surface.
//!
//! ## Page geometry
//!
//! The page is sized in points so one image pixel maps to one point (the
//! image is embedded at 72 dpi, unscaled, anchored at the page bottom). A
//! fixed 1.5-inch band above the image carries the caption at 48 pt bold.
//!
//! ## Fonts
//!
//! Captions regularly contain extended Latin (č, š, ž, ë). A Unicode-capable
//! TTF is attempted first — the configured path, then standard system
//! locations — silently falling back to builtin Helvetica-Bold, which cannot
//! encode every such glyph. The fallback mis-rendering is accepted rather
//! than failing the row.

use crate::error::RowError;
use ab_glyph::{Font, FontVec};
use printpdf::image_crate::GenericImageView;
use printpdf::{
    BuiltinFont, Image as PdfImage, ImageTransform, IndirectFontRef, Mm, PdfDocument,
    PdfDocumentReference, Pt,
};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Height of the caption band above the image: 1.5 inch in points.
pub const HEADER_BAND_PT: f32 = 108.0;

/// Caption font size.
pub const HEADER_FONT_SIZE_PT: f32 = 48.0;

/// Caption baseline, measured down from the top page edge.
const HEADER_BASELINE_OFFSET_PT: f32 = 80.0;

/// System locations probed for a Unicode-capable header font.
const FONT_CANDIDATES: &[&str] = &[
    "/System/Library/Fonts/Supplemental/Arial Unicode.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
];

/// Page dimensions in points for an image of the given pixel size.
pub fn page_size(width_px: u32, height_px: u32) -> (f32, f32) {
    (width_px as f32, height_px as f32 + HEADER_BAND_PT)
}

/// Candidate font files: the configured path first, then system locations.
pub(crate) fn font_candidates(configured: Option<&Path>) -> impl Iterator<Item = PathBuf> {
    configured
        .map(Path::to_path_buf)
        .into_iter()
        .chain(FONT_CANDIDATES.iter().map(PathBuf::from))
}

/// Compose `image_path` and `header` into a single-page PDF at `dest`.
///
/// The write goes through a temp file in the destination directory and a
/// rename, so a crash mid-write never leaves a partial PDF at `dest`.
pub async fn compose_document(
    image_path: PathBuf,
    dest: PathBuf,
    header: String,
    unicode_font: Option<PathBuf>,
) -> Result<(), RowError> {
    tokio::task::spawn_blocking(move || {
        compose_blocking(&image_path, &dest, &header, unicode_font.as_deref())
    })
    .await
    .map_err(|e| RowError::Composition {
        detail: format!("compose task panicked: {e}"),
    })?
}

/// Blocking implementation of document composition.
fn compose_blocking(
    image_path: &Path,
    dest: &Path,
    header: &str,
    unicode_font: Option<&Path>,
) -> Result<(), RowError> {
    let img = printpdf::image_crate::open(image_path).map_err(|e| RowError::Composition {
        detail: format!("cannot read image '{}': {e}", image_path.display()),
    })?;
    let (width_px, height_px) = img.dimensions();
    let (page_w, page_h) = page_size(width_px, height_px);
    debug!(
        "composing {}x{} px image into {}x{} pt page",
        width_px, height_px, page_w, page_h
    );

    let title = dest
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());

    let (doc, page_idx, layer_idx) = PdfDocument::new(
        title,
        Mm::from(Pt(page_w)),
        Mm::from(Pt(page_h)),
        "Layer 1",
    );
    let layer = doc.get_page(page_idx).get_layer(layer_idx);

    let (font, metrics) = load_header_font(&doc, unicode_font)?;
    let baseline_y = page_h - HEADER_BASELINE_OFFSET_PT;
    let x = centered_text_x(header, HEADER_FONT_SIZE_PT, page_w, metrics.as_ref());
    layer.use_text(
        header,
        HEADER_FONT_SIZE_PT,
        Mm::from(Pt(x)),
        Mm::from(Pt(baseline_y)),
        &font,
    );

    // 72 dpi makes one pixel one point, so the image fills the page width
    // exactly and sits flush with the bottom edge.
    let pdf_image = PdfImage::from_dynamic_image(&img);
    pdf_image.add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm::from(Pt(0.0))),
            translate_y: Some(Mm::from(Pt(0.0))),
            dpi: Some(72.0),
            ..Default::default()
        },
    );

    let bytes = doc.save_to_bytes().map_err(|e| RowError::Composition {
        detail: format!("pdf serialisation failed: {e}"),
    })?;

    let parent = dest.parent().filter(|p| !p.as_os_str().is_empty());
    let tmp = tempfile::NamedTempFile::new_in(parent.unwrap_or_else(|| Path::new(".")))
        .map_err(|e| RowError::Composition {
            detail: format!("temp file: {e}"),
        })?;
    std::fs::write(tmp.path(), &bytes).map_err(|e| RowError::Composition {
        detail: format!("write '{}': {e}", dest.display()),
    })?;
    tmp.persist(dest).map_err(|e| RowError::Composition {
        detail: format!("persist '{}': {e}", dest.display()),
    })?;

    Ok(())
}

/// Load the caption font: configured TTF first, then system candidates,
/// then builtin Helvetica-Bold.
///
/// The parsed glyph table comes back alongside the embedded font so the
/// caption can be centred from real advance widths; the builtin fallback
/// has no table and centres by approximation.
fn load_header_font(
    doc: &PdfDocumentReference,
    configured: Option<&Path>,
) -> Result<(IndirectFontRef, Option<FontVec>), RowError> {
    for path in font_candidates(configured) {
        let Ok(bytes) = std::fs::read(&path) else { continue };
        match doc.add_external_font(bytes.as_slice()) {
            Ok(font) => {
                debug!("using unicode header font {}", path.display());
                let metrics = FontVec::try_from_vec(bytes).ok();
                return Ok((font, metrics));
            }
            Err(e) => warn!("failed to load font {}: {e}", path.display()),
        }
    }

    doc.add_builtin_font(BuiltinFont::HelveticaBold)
        .map(|font| (font, None))
        .map_err(|e| RowError::Composition {
            detail: format!("builtin font unavailable: {e}"),
        })
}

/// Left edge for a horizontally centred caption.
fn centered_text_x(
    text: &str,
    font_size: f32,
    page_width: f32,
    metrics: Option<&FontVec>,
) -> f32 {
    ((page_width - text_width_pt(text, font_size, metrics)) / 2.0).max(0.0)
}

/// Advance width of `text` at `font_size` points.
///
/// With the header font's glyph table this is exact (unscaled advances ×
/// size / units-per-em, the PDF text model). Without it — the builtin
/// Helvetica-Bold fallback — bold Latin is approximated at half an em per
/// glyph, which centres typical mixed-case captions to within ~15% of the
/// text width.
fn text_width_pt(text: &str, font_size: f32, metrics: Option<&FontVec>) -> f32 {
    match metrics {
        Some(font) => {
            let units: f32 = text
                .chars()
                .map(|c| font.h_advance_unscaled(font.glyph_id(c)))
                .sum();
            units * font_size / font.units_per_em().unwrap_or(1000.0)
        }
        None => text.chars().count() as f32 * font_size * 0.5,
    }
}
