//! Code 128 barcode rendering.
//!
//! Each row's code is encoded in character set B (full printable ASCII) and
//! written as a PNG of configurable bar height, with the human-readable code
//! rendered as a reduced-size caption line offset beneath the bars. The
//! caption uses the same font discovery chain as the document compositor;
//! when no font file can be loaded the bars are written on their own.

use crate::error::RowError;
use crate::pipeline::compose::font_candidates;
use ab_glyph::{FontVec, PxScale};
use barcoders::generators::image::Image as ImageGenerator;
use barcoders::sym::code128::Code128;
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use std::path::Path;
use tracing::{debug, warn};

/// Character-set-B selector that Code 128 payloads must be prefixed with.
const CHARSET_B: char = '\u{0181}';

/// Caption glyph height in pixels.
const CAPTION_FONT_PX: f32 = 14.0;

/// Gap between the bottom of the bars and the caption line.
const CAPTION_OFFSET_PX: u32 = 4;

/// Total height added below the bars when a caption is rendered.
pub(crate) const CAPTION_BAND_PX: u32 = CAPTION_OFFSET_PX + CAPTION_FONT_PX as u32;

/// Encode `code` as Code 128 and write a captioned PNG to `dest`.
///
/// `height` is the bar height in pixels; the caption band adds
/// [`CAPTION_BAND_PX`] below it. The write goes through a temp file and a
/// rename so an interrupted run never leaves a truncated PNG behind.
pub fn generate_barcode(
    code: &str,
    dest: &Path,
    height: u32,
    caption_font: Option<&Path>,
) -> Result<(), RowError> {
    let symbol =
        Code128::new(format!("{CHARSET_B}{code}")).map_err(|e| RowError::BarcodeEncode {
            detail: format!("'{code}' is not encodable: {e}"),
        })?;

    let png = ImageGenerator::png(height)
        .generate(&symbol.encode()[..])
        .map_err(|e| RowError::BarcodeEncode {
            detail: format!("render failed for '{code}': {e}"),
        })?;

    let bars = image::load_from_memory(&png)
        .map_err(|e| RowError::BarcodeEncode {
            detail: format!("bar raster unreadable for '{code}': {e}"),
        })?
        .to_rgba8();

    let rendered = match load_caption_font(caption_font) {
        Some(font) => with_caption(&bars, code, &font),
        None => {
            warn!("no caption font found, writing bars only");
            bars
        }
    };

    let parent = dest.parent().filter(|p| !p.as_os_str().is_empty());
    let tmp = tempfile::NamedTempFile::new_in(parent.unwrap_or_else(|| Path::new(".")))
        .map_err(|e| RowError::BarcodeEncode {
            detail: format!("temp file: {e}"),
        })?;
    rendered
        .save_with_format(tmp.path(), image::ImageFormat::Png)
        .map_err(|e| RowError::BarcodeEncode {
            detail: format!("write '{}': {e}", dest.display()),
        })?;
    tmp.persist(dest).map_err(|e| RowError::BarcodeEncode {
        detail: format!("persist '{}': {e}", dest.display()),
    })?;

    debug!("barcode written to {}", dest.display());
    Ok(())
}

/// First loadable font from the shared candidate chain, parsed for drawing.
fn load_caption_font(configured: Option<&Path>) -> Option<FontVec> {
    for path in font_candidates(configured) {
        let Ok(bytes) = std::fs::read(&path) else { continue };
        match FontVec::try_from_vec(bytes) {
            Ok(font) => {
                debug!("caption font: {}", path.display());
                return Some(font);
            }
            Err(e) => warn!("failed to parse font {}: {e}", path.display()),
        }
    }
    None
}

/// Bars on top, the code centred in a white band beneath them.
fn with_caption(bars: &RgbaImage, code: &str, font: &FontVec) -> RgbaImage {
    let mut canvas = RgbaImage::from_pixel(
        bars.width(),
        bars.height() + CAPTION_BAND_PX,
        Rgba([255, 255, 255, 255]),
    );
    image::imageops::replace(&mut canvas, bars, 0, 0);

    let scale = PxScale::from(CAPTION_FONT_PX);
    let (text_w, _) = text_size(scale, font, code);
    let x = ((bars.width() as i64 - text_w as i64) / 2).max(0) as i32;
    let y = (bars.height() + CAPTION_OFFSET_PX) as i32;
    draw_text_mut(&mut canvas, Rgba([0, 0, 0, 255]), x, y, scale, font, code);
    canvas
}
