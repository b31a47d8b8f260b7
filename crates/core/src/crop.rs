//! Viewport cropping.
//!
//! A viewport snapshot is taken in device pixels while selections are
//! expressed in CSS pixels. The crop scales the selection by the device
//! pixel ratio, samples that source region and writes it into an output
//! surface of exactly `width × height` CSS pixels, so the result does not
//! depend on the display density of the capturing screen.

use std::io::Cursor;

use image::{ImageFormat, Rgba, RgbaImage};

use crate::error::CoreError;
use crate::types::SelectionRect;

/// Pixel written where the scaled region falls outside the snapshot.
const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Normalize a reported device pixel ratio. Missing, non-finite or
/// non-positive values fall back to `1.0`.
pub fn effective_ratio(reported: Option<f64>) -> f64 {
    match reported {
        Some(r) if r.is_finite() && r > 0.0 => r,
        _ => 1.0,
    }
}

/// Decode an encoded snapshot (PNG, JPEG or WebP) into RGBA pixels.
pub fn decode_bitmap(bytes: &[u8]) -> Result<RgbaImage, CoreError> {
    let image = image::load_from_memory(bytes).map_err(CoreError::Decode)?;
    Ok(image.into_rgba8())
}

/// Encode RGBA pixels as PNG.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, CoreError> {
    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, ImageFormat::Png)
        .map_err(CoreError::Encode)?;
    Ok(out.into_inner())
}

/// Crop `area` (CSS pixels) out of `source` (device pixels).
///
/// Output pixel `(x, y)` takes source pixel
/// `(round(left*r + x*r), round(top*r + y*r))`, so output `(0, 0)` is always
/// source `(round(left*r), round(top*r))`.
pub fn crop_region(source: &RgbaImage, area: &SelectionRect, ratio: f64) -> RgbaImage {
    let (out_w, out_h) = area.output_size();
    let scaled = area.scaled(ratio);
    let (src_w, src_h) = source.dimensions();

    RgbaImage::from_fn(out_w, out_h, |x, y| {
        let sx = (scaled.left + f64::from(x) * ratio).round();
        let sy = (scaled.top + f64::from(y) * ratio).round();
        if sx < 0.0 || sy < 0.0 || sx >= f64::from(src_w) || sy >= f64::from(src_h) {
            TRANSPARENT
        } else {
            *source.get_pixel(sx as u32, sy as u32)
        }
    })
}

/// Reject selections the snapshot cannot back: the scaled region must overlap
/// the source, and the output may not be larger than the source viewport in
/// CSS pixels. Checked before any output surface is allocated.
pub fn check_bounds(
    source_dims: (u32, u32),
    area: &SelectionRect,
    ratio: f64,
) -> Result<(), CoreError> {
    let (src_w, src_h) = source_dims;
    let scaled = area.scaled(ratio);

    let overlaps = scaled.left < f64::from(src_w)
        && scaled.top < f64::from(src_h)
        && scaled.left + scaled.width > 0.0
        && scaled.top + scaled.height > 0.0;
    if !overlaps {
        return Err(CoreError::Validation(format!(
            "Selection {}x{} at ({}, {}) lies outside the {src_w}x{src_h} snapshot",
            area.width, area.height, area.left, area.top
        )));
    }

    let max_w = (f64::from(src_w) / ratio).ceil().max(1.0);
    let max_h = (f64::from(src_h) / ratio).ceil().max(1.0);
    if area.width.round() > max_w || area.height.round() > max_h {
        return Err(CoreError::Validation(format!(
            "Selection {}x{} exceeds the {max_w}x{max_h} viewport",
            area.width, area.height
        )));
    }
    Ok(())
}

/// Decode, crop and re-encode in one step.
pub fn crop_png(bytes: &[u8], area: &SelectionRect, ratio: f64) -> Result<Vec<u8>, CoreError> {
    area.validate()?;
    let ratio = effective_ratio(Some(ratio));
    let source = decode_bitmap(bytes)?;
    check_bounds(source.dimensions(), area, ratio)?;
    let cropped = crop_region(&source, area, ratio);
    encode_png(&cropped)
}
