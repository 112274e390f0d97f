//! Alpha trimming: the tight rectangle around a bitmap's visible pixels.

use crate::error::{AtlasError, Result};
use crate::model::Rect;
use image::RgbaImage;

/// Computes the opaque bounds of tightly packed RGBA8 `pixels`.
///
/// Equivalent to [`trim_with_threshold`] with a threshold of 0: any non-zero alpha
/// counts as visible.
pub fn trim(pixels: &[u8], width: u32, height: u32) -> Result<Rect> {
    trim_with_threshold(pixels, width, height, 0)
}

/// Computes `(min_x, min_y, max_x - min_x, max_y - min_y)` over every pixel whose
/// alpha is greater than `threshold`, or `(0, 0, 0, 0)` if there is none.
///
/// The extents are the coordinates of the outermost visible pixels, so a sprite whose
/// visible area is a single column has a width of 0.
pub fn trim_with_threshold(pixels: &[u8], width: u32, height: u32, threshold: u8) -> Result<Rect> {
    let expected = (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(4))
        .ok_or_else(|| AtlasError::InvalidInput(format!("{}x{} bitmap is too large", width, height)))?;
    if pixels.len() != expected {
        return Err(AtlasError::InvalidInput(format!(
            "expected {} bytes for a {}x{} RGBA bitmap, got {}",
            expected,
            width,
            height,
            pixels.len()
        )));
    }

    let w = width as usize;
    let visible = pixels
        .chunks_exact(4)
        .enumerate()
        .map(|(i, px)| ((i % w) as u32, (i / w) as u32, px[3]));
    Ok(scan_bounds(visible, threshold))
}

/// Trims a decoded image.
///
/// Only the `width x height` pixels are scanned, whatever the length of the
/// backing container.
pub fn trim_image(image: &RgbaImage, threshold: u8) -> Rect {
    let visible = image.enumerate_pixels().map(|(x, y, px)| (x, y, px[3]));
    scan_bounds(visible, threshold)
}

fn scan_bounds(pixels: impl Iterator<Item = (u32, u32, u8)>, threshold: u8) -> Rect {
    let mut extents: Option<(u32, u32, u32, u32)> = None;
    for (x, y, alpha) in pixels {
        if alpha <= threshold {
            continue;
        }
        extents = Some(match extents {
            None => (x, y, x, y),
            Some((min_x, min_y, max_x, max_y)) => {
                (min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y))
            }
        });
    }
    match extents {
        Some((min_x, min_y, max_x, max_y)) => Rect::new(min_x, min_y, max_x - min_x, max_y - min_y),
        None => Rect::default(),
    }
}
