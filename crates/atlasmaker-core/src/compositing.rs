use crate::model::{Layer, Rect};
use image::{Rgba, RgbaImage};

/// Blit the sub-rectangle `src_rect` of `src` into `canvas` at (dx, dy), clipping
/// anything that falls outside either image, then optionally draw a red 1px outline
/// around the destination area for debugging.
pub fn blit_rgba(src: &RgbaImage, canvas: &mut RgbaImage, dx: u32, dy: u32, src_rect: Rect, outlines: bool) {
    let (cw, ch) = canvas.dimensions();
    let (sw, sh) = src.dimensions();
    let rw = src_rect
        .w
        .min(sw.saturating_sub(src_rect.x))
        .min(cw.saturating_sub(dx));
    let rh = src_rect
        .h
        .min(sh.saturating_sub(src_rect.y))
        .min(ch.saturating_sub(dy));
    if rw == 0 || rh == 0 {
        return;
    }

    for yy in 0..rh {
        for xx in 0..rw {
            let px = *src.get_pixel(src_rect.x + xx, src_rect.y + yy);
            canvas.put_pixel(dx + xx, dy + yy, px);
        }
    }

    if outlines {
        let red = Rgba([255, 0, 0, 255]);
        let (right, bottom) = (dx + rw - 1, dy + rh - 1);
        for x in dx..=right {
            canvas.put_pixel(x, dy, red);
            canvas.put_pixel(x, bottom, red);
        }
        for y in dy..=bottom {
            canvas.put_pixel(dx, y, red);
            canvas.put_pixel(right, y, red);
        }
    }
}

/// Draws every sprite of `layer` onto a transparent `side x side` canvas.
///
/// Each placement copies the sprite's trimmed bounds from its source image. The
/// result lives in memory only; writing it anywhere is up to the caller.
pub fn render_layer(layer: &Layer, outlines: bool) -> RgbaImage {
    let mut canvas = RgbaImage::from_pixel(layer.side, layer.side, Rgba([0, 0, 0, 0]));
    for p in &layer.placements {
        blit_rgba(
            p.sprite.image().pixels(),
            &mut canvas,
            p.x,
            p.y,
            p.sprite.bounds(),
            outlines,
        );
    }
    canvas
}
