use image::RgbaImage;
use image::imageops::{self, FilterType};

use crate::foundation::core::ensure_pixel_budget;
use crate::foundation::error::LetterpressResult;
use crate::geometry::grid::{aspect_fit, square_fit};
use crate::resize::ResizeTarget;

/// Width of the fixed resize box.
pub const FIXED_BOX_WIDTH: u32 = 480;
/// Height of the fixed resize box.
pub const FIXED_BOX_HEIGHT: u32 = 720;

/// Smoothing used whenever a source is scaled.
const SMOOTHING: FilterType = FilterType::CatmullRom;

/// Convert `src` to `target`. Output is straight-alpha RGBA with transparent padding.
///
/// Outputs larger than [`MAX_OUTPUT_PIXELS`](crate::foundation::core::MAX_OUTPUT_PIXELS) are
/// rejected with a validation error before anything is allocated.
pub fn resize(src: &RgbaImage, target: ResizeTarget) -> LetterpressResult<RgbaImage> {
    match target {
        ResizeTarget::Square => resize_square(src),
        ResizeTarget::Fixed480x720 => resize_to_box(src, FIXED_BOX_WIDTH, FIXED_BOX_HEIGHT),
        ResizeTarget::Ratio(r) => {
            let (w, h) = r.target_size();
            resize_to_box(src, w, h)
        }
    }
}

/// Square canvas of side `max(w, h)` with the source centred at its own size.
pub fn resize_square(src: &RgbaImage) -> LetterpressResult<RgbaImage> {
    let (side, fit) = square_fit(src.width(), src.height());
    ensure_pixel_budget(side, side)?;
    let mut out = RgbaImage::new(side, side);
    imageops::replace(&mut out, src, fit.x.floor() as i64, fit.y.floor() as i64);
    Ok(out)
}

/// `w`×`h` canvas with the source aspect-fit: centred horizontally, bottom-aligned vertically.
pub fn resize_to_box(src: &RgbaImage, w: u32, h: u32) -> LetterpressResult<RgbaImage> {
    ensure_pixel_budget(w, h)?;
    let mut out = RgbaImage::new(w, h);
    if src.width() == 0 || src.height() == 0 || w == 0 || h == 0 {
        return Ok(out);
    }

    let fit = aspect_fit(
        f64::from(src.width()),
        f64::from(src.height()),
        f64::from(w),
        f64::from(h),
    );
    let draw_w = (fit.draw_w.round() as u32).clamp(1, w);
    let draw_h = (fit.draw_h.round() as u32).clamp(1, h);
    let scaled = if (draw_w, draw_h) == src.dimensions() {
        src.clone()
    } else {
        imageops::resize(src, draw_w, draw_h, SMOOTHING)
    };

    // Full-span axis gives zero slack, so one formula covers both cases.
    let x = i64::from((w - draw_w) / 2);
    let y = i64::from(h - draw_h);
    imageops::replace(&mut out, &scaled, x, y);
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/resize/fit.rs"]
mod tests;
