//! Grid-unit canvas sizing, aspect-fit placement, and integer ratio search.
//!
//! Every target dimension in letterpress is expressed in 24px grid units. These helpers are
//! pure; callers clamp user input (see [`clamp_grid`]) before asking for a canvas size.

use std::fmt;
use std::str::FromStr;

use crate::foundation::error::{LetterpressError, LetterpressResult};

/// Edge length of one grid unit in pixels.
pub const GRID_UNIT_PX: u32 = 24;

/// Valid grid range for single-mode canvases.
pub const GRID_RANGE: (u32, u32) = (1, 1000);

/// Valid grid range for the multi-block preview canvas (roughly 50..1000 px).
pub const PREVIEW_GRID_RANGE: (u32, u32) = (3, 41);

/// Search bound (inclusive) for [`best_integer_ratio`].
pub const MAX_RATIO_TERM: u32 = 10;

/// Largest term accepted in a user-supplied ratio (the single-mode grid ceiling).
pub const MAX_CUSTOM_RATIO_TERM: u32 = GRID_RANGE.1;

/// Pixel size of a `cols x rows` grid canvas.
///
/// Inputs are expected to be clamped already; the multiplication saturates rather than wrap.
pub fn canvas_size(cols: u32, rows: u32) -> (u32, u32) {
    (
        cols.saturating_mul(GRID_UNIT_PX),
        rows.saturating_mul(GRID_UNIT_PX),
    )
}

/// Clamp a user-provided grid count into [`GRID_RANGE`].
pub fn clamp_grid(v: f64) -> u32 {
    clamp_into(v, GRID_RANGE)
}

/// Clamp a user-provided preview grid count into [`PREVIEW_GRID_RANGE`].
pub fn clamp_preview_grid(v: f64) -> u32 {
    clamp_into(v, PREVIEW_GRID_RANGE)
}

fn clamp_into(v: f64, (lo, hi): (u32, u32)) -> u32 {
    if !v.is_finite() {
        return lo;
    }
    v.round().clamp(f64::from(lo), f64::from(hi)) as u32
}

/// Placement of a scaled source inside a destination box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FitRect {
    /// Drawn width in destination pixels.
    pub draw_w: f64,
    /// Drawn height in destination pixels.
    pub draw_h: f64,
    /// Left edge in destination pixels.
    pub x: f64,
    /// Top edge in destination pixels.
    pub y: f64,
}

/// Fit `src` into `dst` along its limiting axis.
///
/// A source wider than the target ratio spans the full width and sits on the bottom edge;
/// otherwise it spans the full height and is centred horizontally.
pub fn aspect_fit(src_w: f64, src_h: f64, dst_w: f64, dst_h: f64) -> FitRect {
    let src_ratio = src_w / src_h;
    let dst_ratio = dst_w / dst_h;

    if src_ratio > dst_ratio {
        let draw_h = dst_w / src_ratio;
        FitRect {
            draw_w: dst_w,
            draw_h,
            x: 0.0,
            y: dst_h - draw_h,
        }
    } else {
        let draw_w = dst_h * src_ratio;
        FitRect {
            draw_w,
            draw_h: dst_h,
            x: (dst_w - draw_w) / 2.0,
            y: 0.0,
        }
    }
}

/// Square canvas side and unscaled, centred placement for `src`.
pub fn square_fit(src_w: u32, src_h: u32) -> (u32, FitRect) {
    let side = src_w.max(src_h);
    let rect = FitRect {
        draw_w: f64::from(src_w),
        draw_h: f64::from(src_h),
        x: f64::from(side - src_w) / 2.0,
        y: f64::from(side - src_h) / 2.0,
    };
    (side, rect)
}

/// An integer `width:height` ratio.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Ratio {
    /// Horizontal term.
    pub width: u32,
    /// Vertical term.
    pub height: u32,
}

impl Ratio {
    /// Create a ratio with terms in `1..=MAX_CUSTOM_RATIO_TERM`.
    pub fn new(width: u32, height: u32) -> LetterpressResult<Self> {
        if width == 0 || height == 0 {
            return Err(LetterpressError::validation(format!(
                "ratio terms must be > 0 (got {width}:{height})"
            )));
        }
        if width > MAX_CUSTOM_RATIO_TERM || height > MAX_CUSTOM_RATIO_TERM {
            return Err(LetterpressError::validation(format!(
                "ratio terms must be <= {MAX_CUSTOM_RATIO_TERM} (got {width}:{height})"
            )));
        }
        Ok(Self { width, height })
    }

    /// Pixel size of the grid canvas for this ratio.
    pub fn target_size(self) -> (u32, u32) {
        canvas_size(self.width, self.height)
    }

    /// Aspect value `width / height`.
    pub fn aspect(self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.width, self.height)
    }
}

impl FromStr for Ratio {
    type Err = LetterpressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_ratio(s)
    }
}

/// Parse a `W:H` ratio string (digits only on both sides).
pub fn parse_ratio(input: &str) -> LetterpressResult<Ratio> {
    let malformed = || {
        LetterpressError::validation(format!(
            "ratio must look like 'W:H' with whole numbers, e.g. 1:3 or 2:1 (got '{input}')"
        ))
    };

    let trimmed = input.trim();
    let (w, h) = trimmed.split_once(':').ok_or_else(malformed)?;
    let is_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !is_digits(w) || !is_digits(h) {
        return Err(malformed());
    }

    let w: u32 = w.parse().map_err(|_| malformed())?;
    let h: u32 = h.parse().map_err(|_| malformed())?;
    Ratio::new(w, h)
}

/// Closest `w:h` ratio with both terms in `1..=10`.
///
/// Pairs are scanned in ascending `(w, h)` order and only a strictly smaller difference replaces
/// the current best, so ties go to the first pair scanned.
pub fn best_integer_ratio(src_w: u32, src_h: u32) -> Ratio {
    let aspect = f64::from(src_w) / f64::from(src_h);

    let mut best = Ratio {
        width: 1,
        height: 1,
    };
    let mut min_diff = f64::INFINITY;
    for w in 1..=MAX_RATIO_TERM {
        for h in 1..=MAX_RATIO_TERM {
            let diff = (aspect - f64::from(w) / f64::from(h)).abs();
            if diff < min_diff {
                min_diff = diff;
                best = Ratio {
                    width: w,
                    height: h,
                };
            }
        }
    }
    best
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/grid.rs"]
mod tests;
