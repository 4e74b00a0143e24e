use crate::foundation::error::{LetterpressError, LetterpressResult};

pub use kurbo::{Affine, Point, Rect, Vec2};

/// Pixel dimensions of a drawing surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Largest edge accepted by the CPU rasterizer.
    pub const MAX_EDGE: u32 = u16::MAX as u32;

    /// Create a validated canvas with non-zero edges that fit the rasterizer.
    pub fn new(width: u32, height: u32) -> LetterpressResult<Self> {
        if width == 0 || height == 0 {
            return Err(LetterpressError::validation(
                "canvas width and height must be > 0",
            ));
        }
        if width > Self::MAX_EDGE || height > Self::MAX_EDGE {
            return Err(LetterpressError::validation(format!(
                "canvas {width}x{height} exceeds the {} px edge limit",
                Self::MAX_EDGE
            )));
        }
        Ok(Self { width, height })
    }

    /// Canvas centre in pixel space.
    pub fn center(self) -> Point {
        Point::new(f64::from(self.width) / 2.0, f64::from(self.height) / 2.0)
    }

    /// Byte length of a tightly packed RGBA8 buffer for this canvas.
    pub fn rgba_len(self) -> usize {
        (self.width as usize)
            .saturating_mul(self.height as usize)
            .saturating_mul(4)
    }
}

/// Largest pixel count any generated raster (resize output, scaled export) may have.
pub const MAX_OUTPUT_PIXELS: u64 = 64 * 1024 * 1024;

/// Reject `width`x`height` outputs above [`MAX_OUTPUT_PIXELS`].
pub fn ensure_pixel_budget(width: u32, height: u32) -> LetterpressResult<()> {
    let pixels = u64::from(width) * u64::from(height);
    if pixels > MAX_OUTPUT_PIXELS {
        return Err(LetterpressError::validation(format!(
            "output {width}x{height} exceeds the {MAX_OUTPUT_PIXELS} pixel limit"
        )));
    }
    Ok(())
}

/// Premultiplied RGBA8 (r,g,b already multiplied by a).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Rgba8Premul {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8Premul {
    /// Fully transparent black.
    pub fn transparent() -> Self {
        Self {
            r: 0,
            g: 0,
            b: 0,
            a: 0,
        }
    }

    /// Premultiply straight RGBA8 channels.
    pub fn from_straight_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        fn premul(c: u8, a: u8) -> u8 {
            let c = u16::from(c);
            let a = u16::from(a);
            (((c * a) + 127) / 255) as u8
        }

        Self {
            r: premul(r, a),
            g: premul(g, a),
            b: premul(b, a),
            a,
        }
    }

    /// Channels as a `[r, g, b, a]` array.
    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
