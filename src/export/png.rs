use std::io::Cursor;

use anyhow::Context as _;
use image::RgbaImage;
use image::imageops::{self, FilterType};

use crate::assets::decode::unpremultiply_rgba8_in_place;
use crate::foundation::core::ensure_pixel_budget;
use crate::foundation::error::{LetterpressError, LetterpressResult};
use crate::render::FrameRGBA;

/// Name used when the text leaves nothing to build a file name from.
pub const DEFAULT_EXPORT_STEM: &str = "text-effect";
const MAX_STEM_CHARS: usize = 30;

/// Encode a rendered frame as PNG, upscaled by an integer `scale` (bilinear).
pub fn encode_png(frame: &FrameRGBA, scale: u32) -> LetterpressResult<Vec<u8>> {
    if scale == 0 {
        return Err(LetterpressError::validation("export scale must be >= 1"));
    }
    let expected = (frame.width as usize)
        .saturating_mul(frame.height as usize)
        .saturating_mul(4);
    if frame.data.len() != expected {
        return Err(LetterpressError::render(format!(
            "frame data is {} bytes, expected {expected}",
            frame.data.len()
        )));
    }

    let mut rgba = frame.data.clone();
    if frame.premultiplied {
        unpremultiply_rgba8_in_place(&mut rgba);
    }
    let img = RgbaImage::from_raw(frame.width, frame.height, rgba)
        .ok_or_else(|| LetterpressError::render("frame buffer does not match its size"))?;
    if scale == 1 {
        return encode_straight_png(&img);
    }

    let (w, h) = frame
        .width
        .checked_mul(scale)
        .zip(frame.height.checked_mul(scale))
        .ok_or_else(|| LetterpressError::validation("scaled export size overflows"))?;
    ensure_pixel_budget(w, h)?;
    encode_straight_png(&imageops::resize(&img, w, h, FilterType::Triangle))
}

/// Encode straight-alpha RGBA as a lossless PNG.
pub fn encode_straight_png(img: &RgbaImage) -> LetterpressResult<Vec<u8>> {
    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
        .context("encode png")?;
    Ok(out)
}

/// File name for an exported effect: ASCII letters, digits and Hangul syllables kept, every
/// other char replaced by `_`, at most 30 chars.
pub fn export_file_name(text: &str) -> String {
    let stem: String = text
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || ('가'..='힣').contains(&c) {
                c
            } else {
                '_'
            }
        })
        .take(MAX_STEM_CHARS)
        .collect();
    if stem.is_empty() {
        format!("{DEFAULT_EXPORT_STEM}.png")
    } else {
        format!("{stem}.png")
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/png.rs"]
mod tests;
