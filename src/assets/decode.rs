use std::sync::Arc;

use base64::Engine as _;

use crate::assets::store::PreparedImage;
use crate::foundation::error::{LetterpressError, LetterpressResult};

/// Decode PNG/JPEG/GIF/WebP/BMP bytes into premultiplied RGBA8.
pub fn decode_image(bytes: &[u8]) -> LetterpressResult<PreparedImage> {
    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| LetterpressError::decode(format!("decode image from memory: {e}")))?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(PreparedImage {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

/// Split a `data:<mime>;base64,<payload>` URL into its MIME type and decoded bytes.
pub fn parse_data_url(url: &str) -> LetterpressResult<(String, Vec<u8>)> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| LetterpressError::validation("data URL must start with \"data:\""))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| LetterpressError::validation("data URL is missing the ',' separator"))?;
    let mime = header.strip_suffix(";base64").ok_or_else(|| {
        LetterpressError::validation("only base64-encoded data URLs are supported")
    })?;

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| LetterpressError::validation(format!("invalid base64 payload: {e}")))?;
    Ok((mime.to_owned(), bytes))
}

/// Build a base64 data URL, the form image sources take inside an effect config.
pub fn encode_data_url(mime: &str, bytes: &[u8]) -> String {
    format!(
        "data:{mime};base64,{}",
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

pub(crate) fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((*c as u16 * 255 + a / 2) / a).min(255) as u8;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
