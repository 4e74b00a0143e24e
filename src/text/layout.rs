use std::collections::HashMap;
use std::sync::Arc;

use crate::foundation::core::Point;
use crate::foundation::error::{LetterpressError, LetterpressResult};

/// Glyph id and position relative to the pen origin on the baseline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacedGlyph {
    /// Glyph id in the font.
    pub id: u32,
    /// X offset from the pen origin.
    pub x: f32,
    /// Y offset from the baseline (positive is down).
    pub y: f32,
}

/// One shaped run of text in a single face.
#[derive(Clone, Debug, Default)]
pub struct ShapedText {
    /// Face the glyph ids belong to; `None` when no font is available.
    pub font: Option<vello_cpu::peniko::FontData>,
    /// Size the run was shaped at.
    pub size_px: f32,
    /// Positioned glyphs.
    pub glyphs: Vec<PlacedGlyph>,
    /// Total advance including trailing whitespace.
    pub advance: f32,
    /// Font ascent above the baseline.
    pub ascent: f32,
    /// Font descent below the baseline (positive).
    pub descent: f32,
}

impl ShapedText {
    /// Zero-width run that draws nothing.
    pub fn empty(size_px: f32) -> Self {
        Self {
            size_px,
            ..Self::default()
        }
    }

    /// `true` when there is nothing to draw.
    pub fn is_blank(&self) -> bool {
        self.font.is_none() || self.glyphs.is_empty()
    }
}

/// Measures and shapes text in a named family.
pub trait Shaper {
    /// Shape `text` in `family` at `size_px`.
    fn shape(&mut self, text: &str, family: &str, size_px: f32) -> LetterpressResult<ShapedText>;
}

/// Font parameters shared by every unit of one layout.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextStyle<'a> {
    /// Family name passed to the shaper.
    pub family: &'a str,
    /// Font size in pixels.
    pub size_px: f64,
    /// Extra advance between characters, as a fraction of `size_px`.
    pub letter_spacing: f64,
    /// Horizontal squeeze limit for the whole-string path.
    pub max_width: Option<f64>,
}

/// A drawable piece of text: the whole string, or one character.
#[derive(Clone, Debug)]
pub struct DrawUnit {
    /// Point image fills and textures are centred against.
    pub anchor: Point,
    /// Pen origin on the baseline.
    pub origin: Point,
    /// Horizontal scale applied around `origin` (1.0 unless squeezed).
    pub scale_x: f64,
    /// Shaped glyphs.
    pub shaped: Arc<ShapedText>,
}

/// Laid-out text ready for the compositor.
#[derive(Clone, Debug, Default)]
pub struct TextLayout {
    /// Units in drawing order.
    pub units: Vec<DrawUnit>,
    /// Width of the laid-out text including letter spacing.
    pub total_width: f64,
    /// `true` when each character is its own unit.
    pub per_char: bool,
}

impl TextLayout {
    /// `true` when nothing would be drawn.
    pub fn is_empty(&self) -> bool {
        self.units.iter().all(|u| u.shaped.is_blank())
    }
}

/// Spacing below this many pixels is treated as no spacing at all.
pub const MIN_EFFECTIVE_SPACING_PX: f64 = 1.0 / 64.0;

/// Lay out `text` centred on `anchor` with a "middle" baseline.
///
/// Spacing that resolves to less than [`MIN_EFFECTIVE_SPACING_PX`] keeps the string as one
/// (kerned) unit. Any other spacing splits it into characters that are measured one by one and
/// placed from `anchor.x - total / 2`, where `total = sum(advances) + spacing * size * (n - 1)`.
pub fn layout_text(
    shaper: &mut dyn Shaper,
    text: &str,
    style: &TextStyle<'_>,
    anchor: Point,
) -> LetterpressResult<TextLayout> {
    if !style.size_px.is_finite() || style.size_px <= 0.0 {
        return Err(LetterpressError::validation(
            "font size must be finite and > 0",
        ));
    }
    if text.is_empty() {
        return Ok(TextLayout::default());
    }
    let size = style.size_px as f32;

    let extra = style.letter_spacing * style.size_px;
    if extra.is_nan() || extra.abs() < MIN_EFFECTIVE_SPACING_PX {
        let shaped = Arc::new(shaper.shape(text, style.family, size)?);
        let advance = f64::from(shaped.advance);
        let scale_x = match style.max_width {
            Some(max) if max > 0.0 && advance > max => max / advance,
            _ => 1.0,
        };
        let width = advance * scale_x;
        let origin = Point::new(anchor.x - width / 2.0, baseline_y(anchor.y, &shaped));
        return Ok(TextLayout {
            units: vec![DrawUnit {
                anchor,
                origin,
                scale_x,
                shaped,
            }],
            total_width: width,
            per_char: false,
        });
    }

    let mut cache: HashMap<char, Arc<ShapedText>> = HashMap::new();
    let mut chars = Vec::new();
    for ch in text.chars() {
        let shaped = match cache.get(&ch) {
            Some(s) => s.clone(),
            None => {
                let mut buf = [0u8; 4];
                let s = Arc::new(shaper.shape(ch.encode_utf8(&mut buf), style.family, size)?);
                cache.insert(ch, s.clone());
                s
            }
        };
        chars.push(shaped);
    }

    let sum: f64 = chars.iter().map(|s| f64::from(s.advance)).sum();
    let total = sum + extra * (chars.len() as f64 - 1.0);

    let mut x = anchor.x - total / 2.0;
    let mut units = Vec::with_capacity(chars.len());
    for shaped in chars {
        let advance = f64::from(shaped.advance);
        units.push(DrawUnit {
            anchor: Point::new(x, anchor.y),
            origin: Point::new(x, baseline_y(anchor.y, &shaped)),
            scale_x: 1.0,
            shaped,
        });
        x += advance + extra;
    }

    Ok(TextLayout {
        units,
        total_width: total,
        per_char: true,
    })
}

fn baseline_y(middle: f64, shaped: &ShapedText) -> f64 {
    middle + f64::from(shaped.ascent - shaped.descent) / 2.0
}

#[cfg(test)]
#[path = "../../tests/unit/text/layout.rs"]
mod tests;
