use std::borrow::Cow;
use std::path::Path;

use anyhow::Context;

use crate::foundation::error::{LetterpressError, LetterpressResult};
use crate::text::layout::{PlacedGlyph, ShapedText, Shaper};

/// File extensions accepted by [`FontBook::register_file`].
pub const FONT_EXTENSIONS: [&str; 5] = ["ttf", "otf", "woff", "woff2", "eot"];

#[derive(Clone, Debug)]
struct RegisteredFont {
    name: String,
    family: String,
    /// Private family holding only this face; shaping goes through it.
    shaping_family: String,
    data: vello_cpu::peniko::FontData,
}

/// Registry of user fonts backed by Parley.
///
/// The first registered font is the default face: unknown family names (including CSS generic
/// names such as `sans-serif`) resolve to it.
pub struct FontBook {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<()>,
    fonts: Vec<RegisteredFont>,
    faces_registered: usize,
}

impl Default for FontBook {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FontBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontBook")
            .field("names", &self.names())
            .finish_non_exhaustive()
    }
}

impl FontBook {
    /// Empty registry with fresh Parley contexts.
    pub fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            fonts: Vec::new(),
            faces_registered: 0,
        }
    }

    /// Register font bytes under `name`, replacing an earlier font with the same name.
    #[tracing::instrument(skip(self, bytes), fields(len = bytes.len()))]
    pub fn register(&mut self, name: &str, bytes: Vec<u8>) -> LetterpressResult<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LetterpressError::validation("font name must be non-empty"));
        }

        let blob = parley::fontique::Blob::from(bytes.clone());
        let families = self
            .font_ctx
            .collection
            .register_fonts(blob.clone(), None);
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            LetterpressError::decode(format!("\"{name}\": no font families found in font data"))
        })?;
        let family = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| {
                LetterpressError::decode(format!("\"{name}\": registered font family has no name"))
            })?
            .to_string();

        // Faces sharing a family would otherwise be picked by style, not by registration.
        let shaping_family = format!("letterpress-face-{}", self.faces_registered);
        self.faces_registered += 1;
        self.font_ctx.collection.register_fonts(
            blob,
            Some(parley::fontique::FontInfoOverride {
                family_name: Some(shaping_family.as_str()),
                ..Default::default()
            }),
        );

        let font = RegisteredFont {
            name: name.to_owned(),
            family,
            shaping_family,
            data: vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(bytes), 0),
        };
        match self.fonts.iter_mut().find(|f| f.name == font.name) {
            Some(slot) => *slot = font,
            None => self.fonts.push(font),
        }
        tracing::debug!(name, "font registered");
        Ok(())
    }

    /// Register a font file; the name is the file name minus its extension.
    pub fn register_file(&mut self, path: &Path) -> LetterpressResult<String> {
        let name = font_name_for_path(path)?;
        let bytes =
            std::fs::read(path).with_context(|| format!("read font file {}", path.display()))?;
        self.register(&name, bytes)?;
        Ok(name)
    }

    /// Registered names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.fonts.iter().map(|f| f.name.as_str()).collect()
    }

    /// `true` when `name` is registered (case-insensitive).
    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// `true` when no font is registered.
    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    fn find(&self, family: &str) -> Option<&RegisteredFont> {
        let family = family.trim().trim_matches(|c| c == '"' || c == '\'');
        self.fonts.iter().find(|f| {
            f.name.eq_ignore_ascii_case(family) || f.family.eq_ignore_ascii_case(family)
        })
    }

    fn resolve(&self, family: &str) -> Option<&RegisteredFont> {
        self.find(family).or_else(|| {
            let fallback = self.fonts.first();
            if let Some(f) = fallback {
                tracing::debug!(requested = family, fallback = %f.name, "unknown font family");
            }
            fallback
        })
    }
}

/// Font name derived from a file name, validating the extension.
pub fn font_name_for_path(path: &Path) -> LetterpressResult<String> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    if !FONT_EXTENSIONS.contains(&ext.as_str()) {
        return Err(LetterpressError::validation(format!(
            "unsupported font file \"{}\" (expected one of: {})",
            path.display(),
            FONT_EXTENSIONS.join(", ")
        )));
    }
    path.file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| {
            LetterpressError::validation(format!("font file \"{}\" has no name", path.display()))
        })
}

impl Shaper for FontBook {
    fn shape(&mut self, text: &str, family: &str, size_px: f32) -> LetterpressResult<ShapedText> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(LetterpressError::validation(
                "font size must be finite and > 0",
            ));
        }
        let Some(face) = self.resolve(family) else {
            return Ok(ShapedText::empty(size_px));
        };
        let family_name = face.shaping_family.clone();
        let data = face.data.clone();

        // Canvas text drawing renders line breaks as spaces.
        let text = text.replace(['\n', '\r'], " ");
        if text.is_empty() {
            return Ok(ShapedText::empty(size_px));
        }

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, &text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(Cow::Owned(family_name)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        let mut layout: parley::Layout<()> = builder.build(&text);
        layout.break_all_lines(None);

        let mut out = ShapedText {
            font: Some(data),
            size_px,
            advance: layout.full_width(),
            ..ShapedText::default()
        };
        for (i, line) in layout.lines().enumerate() {
            let metrics = line.metrics();
            if i == 0 {
                out.ascent = metrics.ascent;
                out.descent = metrics.descent;
            }
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                out.glyphs.extend(run.positioned_glyphs().map(|g| PlacedGlyph {
                    id: g.id,
                    x: g.x,
                    y: g.y - metrics.baseline,
                }));
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/text/fonts.rs"]
mod tests;
