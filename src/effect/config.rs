use serde::{Deserialize, Serialize};

use crate::effect::color::Color;
use crate::effect::gradient::GradientSpec;
use crate::geometry::grid;

/// Rendering mode of the editor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextMode {
    /// One styled string, canvas sized by `grid_cols`/`grid_rows`.
    #[default]
    Single,
    /// Independent text blocks on a preview canvas.
    Multiple,
}

/// Named pixel-combination function for texture overlays.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlendMode {
    /// `s * d`
    #[default]
    Multiply,
    /// Multiply or screen depending on the backdrop.
    Overlay,
    /// `s + d - s * d`
    Screen,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
/// Soft drop shadow drawn with stamped glyph copies.
pub struct ShadowConfig {
    /// Effect toggle; disabling keeps the image source.
    pub enabled: bool,
    /// Paint colour.
    pub color: Color,
    /// Halo radius in pixels; `<= 0` draws only the core stamp.
    pub blur: f64,
    /// Horizontal offset in pixels.
    pub offset_x: f64,
    /// Vertical offset in pixels.
    pub offset_y: f64,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            color: Color::rgba(0, 0, 0, 128),
            blur: 4.0,
            offset_x: 4.0,
            offset_y: 4.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
/// Image overlay blended onto a glyph-shaped layer.
pub struct TextureConfig {
    /// Effect toggle; disabling keeps the image source.
    pub enabled: bool,
    /// Image source (data URL or relative path).
    pub image_url: Option<String>,
    /// How the texture combines with the layer below.
    pub blend_mode: BlendMode,
    /// Opacity in `[0, 1]`.
    pub opacity: f64,
    /// Horizontal offset in pixels.
    pub offset_x: f64,
    /// Vertical offset in pixels.
    pub offset_y: f64,
    /// Image scale factor.
    pub scale: f64,
}

impl Default for TextureConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            image_url: None,
            blend_mode: BlendMode::Multiply,
            opacity: 0.5,
            offset_x: 0.0,
            offset_y: 0.0,
            scale: 1.0,
        }
    }
}

impl TextureConfig {
    /// Image source when the texture is enabled and has an image.
    pub fn active_source(&self) -> Option<&str> {
        active(self.enabled, &self.image_url)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
/// Glyph outline stroke with optional gradient, image and texture paint.
pub struct StrokeConfig {
    /// Effect toggle; disabling keeps the image source.
    pub enabled: bool,
    /// Stroke width in pixels.
    pub width: f64,
    /// Paint colour.
    pub color: Color,
    /// Paint the stroke with `gradient`.
    pub use_gradient: bool,
    /// Gradient paint.
    pub gradient: Option<GradientSpec>,
    /// Paint the stroke with `image_url`.
    pub use_image: bool,
    /// Image source (data URL or relative path).
    pub image_url: Option<String>,
    /// Horizontal offset in pixels.
    pub offset_x: f64,
    /// Vertical offset in pixels.
    pub offset_y: f64,
    /// Image scale factor.
    pub scale: f64,
    /// Texture overlay.
    pub texture: TextureConfig,
}

impl Default for StrokeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            width: 2.0,
            color: Color::WHITE,
            use_gradient: false,
            gradient: None,
            use_image: false,
            image_url: None,
            offset_x: 0.0,
            offset_y: 0.0,
            scale: 1.0,
            texture: TextureConfig::default(),
        }
    }
}

impl StrokeConfig {
    /// Image source when the stroke image paint is selected.
    pub fn active_image(&self) -> Option<&str> {
        active(self.use_image, &self.image_url)
    }

    /// Gradient spec when the stroke gradient paint is selected and buildable.
    pub fn active_gradient(&self) -> Option<&GradientSpec> {
        self.gradient
            .as_ref()
            .filter(|g| self.use_gradient && g.is_buildable())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
/// Image shown through the glyph silhouette.
pub struct ImageFillConfig {
    /// Effect toggle; disabling keeps the image source.
    pub enabled: bool,
    /// Image source (data URL or relative path).
    pub image_url: Option<String>,
    /// Horizontal offset in pixels.
    pub offset_x: f64,
    /// Vertical offset in pixels.
    pub offset_y: f64,
    /// Image scale factor.
    pub scale: f64,
}

impl Default for ImageFillConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            image_url: None,
            offset_x: 0.0,
            offset_y: 0.0,
            scale: 1.0,
        }
    }
}

impl ImageFillConfig {
    /// Image source when the fill is enabled and has an image.
    pub fn active_source(&self) -> Option<&str> {
        active(self.enabled, &self.image_url)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
/// Image drawn behind every text layer.
pub struct BackgroundConfig {
    /// Effect toggle; disabling keeps the image source.
    pub enabled: bool,
    /// Image source (data URL or relative path).
    pub image_url: Option<String>,
    /// Horizontal offset in pixels.
    pub offset_x: f64,
    /// Vertical offset in pixels.
    pub offset_y: f64,
    /// Image scale factor.
    pub scale: f64,
    /// Opacity in `[0, 1]`.
    pub opacity: f64,
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            image_url: None,
            offset_x: 0.0,
            offset_y: 0.0,
            scale: 1.0,
            opacity: 1.0,
        }
    }
}

impl BackgroundConfig {
    /// Image source when the background is enabled and has an image.
    pub fn active_source(&self) -> Option<&str> {
        active(self.enabled, &self.image_url)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
/// Per-block stroke (colour and width only).
pub struct BlockStroke {
    /// Effect toggle; disabling keeps the image source.
    pub enabled: bool,
    /// Stroke width in pixels.
    pub width: f64,
    /// Paint colour.
    pub color: Color,
}

impl Default for BlockStroke {
    fn default() -> Self {
        Self {
            enabled: false,
            width: 2.0,
            color: Color::WHITE,
        }
    }
}

/// One independent text block in multi mode.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextBlock {
    /// Unique block id.
    pub id: String,
    /// Text to draw.
    pub text: String,
    /// Font size in pixels.
    pub font_size: f64,
    /// Registered font family name.
    pub font_family: String,
    /// Extra advance between characters as a fraction of `font_size`.
    pub letter_spacing: f64,
    /// Solid fill colour.
    pub text_color: Color,
    /// Horizontal offset from the canvas centre.
    pub offset_x: f64,
    /// Vertical offset from the canvas centre.
    pub offset_y: f64,
    /// Outline stroke.
    pub stroke: BlockStroke,
    /// Image fill.
    pub image_fill: ImageFillConfig,
    /// Texture overlay.
    pub texture: TextureConfig,
}

impl Default for TextBlock {
    fn default() -> Self {
        Self::new("block-1", "Text")
    }
}

impl TextBlock {
    /// Block with editor defaults.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            font_size: 48.0,
            font_family: DEFAULT_FONT_FAMILY.to_owned(),
            letter_spacing: 0.0,
            text_color: Color::BLACK,
            offset_x: 0.0,
            offset_y: 0.0,
            stroke: BlockStroke::default(),
            image_fill: ImageFillConfig::default(),
            texture: TextureConfig::default(),
        }
    }
}

/// Font family used until the user picks one.
pub const DEFAULT_FONT_FAMILY: &str = "sans-serif";

/// Which paint determines a fill's visible colour.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FillSource<'a> {
    /// Image shown through the glyph silhouette (falls back if not loaded).
    Image(&'a ImageFillConfig),
    /// Linear or radial gradient.
    Gradient(&'a GradientSpec),
    /// Solid text colour.
    Solid(Color),
}

/// Complete editor state for one text effect.
///
/// Values are treated as immutable snapshots: every `with_*` method returns a new config with
/// one sub-record replaced.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EffectConfig {
    /// Single or multi-block rendering.
    pub text_mode: TextMode,
    /// Text to draw.
    pub text: String,
    /// Font size in pixels.
    pub font_size: f64,
    /// Registered font family name.
    pub font_family: String,
    /// Extra advance between characters as a fraction of `font_size`.
    pub letter_spacing: f64,
    /// Single-mode canvas width in grid units.
    pub grid_cols: u32,
    /// Single-mode canvas height in grid units.
    pub grid_rows: u32,
    /// Solid fill colour.
    pub text_color: Color,
    /// Fill the text with `gradient`.
    pub use_text_gradient: bool,
    /// Gradient paint.
    pub gradient: Option<GradientSpec>,
    /// Drop shadow.
    pub shadow: ShadowConfig,
    /// Outline stroke.
    pub stroke: StrokeConfig,
    /// Image fill.
    pub image_fill: ImageFillConfig,
    /// Texture overlay.
    pub texture: TextureConfig,
    /// Background image.
    pub background_image: BackgroundConfig,
    /// Multi-mode preview width in grid units.
    pub canvas_grid_cols: Option<u32>,
    /// Multi-mode preview height in grid units.
    pub canvas_grid_rows: Option<u32>,
    /// Multi-mode text blocks in list order.
    pub text_blocks: Vec<TextBlock>,
}

impl Default for EffectConfig {
    fn default() -> Self {
        Self {
            text_mode: TextMode::Single,
            text: "Text Effect".to_owned(),
            font_size: 72.0,
            font_family: DEFAULT_FONT_FAMILY.to_owned(),
            letter_spacing: 0.0,
            grid_cols: 20,
            grid_rows: 6,
            text_color: Color::BLACK,
            use_text_gradient: false,
            gradient: None,
            shadow: ShadowConfig::default(),
            stroke: StrokeConfig::default(),
            image_fill: ImageFillConfig::default(),
            texture: TextureConfig::default(),
            background_image: BackgroundConfig::default(),
            canvas_grid_cols: None,
            canvas_grid_rows: None,
            text_blocks: Vec::new(),
        }
    }
}

/// Preview grid used in multi mode when none is set (600×400 px rounded to grid units).
pub const DEFAULT_PREVIEW_GRID: (u32, u32) = (25, 17);

impl EffectConfig {
    /// Parse a JSON document; missing fields take editor defaults.
    pub fn from_json(s: &str) -> crate::LetterpressResult<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// Serialize to pretty JSON.
    pub fn to_json_pretty(&self) -> crate::LetterpressResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Switch between single and multi mode.
    pub fn with_text_mode(&self, text_mode: TextMode) -> Self {
        Self {
            text_mode,
            ..self.clone()
        }
    }

    /// Replace the single-mode text.
    pub fn with_text(&self, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..self.clone()
        }
    }

    /// Replace font family, size and letter spacing together.
    pub fn with_typography(
        &self,
        font_family: impl Into<String>,
        font_size: f64,
        letter_spacing: f64,
    ) -> Self {
        Self {
            font_family: font_family.into(),
            font_size,
            letter_spacing,
            ..self.clone()
        }
    }

    /// Replace the solid fill colour.
    pub fn with_text_color(&self, text_color: Color) -> Self {
        Self {
            text_color,
            ..self.clone()
        }
    }

    /// Replace the text gradient and its use flag.
    pub fn with_gradient(&self, use_text_gradient: bool, gradient: Option<GradientSpec>) -> Self {
        Self {
            use_text_gradient,
            gradient,
            ..self.clone()
        }
    }

    /// Replace the shadow settings.
    pub fn with_shadow(&self, shadow: ShadowConfig) -> Self {
        Self {
            shadow,
            ..self.clone()
        }
    }

    /// Replace the stroke settings.
    pub fn with_stroke(&self, stroke: StrokeConfig) -> Self {
        Self {
            stroke,
            ..self.clone()
        }
    }

    /// Replace the image fill settings.
    pub fn with_image_fill(&self, image_fill: ImageFillConfig) -> Self {
        Self {
            image_fill,
            ..self.clone()
        }
    }

    /// Replace the texture settings.
    pub fn with_texture(&self, texture: TextureConfig) -> Self {
        Self {
            texture,
            ..self.clone()
        }
    }

    /// Replace the background image settings.
    pub fn with_background(&self, background_image: BackgroundConfig) -> Self {
        Self {
            background_image,
            ..self.clone()
        }
    }

    /// Single-mode canvas grid. Values are clamped when the canvas size is computed.
    pub fn with_grid(&self, grid_cols: u32, grid_rows: u32) -> Self {
        Self {
            grid_cols,
            grid_rows,
            ..self.clone()
        }
    }

    /// Multi-mode preview grid.
    pub fn with_preview_grid(&self, cols: u32, rows: u32) -> Self {
        Self {
            canvas_grid_cols: Some(cols),
            canvas_grid_rows: Some(rows),
            ..self.clone()
        }
    }

    /// Look up a block by id.
    pub fn block(&self, id: &str) -> Option<&TextBlock> {
        self.text_blocks.iter().find(|b| b.id == id)
    }

    /// First `block-N` id not used by any block.
    pub fn next_block_id(&self) -> String {
        (1..)
            .map(|n| format!("block-{n}"))
            .find(|id| self.block(id).is_none())
            .unwrap_or_default()
    }

    /// Append a block to the end of the list.
    pub fn add_block(&self, block: TextBlock) -> Self {
        let mut text_blocks = self.text_blocks.clone();
        text_blocks.push(block);
        Self {
            text_blocks,
            ..self.clone()
        }
    }

    /// Remove the block with `id`; unknown ids leave the config unchanged.
    pub fn remove_block(&self, id: &str) -> Self {
        Self {
            text_blocks: self
                .text_blocks
                .iter()
                .filter(|b| b.id != id)
                .cloned()
                .collect(),
            ..self.clone()
        }
    }

    /// Replace the block with `id` by `f(block)`; unknown ids leave the config unchanged.
    pub fn update_block(&self, id: &str, f: impl FnOnce(&TextBlock) -> TextBlock) -> Self {
        self.try_update_block(id, f)
            .unwrap_or_else(|| self.clone())
    }

    /// Like [`EffectConfig::update_block`], returning `None` for an unknown id.
    pub fn try_update_block(
        &self,
        id: &str,
        f: impl FnOnce(&TextBlock) -> TextBlock,
    ) -> Option<Self> {
        let idx = self.text_blocks.iter().position(|b| b.id == id)?;
        let mut text_blocks = self.text_blocks.clone();
        text_blocks[idx] = f(&self.text_blocks[idx]);
        Some(Self {
            text_blocks,
            ..self.clone()
        })
    }

    /// `true` when the multi-block renderer applies.
    pub fn is_multi(&self) -> bool {
        self.text_mode == TextMode::Multiple && !self.text_blocks.is_empty()
    }

    /// Canvas pixel size after clamping the mode-appropriate grid.
    pub fn canvas_size(&self) -> (u32, u32) {
        match self.text_mode {
            TextMode::Single => grid::canvas_size(
                grid::clamp_grid(f64::from(self.grid_cols)),
                grid::clamp_grid(f64::from(self.grid_rows)),
            ),
            TextMode::Multiple => {
                let cols = self.canvas_grid_cols.unwrap_or(DEFAULT_PREVIEW_GRID.0);
                let rows = self.canvas_grid_rows.unwrap_or(DEFAULT_PREVIEW_GRID.1);
                grid::canvas_size(
                    grid::clamp_preview_grid(f64::from(cols)),
                    grid::clamp_preview_grid(f64::from(rows)),
                )
            }
        }
    }

    /// Visible fill paint of the single-mode text: image > gradient > solid.
    pub fn fill_source(&self) -> FillSource<'_> {
        if self.image_fill.active_source().is_some() {
            return FillSource::Image(&self.image_fill);
        }
        self.fallback_fill()
    }

    /// Fill used when no image fill applies (or its image is not loaded).
    pub fn fallback_fill(&self) -> FillSource<'_> {
        match &self.gradient {
            Some(g) if self.use_text_gradient && g.is_buildable() => FillSource::Gradient(g),
            _ => FillSource::Solid(self.text_color),
        }
    }

    /// Every image source referenced by an enabled effect, deduplicated, first-seen order.
    pub fn required_images(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        let mut push = |src: Option<&str>| {
            if let Some(s) = src
                && !out.iter().any(|o| o == s)
            {
                out.push(s.to_owned());
            }
        };

        push(self.background_image.active_source());
        if self.is_multi() {
            for b in &self.text_blocks {
                push(b.image_fill.active_source());
                push(b.texture.active_source());
            }
        } else {
            push(self.image_fill.active_source());
            push(self.texture.active_source());
            if self.stroke.enabled {
                push(self.stroke.active_image());
                push(self.stroke.texture.active_source());
            }
        }
        out
    }
}

fn active(enabled: bool, url: &Option<String>) -> Option<&str> {
    url.as_deref().filter(|u| enabled && !u.is_empty())
}

#[cfg(test)]
#[path = "../../tests/unit/effect/config.rs"]
mod tests;
