//! Scene entry points: background, then the single-string or multi-block text passes.

use tracing::debug;

use crate::assets::store::{PreparedAssets, PreparedImage};
use crate::effect::config::{EffectConfig, FillSource, ShadowConfig, TextureConfig};
use crate::effect::gradient::{GradientSpec, build_gradient};
use crate::foundation::core::{Canvas, Point, Vec2};
use crate::foundation::error::{LetterpressError, LetterpressResult};
use crate::render::blend::premul_over_in_place_opacity;
use crate::render::compositor::{
    Compositor, FillStyle, ImagePlacement, Layers, Paint, ShadowStyle, StrokeStyle, Texture,
};
use crate::render::raster::Rasterizer;
use crate::render::surface::Surface;
use crate::render::surface_pool::{SurfacePool, SurfacePoolStats};
use crate::render::{FrameRGBA, RenderOpts};
use crate::text::layout::{Shaper, TextLayout, TextStyle, layout_text};

/// Horizontal room kept free when a whole single-mode string is squeezed to fit.
const SQUEEZE_MARGIN_PX: f64 = 20.0;

/// Reusable renderer: owns the scratch surface pool and the rasterizer context.
///
/// Rendering the same config, assets and fonts twice produces identical pixels.
pub struct Renderer {
    opts: RenderOpts,
    pool: SurfacePool,
    raster: Rasterizer,
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("opts", &self.opts)
            .field("pool", &self.pool.stats())
            .finish_non_exhaustive()
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(RenderOpts::default())
    }
}

impl Renderer {
    /// Renderer with the given options.
    pub fn new(opts: RenderOpts) -> Self {
        Self {
            pool: SurfacePool::new(opts.pool),
            raster: Rasterizer::new(),
            opts,
        }
    }

    /// Options this renderer was built with.
    pub fn opts(&self) -> &RenderOpts {
        &self.opts
    }

    /// Scratch pool counters.
    pub fn pool_stats(&self) -> SurfacePoolStats {
        self.pool.stats()
    }

    /// Render `config` onto a freshly allocated canvas-sized frame.
    pub fn render(
        &mut self,
        config: &EffectConfig,
        assets: &PreparedAssets,
        fonts: &mut dyn Shaper,
    ) -> LetterpressResult<FrameRGBA> {
        let (w, h) = config.canvas_size();
        let mut surface = Surface::new(w, h)?;
        self.render_into(config, assets, fonts, &mut surface)?;
        Ok(surface.to_frame())
    }

    /// Render `config` onto a caller-owned surface matching `config.canvas_size()`.
    pub fn render_into(
        &mut self,
        config: &EffectConfig,
        assets: &PreparedAssets,
        fonts: &mut dyn Shaper,
        surface: &mut Surface,
    ) -> LetterpressResult<()> {
        let (w, h) = config.canvas_size();
        if surface.width() != w || surface.height() != h {
            return Err(LetterpressError::validation(format!(
                "surface is {}x{} but the canvas is {w}x{h}",
                surface.width(),
                surface.height()
            )));
        }
        let canvas = surface.canvas();

        surface.clear(self.opts.clear_rgba);
        self.raster.begin_frame();
        self.draw_background(config, assets, surface)?;

        let gradients = GradientRasters::for_config(config, assets, canvas);
        let passes = if config.is_multi() {
            block_passes(config, assets, fonts, canvas)?
        } else {
            vec![single_pass(config, assets, &gradients, fonts, canvas)?]
        };
        debug!(
            passes = passes.len(),
            units = passes.iter().map(|p| p.layout.units.len()).sum::<usize>(),
            "text passes laid out"
        );
        if passes.iter().all(|p| p.layout.is_empty()) {
            return Ok(());
        }

        let mut layers = Layers::borrow(&mut self.pool, w, h)?;
        let painted = match Compositor::new(&mut self.raster, &mut self.pool, w, h) {
            Ok(mut comp) => {
                let r = paint_passes(&mut comp, &mut layers, &passes);
                comp.finish(&mut self.pool);
                r
            }
            Err(e) => Err(e),
        };
        let composed = painted.and_then(|()| layers.composite_onto(surface.data_mut()));
        layers.release(&mut self.pool);
        composed
    }

    fn draw_background(
        &mut self,
        config: &EffectConfig,
        assets: &PreparedAssets,
        surface: &mut Surface,
    ) -> LetterpressResult<()> {
        let bg = &config.background_image;
        let Some(image) = bg
            .active_source()
            .and_then(|src| loaded(assets, src, "background"))
        else {
            return Ok(());
        };
        let rect =
            ImagePlacement::new(bg.offset_x, bg.offset_y, bg.scale).rect(image, surface.canvas().center());

        let mut scratch = self.pool.borrow(surface.width(), surface.height())?;
        let drawn = self
            .raster
            .place_image(image, rect, &mut scratch)
            .and_then(|()| {
                premul_over_in_place_opacity(
                    surface.data_mut(),
                    scratch.data_as_u8_slice(),
                    bg.opacity as f32,
                )
            });
        self.pool.release(scratch);
        drawn
    }
}

/// One-shot render of `config` into a new frame.
#[tracing::instrument(skip_all, fields(mode = ?config.text_mode))]
pub fn render_effect(
    config: &EffectConfig,
    assets: &PreparedAssets,
    fonts: &mut dyn Shaper,
    opts: &RenderOpts,
) -> LetterpressResult<FrameRGBA> {
    Renderer::new(opts.clone()).render(config, assets, fonts)
}

/// Render `config` into a caller-owned surface using a long-lived renderer.
pub fn render_effect_into(
    config: &EffectConfig,
    assets: &PreparedAssets,
    fonts: &mut dyn Shaper,
    renderer: &mut Renderer,
    surface: &mut Surface,
) -> LetterpressResult<()> {
    renderer.render_into(config, assets, fonts, surface)
}

/// Laid-out text plus the styles of its three layers.
struct TextPass<'a> {
    layout: TextLayout,
    shadow: Option<ShadowStyle>,
    stroke: Option<StrokeStyle<'a>>,
    fill: FillStyle<'a>,
}

/// Canvas-sized gradient rasters for the single-mode fill and stroke.
#[derive(Default)]
struct GradientRasters {
    fill: Option<Vec<u8>>,
    stroke: Option<Vec<u8>>,
}

impl GradientRasters {
    fn for_config(config: &EffectConfig, assets: &PreparedAssets, canvas: Canvas) -> Self {
        if config.is_multi() {
            return Self::default();
        }
        let (w, h) = (f64::from(canvas.width), f64::from(canvas.height));
        let rasterize = |spec: &GradientSpec| {
            build_gradient(spec, w, h).map(|g| g.rasterize(canvas.width, canvas.height))
        };

        let fill = match config.fallback_fill() {
            FillSource::Gradient(spec) => rasterize(spec),
            _ => None,
        };
        let stroke_image_ready = config
            .stroke
            .active_image()
            .is_some_and(|src| assets.get(src).is_some());
        let stroke = match config.stroke.active_gradient() {
            Some(spec) if config.stroke.enabled && !stroke_image_ready => rasterize(spec),
            _ => None,
        };
        Self { fill, stroke }
    }
}

fn single_pass<'a>(
    config: &'a EffectConfig,
    assets: &'a PreparedAssets,
    gradients: &'a GradientRasters,
    fonts: &mut dyn Shaper,
    canvas: Canvas,
) -> LetterpressResult<TextPass<'a>> {
    let style = TextStyle {
        family: &config.font_family,
        size_px: config.font_size,
        letter_spacing: config.letter_spacing,
        max_width: Some(f64::from(canvas.width) - SQUEEZE_MARGIN_PX),
    };
    let layout = layout_or_empty(fonts, &config.text, &style, canvas.center())?;

    let image_fill = &config.image_fill;
    let paint = match image_fill
        .active_source()
        .and_then(|src| loaded(assets, src, "image fill"))
    {
        Some(image) => Paint::Image {
            image,
            placement: ImagePlacement::new(image_fill.offset_x, image_fill.offset_y, image_fill.scale),
        },
        None => match (config.fallback_fill(), gradients.fill.as_deref()) {
            (FillSource::Gradient(_), Some(buf)) => Paint::Gradient(buf),
            _ => Paint::Solid(config.text_color.to_premul()),
        },
    };

    let sc = &config.stroke;
    let stroke = sc.enabled.then(|| {
        let paint = match sc
            .active_image()
            .and_then(|src| loaded(assets, src, "stroke image"))
        {
            Some(image) => Paint::Image {
                image,
                placement: ImagePlacement::new(sc.offset_x, sc.offset_y, sc.scale),
            },
            None => match gradients.stroke.as_deref() {
                Some(buf) => Paint::Gradient(buf),
                None => Paint::Solid(sc.color.to_premul()),
            },
        };
        StrokeStyle {
            width: sc.width,
            paint,
            texture: texture(&sc.texture, assets),
        }
    });

    Ok(TextPass {
        layout,
        shadow: shadow(&config.shadow),
        stroke,
        fill: FillStyle {
            paint,
            texture: texture(&config.texture, assets),
        },
    })
}

fn block_passes<'a>(
    config: &'a EffectConfig,
    assets: &'a PreparedAssets,
    fonts: &mut dyn Shaper,
    canvas: Canvas,
) -> LetterpressResult<Vec<TextPass<'a>>> {
    let center = canvas.center();
    config
        .text_blocks
        .iter()
        .map(|block| {
            let style = TextStyle {
                family: &block.font_family,
                size_px: block.font_size,
                letter_spacing: block.letter_spacing,
                max_width: None,
            };
            let anchor = center + Vec2::new(block.offset_x, block.offset_y);
            let layout = layout_or_empty(fonts, &block.text, &style, anchor)?;

            let fill = &block.image_fill;
            let paint = match fill
                .active_source()
                .and_then(|src| loaded(assets, src, "block image fill"))
            {
                Some(image) => Paint::Image {
                    image,
                    placement: ImagePlacement::new(fill.offset_x, fill.offset_y, fill.scale),
                },
                None => Paint::Solid(block.text_color.to_premul()),
            };
            let stroke = block.stroke.enabled.then(|| StrokeStyle {
                width: block.stroke.width,
                paint: Paint::Solid(block.stroke.color.to_premul()),
                texture: None,
            });

            Ok(TextPass {
                layout,
                shadow: shadow(&config.shadow),
                stroke,
                fill: FillStyle {
                    paint,
                    texture: texture(&block.texture, assets),
                },
            })
        })
        .collect()
}

/// All shadows first, then all strokes, then all fills.
fn paint_passes(
    comp: &mut Compositor<'_>,
    layers: &mut Layers,
    passes: &[TextPass<'_>],
) -> LetterpressResult<()> {
    for pass in passes {
        if let Some(style) = &pass.shadow {
            for unit in &pass.layout.units {
                comp.shadow_unit(&mut layers.shadow, unit, style)?;
            }
        }
    }
    for pass in passes {
        if let Some(style) = &pass.stroke {
            for unit in &pass.layout.units {
                comp.stroke_unit(&mut layers.stroke, unit, style)?;
            }
        }
    }
    for pass in passes {
        for unit in &pass.layout.units {
            comp.fill_unit(&mut layers.fill, unit, &pass.fill)?;
        }
    }
    Ok(())
}

/// Unusable font sizes draw nothing instead of failing the frame.
fn layout_or_empty(
    fonts: &mut dyn Shaper,
    text: &str,
    style: &TextStyle<'_>,
    anchor: Point,
) -> LetterpressResult<TextLayout> {
    if !(style.size_px.is_finite() && style.size_px > 0.0) {
        debug!(size = style.size_px, "skipping text with unusable font size");
        return Ok(TextLayout::default());
    }
    layout_text(fonts, text, style, anchor)
}

fn shadow(cfg: &ShadowConfig) -> Option<ShadowStyle> {
    cfg.enabled.then(|| ShadowStyle {
        color: cfg.color.to_premul(),
        blur: cfg.blur,
        offset: Vec2::new(cfg.offset_x, cfg.offset_y),
    })
}

fn texture<'a>(cfg: &TextureConfig, assets: &'a PreparedAssets) -> Option<Texture<'a>> {
    let image = loaded(assets, cfg.active_source()?, "texture")?;
    Some(Texture {
        image,
        placement: ImagePlacement::new(cfg.offset_x, cfg.offset_y, cfg.scale),
        mode: cfg.blend_mode,
        opacity: cfg.opacity as f32,
    })
}

fn loaded<'a>(assets: &'a PreparedAssets, src: &str, role: &str) -> Option<&'a PreparedImage> {
    let image = assets.get(src);
    if image.is_none() {
        debug!(role, "image not loaded; skipping");
    }
    image
}

#[cfg(test)]
#[path = "../../tests/unit/render/scene.rs"]
mod tests;
