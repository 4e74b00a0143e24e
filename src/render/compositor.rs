//! Per-unit layer painting: shadow, stroke and fill.
//!
//! Every pass rasterizes glyph coverage as an opaque white mask, then colours it with the pixel
//! kernels in [`blend`](super::blend). Layers are full-canvas premultiplied pixmaps that the
//! scene composites shadow → stroke → fill once all units have been painted.

use crate::assets::store::PreparedImage;
use crate::effect::config::BlendMode;
use crate::foundation::core::{Point, Rect, Rgba8Premul, Vec2};
use crate::foundation::error::LetterpressResult;
use crate::render::blend::{
    alpha_bounds, composite_blend, mask_source_in, paint_mask_color, premul_over_in_place,
    stamp_mask,
};
use crate::render::raster::{GlyphStyle, Rasterizer};
use crate::render::surface_pool::SurfacePool;
use crate::text::layout::DrawUnit;

const HALO_MAX_ALPHA: f32 = 0.5;
const CORE_ALPHA: f32 = 0.8;
const MIN_HALO_RADIUS: i32 = 2;
const MAX_HALO_RADIUS: i32 = 64;

/// Offset and scale of an image placed around a unit anchor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct ImagePlacement {
    pub(crate) offset: Vec2,
    pub(crate) scale: f64,
}

impl ImagePlacement {
    pub(crate) fn new(offset_x: f64, offset_y: f64, scale: f64) -> Self {
        Self {
            offset: Vec2::new(offset_x, offset_y),
            scale,
        }
    }

    /// Rect of `image` scaled by `scale`, centred on `center + offset`.
    pub(crate) fn rect(&self, image: &PreparedImage, center: Point) -> Rect {
        let w = f64::from(image.width) * self.scale;
        let h = f64::from(image.height) * self.scale;
        let x = center.x + self.offset.x - w / 2.0;
        let y = center.y + self.offset.y - h / 2.0;
        Rect::new(x, y, x + w, y + h)
    }
}

/// What fills a coverage mask.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Paint<'a> {
    Solid(Rgba8Premul),
    /// Canvas-sized premultiplied gradient raster.
    Gradient(&'a [u8]),
    Image {
        image: &'a PreparedImage,
        placement: ImagePlacement,
    },
}

/// Image blended over a layer inside the glyph fill silhouette.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Texture<'a> {
    pub(crate) image: &'a PreparedImage,
    pub(crate) placement: ImagePlacement,
    pub(crate) mode: BlendMode,
    pub(crate) opacity: f32,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct ShadowStyle {
    pub(crate) color: Rgba8Premul,
    pub(crate) blur: f64,
    pub(crate) offset: Vec2,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct StrokeStyle<'a> {
    pub(crate) width: f64,
    pub(crate) paint: Paint<'a>,
    pub(crate) texture: Option<Texture<'a>>,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct FillStyle<'a> {
    pub(crate) paint: Paint<'a>,
    pub(crate) texture: Option<Texture<'a>>,
}

/// Integer shifts and alphas of the shadow stamps, halo first and core last.
///
/// `blur <= 0` (or non-finite) yields the core stamp alone.
pub(crate) fn shadow_stamps(blur: f64) -> Vec<((i32, i32), f32)> {
    let mut out = Vec::new();
    if blur.is_finite() && blur > 0.0 {
        let r = (blur.ceil() as i32).clamp(MIN_HALO_RADIUS, MAX_HALO_RADIUS);
        let rf = f64::from(r);
        for dx in -r..=r {
            for dy in -r..=r {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let d = f64::from(dx).hypot(f64::from(dy));
                if d <= rf {
                    let alpha = f64::from(HALO_MAX_ALPHA) * (1.0 - d / (rf + 1.0));
                    out.push(((dx, dy), alpha as f32));
                }
            }
        }
    }
    out.push(((0, 0), CORE_ALPHA));
    out
}

/// The three layers a text pass accumulates into.
pub(crate) struct Layers {
    pub(crate) shadow: vello_cpu::Pixmap,
    pub(crate) stroke: vello_cpu::Pixmap,
    pub(crate) fill: vello_cpu::Pixmap,
}

impl Layers {
    pub(crate) fn borrow(pool: &mut SurfacePool, width: u32, height: u32) -> LetterpressResult<Self> {
        Ok(Self {
            shadow: pool.borrow(width, height)?,
            stroke: pool.borrow(width, height)?,
            fill: pool.borrow(width, height)?,
        })
    }

    pub(crate) fn release(self, pool: &mut SurfacePool) {
        pool.release(self.shadow);
        pool.release(self.stroke);
        pool.release(self.fill);
    }

    /// Source-over shadow, then stroke, then fill onto `dst`.
    pub(crate) fn composite_onto(&self, dst: &mut [u8]) -> LetterpressResult<()> {
        premul_over_in_place(dst, self.shadow.data_as_u8_slice())?;
        premul_over_in_place(dst, self.stroke.data_as_u8_slice())?;
        premul_over_in_place(dst, self.fill.data_as_u8_slice())
    }
}

/// Scratch state for painting units onto layers.
pub(crate) struct Compositor<'r> {
    raster: &'r mut Rasterizer,
    width: u32,
    height: u32,
    /// Glyph fill coverage.
    mask: vello_cpu::Pixmap,
    /// Stroke coverage.
    outline: vello_cpu::Pixmap,
    /// Painted unit before it lands on a layer.
    scratch: vello_cpu::Pixmap,
}

impl<'r> Compositor<'r> {
    pub(crate) fn new(
        raster: &'r mut Rasterizer,
        pool: &mut SurfacePool,
        width: u32,
        height: u32,
    ) -> LetterpressResult<Self> {
        Ok(Self {
            raster,
            width,
            height,
            mask: pool.borrow(width, height)?,
            outline: pool.borrow(width, height)?,
            scratch: pool.borrow(width, height)?,
        })
    }

    pub(crate) fn finish(self, pool: &mut SurfacePool) {
        pool.release(self.mask);
        pool.release(self.outline);
        pool.release(self.scratch);
    }

    /// Stamp the unit's silhouette, shifted by the shadow offset, onto `layer`.
    pub(crate) fn shadow_unit(
        &mut self,
        layer: &mut vello_cpu::Pixmap,
        unit: &DrawUnit,
        style: &ShadowStyle,
    ) -> LetterpressResult<()> {
        if style.color.a == 0 {
            return Ok(());
        }
        self.raster
            .glyph_coverage(unit, style.offset, GlyphStyle::Fill, &mut self.mask);
        let mask = self.mask.data_as_u8_slice();
        let Some(bounds) = alpha_bounds(mask, self.width) else {
            return Ok(());
        };
        for (shift, alpha) in shadow_stamps(style.blur) {
            stamp_mask(
                layer.data_as_u8_slice_mut(),
                mask,
                self.width,
                self.height,
                bounds,
                style.color,
                alpha,
                shift,
            )?;
        }
        Ok(())
    }

    /// Paint the unit's outline onto `layer`, then its stroke texture.
    pub(crate) fn stroke_unit(
        &mut self,
        layer: &mut vello_cpu::Pixmap,
        unit: &DrawUnit,
        style: &StrokeStyle<'_>,
    ) -> LetterpressResult<()> {
        if !(style.width.is_finite() && style.width > 0.0) {
            return Ok(());
        }
        self.raster.glyph_coverage(
            unit,
            Vec2::ZERO,
            GlyphStyle::Stroke { width: style.width },
            &mut self.outline,
        );
        paint_masked(
            self.raster,
            &mut self.scratch,
            &self.outline,
            &style.paint,
            unit.anchor,
        )?;
        premul_over_in_place(layer.data_as_u8_slice_mut(), self.scratch.data_as_u8_slice())?;

        if let Some(texture) = &style.texture {
            // Stroke textures follow the fill silhouette, not the outline.
            self.raster
                .glyph_coverage(unit, Vec2::ZERO, GlyphStyle::Fill, &mut self.mask);
            self.blend_texture(layer, unit.anchor, texture)?;
        }
        Ok(())
    }

    /// Paint the unit's silhouette onto `layer`, then its texture.
    pub(crate) fn fill_unit(
        &mut self,
        layer: &mut vello_cpu::Pixmap,
        unit: &DrawUnit,
        style: &FillStyle<'_>,
    ) -> LetterpressResult<()> {
        self.raster
            .glyph_coverage(unit, Vec2::ZERO, GlyphStyle::Fill, &mut self.mask);
        paint_masked(
            self.raster,
            &mut self.scratch,
            &self.mask,
            &style.paint,
            unit.anchor,
        )?;
        premul_over_in_place(layer.data_as_u8_slice_mut(), self.scratch.data_as_u8_slice())?;

        if let Some(texture) = &style.texture {
            self.blend_texture(layer, unit.anchor, texture)?;
        }
        Ok(())
    }

    /// Texture source-in the current fill mask, blended onto `layer`.
    fn blend_texture(
        &mut self,
        layer: &mut vello_cpu::Pixmap,
        anchor: Point,
        texture: &Texture<'_>,
    ) -> LetterpressResult<()> {
        let rect = texture.placement.rect(texture.image, anchor);
        self.raster
            .place_image(texture.image, rect, &mut self.scratch)?;
        mask_source_in(
            self.scratch.data_as_u8_slice_mut(),
            self.mask.data_as_u8_slice(),
        )?;
        composite_blend(
            layer.data_as_u8_slice_mut(),
            self.scratch.data_as_u8_slice(),
            texture.opacity,
            texture.mode,
        )
    }
}

/// Write `paint` restricted to `mask` into `out`, replacing its contents.
fn paint_masked(
    raster: &mut Rasterizer,
    out: &mut vello_cpu::Pixmap,
    mask: &vello_cpu::Pixmap,
    paint: &Paint<'_>,
    anchor: Point,
) -> LetterpressResult<()> {
    match paint {
        Paint::Solid(color) => {
            paint_mask_color(out.data_as_u8_slice_mut(), mask.data_as_u8_slice(), *color)
        }
        Paint::Gradient(raster_buf) => {
            let dst = out.data_as_u8_slice_mut();
            if dst.len() != raster_buf.len() {
                return Err(crate::foundation::error::LetterpressError::render(
                    "gradient raster does not match the canvas",
                ));
            }
            dst.copy_from_slice(raster_buf);
            mask_source_in(dst, mask.data_as_u8_slice())
        }
        Paint::Image { image, placement } => {
            let rect = placement.rect(image, anchor);
            raster.place_image(image, rect, out)?;
            mask_source_in(out.data_as_u8_slice_mut(), mask.data_as_u8_slice())
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
