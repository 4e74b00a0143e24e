use std::collections::HashMap;
use std::sync::Arc;

use crate::assets::store::PreparedImage;
use crate::foundation::core::{Affine, Rect, Vec2};
use crate::foundation::error::{LetterpressError, LetterpressResult};
use crate::text::layout::DrawUnit;

/// How glyph outlines are turned into coverage.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum GlyphStyle {
    /// Filled glyph interiors.
    Fill,
    /// Outline stroke with round joins.
    Stroke {
        /// Stroke width in pixels.
        width: f64,
    },
}

/// Thin wrapper over a cached `vello_cpu::RenderContext`.
///
/// Every call renders onto a cleared target, so the output is pure coverage or a placed image;
/// all compositing happens in the pixel kernels.
pub(crate) struct Rasterizer {
    ctx: Option<vello_cpu::RenderContext>,
    images: HashMap<usize, vello_cpu::Image>,
}

impl Default for Rasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Rasterizer {
    pub(crate) fn new() -> Self {
        Self {
            ctx: None,
            images: HashMap::new(),
        }
    }

    /// Drop image paints cached for the previous frame.
    pub(crate) fn begin_frame(&mut self) {
        self.images.clear();
    }

    fn render_with(
        &mut self,
        dst: &mut vello_cpu::Pixmap,
        draw: impl FnOnce(&mut vello_cpu::RenderContext),
    ) {
        let (width, height) = (dst.width(), dst.height());
        let mut ctx = match self.ctx.take() {
            Some(ctx) if ctx.width() == width && ctx.height() == height => ctx,
            _ => vello_cpu::RenderContext::new(width, height),
        };
        ctx.reset();
        draw(&mut ctx);
        ctx.flush();
        ctx.render_to_pixmap(dst);
        self.ctx = Some(ctx);
    }

    /// Render the coverage of `unit` (shifted by `offset`) as opaque white into `dst`.
    pub(crate) fn glyph_coverage(
        &mut self,
        unit: &DrawUnit,
        offset: Vec2,
        style: GlyphStyle,
        dst: &mut vello_cpu::Pixmap,
    ) {
        clear_pixmap_to_transparent(dst);
        let shaped = &unit.shaped;
        let Some(font) = shaped.font.as_ref() else {
            return;
        };
        if shaped.glyphs.is_empty() {
            return;
        }

        let tr = Affine::translate(unit.origin.to_vec2() + offset)
            * Affine::scale_non_uniform(unit.scale_x, 1.0);
        let glyphs = shaped.glyphs.iter().map(|g| vello_cpu::Glyph {
            id: g.id,
            x: g.x,
            y: g.y,
        });
        let size = shaped.size_px;

        self.render_with(dst, |ctx| {
            ctx.set_transform(affine_to_cpu(tr));
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(255, 255, 255, 255));
            match style {
                GlyphStyle::Fill => {
                    ctx.glyph_run(font).font_size(size).fill_glyphs(glyphs);
                }
                GlyphStyle::Stroke { width } => {
                    ctx.set_stroke(
                        vello_cpu::kurbo::Stroke::new(width)
                            .with_join(vello_cpu::kurbo::Join::Round),
                    );
                    ctx.glyph_run(font).font_size(size).stroke_glyphs(glyphs);
                }
            }
        });
    }

    /// Draw `image` stretched into `rect` with bilinear sampling; `dst` is cleared first.
    pub(crate) fn place_image(
        &mut self,
        image: &PreparedImage,
        rect: Rect,
        dst: &mut vello_cpu::Pixmap,
    ) -> LetterpressResult<()> {
        clear_pixmap_to_transparent(dst);
        let (w, h) = (rect.width(), rect.height());
        if image.width == 0 || image.height == 0 || !(w > 0.0 && h > 0.0) || !rect.is_finite() {
            return Ok(());
        }

        let paint = self.image_paint(image)?;
        let iw = f64::from(image.width);
        let ih = f64::from(image.height);
        let tr = Affine::translate((rect.x0, rect.y0)) * Affine::scale_non_uniform(w / iw, h / ih);

        self.render_with(dst, |ctx| {
            ctx.set_transform(affine_to_cpu(tr));
            ctx.set_paint(paint);
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, iw, ih));
        });
        Ok(())
    }

    fn image_paint(&mut self, image: &PreparedImage) -> LetterpressResult<vello_cpu::Image> {
        let key = Arc::as_ptr(&image.rgba8_premul) as usize;
        if let Some(p) = self.images.get(&key) {
            return Ok(p.clone());
        }
        let pixmap = pixmap_from_premul_bytes(&image.rgba8_premul, image.width, image.height)?;
        let paint = vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        };
        self.images.insert(key, paint.clone());
        Ok(paint)
    }
}

pub(crate) fn clear_pixmap_to_transparent(pixmap: &mut vello_cpu::Pixmap) {
    pixmap.data_as_u8_slice_mut().fill(0);
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn pixmap_from_premul_bytes(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> LetterpressResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| LetterpressError::render("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| LetterpressError::render("image height exceeds u16"))?;
    if bytes.len()
        != (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4)
    {
        return Err(LetterpressError::render("image byte len mismatch"));
    }
    let pixels = bytes
        .chunks_exact(4)
        .map(|px| vello_cpu::peniko::color::PremulRgba8::from_u8_array([px[0], px[1], px[2], px[3]]))
        .collect::<Vec<_>>();
    let has_opacities = bytes.chunks_exact(4).any(|px| px[3] != 255);
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        has_opacities,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/render/raster.rs"]
mod tests;
