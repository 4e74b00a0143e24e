use crate::effect::config::BlendMode;
use crate::foundation::core::Rgba8Premul;
use crate::foundation::error::{LetterpressError, LetterpressResult};
use crate::foundation::math::{add_sat_u8, mul_div255_u8, unit_to_u8};

/// Inclusive-exclusive pixel bounds `[x0, x1) × [y0, y1)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct PixelBounds {
    pub(crate) x0: u32,
    pub(crate) y0: u32,
    pub(crate) x1: u32,
    pub(crate) y1: u32,
}

fn check_pair(dst: &[u8], src: &[u8], what: &str) -> LetterpressResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(LetterpressError::render(format!(
            "{what} expects equal-length rgba8 buffers"
        )));
    }
    Ok(())
}

/// Porter-Duff source-over of premultiplied `src` onto `dst`.
pub(crate) fn premul_over_in_place(dst: &mut [u8], src: &[u8]) -> LetterpressResult<()> {
    check_pair(dst, src, "premul_over_in_place")?;
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let sa = s[3] as u16;
        if sa == 0 {
            continue;
        }
        let inv = 255u16 - sa;
        d[3] = add_sat_u8(sa as u8, mul_div255_u8(d[3] as u16, inv));
        for c in 0..3 {
            let dc = mul_div255_u8(d[c] as u16, inv);
            d[c] = add_sat_u8(s[c], dc);
        }
    }
    Ok(())
}

/// Source-over with `src` scaled by `opacity`.
pub(crate) fn premul_over_in_place_opacity(
    dst: &mut [u8],
    src: &[u8],
    opacity: f32,
) -> LetterpressResult<()> {
    check_pair(dst, src, "premul_over_in_place_opacity")?;
    let op = u16::from(unit_to_u8(opacity));
    if op == 0 {
        return Ok(());
    }
    if op == 255 {
        return premul_over_in_place(dst, src);
    }

    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let sa = mul_div255_u8(u16::from(s[3]), op);
        if sa == 0 {
            continue;
        }
        let inv = 255u16 - u16::from(sa);

        d[3] = add_sat_u8(sa, mul_div255_u8(u16::from(d[3]), inv));
        for c in 0..3 {
            let sc = mul_div255_u8(u16::from(s[c]), op);
            let dc = mul_div255_u8(u16::from(d[c]), inv);
            d[c] = add_sat_u8(sc, dc);
        }
    }
    Ok(())
}

/// Composite `src` onto `dst` with a separable blend mode at `opacity`.
pub(crate) fn composite_blend(
    dst: &mut [u8],
    src: &[u8],
    opacity: f32,
    mode: BlendMode,
) -> LetterpressResult<()> {
    check_pair(dst, src, "composite_blend")?;
    // One dispatch per call; each branch monomorphizes its kernel.
    match mode {
        BlendMode::Multiply => composite_over_rgba8_premul_blend(dst, src, opacity, |s, d| s * d),
        BlendMode::Screen => {
            composite_over_rgba8_premul_blend(dst, src, opacity, |s, d| s + d - s * d)
        }
        BlendMode::Overlay => composite_over_rgba8_premul_blend(dst, src, opacity, |s, d| {
            if d <= 0.5 {
                2.0 * s * d
            } else {
                1.0 - 2.0 * (1.0 - s) * (1.0 - d)
            }
        }),
    }
    Ok(())
}

#[inline(always)]
fn composite_over_rgba8_premul_blend<F>(dst: &mut [u8], src: &[u8], opacity: f32, blend_fn: F)
where
    F: Fn(f32, f32) -> f32,
{
    let opacity = if opacity.is_finite() {
        opacity.clamp(0.0, 1.0)
    } else {
        0.0
    };
    if opacity <= 0.0 {
        return;
    }

    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        if s[3] == 0 {
            continue;
        }
        // out_a = sa + da * (1 - sa)
        // out_p = sp * (1 - da) + dp * (1 - sa) + B(sc, dc) * sa * da
        let sa = (s[3] as f32 / 255.0) * opacity;
        let da = d[3] as f32 / 255.0;
        let out_a = (sa + da * (1.0 - sa)).clamp(0.0, 1.0);

        for c in 0..3 {
            let sp = (s[c] as f32 / 255.0) * opacity;
            let dp = d[c] as f32 / 255.0;
            let sc = if sa > 0.0 {
                (sp / sa).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let dc = if da > 0.0 {
                (dp / da).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let b = blend_fn(sc, dc).clamp(0.0, 1.0);
            let out = (sp * (1.0 - da) + dp * (1.0 - sa) + b * sa * da).clamp(0.0, 1.0);
            d[c] = (out * 255.0).round() as u8;
        }
        d[3] = (out_a * 255.0).round() as u8;
    }
}

/// Source-in: keep `src` only where `mask` has alpha.
pub(crate) fn mask_source_in(src: &mut [u8], mask: &[u8]) -> LetterpressResult<()> {
    check_pair(src, mask, "mask_source_in")?;
    for (s, m) in src.chunks_exact_mut(4).zip(mask.chunks_exact(4)) {
        let w = u16::from(m[3]);
        if w == 255 {
            continue;
        }
        for c in s.iter_mut() {
            *c = mul_div255_u8(u16::from(*c), w);
        }
    }
    Ok(())
}

/// Replace `dst` with `color` painted through the alpha of `mask`.
pub(crate) fn paint_mask_color(
    dst: &mut [u8],
    mask: &[u8],
    color: Rgba8Premul,
) -> LetterpressResult<()> {
    check_pair(dst, mask, "paint_mask_color")?;
    let c = color.to_array();
    for (d, m) in dst.chunks_exact_mut(4).zip(mask.chunks_exact(4)) {
        let w = u16::from(m[3]);
        for i in 0..4 {
            d[i] = mul_div255_u8(u16::from(c[i]), w);
        }
    }
    Ok(())
}

/// Smallest bounds containing every pixel of `mask` with non-zero alpha.
pub(crate) fn alpha_bounds(mask: &[u8], width: u32) -> Option<PixelBounds> {
    let w = width as usize;
    let mut b: Option<PixelBounds> = None;
    for (i, px) in mask.chunks_exact(4).enumerate() {
        if px[3] == 0 {
            continue;
        }
        let (x, y) = ((i % w) as u32, (i / w) as u32);
        b = Some(match b {
            None => PixelBounds {
                x0: x,
                y0: y,
                x1: x + 1,
                y1: y + 1,
            },
            Some(p) => PixelBounds {
                x0: p.x0.min(x),
                y0: p.y0.min(y),
                x1: p.x1.max(x + 1),
                y1: p.y1.max(y + 1),
            },
        });
    }
    b
}

/// Source-over `color * alpha * mask(x - dx, y - dy)` onto `dst`.
///
/// `bounds` limits the mask pixels read; pixels shifted outside the surface are dropped.
#[allow(clippy::too_many_arguments)]
pub(crate) fn stamp_mask(
    dst: &mut [u8],
    mask: &[u8],
    width: u32,
    height: u32,
    bounds: PixelBounds,
    color: Rgba8Premul,
    alpha: f32,
    (dx, dy): (i32, i32),
) -> LetterpressResult<()> {
    check_pair(dst, mask, "stamp_mask")?;
    let a = u16::from(unit_to_u8(alpha));
    if a == 0 {
        return Ok(());
    }
    let c = color.to_array().map(|v| mul_div255_u8(u16::from(v), a));
    let (w, h) = (width as i64, height as i64);

    for sy in bounds.y0..bounds.y1 {
        let ty = i64::from(sy) + i64::from(dy);
        if ty < 0 || ty >= h {
            continue;
        }
        for sx in bounds.x0..bounds.x1 {
            let tx = i64::from(sx) + i64::from(dx);
            if tx < 0 || tx >= w {
                continue;
            }
            let m = u16::from(mask[((sy as usize) * (width as usize) + sx as usize) * 4 + 3]);
            if m == 0 {
                continue;
            }
            let sa = mul_div255_u8(u16::from(c[3]), m);
            if sa == 0 {
                continue;
            }
            let idx = ((ty as usize) * (width as usize) + tx as usize) * 4;
            let d = &mut dst[idx..idx + 4];
            let inv = 255u16 - u16::from(sa);
            d[3] = add_sat_u8(sa, mul_div255_u8(u16::from(d[3]), inv));
            for i in 0..3 {
                let sc = mul_div255_u8(u16::from(c[i]), m);
                d[i] = add_sat_u8(sc, mul_div255_u8(u16::from(d[i]), inv));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/blend.rs"]
mod tests;
