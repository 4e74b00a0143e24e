use std::path::PathBuf;
use std::sync::Arc;

use super::*;
use crate::render::surface_pool::SurfacePoolOpts;
use crate::text::fonts::FontBook;
use crate::text::layout::{TextStyle, layout_text};

const W: u32 = 96;
const H: u32 = 64;

fn unit(text: &str) -> DrawUnit {
    let mut fonts = FontBook::new();
    fonts
        .register_file(
            &PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data/fonts/DejaVuSans.ttf"),
        )
        .unwrap();
    let style = TextStyle {
        family: "DejaVuSans",
        size_px: 40.0,
        letter_spacing: 0.0,
        max_width: None,
    };
    let mut l = layout_text(&mut fonts, text, &style, Point::new(48.0, 32.0)).unwrap();
    l.units.remove(0)
}

fn opaque(r: u8, g: u8, b: u8) -> Rgba8Premul {
    Rgba8Premul::from_straight_rgba(r, g, b, 255)
}

fn max_alpha(px: &vello_cpu::Pixmap) -> u8 {
    px.data_as_u8_slice()
        .chunks_exact(4)
        .map(|p| p[3])
        .max()
        .unwrap_or(0)
}

fn covered(px: &vello_cpu::Pixmap) -> usize {
    px.data_as_u8_slice()
        .chunks_exact(4)
        .filter(|p| p[3] > 0)
        .count()
}

#[test]
fn zero_blur_stamps_only_the_core() {
    assert_eq!(shadow_stamps(0.0), vec![((0, 0), 0.8)]);
    assert_eq!(shadow_stamps(-3.0), vec![((0, 0), 0.8)]);
    assert_eq!(shadow_stamps(f64::NAN), vec![((0, 0), 0.8)]);
}

#[test]
fn halo_radius_is_at_least_two() {
    let stamps = shadow_stamps(0.3);
    let r = stamps
        .iter()
        .map(|((dx, dy), _)| dx.abs().max(dy.abs()))
        .max()
        .unwrap();
    assert_eq!(r, 2);
    // (±1,0),(0,±1),(±1,±1),(±2,0),(0,±2) plus the core.
    assert_eq!(stamps.len(), 13);
    assert_eq!(stamps.last(), Some(&((0, 0), 0.8)));
}

#[test]
fn halo_radius_is_capped_at_64() {
    let r = |blur| {
        shadow_stamps(blur)
            .iter()
            .map(|((dx, dy), _)| dx.abs().max(dy.abs()))
            .max()
            .unwrap()
    };
    assert_eq!(r(50.0), 50);
    assert_eq!(r(64.0), 64);
    assert_eq!(r(1e9), 64);
}

#[test]
fn halo_alpha_falls_off_with_distance() {
    let stamps = shadow_stamps(4.0);
    let alpha = |s: (i32, i32)| stamps.iter().find(|(p, _)| *p == s).map(|(_, a)| *a);
    let near = alpha((1, 0)).unwrap();
    let far = alpha((4, 0)).unwrap();
    assert!((near - 0.5 * (1.0 - 1.0 / 5.0)).abs() < 1e-6);
    assert!((far - 0.5 * (1.0 - 4.0 / 5.0)).abs() < 1e-6);
    assert!(alpha((4, 1)).is_none());
}

#[test]
fn image_placement_centres_on_anchor_plus_offset() {
    let img = PreparedImage {
        width: 10,
        height: 4,
        rgba8_premul: Arc::new(vec![0; 160]),
    };
    let r = ImagePlacement::new(5.0, -2.0, 2.0).rect(&img, Point::new(50.0, 20.0));
    assert_eq!(r, Rect::new(45.0, 14.0, 65.0, 22.0));
}

#[test]
fn shadow_is_offset_and_uses_its_colour() {
    let mut pool = SurfacePool::new(SurfacePoolOpts::disabled());
    let mut raster = Rasterizer::new();
    let mut layers = Layers::borrow(&mut pool, W, H).unwrap();
    let u = unit("I");

    let mut c = Compositor::new(&mut raster, &mut pool, W, H).unwrap();
    c.fill_unit(
        &mut layers.fill,
        &u,
        &FillStyle {
            paint: Paint::Solid(opaque(0, 0, 0)),
            texture: None,
        },
    )
    .unwrap();
    c.shadow_unit(
        &mut layers.shadow,
        &u,
        &ShadowStyle {
            color: opaque(255, 0, 0),
            blur: 0.0,
            offset: Vec2::new(6.0, 0.0),
        },
    )
    .unwrap();
    c.finish(&mut pool);

    let fb = alpha_bounds(layers.fill.data_as_u8_slice(), W).unwrap();
    let sb = alpha_bounds(layers.shadow.data_as_u8_slice(), W).unwrap();
    assert_eq!(sb.x0, fb.x0 + 6);
    // Core stamp alone: 0.8 of opaque red.
    assert_eq!(max_alpha(&layers.shadow), 204);
    let red = layers
        .shadow
        .data_as_u8_slice()
        .chunks_exact(4)
        .find(|p| p[3] == 204)
        .unwrap();
    assert_eq!(red, &[204, 0, 0, 204]);
    layers.release(&mut pool);
}

#[test]
fn blurred_shadow_spreads_past_the_sharp_one() {
    let mut pool = SurfacePool::new(SurfacePoolOpts::default());
    let mut raster = Rasterizer::new();
    let u = unit("I");
    let style = |blur| ShadowStyle {
        color: opaque(0, 0, 0),
        blur,
        offset: Vec2::ZERO,
    };

    let mut sharp = pool.borrow(W, H).unwrap();
    let mut soft = pool.borrow(W, H).unwrap();
    let mut c = Compositor::new(&mut raster, &mut pool, W, H).unwrap();
    c.shadow_unit(&mut sharp, &u, &style(0.0)).unwrap();
    c.shadow_unit(&mut soft, &u, &style(3.0)).unwrap();
    c.finish(&mut pool);

    assert!(covered(&soft) > covered(&sharp));
    assert!(max_alpha(&soft) > max_alpha(&sharp));
}

#[test]
fn stroke_surrounds_the_fill() {
    let mut pool = SurfacePool::new(SurfacePoolOpts::default());
    let mut raster = Rasterizer::new();
    let mut layers = Layers::borrow(&mut pool, W, H).unwrap();
    let u = unit("O");

    let mut c = Compositor::new(&mut raster, &mut pool, W, H).unwrap();
    c.stroke_unit(
        &mut layers.stroke,
        &u,
        &StrokeStyle {
            width: 4.0,
            paint: Paint::Solid(opaque(0, 0, 255)),
            texture: None,
        },
    )
    .unwrap();
    c.fill_unit(
        &mut layers.fill,
        &u,
        &FillStyle {
            paint: Paint::Solid(opaque(0, 255, 0)),
            texture: None,
        },
    )
    .unwrap();
    c.finish(&mut pool);

    let fb = alpha_bounds(layers.fill.data_as_u8_slice(), W).unwrap();
    let sb = alpha_bounds(layers.stroke.data_as_u8_slice(), W).unwrap();
    assert!(sb.x0 < fb.x0 && sb.x1 > fb.x1);

    let mut dst = vec![0u8; (W * H * 4) as usize];
    layers.composite_onto(&mut dst).unwrap();
    let blue = dst.chunks_exact(4).filter(|p| *p == [0, 0, 255, 255]).count();
    let green = dst.chunks_exact(4).filter(|p| *p == [0, 255, 0, 255]).count();
    assert!(blue > 0 && green > 0);
    layers.release(&mut pool);
}

#[test]
fn zero_width_stroke_draws_nothing() {
    let mut pool = SurfacePool::new(SurfacePoolOpts::default());
    let mut raster = Rasterizer::new();
    let mut layer = pool.borrow(W, H).unwrap();
    let mut c = Compositor::new(&mut raster, &mut pool, W, H).unwrap();
    c.stroke_unit(
        &mut layer,
        &unit("O"),
        &StrokeStyle {
            width: 0.0,
            paint: Paint::Solid(opaque(0, 0, 0)),
            texture: None,
        },
    )
    .unwrap();
    c.finish(&mut pool);
    assert_eq!(covered(&layer), 0);
}

#[test]
fn image_fill_stays_inside_the_silhouette() {
    let mut pool = SurfacePool::new(SurfacePoolOpts::default());
    let mut raster = Rasterizer::new();
    let u = unit("H");
    let img = PreparedImage {
        width: 4,
        height: 4,
        rgba8_premul: Arc::new([200u8, 100, 0, 255].repeat(16)),
    };

    let mut solid = pool.borrow(W, H).unwrap();
    let mut textured = pool.borrow(W, H).unwrap();
    let mut c = Compositor::new(&mut raster, &mut pool, W, H).unwrap();
    c.fill_unit(
        &mut solid,
        &u,
        &FillStyle {
            paint: Paint::Solid(opaque(0, 0, 0)),
            texture: None,
        },
    )
    .unwrap();
    c.fill_unit(
        &mut textured,
        &u,
        &FillStyle {
            paint: Paint::Image {
                image: &img,
                // 4px image scaled to cover the whole canvas.
                placement: ImagePlacement::new(0.0, 0.0, 40.0),
            },
            texture: None,
        },
    )
    .unwrap();
    c.finish(&mut pool);

    assert_eq!(covered(&solid), covered(&textured));
    let px = textured
        .data_as_u8_slice()
        .chunks_exact(4)
        .find(|p| p[3] == 255)
        .unwrap();
    assert_eq!(px, &[200, 100, 0, 255]);
}

#[test]
fn multiply_texture_darkens_only_covered_pixels() {
    let mut pool = SurfacePool::new(SurfacePoolOpts::default());
    let mut raster = Rasterizer::new();
    let u = unit("H");
    let tex = PreparedImage {
        width: 2,
        height: 2,
        rgba8_premul: Arc::new([128u8, 128, 128, 255].repeat(4)),
    };

    let mut layer = pool.borrow(W, H).unwrap();
    let mut c = Compositor::new(&mut raster, &mut pool, W, H).unwrap();
    c.fill_unit(
        &mut layer,
        &u,
        &FillStyle {
            paint: Paint::Solid(opaque(255, 255, 255)),
            texture: Some(Texture {
                image: &tex,
                placement: ImagePlacement::new(0.0, 0.0, 100.0),
                mode: BlendMode::Multiply,
                opacity: 1.0,
            }),
        },
    )
    .unwrap();
    c.finish(&mut pool);

    let data = layer.data_as_u8_slice();
    assert!(data.chunks_exact(4).any(|p| p == [128, 128, 128, 255]));
    assert!(data.chunks_exact(4).all(|p| p[3] > 0 || p == [0, 0, 0, 0]));
    assert_eq!(data[..4], [0, 0, 0, 0]);
}

#[test]
fn gradient_raster_must_match_the_canvas() {
    let mut pool = SurfacePool::new(SurfacePoolOpts::default());
    let mut raster = Rasterizer::new();
    let mut layer = pool.borrow(W, H).unwrap();
    let short = vec![0u8; 16];
    let mut c = Compositor::new(&mut raster, &mut pool, W, H).unwrap();
    let err = c
        .fill_unit(
            &mut layer,
            &unit("H"),
            &FillStyle {
                paint: Paint::Gradient(&short),
                texture: None,
            },
        )
        .unwrap_err();
    assert!(matches!(
        err,
        crate::foundation::error::LetterpressError::Render(_)
    ));
}

fn stroke_o(paint: Paint<'_>, texture: Option<Texture<'_>>) -> Vec<u8> {
    let mut pool = SurfacePool::new(SurfacePoolOpts::default());
    let mut raster = Rasterizer::new();
    let mut layer = pool.borrow(W, H).unwrap();
    let mut c = Compositor::new(&mut raster, &mut pool, W, H).unwrap();
    c.stroke_unit(
        &mut layer,
        &unit("O"),
        &StrokeStyle {
            width: 6.0,
            paint,
            texture,
        },
    )
    .unwrap();
    c.finish(&mut pool);
    layer.data_as_u8_slice().to_vec()
}

fn fill_o() -> Vec<u8> {
    let mut pool = SurfacePool::new(SurfacePoolOpts::default());
    let mut raster = Rasterizer::new();
    let mut layer = pool.borrow(W, H).unwrap();
    let mut c = Compositor::new(&mut raster, &mut pool, W, H).unwrap();
    c.fill_unit(
        &mut layer,
        &unit("O"),
        &FillStyle {
            paint: Paint::Solid(opaque(0, 0, 0)),
            texture: None,
        },
    )
    .unwrap();
    c.finish(&mut pool);
    layer.data_as_u8_slice().to_vec()
}

#[test]
fn stroke_texture_follows_the_fill_silhouette_on_the_stroke_layer() {
    let grey = PreparedImage {
        width: 2,
        height: 2,
        rgba8_premul: Arc::new([128u8, 128, 128, 255].repeat(4)),
    };
    let white = Paint::Solid(opaque(255, 255, 255));
    let plain = stroke_o(white, None);
    let textured = stroke_o(
        white,
        Some(Texture {
            image: &grey,
            placement: ImagePlacement::new(0.0, 0.0, 100.0),
            mode: BlendMode::Multiply,
            opacity: 1.0,
        }),
    );
    let silhouette = fill_o();

    let mut changed = 0;
    let mut outer_untouched = 0;
    for ((p, t), f) in plain
        .chunks_exact(4)
        .zip(textured.chunks_exact(4))
        .zip(silhouette.chunks_exact(4))
    {
        if p != t {
            changed += 1;
            assert!(f[3] > 0, "texture leaked outside the fill silhouette");
        } else if p[3] > 0 && f[3] == 0 {
            outer_untouched += 1;
        }
    }
    assert!(changed > 0);
    // The outer half of the outline keeps the plain stroke colour.
    assert!(outer_untouched > 0);
    // Where outline and silhouette overlap, multiply darkens white to the texture grey.
    assert!(textured.chunks_exact(4).any(|p| p == [128, 128, 128, 255]));
}

#[test]
fn stroke_gradient_paint_samples_the_canvas_raster() {
    let mut gradient = Vec::with_capacity((W * H * 4) as usize);
    for _y in 0..H {
        for x in 0..W {
            gradient.extend_from_slice(if x < W / 2 {
                &[255, 0, 0, 255]
            } else {
                &[0, 0, 255, 255]
            });
        }
    }
    let out = stroke_o(Paint::Gradient(&gradient), None);

    let mut seen = (false, false);
    for (i, p) in out.chunks_exact(4).enumerate() {
        if p[3] != 255 {
            continue;
        }
        let x = i as u32 % W;
        if x < W / 2 {
            assert_eq!(p, [255, 0, 0, 255]);
            seen.0 = true;
        } else {
            assert_eq!(p, [0, 0, 255, 255]);
            seen.1 = true;
        }
    }
    assert_eq!(seen, (true, true));
}

#[test]
fn stroke_image_paint_is_clipped_to_the_outline() {
    let img = PreparedImage {
        width: 4,
        height: 4,
        rgba8_premul: Arc::new([200u8, 100, 0, 255].repeat(16)),
    };
    let solid = stroke_o(Paint::Solid(opaque(0, 0, 0)), None);
    let imaged = stroke_o(
        Paint::Image {
            image: &img,
            placement: ImagePlacement::new(0.0, 0.0, 40.0),
        },
        None,
    );

    let alphas = |buf: &[u8]| buf.chunks_exact(4).map(|p| p[3]).collect::<Vec<_>>();
    assert_eq!(alphas(&solid), alphas(&imaged));
    assert!(imaged.chunks_exact(4).any(|p| p == [200, 100, 0, 255]));
}
