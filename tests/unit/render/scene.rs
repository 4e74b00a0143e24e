use std::path::PathBuf;
use std::sync::Arc;

use super::*;
use crate::effect::color::Color;
use crate::effect::config::{BackgroundConfig, BlockStroke, ImageFillConfig, TextBlock, TextMode};
use crate::text::fonts::FontBook;

fn fonts() -> FontBook {
    let mut b = FontBook::new();
    b.register_file(
        &PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data/fonts/DejaVuSans.ttf"),
    )
    .unwrap();
    b
}

fn solid_image(rgba: [u8; 4], w: u32, h: u32) -> PreparedImage {
    PreparedImage {
        width: w,
        height: h,
        rgba8_premul: Arc::new(rgba.repeat((w * h) as usize)),
    }
}

fn count(frame: &FrameRGBA, px: [u8; 4]) -> usize {
    frame.data.chunks_exact(4).filter(|p| *p == px).count()
}

#[test]
fn empty_text_renders_a_transparent_canvas() {
    let cfg = EffectConfig::default().with_text("").with_grid(5, 3);
    let frame = render_effect(
        &cfg,
        &PreparedAssets::empty(),
        &mut fonts(),
        &RenderOpts::default(),
    )
    .unwrap();
    assert_eq!((frame.width, frame.height), (120, 72));
    assert!(frame.premultiplied);
    assert!(frame.is_transparent());
}

#[test]
fn clear_colour_fills_the_canvas() {
    let cfg = EffectConfig::default().with_text("").with_grid(2, 2);
    let opts = RenderOpts::default().with_clear_rgba([255, 255, 255, 255]);
    let frame = render_effect(&cfg, &PreparedAssets::empty(), &mut fonts(), &opts).unwrap();
    assert_eq!(count(&frame, [255, 255, 255, 255]), 48 * 48);
}

#[test]
fn surface_must_match_the_canvas() {
    let cfg = EffectConfig::default().with_grid(4, 4);
    let mut surface = Surface::new(10, 10).unwrap();
    let mut renderer = Renderer::default();
    let err = render_effect_into(
        &cfg,
        &PreparedAssets::empty(),
        &mut fonts(),
        &mut renderer,
        &mut surface,
    )
    .unwrap_err();
    assert!(matches!(err, LetterpressError::Validation(_)));
}

#[test]
fn solid_text_lands_near_the_centre() {
    let cfg = EffectConfig::default()
        .with_text("Hi")
        .with_text_color(Color::rgb(255, 0, 0))
        .with_grid(10, 5);
    let frame = render_effect(
        &cfg,
        &PreparedAssets::empty(),
        &mut fonts(),
        &RenderOpts::default(),
    )
    .unwrap();
    assert!(count(&frame, [255, 0, 0, 255]) > 50);
    assert_eq!(frame.pixel(0, 0), Some([0, 0, 0, 0]));
    assert_eq!(frame.pixel(239, 119), Some([0, 0, 0, 0]));
}

#[test]
fn unusable_font_size_draws_nothing() {
    let cfg = EffectConfig::default()
        .with_text("Hi")
        .with_typography("sans-serif", 0.0, 0.0)
        .with_grid(4, 4);
    let frame = render_effect(
        &cfg,
        &PreparedAssets::empty(),
        &mut fonts(),
        &RenderOpts::default(),
    )
    .unwrap();
    assert!(frame.is_transparent());
}

#[test]
fn background_is_drawn_at_its_opacity() {
    let cfg = EffectConfig::default()
        .with_text("")
        .with_grid(2, 2)
        .with_background(BackgroundConfig {
            enabled: true,
            image_url: Some("bg.png".into()),
            scale: 100.0,
            opacity: 0.5,
            ..BackgroundConfig::default()
        });
    let mut assets = PreparedAssets::empty();
    assets.insert("bg.png", solid_image([0, 0, 255, 255], 2, 2));

    let frame = render_effect(&cfg, &assets, &mut fonts(), &RenderOpts::default()).unwrap();
    assert_eq!(frame.pixel(24, 24), Some([0, 0, 128, 128]));
}

#[test]
fn missing_background_is_skipped() {
    let cfg = EffectConfig::default()
        .with_text("")
        .with_grid(2, 2)
        .with_background(BackgroundConfig {
            enabled: true,
            image_url: Some("bg.png".into()),
            ..BackgroundConfig::default()
        });
    let frame = render_effect(
        &cfg,
        &PreparedAssets::empty(),
        &mut fonts(),
        &RenderOpts::default(),
    )
    .unwrap();
    assert!(frame.is_transparent());
}

#[test]
fn unloaded_image_fill_falls_back_to_text_colour() {
    let cfg = EffectConfig::default()
        .with_text("H")
        .with_text_color(Color::rgb(0, 200, 0))
        .with_grid(6, 4)
        .with_image_fill(ImageFillConfig {
            enabled: true,
            image_url: Some("fill.png".into()),
            ..ImageFillConfig::default()
        });
    let frame = render_effect(
        &cfg,
        &PreparedAssets::empty(),
        &mut fonts(),
        &RenderOpts::default(),
    )
    .unwrap();
    assert!(count(&frame, [0, 200, 0, 255]) > 20);
}

#[test]
fn loaded_image_fill_replaces_the_text_colour() {
    let cfg = EffectConfig::default()
        .with_text("H")
        .with_grid(6, 4)
        .with_image_fill(ImageFillConfig {
            enabled: true,
            image_url: Some("fill.png".into()),
            scale: 100.0,
            ..ImageFillConfig::default()
        });
    let mut assets = PreparedAssets::empty();
    assets.insert("fill.png", solid_image([250, 0, 250, 255], 2, 2));

    let frame = render_effect(&cfg, &assets, &mut fonts(), &RenderOpts::default()).unwrap();
    assert!(count(&frame, [250, 0, 250, 255]) > 20);
    assert_eq!(count(&frame, [0, 0, 0, 255]), 0);
}

#[test]
fn whole_string_is_squeezed_into_the_canvas() {
    let cfg = EffectConfig::default()
        .with_text("WWWWWWWWWWWWWWWWWWWWWWWW")
        .with_typography("sans-serif", 60.0, 0.0)
        .with_grid(10, 4);
    let frame = render_effect(
        &cfg,
        &PreparedAssets::empty(),
        &mut fonts(),
        &RenderOpts::default(),
    )
    .unwrap();
    let covered_columns: Vec<u32> = (0..frame.width)
        .filter(|&x| (0..frame.height).any(|y| frame.pixel(x, y).is_some_and(|p| p[3] > 0)))
        .collect();
    let first = *covered_columns.first().unwrap();
    let last = *covered_columns.last().unwrap();
    assert!(first >= 8, "first={first}");
    assert!(last <= 231, "last={last}");
}

#[test]
fn multi_mode_fills_sit_above_every_stroke() {
    let mut top = TextBlock::new("a", "I");
    top.font_size = 48.0;
    top.text_color = Color::rgb(255, 0, 0);
    let mut under = TextBlock::new("b", "I");
    under.font_size = 48.0;
    under.text_color = Color::TRANSPARENT;
    under.stroke = BlockStroke {
        enabled: true,
        width: 16.0,
        color: Color::rgb(0, 0, 255),
    };
    let cfg = EffectConfig::default()
        .with_text_mode(TextMode::Multiple)
        .with_preview_grid(5, 5)
        .add_block(top)
        .add_block(under);

    let frame = render_effect(
        &cfg,
        &PreparedAssets::empty(),
        &mut fonts(),
        &RenderOpts::default(),
    )
    .unwrap();
    assert_eq!((frame.width, frame.height), (120, 120));
    assert!(count(&frame, [255, 0, 0, 255]) > 20);
    assert!(count(&frame, [0, 0, 255, 255]) > 20);
}

#[test]
fn renderer_output_is_repeatable_and_reuses_scratch() {
    let cfg = EffectConfig::default()
        .with_text("Ab")
        .with_grid(8, 4)
        .with_shadow(crate::effect::config::ShadowConfig {
            enabled: true,
            ..Default::default()
        });
    let assets = PreparedAssets::empty();
    let mut book = fonts();
    let mut renderer = Renderer::default();

    let a = renderer.render(&cfg, &assets, &mut book).unwrap();
    let b = renderer.render(&cfg, &assets, &mut book).unwrap();
    assert_eq!(a, b);
    assert!(renderer.pool_stats().reused_surfaces > 0);
}

fn stroked(stroke: crate::effect::config::StrokeConfig) -> EffectConfig {
    EffectConfig::default()
        .with_text("O")
        .with_text_color(Color::TRANSPARENT)
        .with_typography("sans-serif", 48.0, 0.0)
        .with_grid(6, 4)
        .with_stroke(stroke)
}

fn gradient_stroke() -> crate::effect::config::StrokeConfig {
    crate::effect::config::StrokeConfig {
        enabled: true,
        width: 6.0,
        color: Color::WHITE,
        use_gradient: true,
        gradient: Some(crate::effect::gradient::GradientSpec::linear(
            vec![Color::rgb(255, 0, 0), Color::rgb(0, 0, 255)],
            0.0,
        )),
        ..Default::default()
    }
}

#[test]
fn stroke_gradient_replaces_the_stroke_colour() {
    let frame = render_effect(
        &stroked(gradient_stroke()),
        &PreparedAssets::empty(),
        &mut fonts(),
        &RenderOpts::default(),
    )
    .unwrap();
    assert!(!frame.is_transparent());
    assert_eq!(count(&frame, [255, 255, 255, 255]), 0);
}

#[test]
fn unloaded_stroke_image_falls_back_to_the_gradient() {
    let with_image = crate::effect::config::StrokeConfig {
        use_image: true,
        image_url: Some("stroke.png".into()),
        scale: 100.0,
        ..gradient_stroke()
    };
    let render = |stroke, assets: &PreparedAssets| {
        render_effect(&stroked(stroke), assets, &mut fonts(), &RenderOpts::default()).unwrap()
    };

    let gradient_only = render(gradient_stroke(), &PreparedAssets::empty());
    let fallback = render(with_image.clone(), &PreparedAssets::empty());
    assert_eq!(fallback, gradient_only);

    // Once loaded, the image wins over the gradient.
    let mut assets = PreparedAssets::empty();
    assets.insert("stroke.png", solid_image([0, 160, 0, 255], 2, 2));
    let imaged = render(with_image, &assets);
    assert!(count(&imaged, [0, 160, 0, 255]) > 20);
    assert_ne!(imaged, gradient_only);
}
