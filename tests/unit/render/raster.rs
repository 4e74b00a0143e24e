use std::path::PathBuf;

use super::*;
use crate::foundation::core::Point;
use crate::render::blend::alpha_bounds;
use crate::text::fonts::FontBook;
use crate::text::layout::{TextStyle, layout_text};

fn book() -> FontBook {
    let mut b = FontBook::new();
    b.register_file(
        &PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data/fonts/DejaVuSans.ttf"),
    )
    .unwrap();
    b
}

fn unit(text: &str, size: f64, at: Point) -> DrawUnit {
    let mut fonts = book();
    let style = TextStyle {
        family: "DejaVuSans",
        size_px: size,
        letter_spacing: 0.0,
        max_width: None,
    };
    let mut l = layout_text(&mut fonts, text, &style, at).unwrap();
    l.units.remove(0)
}

#[test]
fn fill_coverage_is_white_and_centred() {
    let mut r = Rasterizer::new();
    let mut px = vello_cpu::Pixmap::new(120, 60);
    let u = unit("HH", 32.0, Point::new(60.0, 30.0));
    r.glyph_coverage(&u, Vec2::ZERO, GlyphStyle::Fill, &mut px);

    let b = alpha_bounds(px.data_as_u8_slice(), 120).expect("glyphs cover pixels");
    let cx = (b.x0 + b.x1) as f64 / 2.0;
    let cy = (b.y0 + b.y1) as f64 / 2.0;
    assert!((cx - 60.0).abs() < 4.0, "cx={cx}");
    assert!((cy - 30.0).abs() < 6.0, "cy={cy}");

    let solid = px
        .data_as_u8_slice()
        .chunks_exact(4)
        .find(|p| p[3] == 255)
        .expect("an interior pixel");
    assert_eq!(solid, &[255, 255, 255, 255]);
}

#[test]
fn offset_shifts_coverage() {
    let mut r = Rasterizer::new();
    let u = unit("H", 24.0, Point::new(30.0, 30.0));
    let mut a = vello_cpu::Pixmap::new(80, 80);
    let mut b = vello_cpu::Pixmap::new(80, 80);
    r.glyph_coverage(&u, Vec2::ZERO, GlyphStyle::Fill, &mut a);
    r.glyph_coverage(&u, Vec2::new(10.0, 5.0), GlyphStyle::Fill, &mut b);

    let ba = alpha_bounds(a.data_as_u8_slice(), 80).unwrap();
    let bb = alpha_bounds(b.data_as_u8_slice(), 80).unwrap();
    assert_eq!(bb.x0, ba.x0 + 10);
    assert_eq!(bb.y0, ba.y0 + 5);
}

#[test]
fn stroke_coverage_extends_past_fill() {
    let mut r = Rasterizer::new();
    let u = unit("O", 40.0, Point::new(40.0, 40.0));
    let mut fill = vello_cpu::Pixmap::new(80, 80);
    let mut stroke = vello_cpu::Pixmap::new(80, 80);
    r.glyph_coverage(&u, Vec2::ZERO, GlyphStyle::Fill, &mut fill);
    r.glyph_coverage(&u, Vec2::ZERO, GlyphStyle::Stroke { width: 6.0 }, &mut stroke);

    let bf = alpha_bounds(fill.data_as_u8_slice(), 80).unwrap();
    let bs = alpha_bounds(stroke.data_as_u8_slice(), 80).unwrap();
    assert!(bs.x0 < bf.x0);
    assert!(bs.x1 > bf.x1);
}

#[test]
fn blank_unit_leaves_target_cleared() {
    let mut r = Rasterizer::new();
    let mut px = vello_cpu::Pixmap::new(16, 16);
    px.data_as_u8_slice_mut().fill(9);
    let u = DrawUnit {
        anchor: Point::new(8.0, 8.0),
        origin: Point::new(8.0, 8.0),
        scale_x: 1.0,
        shaped: Arc::new(crate::text::layout::ShapedText::empty(12.0)),
    };
    r.glyph_coverage(&u, Vec2::ZERO, GlyphStyle::Fill, &mut px);
    assert!(px.data_as_u8_slice().iter().all(|&b| b == 0));
}

#[test]
fn place_image_fills_the_target_rect() {
    let img = PreparedImage {
        width: 2,
        height: 2,
        rgba8_premul: Arc::new([10u8, 20, 30, 255].repeat(4)),
    };
    let mut r = Rasterizer::new();
    let mut px = vello_cpu::Pixmap::new(20, 20);
    r.place_image(&img, Rect::new(4.0, 6.0, 12.0, 14.0), &mut px)
        .unwrap();

    let data = px.data_as_u8_slice();
    let at = |x: usize, y: usize| &data[(y * 20 + x) * 4..(y * 20 + x) * 4 + 4];
    assert_eq!(at(8, 10), &[10, 20, 30, 255]);
    assert_eq!(at(1, 1)[3], 0);
    assert_eq!(at(15, 10)[3], 0);
    let b = alpha_bounds(data, 20).unwrap();
    assert_eq!((b.x0, b.y0, b.x1, b.y1), (4, 6, 12, 14));
}

#[test]
fn degenerate_rect_is_a_no_op() {
    let img = PreparedImage {
        width: 1,
        height: 1,
        rgba8_premul: Arc::new(vec![255; 4]),
    };
    let mut r = Rasterizer::new();
    let mut px = vello_cpu::Pixmap::new(8, 8);
    r.place_image(&img, Rect::new(2.0, 2.0, 2.0, 6.0), &mut px)
        .unwrap();
    assert!(px.data_as_u8_slice().iter().all(|&b| b == 0));
}

#[test]
fn mismatched_image_bytes_are_rejected() {
    let err = pixmap_from_premul_bytes(&[0u8; 12], 2, 2).unwrap_err();
    assert!(matches!(err, LetterpressError::Render(_)));
}
