use image::Rgba;

use super::*;
use crate::geometry::grid::Ratio;

fn opaque(w: u32, h: u32) -> RgbaImage {
    RgbaImage::from_pixel(w, h, Rgba([10, 120, 200, 255]))
}

fn opaque_bounds(img: &RgbaImage) -> (u32, u32, u32, u32) {
    let mut b = (u32::MAX, u32::MAX, 0, 0);
    for (x, y, p) in img.enumerate_pixels() {
        if p[3] > 0 {
            b = (b.0.min(x), b.1.min(y), b.2.max(x + 1), b.3.max(y + 1));
        }
    }
    b
}

#[test]
fn square_centres_the_source_unscaled() {
    let out = resize_square(&opaque(40, 20)).unwrap();
    assert_eq!(out.dimensions(), (40, 40));
    assert_eq!(opaque_bounds(&out), (0, 10, 40, 30));
    assert_eq!(out.get_pixel(0, 0)[3], 0);
    assert_eq!(*out.get_pixel(20, 20), Rgba([10, 120, 200, 255]));
}

#[test]
fn square_of_a_square_is_a_copy() {
    let src = opaque(16, 16);
    assert_eq!(resize_square(&src).unwrap(), src);
}

#[test]
fn wide_source_spans_the_width_and_sits_on_the_bottom() {
    let out = resize_to_box(&opaque(200, 100), 480, 720).unwrap();
    assert_eq!(out.dimensions(), (480, 720));
    assert_eq!(opaque_bounds(&out), (0, 480, 480, 720));
}

#[test]
fn tall_source_spans_the_height_and_is_centred() {
    let out = resize_to_box(&opaque(100, 400), 480, 720).unwrap();
    assert_eq!(opaque_bounds(&out), (150, 0, 330, 720));
}

#[test]
fn ratio_target_uses_the_grid_box() {
    let out = resize(&opaque(30, 30), ResizeTarget::Ratio(Ratio::new(2, 1).unwrap())).unwrap();
    assert_eq!(out.dimensions(), (48, 24));
    assert_eq!(opaque_bounds(&out), (12, 0, 36, 24));
}

#[test]
fn fixed_target_is_480_by_720() {
    let out = resize(&opaque(2, 3), ResizeTarget::Fixed480x720).unwrap();
    assert_eq!(out.dimensions(), (FIXED_BOX_WIDTH, FIXED_BOX_HEIGHT));
    assert_eq!(opaque_bounds(&out), (0, 0, 480, 720));
}

#[test]
fn empty_source_gives_a_transparent_box() {
    let out = resize_to_box(&RgbaImage::new(0, 0), 24, 24).unwrap();
    assert!(out.pixels().all(|p| p[3] == 0));
}

#[test]
fn oversized_box_is_refused_before_allocating() {
    let err = resize_to_box(&opaque(2, 2), u32::MAX, 24).unwrap_err();
    assert!(matches!(err, crate::LetterpressError::Validation(_)), "{err}");
    assert!(err.to_string().contains("pixel limit"), "{err}");

    // The largest accepted ratio term still fits along one axis.
    let out = resize(
        &opaque(2, 2),
        ResizeTarget::Ratio(Ratio::new(crate::MAX_CUSTOM_RATIO_TERM, 1).unwrap()),
    )
    .unwrap();
    assert_eq!(out.dimensions(), (24_000, 24));
}

#[test]
fn oversized_square_is_refused() {
    let strip = RgbaImage::new(9_000, 1);
    assert!(resize_square(&strip).is_err());
}
