use super::*;

#[test]
fn canvas_rejects_zero_and_oversized_edges() {
    assert!(Canvas::new(0, 10).is_err());
    assert!(Canvas::new(10, 0).is_err());
    assert!(Canvas::new(Canvas::MAX_EDGE + 1, 10).is_err());
    let c = Canvas::new(48, 24).unwrap();
    assert_eq!(c.rgba_len(), 48 * 24 * 4);
    assert_eq!(c.center(), Point::new(24.0, 12.0));
}

#[test]
fn premultiply_rounds_to_nearest() {
    let p = Rgba8Premul::from_straight_rgba(255, 128, 0, 128);
    assert_eq!(p.to_array(), [128, 64, 0, 128]);
    assert_eq!(
        Rgba8Premul::from_straight_rgba(10, 20, 30, 0),
        Rgba8Premul::transparent()
    );
}
