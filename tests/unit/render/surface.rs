use super::*;

#[test]
fn new_surface_is_transparent_and_sized() {
    let s = Surface::new(5, 3).unwrap();
    assert_eq!((s.width(), s.height()), (5, 3));
    assert_eq!(s.data().len(), 5 * 3 * 4);
    assert!(s.data().iter().all(|v| *v == 0));
}

#[test]
fn clear_premultiplies() {
    let mut s = Surface::new(2, 1).unwrap();
    s.clear(Some([255, 0, 0, 128]));
    assert_eq!(&s.data()[..4], &[128, 0, 0, 128]);
    s.clear(None);
    assert!(s.data().iter().all(|v| *v == 0));
}

#[test]
fn invalid_sizes_are_rejected() {
    assert!(Surface::new(0, 1).is_err());
    assert!(Surface::new(1, 70_000).is_err());
}

#[test]
fn frame_copy_is_premultiplied() {
    let f = Surface::new(1, 1).unwrap().to_frame();
    assert!(f.premultiplied);
    assert_eq!(f.data, vec![0, 0, 0, 0]);
}
