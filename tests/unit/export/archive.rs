use std::io::{Cursor, Read as _};

use super::*;

fn read_entries(bytes: Vec<u8>) -> Vec<(String, Vec<u8>)> {
    let mut zip = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    (0..zip.len())
        .map(|i| {
            let mut f = zip.by_index(i).unwrap();
            let mut buf = Vec::new();
            f.read_to_end(&mut buf).unwrap();
            (f.name().to_owned(), buf)
        })
        .collect()
}

#[test]
fn archive_holds_every_entry_in_order() {
    let bytes = zip_archive([("a_square.png", &b"one"[..]), ("b_square.png", &b"two"[..])]).unwrap();
    assert_eq!(
        read_entries(bytes),
        vec![
            ("a_square.png".to_owned(), b"one".to_vec()),
            ("b_square.png".to_owned(), b"two".to_vec()),
        ]
    );
}

#[test]
fn repeated_names_are_suffixed() {
    let bytes = zip_archive([
        ("x.png", &b"1"[..]),
        ("x.png", &b"2"[..]),
        ("x.png", &b"3"[..]),
    ])
    .unwrap();
    let names: Vec<_> = read_entries(bytes).into_iter().map(|(n, _)| n).collect();
    assert_eq!(names, vec!["x.png", "x_2.png", "x_3.png"]);
}

#[test]
fn empty_archive_is_a_validation_error() {
    let err = zip_archive(std::iter::empty()).unwrap_err();
    assert!(matches!(err, LetterpressError::Validation(_)));
}

#[test]
fn archive_names_carry_label_and_date() {
    let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
    assert_eq!(
        archive_name(ResizeTab::Square, date),
        "1x1_ratio_images_2024-03-09.zip"
    );
    assert_eq!(
        archive_name(ResizeTab::Resize, date),
        "480x720_images_2024-03-09.zip"
    );
    assert!(archive_name_today(ResizeTab::Custom).starts_with("custom_ratio_images_"));
}
