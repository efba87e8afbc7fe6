use std::io::Cursor;

use super::*;
use crate::foundation::core::Point;

fn png_bytes(w: u32, h: u32, px: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba(px));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn decode_png_dimensions_and_premul() {
    let bg = BackgroundImage::decode(&png_bytes(1, 1, [100, 50, 200, 128])).unwrap();
    assert_eq!((bg.width, bg.height), (1, 1));
    assert_eq!(
        bg.rgba8_premul.as_slice(),
        &[
            ((100u16 * 128 + 127) / 255) as u8,
            ((50u16 * 128 + 127) / 255) as u8,
            ((200u16 * 128 + 127) / 255) as u8,
            128u8
        ]
    );
}

#[test]
fn decode_rejects_garbage() {
    let err = BackgroundImage::decode(b"definitely not an image").unwrap_err();
    assert!(matches!(err, PathreelError::Other(_)));
}

#[test]
fn open_missing_file_errors() {
    let dir = tempfile::tempdir().unwrap();
    assert!(BackgroundImage::open(&dir.path().join("nope.png")).is_err());
}

#[test]
fn fit_letterboxes_wide_image() {
    let canvas = Canvas::new(100, 100).unwrap();
    let t = fit_transform(200, 100, canvas);
    assert_eq!(t * Point::new(0.0, 0.0), Point::new(0.0, 25.0));
    assert_eq!(t * Point::new(200.0, 100.0), Point::new(100.0, 75.0));
}

#[test]
fn fit_pillarboxes_tall_image_and_upscales() {
    let canvas = Canvas::new(200, 100).unwrap();
    let t = fit_transform(10, 20, canvas);
    assert_eq!(t * Point::new(0.0, 0.0), Point::new(75.0, 0.0));
    assert_eq!(t * Point::new(10.0, 20.0), Point::new(125.0, 100.0));
}

#[test]
fn fit_same_size_is_identity() {
    let canvas = Canvas::new(64, 32).unwrap();
    assert_eq!(fit_transform(64, 32, canvas), Affine::IDENTITY);
}
