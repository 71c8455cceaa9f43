use std::io::Cursor;

use super::*;

#[test]
fn decode_frame_png_dimensions_and_premul() {
    let src_rgba = vec![100u8, 50u8, 200u8, 128u8];
    let img = image::RgbaImage::from_raw(1, 1, src_rgba).unwrap();

    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();

    let frame = decode_frame(&buf).unwrap();
    assert_eq!(frame.width, 1);
    assert_eq!(frame.height, 1);
    assert_eq!(
        frame.rgba8_premul(),
        &[
            ((100u16 * 128 + 127) / 255) as u8,
            ((50u16 * 128 + 127) / 255) as u8,
            ((200u16 * 128 + 127) / 255) as u8,
            128u8
        ]
    );
}

#[test]
fn aspect_ratio_uses_natural_size() {
    let img = image::RgbaImage::from_pixel(16, 9, image::Rgba([0, 0, 0, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();

    let frame = decode_frame(&buf).unwrap();
    assert!((frame.aspect_ratio() - 16.0 / 9.0).abs() < 1e-12);
}

#[test]
fn garbage_bytes_fail_to_decode() {
    assert!(decode_frame(b"not an image").is_err());
}

#[test]
fn premul_bytes_must_match_dimensions() {
    assert!(DecodedFrame::from_premul_rgba8(2, 2, &[0u8; 12]).is_err());
    assert!(DecodedFrame::from_premul_rgba8(0, 2, &[]).is_err());
    assert!(DecodedFrame::from_premul_rgba8(70_000, 1, &vec![0u8; 280_000]).is_err());

    let frame = DecodedFrame::from_premul_rgba8(2, 1, &[1, 2, 3, 255, 4, 5, 6, 255]).unwrap();
    assert_eq!(frame.rgba8_premul(), &[1, 2, 3, 255, 4, 5, 6, 255]);
}
