//! Test fixtures: encoded JPEG/PNG blobs and a non-image payload.

use std::io::Cursor;

use image::{DynamicImage, Rgb, RgbImage};

fn gradient(width: u32, height: u32) -> DynamicImage {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 255 / width.max(1)) as u8, (y * 255 / height.max(1)) as u8, 128])
    });
    DynamicImage::ImageRgb8(img)
}

fn encode(image: &DynamicImage, format: image::ImageFormat) -> Vec<u8> {
    let mut buffer = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buffer), format)
        .expect("Failed to encode fixture");
    buffer
}

/// JPEG of the given dimensions.
pub fn create_test_jpeg(width: u32, height: u32) -> Vec<u8> {
    encode(&gradient(width, height), image::ImageFormat::Jpeg)
}

/// PNG of the given dimensions.
pub fn create_test_png(width: u32, height: u32) -> Vec<u8> {
    encode(&gradient(width, height), image::ImageFormat::Png)
}

/// In-memory image for `save`.
pub fn create_test_image(width: u32, height: u32) -> DynamicImage {
    gradient(width, height)
}

/// Minimal PDF header, not an image.
pub fn create_test_pdf() -> Vec<u8> {
    b"%PDF-1.4\n1 0 obj\n<< /Type /Catalog >>\nendobj\ntrailer\n<< /Root 1 0 R >>\n%%EOF\n".to_vec()
}
