//! Image codec - decode, resize and encode
//!
//! The store only talks to images through the [`ImageCodec`] trait so tests can
//! observe or replace the expensive parts. [`RasterCodec`] is the default
//! implementation on top of the `image` crate.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::{DynamicImage, GenericImageView, ImageReader};
use imgvault_core::{ImageFormat, ThumbnailParams};

use crate::error::ProcessingError;
use crate::image::resize::{ImageResize, ResizeDimensions};

const DEFAULT_JPEG_QUALITY: u8 = 85;

/// Detect a supported image format from magic bytes.
pub fn detect_format(data: &[u8]) -> Option<ImageFormat> {
    match image::guess_format(data).ok()? {
        image::ImageFormat::Jpeg => Some(ImageFormat::Jpeg),
        image::ImageFormat::Png => Some(ImageFormat::Png),
        image::ImageFormat::Gif => Some(ImageFormat::Gif),
        _ => None,
    }
}

/// Whether `data` starts with a readable header of a supported format.
pub fn is_supported_image(data: &[u8]) -> bool {
    if detect_format(data).is_none() {
        return false;
    }
    ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map(|reader| reader.into_dimensions().is_ok())
        .unwrap_or(false)
}

fn to_image_crate_format(format: ImageFormat) -> image::ImageFormat {
    match format {
        ImageFormat::Jpeg => image::ImageFormat::Jpeg,
        ImageFormat::Png => image::ImageFormat::Png,
        ImageFormat::Gif => image::ImageFormat::Gif,
    }
}

/// Output buffer size hint: one byte per pixel, computed without `u32` overflow.
fn initial_capacity(width: u32, height: u32) -> usize {
    (width as usize).saturating_mul(height as usize)
}

/// Image codec collaborator used by the store
pub trait ImageCodec: Send + Sync {
    /// Supported format of the encoded bytes, if any
    fn sniff_format(&self, data: &[u8]) -> Option<ImageFormat> {
        detect_format(data)
    }

    fn decode(&self, data: &[u8]) -> Result<DynamicImage, ProcessingError>;

    /// Resize under the strategy carried by `params`
    fn resize(&self, image: &DynamicImage, params: &ThumbnailParams) -> DynamicImage;

    /// Encode at an optional quality (JPEG: 1-100, PNG: 0-9 compression level)
    fn encode(
        &self,
        image: &DynamicImage,
        format: ImageFormat,
        quality: Option<u32>,
    ) -> Result<Vec<u8>, ProcessingError>;
}

/// Default codec backed by the `image` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterCodec;

impl RasterCodec {
    fn png_compression(quality: Option<u32>) -> CompressionType {
        match quality {
            Some(0..=3) => CompressionType::Fast,
            Some(7..) => CompressionType::Best,
            _ => CompressionType::Default,
        }
    }
}

impl ImageCodec for RasterCodec {
    fn decode(&self, data: &[u8]) -> Result<DynamicImage, ProcessingError> {
        let reader = ImageReader::new(Cursor::new(data)).with_guessed_format()?;
        if reader.format().is_none() {
            return Err(ProcessingError::Decode("unrecognized image data".to_string()));
        }
        Ok(reader.decode()?)
    }

    fn resize(&self, image: &DynamicImage, params: &ThumbnailParams) -> DynamicImage {
        let dimensions = ResizeDimensions {
            width: params.width,
            height: params.height,
        };
        let resized = ImageResize::apply_resize(image, dimensions, params.mode);

        tracing::debug!(
            from = ?image.dimensions(),
            to = ?resized.dimensions(),
            mode = %params.mode,
            "Resized image"
        );

        resized
    }

    fn encode(
        &self,
        image: &DynamicImage,
        format: ImageFormat,
        quality: Option<u32>,
    ) -> Result<Vec<u8>, ProcessingError> {
        let (width, height) = image.dimensions();
        let mut buffer = Vec::with_capacity(initial_capacity(width, height));

        let result = match format {
            ImageFormat::Jpeg => {
                let quality = quality
                    .map(|q| q.clamp(1, 100) as u8)
                    .unwrap_or(DEFAULT_JPEG_QUALITY);
                let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
                DynamicImage::ImageRgb8(image.to_rgb8()).write_with_encoder(encoder)
            }
            ImageFormat::Png => {
                let encoder = PngEncoder::new_with_quality(
                    &mut buffer,
                    Self::png_compression(quality),
                    PngFilter::Adaptive,
                );
                image.write_with_encoder(encoder)
            }
            ImageFormat::Gif => DynamicImage::ImageRgba8(image.to_rgba8())
                .write_to(&mut Cursor::new(&mut buffer), to_image_crate_format(format)),
        };

        result.map_err(|e| ProcessingError::Encode(e.to_string()))?;
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use imgvault_core::ResizeMode;

    fn create_test_image(format: image::ImageFormat) -> Vec<u8> {
        let img = RgbaImage::from_pixel(100, 50, Rgba([255, 0, 0, 255]));
        let mut buffer = Vec::new();
        let mut cursor = Cursor::new(&mut buffer);
        DynamicImage::ImageRgba8(img)
            .write_to(&mut cursor, format)
            .unwrap();
        buffer
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(
            detect_format(&create_test_image(image::ImageFormat::Png)),
            Some(ImageFormat::Png)
        );
        assert_eq!(
            detect_format(&create_test_image(image::ImageFormat::Gif)),
            Some(ImageFormat::Gif)
        );
        assert_eq!(detect_format(b"not an image"), None);
    }

    #[test]
    fn test_is_supported_image() {
        assert!(is_supported_image(&create_test_image(image::ImageFormat::Png)));
        assert!(!is_supported_image(b"plain text"));
    }

    #[test]
    fn test_decode_invalid() {
        let result = RasterCodec.decode(b"not an image");
        assert!(result.is_err());
    }

    #[test]
    fn test_resize_and_encode_jpeg() {
        let codec = RasterCodec;
        let img = codec
            .decode(&create_test_image(image::ImageFormat::Png))
            .unwrap();
        let params = ThumbnailParams::new(Some(20), Some(20), Some(80), ResizeMode::Fit).unwrap();

        let resized = codec.resize(&img, &params);
        assert_eq!(resized.dimensions(), (20, 10));

        let encoded = codec.encode(&resized, ImageFormat::Jpeg, Some(80)).unwrap();
        assert_eq!(detect_format(&encoded), Some(ImageFormat::Jpeg));
        assert_eq!(codec.decode(&encoded).unwrap().dimensions(), (20, 10));
    }

    #[test]
    fn test_encode_png_and_gif() {
        let codec = RasterCodec;
        let img = codec
            .decode(&create_test_image(image::ImageFormat::Png))
            .unwrap();

        let png = codec.encode(&img, ImageFormat::Png, Some(9)).unwrap();
        assert_eq!(detect_format(&png), Some(ImageFormat::Png));

        let gif = codec.encode(&img, ImageFormat::Gif, None).unwrap();
        assert_eq!(detect_format(&gif), Some(ImageFormat::Gif));
    }

    #[test]
    fn test_initial_capacity_does_not_overflow() {
        assert_eq!(initial_capacity(20, 10), 200);
        assert_eq!(
            initial_capacity(70_000, 70_000) as u128,
            (70_000u128 * 70_000).min(usize::MAX as u128)
        );
    }
}
