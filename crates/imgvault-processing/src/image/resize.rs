use image::{imageops, DynamicImage, GenericImageView};
use imgvault_core::ResizeMode;

/// Requested box; either side may be left open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeDimensions {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Image resize operations
pub struct ImageResize;

impl ImageResize {
    /// Size the image is scaled to before any crop.
    ///
    /// For `Exact` this is the `Fill` size; [`ImageResize::output_dimensions`]
    /// gives the final cropped box.
    pub fn calculate_dimensions(
        orig_width: u32,
        orig_height: u32,
        dimensions: ResizeDimensions,
        mode: ResizeMode,
    ) -> (u32, u32) {
        if orig_width == 0 || orig_height == 0 {
            return (orig_width.max(1), orig_height.max(1));
        }

        let (width, height) = match mode {
            ResizeMode::Stretch => (
                dimensions.width.unwrap_or(orig_width) as f64,
                dimensions.height.unwrap_or(orig_height) as f64,
            ),
            ResizeMode::Fit | ResizeMode::ShrinkOnly | ResizeMode::Fill | ResizeMode::Exact => {
                let mut scales: Vec<f64> = Vec::with_capacity(3);
                if let Some(w) = dimensions.width {
                    scales.push(w as f64 / orig_width as f64);
                }
                if let Some(h) = dimensions.height {
                    scales.push(h as f64 / orig_height as f64);
                }
                if scales.is_empty() {
                    return (orig_width, orig_height);
                }

                if matches!(mode, ResizeMode::Fill | ResizeMode::Exact) {
                    let max = scales.iter().cloned().fold(f64::MIN, f64::max);
                    scales = vec![max];
                }
                if mode == ResizeMode::ShrinkOnly {
                    scales.push(1.0);
                }

                let scale = scales.iter().cloned().fold(f64::MAX, f64::min);
                (orig_width as f64 * scale, orig_height as f64 * scale)
            }
        };

        (
            (width.round() as u32).max(1),
            (height.round() as u32).max(1),
        )
    }

    /// Final output size after resizing (and cropping, for `Exact`).
    pub fn output_dimensions(
        orig_width: u32,
        orig_height: u32,
        dimensions: ResizeDimensions,
        mode: ResizeMode,
    ) -> (u32, u32) {
        let (width, height) = Self::calculate_dimensions(orig_width, orig_height, dimensions, mode);
        match mode {
            ResizeMode::Exact => (
                dimensions.width.unwrap_or(width).min(width),
                dimensions.height.unwrap_or(height).min(height),
            ),
            _ => (width, height),
        }
    }

    /// Select appropriate filter type based on resize ratio
    pub fn select_filter(
        orig_width: u32,
        orig_height: u32,
        new_width: u32,
        new_height: u32,
    ) -> imageops::FilterType {
        let width_ratio = orig_width as f32 / new_width as f32;
        let height_ratio = orig_height as f32 / new_height as f32;
        let max_ratio = width_ratio.max(height_ratio);

        if max_ratio > 2.0 {
            imageops::FilterType::Triangle
        } else if max_ratio > 1.5 {
            imageops::FilterType::CatmullRom
        } else {
            imageops::FilterType::Lanczos3
        }
    }

    /// Resize image to exact dimensions
    pub fn resize_image(img: &DynamicImage, width: u32, height: u32) -> DynamicImage {
        let (orig_width, orig_height) = img.dimensions();
        if (orig_width, orig_height) == (width, height) {
            return img.clone();
        }
        let filter = Self::select_filter(orig_width, orig_height, width, height);
        img.resize_exact(width, height, filter)
    }

    /// Apply resize under the given strategy
    pub fn apply_resize(
        img: &DynamicImage,
        dimensions: ResizeDimensions,
        mode: ResizeMode,
    ) -> DynamicImage {
        let (orig_width, orig_height) = img.dimensions();
        let (scaled_width, scaled_height) =
            Self::calculate_dimensions(orig_width, orig_height, dimensions, mode);

        let resized = Self::resize_image(img, scaled_width, scaled_height);

        if mode != ResizeMode::Exact {
            return resized;
        }

        let (crop_width, crop_height) =
            Self::output_dimensions(orig_width, orig_height, dimensions, mode);
        let x = (scaled_width - crop_width) / 2;
        let y = (scaled_height - crop_height) / 2;
        resized.crop_imm(x, y, crop_width, crop_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn dims(width: Option<u32>, height: Option<u32>) -> ResizeDimensions {
        ResizeDimensions { width, height }
    }

    fn image(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba([255, 0, 0, 255])))
    }

    #[test]
    fn test_fit_preserves_aspect_ratio() {
        let (w, h) =
            ImageResize::calculate_dimensions(200, 100, dims(Some(100), Some(100)), ResizeMode::Fit);
        assert_eq!((w, h), (100, 50));
    }

    #[test]
    fn test_fit_upscales() {
        let (w, h) =
            ImageResize::calculate_dimensions(50, 25, dims(Some(100), None), ResizeMode::Fit);
        assert_eq!((w, h), (100, 50));
    }

    #[test]
    fn test_shrink_only_never_upscales() {
        let (w, h) = ImageResize::calculate_dimensions(
            50,
            25,
            dims(Some(100), None),
            ResizeMode::ShrinkOnly,
        );
        assert_eq!((w, h), (50, 25));

        let (w, h) = ImageResize::calculate_dimensions(
            200,
            100,
            dims(Some(100), None),
            ResizeMode::ShrinkOnly,
        );
        assert_eq!((w, h), (100, 50));
    }

    #[test]
    fn test_stretch_ignores_aspect_ratio() {
        let (w, h) = ImageResize::calculate_dimensions(
            200,
            100,
            dims(Some(30), Some(90)),
            ResizeMode::Stretch,
        );
        assert_eq!((w, h), (30, 90));

        let (w, h) =
            ImageResize::calculate_dimensions(200, 100, dims(Some(30), None), ResizeMode::Stretch);
        assert_eq!((w, h), (30, 100));
    }

    #[test]
    fn test_fill_covers_box() {
        let (w, h) = ImageResize::calculate_dimensions(
            200,
            100,
            dims(Some(100), Some(100)),
            ResizeMode::Fill,
        );
        assert_eq!((w, h), (200, 100));

        let (w, h) = ImageResize::calculate_dimensions(
            400,
            100,
            dims(Some(100), Some(100)),
            ResizeMode::Fill,
        );
        assert_eq!((w, h), (400, 100));
    }

    #[test]
    fn test_exact_output_box() {
        let (w, h) = ImageResize::output_dimensions(
            400,
            100,
            dims(Some(100), Some(100)),
            ResizeMode::Exact,
        );
        assert_eq!((w, h), (100, 100));
    }

    #[test]
    fn test_dimensions_never_zero() {
        let (w, h) =
            ImageResize::calculate_dimensions(1000, 1, dims(Some(10), None), ResizeMode::Fit);
        assert_eq!((w, h), (10, 1));
    }

    #[test]
    fn test_apply_resize_exact_crops() {
        let img = image(400, 100);
        let resized = ImageResize::apply_resize(&img, dims(Some(50), Some(50)), ResizeMode::Exact);
        assert_eq!(resized.dimensions(), (50, 50));
    }

    #[test]
    fn test_apply_resize_fit() {
        let img = image(100, 100);
        let resized = ImageResize::apply_resize(&img, dims(Some(50), Some(20)), ResizeMode::Fit);
        assert_eq!(resized.dimensions(), (20, 20));
    }

    #[test]
    fn test_resize_image_same_size_is_noop() {
        let img = image(10, 10);
        let resized = ImageResize::resize_image(&img, 10, 10);
        assert_eq!(resized.dimensions(), (10, 10));
    }
}
