use std::io::Cursor;

use fast_image_resize::{FilterType, ResizeAlg, ResizeOptions, Resizer};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};

use super::models::UploadOptions;
use super::MediaError;

/// Re-encodes uploaded images before they are persisted.
///
/// Returns `Ok(None)` when the input should be stored unchanged.
pub trait ImageOptimizer: Send + Sync {
    fn optimize(
        &self,
        data: &[u8],
        mime_type: &str,
        options: &UploadOptions,
    ) -> Result<Option<Vec<u8>>, MediaError>;
}

/// Downscales to fit the requested bounds and re-encodes in the source format.
#[derive(Debug, Default, Clone, Copy)]
pub struct ResizingOptimizer;

impl ResizingOptimizer {
    fn format_for(mime_type: &str) -> Option<ImageFormat> {
        match mime_type {
            "image/jpeg" | "image/jpg" => Some(ImageFormat::Jpeg),
            "image/png" => Some(ImageFormat::Png),
            "image/webp" => Some(ImageFormat::WebP),
            _ => None,
        }
    }

    /// Target size preserving aspect ratio, never larger than the source.
    fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
        let scale = (max_width.max(1) as f32 / width as f32)
            .min(max_height.max(1) as f32 / height as f32)
            .min(1.0);
        let dst_width = ((width as f32 * scale).round() as u32).clamp(1, width);
        let dst_height = ((height as f32 * scale).round() as u32).clamp(1, height);
        (dst_width, dst_height)
    }
}

impl ImageOptimizer for ResizingOptimizer {
    fn optimize(
        &self,
        data: &[u8],
        mime_type: &str,
        options: &UploadOptions,
    ) -> Result<Option<Vec<u8>>, MediaError> {
        let Some(format) = Self::format_for(mime_type) else {
            return Ok(None);
        };

        let src_image = image::load_from_memory_with_format(data, format)?;
        let (src_width, src_height) = (src_image.width(), src_image.height());
        let (dst_width, dst_height) =
            Self::fit_within(src_width, src_height, options.max_width, options.max_height);
        let resized = dst_width != src_width || dst_height != src_height;

        let image = if resized {
            let mut dst_image = DynamicImage::new(dst_width, dst_height, src_image.color());
            let mut resizer = Resizer::new();
            resizer.resize(
                &src_image,
                &mut dst_image,
                Some(
                    &ResizeOptions::new()
                        .resize_alg(ResizeAlg::Convolution(FilterType::Lanczos3)),
                ),
            )?;
            dst_image
        } else {
            src_image
        };

        let mut out = Vec::new();
        match format {
            ImageFormat::Jpeg => {
                let quality = options.quality.clamp(1, 100);
                let encoder = JpegEncoder::new_with_quality(&mut out, quality);
                DynamicImage::ImageRgb8(image.to_rgb8()).write_with_encoder(encoder)?;
            }
            ImageFormat::WebP => {
                DynamicImage::ImageRgba8(image.to_rgba8())
                    .write_to(&mut Cursor::new(&mut out), ImageFormat::WebP)?;
            }
            _ => {
                image.write_to(&mut Cursor::new(&mut out), format)?;
            }
        }

        if !resized && out.len() >= data.len() {
            return Ok(None);
        }

        tracing::debug!(
            src_width,
            src_height,
            dst_width,
            dst_height,
            before = data.len(),
            after = out.len(),
            "Optimized image"
        );
        Ok(Some(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = ImageBuffer::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
        });
        let mut out = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .unwrap();
        out
    }

    #[test]
    fn test_fit_within_preserves_aspect_ratio() {
        assert_eq!(ResizingOptimizer::fit_within(4000, 2000, 1920, 1080), (1920, 960));
        assert_eq!(ResizingOptimizer::fit_within(1000, 3000, 1920, 1080), (360, 1080));
        assert_eq!(ResizingOptimizer::fit_within(800, 600, 1920, 1080), (800, 600));
    }

    #[test]
    fn test_downscales_large_png() {
        let data = png_bytes(400, 200);
        let options = UploadOptions {
            optimize: true,
            max_width: 100,
            max_height: 100,
            quality: 80,
        };

        let out = ResizingOptimizer
            .optimize(&data, "image/png", &options)
            .unwrap()
            .expect("image should be resized");
        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (100, 50));
    }

    #[test]
    fn test_unsupported_type_is_left_alone() {
        let out = ResizingOptimizer
            .optimize(b"GIF89a", "image/gif", &UploadOptions::optimized())
            .unwrap();
        assert!(out.is_none());
    }

    #[test]
    fn test_corrupt_image_is_an_error() {
        let result =
            ResizingOptimizer.optimize(b"not a png", "image/png", &UploadOptions::optimized());
        assert!(matches!(result, Err(MediaError::Image(_))));
    }
}
