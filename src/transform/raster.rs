//! Raster image re-encoding and WebP variants.

use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ImageFormat};

use super::TransformError;

/// Raster formats the image tasks accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterFormat {
    Png,
    Jpeg,
}

impl RasterFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            _ => None,
        }
    }

    fn image_format(self) -> ImageFormat {
        match self {
            Self::Png => ImageFormat::Png,
            Self::Jpeg => ImageFormat::Jpeg,
        }
    }
}

/// Re-encode for size: PNG at best compression, JPEG at `jpeg_quality`.
///
/// Returns the input unchanged when the re-encoding is not smaller.
pub fn optimize(bytes: &[u8], format: RasterFormat, jpeg_quality: u8) -> Result<Vec<u8>, TransformError> {
    let img = image::load_from_memory_with_format(bytes, format.image_format())?;

    let mut out = Vec::with_capacity(bytes.len());
    match format {
        RasterFormat::Png => {
            let encoder = PngEncoder::new_with_quality(&mut out, CompressionType::Best, FilterType::Adaptive);
            img.write_with_encoder(encoder)?;
        }
        RasterFormat::Jpeg => {
            let img = match img {
                DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) => img,
                other => DynamicImage::ImageRgb8(other.to_rgb8()),
            };
            img.write_with_encoder(JpegEncoder::new_with_quality(&mut out, jpeg_quality))?;
        }
    }

    if out.len() < bytes.len() {
        Ok(out)
    } else {
        Ok(bytes.to_vec())
    }
}

/// Encode a lossless WebP variant of a PNG or JPEG.
pub fn to_webp(bytes: &[u8], format: RasterFormat) -> Result<Vec<u8>, TransformError> {
    let img = image::load_from_memory_with_format(bytes, format.image_format())?;
    let img = if img.color().has_alpha() {
        DynamicImage::ImageRgba8(img.to_rgba8())
    } else {
        DynamicImage::ImageRgb8(img.to_rgb8())
    };

    let mut out = Vec::new();
    img.write_with_encoder(WebPEncoder::new_lossless(&mut out))?;
    Ok(out)
}

/// Image fixtures shared by unit and pipeline tests.
#[cfg(test)]
pub(crate) mod fixtures {
    use image::codecs::jpeg::JpegEncoder;
    use image::codecs::png::{CompressionType, FilterType, PngEncoder};
    use image::{DynamicImage, Rgb, RgbImage};

    fn gradient() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(64, 64, |x, y| {
            Rgb([(x * 4) as u8, (y * 4) as u8, 128])
        }))
    }

    /// A PNG written with the weakest settings, so re-encoding shrinks it.
    pub fn loose_png() -> Vec<u8> {
        let mut out = Vec::new();
        let encoder = PngEncoder::new_with_quality(&mut out, CompressionType::Fast, FilterType::NoFilter);
        gradient().write_with_encoder(encoder).unwrap();
        out
    }

    /// A maximum-quality JPEG.
    pub fn fine_jpeg() -> Vec<u8> {
        let mut out = Vec::new();
        gradient()
            .write_with_encoder(JpegEncoder::new_with_quality(&mut out, 100))
            .unwrap();
        out
    }
}
