use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ImageEncoder, ImageFormat, RgbImage, RgbaImage};

use crate::error::RedactError;

/// Default JPEG quality for re-encoded uploads.
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

/// Encoding used when writing a redacted image back out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Lossless PNG.
    Png,

    /// Baseline JPEG.
    #[default]
    Jpeg,

    /// Lossless WebP.
    Webp,
}

impl OutputFormat {
    /// Resolve a file extension (without the dot). `jpg` and `jpeg` are both JPEG.
    pub fn from_extension(ext: &str) -> Result<Self, RedactError> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Ok(OutputFormat::Png),
            "jpg" | "jpeg" => Ok(OutputFormat::Jpeg),
            "webp" => Ok(OutputFormat::Webp),
            other => Err(RedactError::UnsupportedFormat(other.to_string())),
        }
    }

    /// Canonical file extension, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Webp => "webp",
        }
    }

    /// Content type sent along with stored objects.
    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Webp => "image/webp",
        }
    }
}

/// Decode input bytes into a `DynamicImage`.
pub fn decode_image(input: &[u8]) -> Result<DynamicImage, RedactError> {
    image::load_from_memory(input).map_err(|e| RedactError::ImageDecode(e.to_string()))
}

/// Detect the input image format from the raw bytes.
pub fn detect_format(input: &[u8]) -> Result<ImageFormat, RedactError> {
    image::guess_format(input).map_err(|e| RedactError::ImageDecode(e.to_string()))
}

/// Bring any decoded color layout (gray, palette, 16-bit, alpha) to 8-bit RGB.
///
/// Images with an alpha channel are composited onto white so transparent
/// areas do not turn into whatever color the encoder left behind them.
pub fn normalize_to_rgb(image: DynamicImage) -> RgbImage {
    if image.color().has_alpha() {
        flatten_alpha(&image.to_rgba8())
    } else {
        match image {
            DynamicImage::ImageRgb8(rgb) => rgb,
            other => other.to_rgb8(),
        }
    }
}

/// Flatten alpha channel by compositing onto a white background.
fn flatten_alpha(rgba: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let alpha = a as f32 / 255.0;
        let over_white = |c: u8| (c as f32 * alpha + 255.0 * (1.0 - alpha)).round() as u8;
        image::Rgb([over_white(r), over_white(g), over_white(b)])
    })
}

/// Encode an RGB image. `quality` (1–100) only affects JPEG.
pub fn encode_image(
    image: &RgbImage,
    format: OutputFormat,
    quality: u8,
) -> Result<Vec<u8>, RedactError> {
    if !(1..=100).contains(&quality) {
        return Err(RedactError::InvalidQuality(quality));
    }
    let mut buffer = Vec::new();
    let (width, height) = image.dimensions();
    let color = image::ExtendedColorType::Rgb8;

    let written = match format {
        OutputFormat::Png => {
            PngEncoder::new(&mut buffer).write_image(image.as_raw(), width, height, color)
        }
        OutputFormat::Jpeg => JpegEncoder::new_with_quality(&mut buffer, quality)
            .write_image(image.as_raw(), width, height, color),
        // image-webp only encodes losslessly
        OutputFormat::Webp => {
            WebPEncoder::new_lossless(&mut buffer).write_image(image.as_raw(), width, height, color)
        }
    };
    written.map_err(|e| RedactError::Encode(e.to_string()))?;

    Ok(buffer)
}

/// Turns stored bytes into pixels and back.
pub trait ImageLoader: Send + Sync {
    /// Decode and normalize to 8-bit RGB.
    fn load(&self, bytes: &[u8]) -> Result<RgbImage, RedactError>;

    /// Encode `image` in `format`.
    fn encode(&self, image: &RgbImage, format: OutputFormat) -> Result<Vec<u8>, RedactError>;
}

/// [`ImageLoader`] backed by the `image` crate's PNG, JPEG and WebP codecs.
#[derive(Debug, Clone)]
pub struct StandardLoader {
    jpeg_quality: u8,
}

impl StandardLoader {
    /// Loader writing JPEGs at `jpeg_quality` (1-100).
    pub fn new(jpeg_quality: u8) -> Result<Self, RedactError> {
        if !(1..=100).contains(&jpeg_quality) {
            return Err(RedactError::InvalidQuality(jpeg_quality));
        }
        Ok(Self { jpeg_quality })
    }
}

impl Default for StandardLoader {
    fn default() -> Self {
        Self {
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl ImageLoader for StandardLoader {
    fn load(&self, bytes: &[u8]) -> Result<RgbImage, RedactError> {
        let decoded = decode_image(bytes)?;
        if decoded.width() == 0 || decoded.height() == 0 {
            return Err(RedactError::ZeroDimensions);
        }
        Ok(normalize_to_rgb(decoded))
    }

    fn encode(&self, image: &RgbImage, format: OutputFormat) -> Result<Vec<u8>, RedactError> {
        encode_image(image, format, self.jpeg_quality)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgba};

    fn make_test_rgb(width: u32, height: u32) -> RgbImage {
        let mut img = RgbImage::new(width, height);
        for (x, y, pixel) in img.enumerate_pixels_mut() {
            *pixel = image::Rgb([
                (x * 255 / width.max(1)) as u8,
                (y * 255 / height.max(1)) as u8,
                128,
            ]);
        }
        img
    }

    #[test]
    fn extension_lookup_is_case_insensitive() {
        assert_eq!(OutputFormat::from_extension("PNG").unwrap(), OutputFormat::Png);
        assert_eq!(OutputFormat::from_extension("jpg").unwrap(), OutputFormat::Jpeg);
        assert_eq!(OutputFormat::from_extension("JPEG").unwrap(), OutputFormat::Jpeg);
        assert_eq!(OutputFormat::from_extension("webp").unwrap(), OutputFormat::Webp);
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        let err = OutputFormat::from_extension("gif").unwrap_err();
        assert!(matches!(err, RedactError::UnsupportedFormat(ref e) if e == "gif"));
    }

    #[test]
    fn encode_jpeg_produces_valid_output() {
        let img = make_test_rgb(48, 64);
        let data = encode_image(&img, OutputFormat::Jpeg, 80).unwrap();
        assert_eq!(data[0], 0xFF);
        assert_eq!(data[1], 0xD8);
        assert_eq!(detect_format(&data).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn encode_png_is_lossless() {
        let img = make_test_rgb(33, 17);
        let data = encode_image(&img, OutputFormat::Png, 95).unwrap();
        assert_eq!(&data[1..4], b"PNG");
        let back = normalize_to_rgb(decode_image(&data).unwrap());
        assert_eq!(back, img);
    }

    #[test]
    fn encode_webp_produces_riff() {
        let img = make_test_rgb(16, 16);
        let data = encode_image(&img, OutputFormat::Webp, 95).unwrap();
        assert_eq!(&data[0..4], b"RIFF");
        assert_eq!(&data[8..12], b"WEBP");
    }

    #[test]
    fn quality_out_of_range_is_rejected() {
        let img = make_test_rgb(4, 4);
        assert!(matches!(
            encode_image(&img, OutputFormat::Jpeg, 0),
            Err(RedactError::InvalidQuality(0))
        ));
        assert!(StandardLoader::new(101).is_err());
    }

    #[test]
    fn invalid_bytes_fail_to_decode() {
        let err = StandardLoader::default().load(b"not an image").unwrap_err();
        assert!(matches!(err, RedactError::ImageDecode(_)));
    }

    #[test]
    fn grayscale_normalizes_to_rgb() {
        let gray = GrayImage::from_pixel(3, 3, Luma([77]));
        let rgb = normalize_to_rgb(DynamicImage::ImageLuma8(gray));
        assert_eq!(rgb.get_pixel(1, 1), &image::Rgb([77, 77, 77]));
    }

    #[test]
    fn transparent_pixels_become_white() {
        let mut rgba = RgbaImage::new(2, 1);
        rgba.put_pixel(0, 0, Rgba([255, 0, 0, 0]));
        rgba.put_pixel(1, 0, Rgba([100, 150, 200, 255]));
        let rgb = normalize_to_rgb(DynamicImage::ImageRgba8(rgba));
        assert_eq!(rgb.get_pixel(0, 0), &image::Rgb([255, 255, 255]));
        assert_eq!(rgb.get_pixel(1, 0), &image::Rgb([100, 150, 200]));
    }

    #[test]
    fn loader_round_trips_png_with_alpha() {
        let rgba = RgbaImage::from_pixel(5, 4, Rgba([10, 20, 30, 255]));
        let mut bytes = Vec::new();
        PngEncoder::new(&mut bytes)
            .write_image(rgba.as_raw(), 5, 4, image::ExtendedColorType::Rgba8)
            .unwrap();

        let loaded = StandardLoader::default().load(&bytes).unwrap();
        assert_eq!(loaded.dimensions(), (5, 4));
        assert_eq!(loaded.get_pixel(0, 0), &image::Rgb([10, 20, 30]));
    }
}
