//! Blur text out of uploaded profile pictures.
//!
//! An OCR engine reports where text sits in an image as boxes normalized to
//! the image size. This crate maps those boxes onto pixels, merges them into a
//! single mask, and pastes a heavily blurred copy of the image through that
//! mask, leaving everything outside the detected text untouched.
//!
//! # Example
//!
//! ```no_run
//! use textredact::{Detection, NormalizedBox, Redactor};
//!
//! let raw_bytes = std::fs::read("avatar.png").unwrap();
//! let detections = vec![Detection::new("555-0100", NormalizedBox::new(0.1, 0.8, 0.4, 0.1))];
//! let result = Redactor::new(raw_bytes)
//!     .unwrap()
//!     .redact(&detections)
//!     .unwrap();
//! println!("Redacted {:?} into {} bytes", result.detected_texts, result.data.len());
//! ```
#![warn(missing_docs)]

/// Decoding, color normalization and encoding.
pub mod codec;
/// Blur-and-paste through a mask.
pub mod composite;
mod config;
/// OCR boundary: detections, detector trait and response types.
pub mod detector;
mod error;
/// Normalized boxes and pixel rectangles.
pub mod geometry;
/// Binary selection masks.
pub mod mask;
/// Notifier trait and report rendering.
pub mod notify;
mod pipeline;
mod service;
/// Text summaries of detections.
pub mod summary;
/// Object store trait, object references and upload events.
pub mod store;

pub use codec::{ImageLoader, OutputFormat, StandardLoader};
pub use config::{ConfigError, ServiceConfig};
pub use detector::{Detection, StaticDetector, TextDetector};
pub use error::{RedactError, Stage};
pub use geometry::{NormalizedBox, PixelRect};
pub use mask::Mask;
pub use notify::{Notification, Notifier, RecordingNotifier};
pub use pipeline::{RedactionPipeline, RedactionResult};
pub use service::{ProcessingOutcome, ProcessingStatus, RedactionService};
pub use store::{MemoryStore, ObjectRef, ObjectStore, UploadEvent};

use image::{ImageFormat, RgbImage};

/// Result of redacting an encoded image.
#[derive(Debug, Clone)]
pub struct RedactedPhoto {
    /// The output image bytes.
    pub data: Vec<u8>,

    /// The output format used.
    pub format: OutputFormat,

    /// Width of the output image in pixels.
    pub width: u32,

    /// Height of the output image in pixels.
    pub height: u32,

    /// Size of the original input in bytes.
    pub original_size: usize,

    /// Detected text in detector order.
    pub detected_texts: Vec<String>,

    /// Whether anything was blurred.
    pub had_redactions: bool,
}

/// Builder for redacting an encoded image.
///
/// Decodes and normalizes the input on construction, then blurs the regions
/// passed to [`Redactor::redact`] and re-encodes.
pub struct Redactor {
    input: Vec<u8>,
    image: RgbImage,
    source_format: Option<OutputFormat>,
    format: OutputFormat,
    quality: u8,
}

impl Redactor {
    /// Create a new redactor from raw image bytes (JPEG, PNG, or WebP).
    ///
    /// The output format defaults to the input's format.
    pub fn new(input: Vec<u8>) -> Result<Self, RedactError> {
        let source_format = match codec::detect_format(&input)? {
            ImageFormat::Png => Some(OutputFormat::Png),
            ImageFormat::Jpeg => Some(OutputFormat::Jpeg),
            ImageFormat::WebP => Some(OutputFormat::Webp),
            _ => None,
        };
        let image = StandardLoader::default().load(&input)?;

        Ok(Self {
            input,
            image,
            source_format,
            format: source_format.unwrap_or(OutputFormat::Png),
            quality: codec::DEFAULT_JPEG_QUALITY,
        })
    }

    /// Set the output format.
    pub fn format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the JPEG quality from 1 to 100 (default: 95).
    pub fn quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    /// Decoded image size.
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// The decoded, RGB-normalized source.
    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    /// Blur every detection and encode the result.
    ///
    /// When nothing is detected and the output format matches the input, the
    /// original bytes are returned as-is rather than re-encoded.
    pub fn redact(&self, detections: &[Detection]) -> Result<RedactedPhoto, RedactError> {
        let result = RedactionPipeline::new().run(&self.image, detections)?;
        let (width, height) = result.redacted_image.dimensions();

        let data = if !result.had_redactions && self.source_format == Some(self.format) {
            self.input.clone()
        } else {
            codec::encode_image(&result.redacted_image, self.format, self.quality)?
        };

        Ok(RedactedPhoto {
            data,
            format: self.format,
            width,
            height,
            original_size: self.input.len(),
            detected_texts: result.detected_texts,
            had_redactions: result.had_redactions,
        })
    }
}
