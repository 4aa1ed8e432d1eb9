use image::RgbImage;
use tracing::debug;

use crate::composite::composite;
use crate::detector::Detection;
use crate::error::RedactError;
use crate::geometry::{to_pixel_rect, PixelRect};
use crate::mask::build_mask;
use crate::summary::accumulate;

/// Outcome of redacting one image.
#[derive(Debug, Clone)]
pub struct RedactionResult {
    /// The source with every detected region blurred, or an untouched copy.
    pub redacted_image: RgbImage,

    /// Detected text in detector order, duplicates included.
    pub detected_texts: Vec<String>,

    /// Pixel regions that were blurred, one per detection (possibly zero-area).
    pub regions: Vec<PixelRect>,

    /// Whether any detection was present.
    pub had_redactions: bool,
}

/// Turns a batch of detections into one mask and one blur pass.
///
/// Stateless; share a single instance across threads freely.
#[derive(Debug, Clone, Copy, Default)]
pub struct RedactionPipeline;

impl RedactionPipeline {
    /// A pipeline. Equivalent to `RedactionPipeline`.
    pub fn new() -> Self {
        Self
    }

    /// Blur every detection out of `source` and collect their text.
    ///
    /// With no detections the result is an untouched copy and
    /// `had_redactions` is false.
    pub fn run(
        &self,
        source: &RgbImage,
        detections: &[Detection],
    ) -> Result<RedactionResult, RedactError> {
        if detections.is_empty() {
            return Ok(RedactionResult {
                redacted_image: source.clone(),
                detected_texts: Vec::new(),
                regions: Vec::new(),
                had_redactions: false,
            });
        }

        let (width, height) = source.dimensions();
        if width == 0 || height == 0 {
            return Err(RedactError::ZeroDimensions);
        }

        let regions: Vec<PixelRect> = detections
            .iter()
            .map(|detection| {
                let rect = to_pixel_rect(&detection.bbox, width, height);
                debug!(
                    text = %detection.text,
                    x = rect.x,
                    y = rect.y,
                    width = rect.width,
                    height = rect.height,
                    "mapped detection"
                );
                rect
            })
            .collect();

        let mask = build_mask(width, height, &regions);
        debug!(
            regions = regions.len(),
            covered = mask.coverage(),
            total = u64::from(width) * u64::from(height),
            "built redaction mask"
        );
        let redacted_image = composite(source, &mask)?;

        Ok(RedactionResult {
            redacted_image,
            detected_texts: accumulate(detections),
            regions,
            had_redactions: true,
        })
    }
}
