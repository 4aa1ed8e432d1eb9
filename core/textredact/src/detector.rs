use image::RgbImage;
use serde::Deserialize;

use crate::error::RedactError;
use crate::geometry::NormalizedBox;
use crate::store::ObjectRef;

/// One piece of text found by OCR, with where it was found.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// The recognized text.
    pub text: String,
    /// Where it sits, as fractions of the image size.
    pub bbox: NormalizedBox,
}

impl Detection {
    /// Pair `text` with its box.
    pub fn new(text: impl Into<String>, bbox: NormalizedBox) -> Self {
        Self {
            text: text.into(),
            bbox,
        }
    }
}

/// Pluggable OCR backend.
///
/// Implementations receive both the stored object's location (services that
/// read straight from the store want this) and the decoded pixels (local
/// engines want these). Detections must come back in the engine's emission
/// order.
pub trait TextDetector: Send + Sync {
    /// Find text in `image`, which was read from `source`.
    fn detect(&self, source: &ObjectRef, image: &RgbImage) -> Result<Vec<Detection>, RedactError>;
}

/// Detector that always returns the same detections.
#[derive(Debug, Clone, Default)]
pub struct StaticDetector {
    detections: Vec<Detection>,
}

impl StaticDetector {
    /// Detector answering every call with `detections`.
    pub fn new(detections: Vec<Detection>) -> Self {
        Self { detections }
    }
}

impl TextDetector for StaticDetector {
    fn detect(&self, _source: &ObjectRef, _image: &RgbImage) -> Result<Vec<Detection>, RedactError> {
        Ok(self.detections.clone())
    }
}

/// Document-text response as returned by the OCR service.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OcrResponse {
    /// Blocks in emission order. Missing means none.
    #[serde(default)]
    pub blocks: Vec<OcrBlock>,
}

/// Granularity of an [`OcrBlock`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockType {
    /// The whole page.
    Page,
    /// A line of words.
    Line,
    /// A single word. Only these are redacted.
    Word,
    /// Anything else the service may add.
    #[serde(other)]
    Other,
}

/// One entry of an [`OcrResponse`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OcrBlock {
    /// Page, line or word.
    pub block_type: BlockType,
    /// Recognized text, absent on page blocks.
    #[serde(default)]
    pub text: Option<String>,
    /// Location of the block.
    #[serde(default)]
    pub geometry: Option<OcrGeometry>,
}

/// Geometry wrapper around an [`OcrBoundingBox`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OcrGeometry {
    /// The block's box.
    pub bounding_box: OcrBoundingBox,
}

/// Axis-aligned box in fractions of the image size, as the OCR service spells it.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OcrBoundingBox {
    /// Left edge.
    pub left: f64,
    /// Top edge.
    pub top: f64,
    /// Box width.
    pub width: f64,
    /// Box height.
    pub height: f64,
}

impl From<OcrBoundingBox> for NormalizedBox {
    fn from(b: OcrBoundingBox) -> Self {
        NormalizedBox::new(b.left, b.top, b.width, b.height)
    }
}

impl OcrResponse {
    /// Parse a JSON response body.
    pub fn from_json(body: &str) -> Result<Self, RedactError> {
        serde_json::from_str(body).map_err(|e| RedactError::Detection(e.to_string()))
    }

    /// Word-level detections in block order.
    ///
    /// Page and line blocks are skipped, since lines repeat the words they
    /// contain. Word blocks missing text or geometry are dropped.
    pub fn word_detections(&self) -> Vec<Detection> {
        self.blocks
            .iter()
            .filter(|block| block.block_type == BlockType::Word)
            .filter_map(|block| {
                let text = block.text.as_ref()?;
                let geometry = block.geometry.as_ref()?;
                Some(Detection::new(text.clone(), geometry.bounding_box.into()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESPONSE: &str = r#"{
        "Blocks": [
            {"BlockType": "PAGE", "Geometry": {"BoundingBox": {"Left": 0, "Top": 0, "Width": 1, "Height": 1}}},
            {"BlockType": "LINE", "Text": "call 555 0100",
             "Geometry": {"BoundingBox": {"Left": 0.1, "Top": 0.2, "Width": 0.5, "Height": 0.05}}},
            {"BlockType": "WORD", "Text": "call", "Confidence": 99.1,
             "Geometry": {"BoundingBox": {"Left": 0.1, "Top": 0.2, "Width": 0.1, "Height": 0.05}}},
            {"BlockType": "WORD", "Text": "555",
             "Geometry": {"BoundingBox": {"Left": 0.25, "Top": 0.2, "Width": 0.1, "Height": 0.05}}},
            {"BlockType": "WORD", "Text": "0100",
             "Geometry": {"BoundingBox": {"Left": 0.4, "Top": 0.2, "Width": 0.2, "Height": 0.05}}},
            {"BlockType": "KEY_VALUE_SET"}
        ]
    }"#;

    #[test]
    fn keeps_only_words_in_order() {
        let response = OcrResponse::from_json(RESPONSE).unwrap();
        let texts: Vec<_> = response
            .word_detections()
            .into_iter()
            .map(|d| d.text)
            .collect();
        assert_eq!(texts, vec!["call", "555", "0100"]);
    }

    #[test]
    fn bounding_box_maps_to_normalized_box() {
        let response = OcrResponse::from_json(RESPONSE).unwrap();
        let detections = response.word_detections();
        assert_eq!(detections[1].bbox, NormalizedBox::new(0.25, 0.2, 0.1, 0.05));
    }

    #[test]
    fn word_without_geometry_is_dropped() {
        let response =
            OcrResponse::from_json(r#"{"Blocks": [{"BlockType": "WORD", "Text": "x"}]}"#).unwrap();
        assert!(response.word_detections().is_empty());
    }

    #[test]
    fn missing_blocks_is_empty() {
        let response = OcrResponse::from_json("{}").unwrap();
        assert!(response.word_detections().is_empty());
    }

    #[test]
    fn malformed_json_is_a_detection_error() {
        let err = OcrResponse::from_json("{\"Blocks\": 3}").unwrap_err();
        assert!(matches!(err, RedactError::Detection(_)));
    }

    #[test]
    fn static_detector_returns_its_list() {
        let detector = StaticDetector::new(vec![Detection::new(
            "hi",
            NormalizedBox::new(0.0, 0.0, 0.5, 0.5),
        )]);
        let found = detector
            .detect(&ObjectRef::new("b", "k.png"), &RgbImage::new(2, 2))
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].text, "hi");
    }
}
