use crate::detector::Detection;

/// Text of every detection in the order the detector emitted them.
///
/// Duplicates are kept: a number split over two lines or repeated on a
/// sign is exactly what a reviewer needs to see.
pub fn accumulate(detections: &[Detection]) -> Vec<String> {
    detections.iter().map(|d| d.text.clone()).collect()
}
