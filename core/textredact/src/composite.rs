use image::{imageops, RgbImage};

use crate::error::RedactError;
use crate::mask::Mask;

/// Gaussian blur strength applied to every redacted region.
///
/// Large enough that text of any size becomes illegible while faces
/// around it stay recognizable. Not scaled by region or image size.
pub const BLUR_RADIUS: f32 = 52.0;

/// Blur the whole of `source` once, then take blurred pixels where the mask
/// is set and original pixels everywhere else.
///
/// An all-clear mask returns an untouched copy without running the blur.
pub fn composite(source: &RgbImage, mask: &Mask) -> Result<RgbImage, RedactError> {
    if source.dimensions() != mask.dimensions() {
        return Err(RedactError::Compositing(format!(
            "mask is {}x{} but image is {}x{}",
            mask.width(),
            mask.height(),
            source.width(),
            source.height()
        )));
    }
    if mask.is_clear() {
        return Ok(source.clone());
    }

    let blurred = imageops::blur(source, BLUR_RADIUS);
    let mut output = source.clone();
    for (x, y, pixel) in output.enumerate_pixels_mut() {
        if mask.is_set(x, y) {
            *pixel = *blurred.get_pixel(x, y);
        }
    }

    Ok(output)
}
