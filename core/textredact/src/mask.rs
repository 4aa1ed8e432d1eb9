use image::{GrayImage, Luma};

use crate::geometry::PixelRect;

/// Mask value selecting the original pixel.
pub const KEEP: u8 = 0;

/// Mask value selecting the blurred pixel.
pub const BLUR: u8 = 255;

/// Single-channel selector the same size as the image being redacted.
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    pixels: GrayImage,
}

impl Mask {
    /// All-[`KEEP`] mask of the given size.
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            pixels: GrayImage::from_pixel(width, height, Luma([KEEP])),
        }
    }

    /// Mask width in pixels.
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Mask height in pixels.
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// `(width, height)`.
    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    /// Whether the pixel at `(x, y)` will be blurred.
    pub fn is_set(&self, x: u32, y: u32) -> bool {
        self.pixels.get_pixel(x, y).0[0] == BLUR
    }

    /// True when no pixel is selected, i.e. compositing is the identity.
    pub fn is_clear(&self) -> bool {
        self.pixels.as_raw().iter().all(|&v| v == KEEP)
    }

    /// Number of selected pixels.
    pub fn coverage(&self) -> usize {
        self.pixels.as_raw().iter().filter(|&&v| v == BLUR).count()
    }

    /// Paint `rect` at full intensity. Pixels already set stay set.
    ///
    /// Rectangles reaching outside the mask are cut back to its bounds.
    pub fn paint(&mut self, rect: &PixelRect) {
        if rect.is_empty() {
            return;
        }
        let (width, height) = self.dimensions();
        let x_end = rect.x.saturating_add(rect.width).min(width);
        let y_end = rect.y.saturating_add(rect.height).min(height);

        for y in rect.y..y_end {
            for x in rect.x..x_end {
                self.pixels.put_pixel(x, y, Luma([BLUR]));
            }
        }
    }

    /// Borrow the underlying 8-bit buffer.
    pub fn as_gray(&self) -> &GrayImage {
        &self.pixels
    }
}

/// Union of `rects` painted into a `width` × `height` mask.
pub fn build_mask(width: u32, height: u32, rects: &[PixelRect]) -> Mask {
    let mut mask = Mask::empty(width, height);
    for rect in rects {
        mask.paint(rect);
    }
    mask
}
