/// Bounding box expressed as fractions of the image size, origin top-left.
///
/// OCR services do not guarantee `left + width <= 1`, nor even that the
/// values are non-negative, so nothing here is validated on construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedBox {
    /// Left edge as a fraction of image width.
    pub left: f64,
    /// Top edge as a fraction of image height.
    pub top: f64,
    /// Width as a fraction of image width.
    pub width: f64,
    /// Height as a fraction of image height.
    pub height: f64,
}

impl NormalizedBox {
    /// Box from its four fractions, unchecked.
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }
}

/// Pixel rectangle covering `[x, x + width) × [y, y + height)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    /// Left column.
    pub x: u32,
    /// Top row.
    pub y: u32,
    /// Columns covered.
    pub width: u32,
    /// Rows covered.
    pub height: u32,
}

impl PixelRect {
    /// Zero-area rectangles contribute nothing to a mask.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Whether pixel `(px, py)` falls inside. Right and bottom edges are exclusive.
    pub fn contains(&self, px: u32, py: u32) -> bool {
        px >= self.x && px - self.x < self.width && py >= self.y && py - self.y < self.height
    }
}

/// Map a normalized box onto an image of the given size.
///
/// Offsets and extents are truncated (not rounded), then the origin is clamped
/// into the image and the extent is cut back so the rectangle ends at or before
/// the image edge.
pub fn to_pixel_rect(bbox: &NormalizedBox, image_width: u32, image_height: u32) -> PixelRect {
    let (x, width) = clamp_span(bbox.left, bbox.width, image_width);
    let (y, height) = clamp_span(bbox.top, bbox.height, image_height);
    PixelRect {
        x,
        y,
        width,
        height,
    }
}

/// Truncate one axis of a box and fit it into `[0, dimension)`.
fn clamp_span(offset: f64, extent: f64, dimension: u32) -> (u32, u32) {
    if dimension == 0 {
        return (0, 0);
    }
    let dim = dimension as f64;

    // `as` saturates and maps NaN to zero
    let start = ((dim * offset).floor() as i64).clamp(0, dimension as i64 - 1) as u32;
    let length = ((dim * extent).floor() as i64).max(0) as u64;
    let length = length.min((dimension - start) as u64) as u32;

    (start, length)
}
