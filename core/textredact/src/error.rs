use thiserror::Error;

/// Where in the redaction flow an error originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Reading the upload event.
    Event,
    /// Moving bytes in or out of the object store.
    Storage,
    /// Turning bytes into pixels.
    Decode,
    /// Asking the OCR service for text regions.
    Detection,
    /// Mapping boxes onto the pixel grid.
    Geometry,
    /// Blurring and pasting.
    Compositing,
    /// Turning pixels back into bytes.
    Encode,
    /// Publishing the report.
    Notification,
}

impl Stage {
    /// Stable lowercase name used in log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Event => "event",
            Stage::Storage => "storage",
            Stage::Decode => "decode",
            Stage::Detection => "detection",
            Stage::Geometry => "geometry",
            Stage::Compositing => "compositing",
            Stage::Encode => "encode",
            Stage::Notification => "notification",
        }
    }
}

/// Everything that can go wrong while redacting one image.
#[derive(Debug, Error)]
pub enum RedactError {
    /// The bytes are not a readable image.
    #[error("failed to decode image: {0}")]
    ImageDecode(String),

    /// The image or requested output format is not PNG, JPEG or WebP.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// The image is zero pixels wide or tall.
    #[error("image dimensions are zero")]
    ZeroDimensions,

    /// A region could not be placed on the pixel grid.
    #[error("invalid geometry: {0}")]
    Geometry(String),

    /// Blur or paste failed, e.g. mask and image disagree in size.
    #[error("compositing failed: {0}")]
    Compositing(String),

    /// The redacted image could not be written out.
    #[error("failed to encode image: {0}")]
    Encode(String),

    /// JPEG quality outside 1..=100.
    #[error("quality must be between 1 and 100, got {0}")]
    InvalidQuality(u8),

    /// The OCR collaborator failed or returned an unreadable response.
    #[error("text detection failed: {0}")]
    Detection(String),

    /// A get, put, copy or delete against the object store failed.
    #[error("object store request failed: {0}")]
    Storage(String),

    /// The notifier could not deliver a message.
    #[error("notification failed: {0}")]
    Notification(String),

    /// The upload event payload could not be parsed.
    #[error("malformed upload event: {0}")]
    Event(String),
}

impl RedactError {
    /// The stage this error belongs to.
    pub fn stage(&self) -> Stage {
        match self {
            RedactError::ImageDecode(_) | RedactError::UnsupportedFormat(_) => Stage::Decode,
            RedactError::ZeroDimensions | RedactError::Geometry(_) => Stage::Geometry,
            RedactError::Compositing(_) => Stage::Compositing,
            RedactError::Encode(_) | RedactError::InvalidQuality(_) => Stage::Encode,
            RedactError::Detection(_) => Stage::Detection,
            RedactError::Storage(_) => Stage::Storage,
            RedactError::Notification(_) => Stage::Notification,
            RedactError::Event(_) => Stage::Event,
        }
    }

    /// Short machine-readable error kind for structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            RedactError::ImageDecode(_) => "image_decode",
            RedactError::UnsupportedFormat(_) => "unsupported_format",
            RedactError::ZeroDimensions => "zero_dimensions",
            RedactError::Geometry(_) => "geometry",
            RedactError::Compositing(_) => "compositing",
            RedactError::Encode(_) => "encode",
            RedactError::InvalidQuality(_) => "invalid_quality",
            RedactError::Detection(_) => "detection",
            RedactError::Storage(_) => "storage",
            RedactError::Notification(_) => "notification",
            RedactError::Event(_) => "event",
        }
    }
}
