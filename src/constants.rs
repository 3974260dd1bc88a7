//! Application-wide constants.
//!
//! All magic numbers and strings are defined here to ensure consistency
//! and make changes easy to track.

/// Application name used for config directories and user-facing messages.
pub const APP_NAME: &str = "insectid-api";

/// Species name reported by the identification model when it cannot
/// commit to a species. Never sent to the taxonomy service.
pub const UNKNOWN_SPECIES: &str = "Unknown";

/// Images whose longer side exceeds this are downscaled before detection.
pub const DEFAULT_MAX_IMAGE_SIDE: u32 = 1280;

/// Detections narrower or shorter than this (in pixels) are discarded.
pub const DEFAULT_MIN_BOX_SIDE: i32 = 30;

/// Minimum top probability across all insects for a successful response.
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.10;

/// Confidence range limits.
pub mod confidence {
    /// Minimum valid confidence value.
    pub const MIN: f64 = 0.0;
    /// Maximum valid confidence value.
    pub const MAX: f64 = 1.0;
}

/// HTTP server defaults.
pub mod server {
    /// Default bind address.
    pub const DEFAULT_HOST: &str = "0.0.0.0";
    /// Default listening port.
    pub const DEFAULT_PORT: u16 = 5000;
    /// Identification endpoint path.
    pub const IDENTIFY_PATH: &str = "/api/v1/identify";
    /// Liveness endpoint path.
    pub const HEALTH_PATH: &str = "/health";
    /// Upper bound on request bodies (base64 images are large).
    pub const MAX_BODY_BYTES: usize = 64 * 1024 * 1024;
}

/// GBIF species lookup defaults.
pub mod gbif {
    /// Species search endpoint.
    pub const DEFAULT_BASE_URL: &str = "https://api.gbif.org/v1/species";
    /// Request timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
    /// Page offset sent with each lookup.
    pub const OFFSET: u32 = 0;
    /// Only the best match is needed.
    pub const LIMIT: u32 = 1;
}

/// ONNX model adapter defaults.
pub mod models {
    /// Square input side of the detection model.
    pub const DEFAULT_DETECTOR_INPUT_SIZE: u32 = 640;
    /// Detections below this score are dropped by the detector adapter.
    pub const DEFAULT_DETECTOR_CONFIDENCE: f32 = 0.5;
    /// IoU above which overlapping boxes are suppressed.
    pub const DEFAULT_DETECTOR_IOU: f32 = 0.5;
    /// Square input side of the identification model.
    pub const DEFAULT_IDENTIFIER_INPUT_SIZE: u32 = 224;
    /// Top probabilities below this are reported as [`super::UNKNOWN_SPECIES`].
    pub const DEFAULT_UNKNOWN_BELOW: f32 = 0.10;
    /// Number of candidates returned per crop.
    pub const TOP_K: usize = 5;
    /// Letterbox fill value (grey, as used when the detector was trained).
    pub const LETTERBOX_FILL: u8 = 114;
    /// `ImageNet` channel means, RGB order.
    pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
    /// `ImageNet` channel standard deviations, RGB order.
    pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];
}

/// `status_message` values returned to clients.
pub mod status {
    /// Successful identification.
    pub const SUCCESS: &str = "Success";
    /// Body is not JSON.
    pub const INVALID_CONTENT_TYPE: &str = "Invalid content type";
    /// `custom_id` or `image_base64` missing.
    pub const MISSING_FIELDS: &str = "Missing required fields";
    /// Image payload could not be decoded.
    pub const DECODE_FAILED: &str = "Failed to decode image";
    /// Pipeline returned nothing.
    pub const NO_INSECTS: &str = "No insects found";
    /// Best probability under the threshold.
    pub const LOW_CONFIDENCE: &str = "Low confidence identification";
    /// Unexpected internal failure.
    pub const PROCESSING_FAILED: &str = "Processing failed";
    /// Liveness response value.
    pub const HEALTHY: &str = "healthy";
}
