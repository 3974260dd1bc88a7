//! Records exchanged with the detection and identification models.

use crate::constants::UNKNOWN_SPECIES;
use crate::error::Result;
use crate::imaging::DecodedImage;

/// One candidate region reported by the detection model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    /// `[x1, y1, x2, y2]` in pixels of the image passed to the detector.
    pub bbox: [f32; 4],
    /// Detection score in `[0, 1]`.
    pub confidence: f32,
    /// Detector class index.
    pub class_index: usize,
}

impl Detection {
    /// Create a detection.
    pub const fn new(bbox: [f32; 4], confidence: f32, class_index: usize) -> Self {
        Self {
            bbox,
            confidence,
            class_index,
        }
    }

    /// Box corners truncated toward zero.
    #[allow(clippy::cast_possible_truncation)]
    pub fn pixel_box(&self) -> PixelBox {
        let [x1, y1, x2, y2] = self.bbox;
        PixelBox {
            x1: x1 as i32,
            y1: y1 as i32,
            x2: x2 as i32,
            y2: y2 as i32,
        }
    }
}

/// Integer box corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelBox {
    /// Left edge.
    pub x1: i32,
    /// Top edge.
    pub y1: i32,
    /// Right edge.
    pub x2: i32,
    /// Bottom edge.
    pub y2: i32,
}

impl PixelBox {
    /// `x2 - x1`.
    pub const fn width(&self) -> i32 {
        self.x2.saturating_sub(self.x1)
    }

    /// `y2 - y1`.
    pub const fn height(&self) -> i32 {
        self.y2.saturating_sub(self.y1)
    }
}

/// A species hypothesis for a cropped region.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentificationCandidate {
    /// Probability in `[0, 1]`.
    pub probability: f64,
    /// Scientific name, or [`UNKNOWN_SPECIES`].
    pub latin_name: String,
}

impl IdentificationCandidate {
    /// Create a candidate.
    pub fn new(probability: f64, latin_name: impl Into<String>) -> Self {
        Self {
            probability,
            latin_name: latin_name.into(),
        }
    }

    /// Candidate for a region the model could not name.
    pub fn unknown(probability: f64) -> Self {
        Self::new(probability, UNKNOWN_SPECIES)
    }

    /// Whether this is the "Unknown" sentinel.
    pub fn is_unknown(&self) -> bool {
        self.latin_name == UNKNOWN_SPECIES
    }
}

/// Finds insects in an image.
///
/// Implementations are loaded once and shared across requests.
pub trait InsectDetector: Send + Sync {
    /// Detections in model order.
    fn detect(&self, image: &DecodedImage) -> Result<Vec<Detection>>;
}

/// Names the insect in a cropped region.
///
/// Implementations are loaded once and shared across requests.
pub trait InsectIdentifier: Send + Sync {
    /// Candidates sorted by descending probability; may be empty.
    fn identify(&self, image: &DecodedImage) -> Result<Vec<IdentificationCandidate>>;
}
