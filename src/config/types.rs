//! Configuration type definitions.

use crate::constants::{
    DEFAULT_MAX_IMAGE_SIDE, DEFAULT_MIN_BOX_SIDE, DEFAULT_MIN_CONFIDENCE, gbif, models, server,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,

    /// Detection and identification model settings.
    pub models: ModelsConfig,

    /// Identification pipeline settings.
    pub pipeline: PipelineConfig,

    /// Taxonomy lookup settings.
    pub taxonomy: TaxonomyConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,

    /// Listening port.
    pub port: u16,

    /// Verbose diagnostics.
    pub debug: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: server::DEFAULT_HOST.to_string(),
            port: server::DEFAULT_PORT,
            debug: false,
        }
    }
}

/// Model file locations and adapter parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// Path to the ONNX detection model.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detector: Option<PathBuf>,

    /// Path to the ONNX identification model.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<PathBuf>,

    /// Path to the identification labels file.
    ///
    /// Defaults to `<identifier>.labels.txt` next to the identification model.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<PathBuf>,

    /// Square input side of the detection model.
    pub detector_input_size: u32,

    /// Minimum detection score kept by the detector.
    pub detector_confidence: f32,

    /// IoU threshold for non-maximum suppression.
    pub detector_iou: f32,

    /// Square input side of the identification model.
    pub identifier_input_size: u32,

    /// Top probabilities below this are reported as "Unknown".
    pub unknown_below: f32,

    /// Intra-op threads per ONNX session.
    pub threads: usize,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            detector: None,
            identifier: None,
            labels: None,
            detector_input_size: models::DEFAULT_DETECTOR_INPUT_SIZE,
            detector_confidence: models::DEFAULT_DETECTOR_CONFIDENCE,
            detector_iou: models::DEFAULT_DETECTOR_IOU,
            identifier_input_size: models::DEFAULT_IDENTIFIER_INPUT_SIZE,
            unknown_below: models::DEFAULT_UNKNOWN_BELOW,
            threads: 1,
        }
    }
}

impl ModelsConfig {
    /// Labels path, falling back to the file next to the identification model.
    pub fn labels_path(&self) -> Option<PathBuf> {
        self.labels.clone().or_else(|| {
            self.identifier
                .as_ref()
                .map(|model| model.with_extension("labels.txt"))
        })
    }
}

/// Identification pipeline settings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Longer image side above which images are downscaled.
    pub max_image_side: u32,

    /// Minimum width and height of a detection box, in pixels.
    pub min_box_side: i32,

    /// Minimum top probability for a successful response.
    pub min_confidence: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_image_side: DEFAULT_MAX_IMAGE_SIDE,
            min_box_side: DEFAULT_MIN_BOX_SIDE,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
        }
    }
}

/// GBIF taxonomy lookup settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxonomyConfig {
    /// Look up GBIF keys at all.
    pub enabled: bool,

    /// Species search endpoint.
    pub base_url: String,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for TaxonomyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: gbif::DEFAULT_BASE_URL.to_string(),
            timeout_secs: gbif::DEFAULT_TIMEOUT_SECS,
        }
    }
}
