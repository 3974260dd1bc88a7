//! Configuration validation.

use crate::config::{Config, ModelsConfig};
use crate::constants::confidence;
use crate::error::{Error, Result};
use std::path::PathBuf;

/// Validate the entire configuration.
pub fn validate_config(config: &Config) -> Result<()> {
    validate_pipeline(config)?;
    validate_models(&config.models)?;
    validate_taxonomy(config)?;
    Ok(())
}

fn invalid(message: String) -> Error {
    Error::ConfigValidation { message }
}

fn check_unit_range(name: &str, value: f64) -> Result<()> {
    if !(confidence::MIN..=confidence::MAX).contains(&value) {
        return Err(invalid(format!(
            "{name} must be between {} and {}, got {value}",
            confidence::MIN,
            confidence::MAX
        )));
    }
    Ok(())
}

fn validate_pipeline(config: &Config) -> Result<()> {
    let pipeline = &config.pipeline;

    check_unit_range("pipeline.min_confidence", pipeline.min_confidence)?;

    if pipeline.max_image_side == 0 {
        return Err(invalid("pipeline.max_image_side must be at least 1".to_string()));
    }

    if pipeline.min_box_side < 0 {
        return Err(invalid(format!(
            "pipeline.min_box_side must be non-negative, got {}",
            pipeline.min_box_side
        )));
    }

    Ok(())
}

fn validate_models(models: &ModelsConfig) -> Result<()> {
    check_unit_range(
        "models.detector_confidence",
        f64::from(models.detector_confidence),
    )?;
    check_unit_range("models.detector_iou", f64::from(models.detector_iou))?;
    check_unit_range("models.unknown_below", f64::from(models.unknown_below))?;

    if models.detector_input_size == 0 || models.identifier_input_size == 0 {
        return Err(invalid("model input sizes must be at least 1".to_string()));
    }

    if models.threads == 0 {
        return Err(invalid("models.threads must be at least 1".to_string()));
    }

    Ok(())
}

fn validate_taxonomy(config: &Config) -> Result<()> {
    let taxonomy = &config.taxonomy;
    if !taxonomy.enabled {
        return Ok(());
    }

    if taxonomy.base_url.trim().is_empty() {
        return Err(invalid("taxonomy.base_url must not be empty".to_string()));
    }

    if taxonomy.timeout_secs == 0 {
        return Err(invalid("taxonomy.timeout_secs must be at least 1".to_string()));
    }

    Ok(())
}

/// Resolved, existing model file paths ready for loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPaths {
    /// Detection model.
    pub detector: PathBuf,
    /// Identification model.
    pub identifier: PathBuf,
    /// Identification labels.
    pub labels: PathBuf,
}

/// Check that every model file the server needs is configured and exists.
pub fn resolve_model_paths(models: &ModelsConfig) -> Result<ModelPaths> {
    let detector = models
        .detector
        .clone()
        .ok_or(Error::ModelNotConfigured { kind: "detector" })?;
    let identifier = models
        .identifier
        .clone()
        .ok_or(Error::ModelNotConfigured { kind: "identifier" })?;

    if !detector.exists() {
        return Err(Error::ModelFileNotFound { path: detector });
    }
    if !identifier.exists() {
        return Err(Error::ModelFileNotFound { path: identifier });
    }

    let labels = models
        .labels_path()
        .ok_or(Error::ModelNotConfigured { kind: "identifier" })?;
    if !labels.exists() {
        return Err(Error::LabelsFileNotFound { path: labels });
    }

    Ok(ModelPaths {
        detector,
        identifier,
        labels,
    })
}
