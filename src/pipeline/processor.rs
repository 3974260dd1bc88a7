//! Per-image identification pipeline.

use super::IdentifiedInsect;
use crate::config::PipelineConfig;
use crate::error::{Error, Result};
use crate::imaging::{DecodedImage, crop_or_pad, limit_longer_side};
use crate::inference::{IdentificationCandidate, InsectDetector, InsectIdentifier};
use crate::taxonomy::TaxonomyLookup;
use std::sync::Arc;
use tracing::{debug, info};

/// Runs one decoded image through detection, identification and taxonomy
/// enrichment.
///
/// Holds only shared read-only collaborators, so one instance serves every
/// request.
#[derive(Clone)]
pub struct IdentificationPipeline {
    detector: Arc<dyn InsectDetector>,
    identifier: Arc<dyn InsectIdentifier>,
    taxonomy: Arc<dyn TaxonomyLookup>,
    settings: PipelineConfig,
}

impl IdentificationPipeline {
    /// Assemble a pipeline from loaded collaborators.
    pub fn new(
        detector: Arc<dyn InsectDetector>,
        identifier: Arc<dyn InsectIdentifier>,
        taxonomy: Arc<dyn TaxonomyLookup>,
        settings: PipelineConfig,
    ) -> Self {
        Self {
            detector,
            identifier,
            taxonomy,
            settings,
        }
    }

    /// Pipeline settings.
    pub fn settings(&self) -> &PipelineConfig {
        &self.settings
    }

    /// Identify every sufficiently large insect in `image`.
    ///
    /// Results keep detector order. Detections narrower or shorter than
    /// `min_box_side`, and crops the identifier has no candidates for, are
    /// skipped. Only collaborator errors are returned; taxonomy failures
    /// leave `gbif_id` empty.
    pub async fn process(&self, image: DecodedImage) -> Result<Vec<IdentifiedInsect>> {
        let original = (image.width(), image.height());
        let image = Arc::new(limit_longer_side(image, self.settings.max_image_side));
        if (image.width(), image.height()) != original {
            debug!(
                "Resized image from {}x{} to {}x{}",
                original.0,
                original.1,
                image.width(),
                image.height()
            );
        }

        let detector = Arc::clone(&self.detector);
        let detect_input = Arc::clone(&image);
        let detections = run_blocking(move || detector.detect(&detect_input)).await?;
        debug!("Detector returned {} detection(s)", detections.len());

        let min_side = self.settings.min_box_side;
        let mut insects = Vec::new();

        for detection in detections {
            let bbox = detection.pixel_box();
            if bbox.width() < min_side || bbox.height() < min_side {
                debug!(
                    "Skipping {}x{} detection at ({}, {})",
                    bbox.width(),
                    bbox.height(),
                    bbox.x1,
                    bbox.y1
                );
                continue;
            }

            let crop = crop_or_pad(&image, bbox.x1, bbox.y1, bbox.x2, bbox.y2);
            let identifier = Arc::clone(&self.identifier);
            let candidates = run_blocking(move || identifier.identify(&crop)).await?;

            let Some(top) = candidates.into_iter().next() else {
                debug!("Identifier returned no candidates for box {:?}", bbox);
                continue;
            };
            check_probability(&top)?;

            let gbif_id = if top.is_unknown() {
                None
            } else {
                self.taxonomy.species_key(&top.latin_name).await
            };

            info!(
                "Identified {} (p={:.4}, gbif_id={:?})",
                top.latin_name, top.probability, gbif_id
            );
            insects.push(IdentifiedInsect {
                probability: top.probability,
                latin_name: top.latin_name,
                gbif_id,
            });
        }

        Ok(insects)
    }
}

fn check_probability(candidate: &IdentificationCandidate) -> Result<()> {
    if candidate.probability.is_finite() && (0.0..=1.0).contains(&candidate.probability) {
        Ok(())
    } else {
        Err(Error::Inference {
            reason: format!(
                "identifier returned probability {} for '{}'",
                candidate.probability, candidate.latin_name
            ),
        })
    }
}

/// Run CPU-bound model inference off the async worker threads.
async fn run_blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::Internal {
            message: format!("inference task failed: {e}"),
        })?
}
