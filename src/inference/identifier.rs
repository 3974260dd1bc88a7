//! ONNX-backed species identifier (image classifier over a labels file).

use super::labels::read_labels;
use super::session::{OnnxSession, TensorOutput};
use super::types::{IdentificationCandidate, InsectIdentifier};
use crate::constants::models::{IMAGENET_MEAN, IMAGENET_STD, TOP_K};
use crate::error::{Error, Result};
use crate::imaging::DecodedImage;
use image::imageops::{self, FilterType};
use std::path::Path;

/// Identifier parameters.
#[derive(Debug, Clone, Copy)]
pub struct IdentifierOptions {
    /// Square model input side.
    pub input_size: u32,
    /// Top probabilities below this are reported as "Unknown".
    pub unknown_below: f32,
    /// Intra-op threads.
    pub threads: usize,
}

/// Species identifier running a pre-built ONNX classification model.
///
/// Expects input `[1, 3, S, S]` (RGB, `ImageNet` normalized) and output
/// `[1, classes]` logits aligned with the labels file.
pub struct OnnxInsectIdentifier {
    session: OnnxSession,
    labels: Vec<String>,
    options: IdentifierOptions,
}

impl OnnxInsectIdentifier {
    /// Load the identification model and its labels.
    pub fn load(model: &Path, labels: &Path, options: IdentifierOptions) -> Result<Self> {
        let labels = read_labels(labels)?;
        Ok(Self {
            session: OnnxSession::load(model, options.threads)?,
            labels,
            options,
        })
    }
}

impl InsectIdentifier for OnnxInsectIdentifier {
    fn identify(&self, image: &DecodedImage) -> Result<Vec<IdentificationCandidate>> {
        if image.width() == 0 || image.height() == 0 {
            return Ok(Vec::new());
        }

        let size = self.options.input_size;
        let tensor = normalize(image, size);
        let side = size as usize;
        let output = self.session.run([1, 3, side, side], &tensor)?;

        rank(&output, &self.labels, self.options.unknown_below)
    }
}

#[allow(clippy::cast_possible_truncation)]
fn normalize(image: &DecodedImage, size: u32) -> Vec<f32> {
    let resized = imageops::resize(&image.to_rgb(), size, size, FilterType::Triangle);
    let plane = (size * size) as usize;
    let mut tensor = vec![0.0f32; 3 * plane];
    for (i, pixel) in resized.pixels().enumerate() {
        for (c, value) in pixel.0.iter().enumerate() {
            tensor[c * plane + i] = (f32::from(*value) / 255.0 - IMAGENET_MEAN[c]) / IMAGENET_STD[c];
        }
    }
    tensor
}

fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&l| (l - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

fn rank(
    output: &TensorOutput,
    labels: &[String],
    unknown_below: f32,
) -> Result<Vec<IdentificationCandidate>> {
    if output.data.len() != labels.len() {
        return Err(Error::Inference {
            reason: format!(
                "identifier produced {} scores for {} labels (shape {:?})",
                output.data.len(),
                labels.len(),
                output.shape
            ),
        });
    }

    let probabilities = softmax(&output.data);
    let mut order: Vec<usize> = (0..probabilities.len()).collect();
    order.sort_by(|&a, &b| probabilities[b].total_cmp(&probabilities[a]));
    order.truncate(TOP_K);

    let mut candidates: Vec<IdentificationCandidate> = order
        .into_iter()
        .map(|i| IdentificationCandidate::new(f64::from(probabilities[i]), labels[i].clone()))
        .collect();

    if let Some(top) = candidates.first_mut()
        && top.probability < f64::from(unknown_below)
    {
        *top = IdentificationCandidate::unknown(top.probability);
    }

    Ok(candidates)
}
