//! ONNX-backed insect detector (YOLO-style single-stage model).

use super::session::{OnnxSession, TensorOutput};
use super::types::{Detection, InsectDetector};
use crate::constants::models::LETTERBOX_FILL;
use crate::error::{Error, Result};
use crate::imaging::DecodedImage;
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use std::path::Path;
use tracing::debug;

/// Detector parameters.
#[derive(Debug, Clone, Copy)]
pub struct DetectorOptions {
    /// Square model input side.
    pub input_size: u32,
    /// Minimum `objectness * class score`.
    pub confidence: f32,
    /// IoU above which the weaker of two boxes is suppressed.
    pub iou: f32,
    /// Intra-op threads.
    pub threads: usize,
}

/// Insect detector running a pre-built ONNX model.
///
/// Expects input `[1, 3, S, S]` (RGB, scaled to `[0, 1]`, letterboxed) and
/// output `[1, N, 5 + classes]` rows of `cx, cy, w, h, objectness, scores...`
/// in input pixel space.
pub struct OnnxInsectDetector {
    session: OnnxSession,
    options: DetectorOptions,
}

impl OnnxInsectDetector {
    /// Load the detection model.
    pub fn load(path: &Path, options: DetectorOptions) -> Result<Self> {
        Ok(Self {
            session: OnnxSession::load(path, options.threads)?,
            options,
        })
    }
}

impl InsectDetector for OnnxInsectDetector {
    fn detect(&self, image: &DecodedImage) -> Result<Vec<Detection>> {
        let size = self.options.input_size;
        let letterbox = Letterbox::new(image, size);
        let side = size as usize;
        let output = self.session.run([1, 3, side, side], &letterbox.tensor)?;

        let candidates = decode_rows(&output, self.options.confidence, &letterbox, image)?;
        let detections = non_max_suppression(candidates, self.options.iou);
        debug!("Detector kept {} box(es) after NMS", detections.len());
        Ok(detections)
    }
}

/// Letterboxed model input plus the transform back to image space.
#[derive(Debug)]
struct Letterbox {
    tensor: Vec<f32>,
    scale: f32,
    pad_x: f32,
    pad_y: f32,
}

impl Letterbox {
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn new(image: &DecodedImage, size: u32) -> Self {
        let (w, h) = (image.width().max(1), image.height().max(1));
        let scale = (size as f32 / w as f32).min(size as f32 / h as f32);
        let new_w = ((w as f32 * scale).round() as u32).clamp(1, size);
        let new_h = ((h as f32 * scale).round() as u32).clamp(1, size);
        let pad_x = (size - new_w) / 2;
        let pad_y = (size - new_h) / 2;

        let resized = imageops::resize(&image.to_rgb(), new_w, new_h, FilterType::Triangle);
        let mut canvas = RgbImage::from_pixel(size, size, Rgb([LETTERBOX_FILL; 3]));
        imageops::replace(&mut canvas, &resized, i64::from(pad_x), i64::from(pad_y));

        let plane = (size * size) as usize;
        let mut tensor = vec![0.0f32; 3 * plane];
        for (i, pixel) in canvas.pixels().enumerate() {
            for (c, value) in pixel.0.iter().enumerate() {
                tensor[c * plane + i] = f32::from(*value) / 255.0;
            }
        }

        Self {
            tensor,
            scale,
            pad_x: pad_x as f32,
            pad_y: pad_y as f32,
        }
    }

    fn to_image(&self, x: f32, y: f32) -> (f32, f32) {
        ((x - self.pad_x) / self.scale, (y - self.pad_y) / self.scale)
    }
}

#[allow(clippy::cast_precision_loss, clippy::cast_sign_loss)]
fn decode_rows(
    output: &TensorOutput,
    min_confidence: f32,
    letterbox: &Letterbox,
    image: &DecodedImage,
) -> Result<Vec<Detection>> {
    let stride = match output.shape.as_slice() {
        [1, _, stride] if *stride > 5 => *stride as usize,
        other => {
            return Err(Error::Inference {
                reason: format!("unexpected detector output shape {other:?}"),
            });
        }
    };

    let max_x = image.width().saturating_sub(1) as f32;
    let max_y = image.height().saturating_sub(1) as f32;

    let mut detections = Vec::new();
    for row in output.data.chunks_exact(stride) {
        let objectness = row[4];
        let Some((class_index, class_score)) = row[5..]
            .iter()
            .copied()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(&b.1))
        else {
            continue;
        };

        let confidence = objectness * class_score;
        if confidence < min_confidence {
            continue;
        }

        let (cx, cy, w, h) = (row[0], row[1], row[2], row[3]);
        let (x1, y1) = letterbox.to_image(cx - w / 2.0, cy - h / 2.0);
        let (x2, y2) = letterbox.to_image(cx + w / 2.0, cy + h / 2.0);
        detections.push(Detection::new(
            [
                x1.clamp(0.0, max_x),
                y1.clamp(0.0, max_y),
                x2.clamp(0.0, max_x),
                y2.clamp(0.0, max_y),
            ],
            confidence,
            class_index,
        ));
    }

    Ok(detections)
}

/// Greedy class-agnostic NMS; output is sorted by descending confidence.
fn non_max_suppression(mut detections: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut kept: Vec<Detection> = Vec::with_capacity(detections.len());
    for detection in detections {
        if kept
            .iter()
            .all(|k| iou(&k.bbox, &detection.bbox) <= iou_threshold)
        {
            kept.push(detection);
        }
    }
    kept
}

fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let area = |r: &[f32; 4]| (r[2] - r[0]).max(0.0) * (r[3] - r[1]).max(0.0);
    let inter_w = (a[2].min(b[2]) - a[0].max(b[0])).max(0.0);
    let inter_h = (a[3].min(b[3]) - a[1].max(b[1])).max(0.0);
    let inter = inter_w * inter_h;
    let union = area(a) + area(b) - inter;
    if union <= 0.0 { 0.0 } else { inter / union }
}
