//! Shared fakes and fixtures for integration tests.

#![allow(dead_code, clippy::unwrap_used)]

use async_trait::async_trait;
use axum::Json;
use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use insectid_api::config::PipelineConfig;
use insectid_api::imaging::DecodedImage;
use insectid_api::inference::{
    Detection, IdentificationCandidate, InsectDetector, InsectIdentifier,
};
use insectid_api::pipeline::IdentificationPipeline;
use insectid_api::taxonomy::TaxonomyLookup;
use insectid_api::{Error, Result};
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

/// PNG of the given size, base64 encoded.
pub fn png_base64(width: u32, height: u32) -> String {
    let rgb = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 251) as u8, (y % 241) as u8, 128])
    });
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(rgb)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    STANDARD.encode(bytes)
}

/// Detector returning a fixed list and recording input sizes.
#[derive(Default)]
pub struct FakeDetector {
    detections: Vec<Detection>,
    pub seen_sizes: Mutex<Vec<(u32, u32)>>,
}

impl FakeDetector {
    pub fn new(detections: Vec<Detection>) -> Self {
        Self {
            detections,
            seen_sizes: Mutex::new(Vec::new()),
        }
    }

    pub fn single(bbox: [f32; 4]) -> Self {
        Self::new(vec![Detection::new(bbox, 0.9, 0)])
    }
}

impl InsectDetector for FakeDetector {
    fn detect(&self, image: &DecodedImage) -> Result<Vec<Detection>> {
        self.seen_sizes
            .lock()
            .unwrap()
            .push((image.width(), image.height()));
        Ok(self.detections.clone())
    }
}

/// Detector that always fails.
pub struct FailingDetector;

impl InsectDetector for FailingDetector {
    fn detect(&self, _image: &DecodedImage) -> Result<Vec<Detection>> {
        Err(Error::Inference {
            reason: "model exploded".to_string(),
        })
    }
}

/// Detector that panics.
pub struct PanickingDetector;

impl InsectDetector for PanickingDetector {
    fn detect(&self, _image: &DecodedImage) -> Result<Vec<Detection>> {
        panic!("detector panicked")
    }
}

/// Identifier answering from a queue, then repeating `fallback`.
pub struct FakeIdentifier {
    queue: Mutex<VecDeque<Vec<IdentificationCandidate>>>,
    fallback: Vec<IdentificationCandidate>,
    pub crop_sizes: Mutex<Vec<(u32, u32)>>,
}

impl FakeIdentifier {
    pub fn fixed(candidates: Vec<IdentificationCandidate>) -> Self {
        Self::sequence(Vec::new(), candidates)
    }

    pub fn top(probability: f64, latin_name: &str) -> Self {
        Self::fixed(vec![IdentificationCandidate::new(probability, latin_name)])
    }

    pub fn sequence(
        answers: Vec<Vec<IdentificationCandidate>>,
        fallback: Vec<IdentificationCandidate>,
    ) -> Self {
        Self {
            queue: Mutex::new(answers.into()),
            fallback,
            crop_sizes: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.crop_sizes.lock().unwrap().len()
    }
}

impl InsectIdentifier for FakeIdentifier {
    fn identify(&self, image: &DecodedImage) -> Result<Vec<IdentificationCandidate>> {
        self.crop_sizes
            .lock()
            .unwrap()
            .push((image.width(), image.height()));
        let next = self.queue.lock().unwrap().pop_front();
        Ok(next.unwrap_or_else(|| self.fallback.clone()))
    }
}

/// Taxonomy lookup backed by a map, counting calls.
#[derive(Default)]
pub struct FakeTaxonomy {
    keys: HashMap<String, i64>,
    calls: AtomicUsize,
}

impl FakeTaxonomy {
    pub fn with(entries: &[(&str, i64)]) -> Self {
        Self {
            keys: entries
                .iter()
                .map(|(name, key)| ((*name).to_string(), *key))
                .collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TaxonomyLookup for FakeTaxonomy {
    async fn species_key(&self, latin_name: &str) -> Option<i64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.keys.get(latin_name).copied()
    }
}

/// Pipeline with default settings around the given collaborators.
pub fn pipeline(
    detector: Arc<dyn InsectDetector>,
    identifier: Arc<dyn InsectIdentifier>,
    taxonomy: Arc<dyn TaxonomyLookup>,
) -> IdentificationPipeline {
    IdentificationPipeline::new(detector, identifier, taxonomy, PipelineConfig::default())
}

/// Query strings received by the GBIF stub.
pub type SeenQueries = Arc<Mutex<Vec<HashMap<String, String>>>>;

/// Start a local stand-in for the GBIF species search endpoint.
///
/// Known names: "Vespa crabro" (1311276), "Slow species" (answers after
/// 2 s), "Broken species" (HTTP 500), "Garbage species" (non-JSON body).
/// Anything else yields an empty result list.
pub async fn spawn_gbif_stub() -> (String, SeenQueries) {
    let seen: SeenQueries = Arc::default();
    let app = Router::new()
        .route("/v1/species", get(stub_species))
        .with_state(Arc::clone(&seen));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{address}/v1/species"), seen)
}

async fn stub_species(
    State(seen): State<SeenQueries>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let name = params.get("name").cloned().unwrap_or_default();
    seen.lock().unwrap().push(params);

    match name.as_str() {
        "Vespa crabro" => Json(json!({
            "offset": 0,
            "limit": 1,
            "endOfRecords": false,
            "results": [{"key": 1_311_276, "scientificName": "Vespa crabro Linnaeus, 1758"}]
        }))
        .into_response(),
        "Slow species" => {
            tokio::time::sleep(Duration::from_secs(2)).await;
            Json(json!({"results": [{"key": 1}]})).into_response()
        }
        "Broken species" => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        "Garbage species" => "definitely not json".into_response(),
        _ => Json(json!({"offset": 0, "limit": 1, "results": []})).into_response(),
    }
}
