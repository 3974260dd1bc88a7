//! End-to-end tests for the HTTP surface with fake models.

#![allow(clippy::unwrap_used, clippy::float_cmp)]

mod common;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use common::{
    FailingDetector, FakeDetector, FakeIdentifier, FakeTaxonomy, PanickingDetector, png_base64,
    spawn_gbif_stub,
};
use insectid_api::inference::{Detection, IdentificationCandidate, InsectDetector, InsectIdentifier};
use insectid_api::server::{AppState, router};
use insectid_api::taxonomy::{GbifClient, TaxonomyLookup};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

fn app(
    detector: Arc<dyn InsectDetector>,
    identifier: Arc<dyn InsectIdentifier>,
    taxonomy: Arc<dyn TaxonomyLookup>,
) -> Router {
    router(AppState::new(common::pipeline(detector, identifier, taxonomy)))
}

fn hornet_app() -> Router {
    app(
        Arc::new(FakeDetector::single([10.0, 10.0, 110.0, 110.0])),
        Arc::new(FakeIdentifier::top(0.87, "Vespa crabro")),
        Arc::new(FakeTaxonomy::with(&[("Vespa crabro", 1_311_276)])),
    )
}

fn identify_request(body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/v1/identify")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_health() {
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(hornet_app(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "healthy"}));
}

#[tokio::test]
async fn test_identify_success() {
    let body = json!({"custom_id": "abc-1", "image_base64": png_base64(200, 200)});
    let (status, body) = send(hornet_app(), identify_request(&body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "custom_id": "abc-1",
            "identified_insects": [
                {"probability": 0.87, "latin_name": "Vespa crabro", "gbif_id": 1_311_276}
            ],
            "status_message": "Success"
        })
    );
}

#[tokio::test]
async fn test_identify_accepts_data_url() {
    let payload = format!("data:image/png;base64,{}", png_base64(200, 200));
    let body = json!({"custom_id": "abc-2", "image_base64": payload});
    let (status, body) = send(hornet_app(), identify_request(&body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["identified_insects"][0]["latin_name"], "Vespa crabro");
}

#[tokio::test]
async fn test_custom_id_is_echoed_verbatim() {
    let body = json!({"custom_id": 42, "image_base64": png_base64(200, 200)});
    let (status, body) = send(hornet_app(), identify_request(&body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["custom_id"], json!(42));
}

#[tokio::test]
async fn test_identical_requests_give_identical_responses() {
    let app = hornet_app();
    let body = json!({"custom_id": "same", "image_base64": png_base64(200, 200)});

    let (_, first) = send(app.clone(), identify_request(&body)).await;
    let (_, second) = send(app, identify_request(&body)).await;

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_wrong_content_type() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/identify")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from("custom_id=1"))
        .unwrap();
    let (status, body) = send(hornet_app(), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Content-Type must be application/json");
    assert_eq!(body["status_message"], "Invalid content type");
}

#[tokio::test]
async fn test_malformed_json() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/identify")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(hornet_app(), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status_message"], "Invalid content type");
}

#[tokio::test]
async fn test_missing_custom_id() {
    let body = json!({"image_base64": png_base64(50, 50)});
    let (status, body) = send(hornet_app(), identify_request(&body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required field: custom_id");
    assert_eq!(body["status_message"], "Missing required fields");
}

#[tokio::test]
async fn test_missing_image() {
    let body = json!({"custom_id": "abc"});
    let (status, body) = send(hornet_app(), identify_request(&body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required field: image_base64");
    assert_eq!(body["status_message"], "Missing required fields");
}

#[tokio::test]
async fn test_invalid_base64() {
    let body = json!({"custom_id": "abc", "image_base64": "!!! not base64 !!!"});
    let (status, body) = send(hornet_app(), identify_request(&body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid base64 image data");
    assert_eq!(body["status_message"], "Failed to decode image");
}

#[tokio::test]
async fn test_base64_of_non_image() {
    let body = json!({"custom_id": "abc", "image_base64": "aGVsbG8gd29ybGQ="});
    let (status, body) = send(hornet_app(), identify_request(&body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status_message"], "Failed to decode image");
}

#[tokio::test]
async fn test_no_insects() {
    let app = app(
        Arc::new(FakeDetector::default()),
        Arc::new(FakeIdentifier::top(0.9, "Apis mellifera")),
        Arc::new(FakeTaxonomy::default()),
    );
    let body = json!({"custom_id": "empty", "image_base64": png_base64(100, 100)});
    let (status, body) = send(app, identify_request(&body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No insects detected in the image");
    assert_eq!(body["status_message"], "No insects found");
}

#[tokio::test]
async fn test_only_tiny_detections_means_no_insects() {
    let identifier = Arc::new(FakeIdentifier::top(0.9, "Apis mellifera"));
    let app = app(
        Arc::new(FakeDetector::single([0.0, 0.0, 20.0, 20.0])),
        identifier.clone(),
        Arc::new(FakeTaxonomy::default()),
    );
    let body = json!({"custom_id": "tiny", "image_base64": png_base64(100, 100)});
    let (status, body) = send(app, identify_request(&body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status_message"], "No insects found");
    assert_eq!(identifier.calls(), 0);
}

#[tokio::test]
async fn test_confidence_threshold_is_inclusive() {
    let at_threshold = app(
        Arc::new(FakeDetector::single([0.0, 0.0, 60.0, 60.0])),
        Arc::new(FakeIdentifier::top(0.10, "Musca domestica")),
        Arc::new(FakeTaxonomy::default()),
    );
    let body = json!({"custom_id": "edge", "image_base64": png_base64(100, 100)});
    let (status, response) = send(at_threshold, identify_request(&body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["identified_insects"][0]["probability"], 0.10);

    let below = app(
        Arc::new(FakeDetector::single([0.0, 0.0, 60.0, 60.0])),
        Arc::new(FakeIdentifier::top(0.09, "Musca domestica")),
        Arc::new(FakeTaxonomy::default()),
    );
    let (status, response) = send(below, identify_request(&body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["error"], "Low confidence identification");
    assert_eq!(response["status_message"], "Low confidence identification");
}

#[tokio::test]
async fn test_one_confident_insect_carries_the_others() {
    let app = app(
        Arc::new(FakeDetector::new(vec![
            Detection::new([0.0, 0.0, 50.0, 50.0], 0.9, 0),
            Detection::new([60.0, 60.0, 120.0, 120.0], 0.8, 0),
        ])),
        Arc::new(FakeIdentifier::sequence(
            vec![
                vec![IdentificationCandidate::new(0.04, "Lasius niger")],
                vec![IdentificationCandidate::new(0.6, "Bombus terrestris")],
            ],
            Vec::new(),
        )),
        Arc::new(FakeTaxonomy::default()),
    );
    let body = json!({"custom_id": "pair", "image_base64": png_base64(150, 150)});
    let (status, response) = send(app, identify_request(&body)).await;

    assert_eq!(status, StatusCode::OK);
    let insects = response["identified_insects"].as_array().unwrap();
    assert_eq!(insects.len(), 2);
    assert_eq!(insects[0]["latin_name"], "Lasius niger");
    assert_eq!(insects[1]["latin_name"], "Bombus terrestris");
    assert_eq!(insects[0]["gbif_id"], Value::Null);
}

#[tokio::test]
async fn test_unknown_species_is_not_looked_up() {
    let taxonomy = Arc::new(FakeTaxonomy::with(&[("Unknown", 1)]));
    let app = app(
        Arc::new(FakeDetector::single([0.0, 0.0, 80.0, 80.0])),
        Arc::new(FakeIdentifier::fixed(vec![IdentificationCandidate::unknown(
            0.5,
        )])),
        taxonomy.clone(),
    );
    let body = json!({"custom_id": "unk", "image_base64": png_base64(100, 100)});
    let (status, response) = send(app, identify_request(&body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["identified_insects"][0]["latin_name"], "Unknown");
    assert_eq!(response["identified_insects"][0]["gbif_id"], Value::Null);
    assert_eq!(taxonomy.calls(), 0);
}

#[tokio::test]
async fn test_gbif_enrichment_through_http() {
    let (url, _) = spawn_gbif_stub().await;
    let taxonomy = GbifClient::new(url, Duration::from_secs(5)).unwrap();
    let app = app(
        Arc::new(FakeDetector::single([10.0, 10.0, 110.0, 110.0])),
        Arc::new(FakeIdentifier::top(0.87, "Vespa crabro")),
        Arc::new(taxonomy),
    );
    let body = json!({"custom_id": "gbif", "image_base64": png_base64(200, 200)});
    let (status, response) = send(app, identify_request(&body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["identified_insects"][0]["gbif_id"], 1_311_276);
}

#[tokio::test]
async fn test_gbif_failure_still_succeeds() {
    let (url, _) = spawn_gbif_stub().await;
    let taxonomy = GbifClient::new(url, Duration::from_secs(5)).unwrap();
    let app = app(
        Arc::new(FakeDetector::single([10.0, 10.0, 110.0, 110.0])),
        Arc::new(FakeIdentifier::top(0.87, "Broken species")),
        Arc::new(taxonomy),
    );
    let body = json!({"custom_id": "gbif-down", "image_base64": png_base64(200, 200)});
    let (status, response) = send(app, identify_request(&body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["identified_insects"][0]["probability"], 0.87);
    assert_eq!(response["identified_insects"][0]["gbif_id"], Value::Null);
}

#[tokio::test]
async fn test_detector_error_is_processing_failure() {
    let app = app(
        Arc::new(FailingDetector),
        Arc::new(FakeIdentifier::top(0.9, "Apis mellifera")),
        Arc::new(FakeTaxonomy::default()),
    );
    let body = json!({"custom_id": "err", "image_base64": png_base64(100, 100)});
    let (status, response) = send(app, identify_request(&body)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response["status_message"], "Processing failed");
    assert!(
        !response["error"]
            .as_str()
            .unwrap()
            .contains("model exploded")
    );
}

#[tokio::test]
async fn test_detector_panic_is_processing_failure() {
    let app = app(
        Arc::new(PanickingDetector),
        Arc::new(FakeIdentifier::top(0.9, "Apis mellifera")),
        Arc::new(FakeTaxonomy::default()),
    );
    let body = json!({"custom_id": "panic", "image_base64": png_base64(100, 100)});
    let (status, response) = send(app.clone(), identify_request(&body)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response["status_message"], "Processing failed");

    // The service keeps answering afterwards.
    let health = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(app, health).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_out_of_range_probability_is_processing_failure() {
    let app = app(
        Arc::new(FakeDetector::single([0.0, 0.0, 60.0, 60.0])),
        Arc::new(FakeIdentifier::top(1.5, "Apis mellifera")),
        Arc::new(FakeTaxonomy::default()),
    );
    let body = json!({"custom_id": "nan", "image_base64": png_base64(100, 100)});
    let (status, response) = send(app, identify_request(&body)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response["status_message"], "Processing failed");
}
