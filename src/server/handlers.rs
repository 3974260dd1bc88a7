//! Route handlers.

use super::AppState;
use super::error::ApiError;
use super::request::parse_identify_request;
use crate::constants::status;
use crate::imaging::decode_base64_image;
use crate::pipeline::{IdentifiedInsect, max_probability};
use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use futures_util::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::Any;
use std::error::Error as _;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Successful identify response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentifyResponse {
    /// Caller's correlation id, unchanged.
    pub custom_id: Value,
    /// Insects in detection order.
    pub identified_insects: Vec<IdentifiedInsect>,
    /// Always "Success".
    pub status_message: String,
}

/// Liveness response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always "healthy".
    pub status: String,
}

/// `GET /health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: status::HEALTHY.to_string(),
    })
}

/// `POST /api/v1/identify`
pub async fn identify(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<IdentifyResponse>, ApiError> {
    let result = handle_identify(&state, &headers, &body).await;
    if let Err(rejection) = &result {
        warn!(
            "Identify request rejected: {} ({})",
            rejection,
            rejection.status_message()
        );
    }
    result.map(Json)
}

async fn handle_identify(
    state: &AppState,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<IdentifyResponse, ApiError> {
    let request = parse_identify_request(headers, body)?;
    info!("Identify request received: custom_id={}", request.custom_id);

    let image = request
        .image_payload()
        .ok_or(ApiError::ImageDecode)
        .and_then(|payload| decode_base64_image(payload).map_err(|_| ApiError::ImageDecode))?;

    let outcome = AssertUnwindSafe(state.pipeline.process(image))
        .catch_unwind()
        .await;
    let insects = match outcome {
        Ok(Ok(insects)) => insects,
        Ok(Err(e)) => {
            error!("Unexpected error in identify: {e}");
            let mut source = e.source();
            while let Some(cause) = source {
                error!("  caused by: {cause}");
                source = cause.source();
            }
            return Err(ApiError::Processing);
        }
        Err(panic) => {
            error!("Identification panicked: {}", panic_message(panic.as_ref()));
            return Err(ApiError::Processing);
        }
    };

    check_confidence(&insects, state.pipeline.settings().min_confidence)?;

    info!(
        "Identify request succeeded: custom_id={}, insects={}",
        request.custom_id,
        insects.len()
    );
    Ok(IdentifyResponse {
        custom_id: request.custom_id,
        identified_insects: insects,
        status_message: status::SUCCESS.to_string(),
    })
}

/// At least one insect, and the best one at or above `min_confidence`.
pub fn check_confidence(insects: &[IdentifiedInsect], min_confidence: f64) -> Result<(), ApiError> {
    match max_probability(insects) {
        None => Err(ApiError::NoInsects),
        Some(best) if best < min_confidence => Err(ApiError::LowConfidence),
        Some(_) => Ok(()),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
