//! HTTP-facing request failures.

use crate::constants::status;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

/// Body of every non-200 response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable description.
    pub error: String,
    /// Stable machine-checkable category.
    pub status_message: String,
}

/// Why an identify request was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// Request is not declared as JSON.
    #[error("Content-Type must be application/json")]
    InvalidContentType,

    /// Declared as JSON but does not parse.
    #[error("Request body must be valid JSON")]
    MalformedJson,

    /// A required field is absent.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// `image_base64` could not be turned into an image.
    #[error("Invalid base64 image data")]
    ImageDecode,

    /// Nothing survived detection and identification.
    #[error("No insects detected in the image")]
    NoInsects,

    /// Best probability is under the threshold.
    #[error("Low confidence identification")]
    LowConfidence,

    /// Unexpected failure; details are logged, never returned.
    #[error("Internal server error")]
    Processing,
}

impl ApiError {
    /// HTTP status for this failure.
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Processing => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// `status_message` for this failure.
    pub const fn status_message(&self) -> &'static str {
        match self {
            Self::InvalidContentType | Self::MalformedJson => status::INVALID_CONTENT_TYPE,
            Self::MissingField(_) => status::MISSING_FIELDS,
            Self::ImageDecode => status::DECODE_FAILED,
            Self::NoInsects => status::NO_INSECTS,
            Self::LowConfidence => status::LOW_CONFIDENCE,
            Self::Processing => status::PROCESSING_FAILED,
        }
    }

    /// Response body for this failure.
    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            error: self.to_string(),
            status_message: self.status_message().to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.body())).into_response()
    }
}
