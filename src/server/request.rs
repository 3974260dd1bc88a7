//! Identify request validation.

use super::error::ApiError;
use axum::http::HeaderMap;
use axum::http::header::CONTENT_TYPE;
use serde_json::Value;

/// Fields every identify request must carry, checked in this order.
pub const REQUIRED_FIELDS: [&str; 2] = ["custom_id", "image_base64"];

/// A structurally valid identify request.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentifyRequest {
    /// Caller's correlation id, echoed back verbatim.
    pub custom_id: Value,
    /// Image payload; not yet checked to be a string.
    pub image_base64: Value,
}

impl IdentifyRequest {
    /// The image payload, if it is a JSON string.
    pub fn image_payload(&self) -> Option<&str> {
        self.image_base64.as_str()
    }
}

/// Validate headers and body in order, stopping at the first failure.
pub fn parse_identify_request(headers: &HeaderMap, body: &[u8]) -> Result<IdentifyRequest, ApiError> {
    if !is_json_content_type(headers) {
        return Err(ApiError::InvalidContentType);
    }

    let value: Value = serde_json::from_slice(body).map_err(|_| ApiError::MalformedJson)?;
    let Value::Object(mut fields) = value else {
        return Err(ApiError::MissingField(REQUIRED_FIELDS[0]));
    };

    if let Some(missing) = REQUIRED_FIELDS
        .iter()
        .find(|field| !fields.contains_key(**field))
    {
        return Err(ApiError::MissingField(*missing));
    }

    Ok(IdentifyRequest {
        custom_id: fields.remove("custom_id").unwrap_or_default(),
        image_base64: fields.remove("image_base64").unwrap_or_default(),
    })
}

/// `application/json` or any `application/*+json`, ignoring parameters.
fn is_json_content_type(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) else {
        return false;
    };
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    mime == "application/json" || (mime.starts_with("application/") && mime.ends_with("+json"))
}
