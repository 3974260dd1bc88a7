//! Base64 image payload decoding.

use super::DecodedImage;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::borrow::Cow;
use tracing::{debug, error};

/// Reasons an image payload could not be decoded.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// `data:` prefix without the comma that ends the header.
    #[error("data URL header is not terminated by ','")]
    MalformedDataUrl,

    /// Payload is empty after removing the header.
    #[error("image payload is empty")]
    Empty,

    /// Payload is not valid standard base64.
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Bytes are not a recognised image format.
    #[error("unrecognised image data: {0}")]
    Image(#[from] image::ImageError),
}

/// Decode a base64 image payload, optionally prefixed with a data-URL header
/// such as `data:image/jpeg;base64,`.
///
/// Any common compressed format the `image` crate recognises is accepted.
/// Grayscale and alpha images are converted to three channels; the result is
/// in BGR order.
pub fn decode_base64_image(payload: &str) -> Result<DecodedImage, DecodeError> {
    decode_inner(payload).inspect_err(|e| error!("Error decoding base64 image: {e}"))
}

fn decode_inner(payload: &str) -> Result<DecodedImage, DecodeError> {
    let encoded = strip_data_url(payload)?;
    let encoded = strip_whitespace(encoded);
    if encoded.is_empty() {
        return Err(DecodeError::Empty);
    }

    let bytes = STANDARD.decode(encoded.as_bytes())?;
    let decoded = image::load_from_memory(&bytes)?;
    debug!(
        "Decoded {} byte payload into {}x{} image",
        bytes.len(),
        decoded.width(),
        decoded.height()
    );

    Ok(DecodedImage::from_rgb(decoded.to_rgb8()))
}

fn strip_data_url(payload: &str) -> Result<&str, DecodeError> {
    if !payload.starts_with("data:") {
        return Ok(payload);
    }
    payload
        .split_once(',')
        .map(|(_, data)| data)
        .ok_or(DecodeError::MalformedDataUrl)
}

// Clients commonly wrap base64 at 76 columns.
fn strip_whitespace(encoded: &str) -> Cow<'_, str> {
    if encoded.bytes().any(|b| b.is_ascii_whitespace()) {
        Cow::Owned(
            encoded
                .chars()
                .filter(|c| !c.is_ascii_whitespace())
                .collect(),
        )
    } else {
        Cow::Borrowed(encoded)
    }
}
