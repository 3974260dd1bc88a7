//! Detection and identification models.
//!
//! The pipeline only sees the [`InsectDetector`] and [`InsectIdentifier`]
//! traits; the ONNX implementations here run the pre-built models.

mod detector;
mod identifier;
mod labels;
mod session;
mod types;

pub use detector::{DetectorOptions, OnnxInsectDetector};
pub use identifier::{IdentifierOptions, OnnxInsectIdentifier};
pub use labels::read_labels;
pub use session::{OnnxSession, TensorOutput};
pub use types::{
    Detection, IdentificationCandidate, InsectDetector, InsectIdentifier, PixelBox,
};
