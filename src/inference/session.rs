//! Thin wrapper around an ONNX Runtime session with one image input.

use crate::error::{Error, Result};
use ort::session::{Session, SessionInputs};
use ort::value::TensorRef;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};

/// Raw `f32` tensor returned by a model.
#[derive(Debug, Clone)]
pub struct TensorOutput {
    /// Dimensions as reported by the runtime.
    pub shape: Vec<i64>,
    /// Row-major values.
    pub data: Vec<f32>,
}

/// Loaded model with a single NCHW `f32` input and a primary `f32` output.
///
/// ONNX Runtime needs exclusive access to run a session, so concurrent
/// requests take turns on the lock.
pub struct OnnxSession {
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
    path: PathBuf,
}

impl OnnxSession {
    /// Load a model file.
    pub fn load(path: &Path, threads: usize) -> Result<Self> {
        let session = build_session(path, threads).map_err(|source| Error::ModelLoad {
            path: path.to_path_buf(),
            source,
        })?;

        let input_name = session
            .inputs()
            .first()
            .map(|input| input.name().to_string())
            .ok_or_else(|| Error::Inference {
                reason: format!("model '{}' declares no inputs", path.display()),
            })?;
        let output_name = session
            .outputs()
            .first()
            .map(|output| output.name().to_string())
            .ok_or_else(|| Error::Inference {
                reason: format!("model '{}' declares no outputs", path.display()),
            })?;

        info!(
            "Loaded model: {} (input '{}', output '{}')",
            path.display(),
            input_name,
            output_name
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output_name,
            path: path.to_path_buf(),
        })
    }

    /// Run the model on one NCHW tensor and return its first output.
    pub fn run(&self, shape: [usize; 4], data: &[f32]) -> Result<TensorOutput> {
        let dims: Vec<i64> = shape.iter().map(|&d| to_dim(d)).collect();
        let tensor = TensorRef::from_array_view((dims, data))?;

        let mut session = self.session.lock().map_err(|_| Error::Inference {
            reason: format!("session lock poisoned for '{}'", self.path.display()),
        })?;

        let inputs: SessionInputs<'_, '_, 0> =
            SessionInputs::ValueMap(vec![(Cow::Borrowed(self.input_name.as_str()), tensor.into())]);
        let outputs = session.run(inputs)?;

        let (out_shape, out_data) = outputs[self.output_name.as_str()].try_extract_tensor::<f32>()?;
        let output = TensorOutput {
            shape: out_shape.iter().copied().collect(),
            data: out_data.to_vec(),
        };
        debug!(
            "Model '{}' produced output {:?}",
            self.path.display(),
            output.shape
        );
        Ok(output)
    }
}

fn build_session(path: &Path, threads: usize) -> ort::Result<Session> {
    let mut builder = Session::builder()?.with_intra_threads(threads)?;
    builder.commit_from_file(path)
}

#[allow(clippy::cast_possible_wrap)]
const fn to_dim(d: usize) -> i64 {
    d as i64
}
