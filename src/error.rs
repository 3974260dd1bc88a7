//! Error types for insectid-api.

/// Result type alias for insectid-api operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for insectid-api.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration directory could not be determined.
    #[error("could not determine configuration directory for this platform")]
    ConfigDirNotFound,

    /// Failed to read configuration file.
    #[error("failed to read config file '{path}'")]
    ConfigRead {
        /// Path to the config file.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse configuration file.
    #[error("failed to parse config file '{path}'")]
    ConfigParse {
        /// Path to the config file.
        path: std::path::PathBuf,
        /// Underlying parse error.
        #[source]
        source: toml::de::Error,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    /// Failed to write configuration file.
    #[error("failed to write config file '{path}'")]
    ConfigWrite {
        /// Path to the config file.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize configuration.
    #[error("failed to serialize config")]
    ConfigSerialize {
        /// Underlying serialization error.
        #[source]
        source: toml::ser::Error,
    },

    /// A model path was not configured.
    #[error("no {kind} model configured (set models.{kind} in config or pass --{kind}-model)")]
    ModelNotConfigured {
        /// Which model is missing (`detector` or `identifier`).
        kind: &'static str,
    },

    /// Model file does not exist.
    #[error("model file does not exist: {path}")]
    ModelFileNotFound {
        /// Path to the missing model file.
        path: std::path::PathBuf,
    },

    /// Labels file does not exist.
    #[error("labels file does not exist: {path}")]
    LabelsFileNotFound {
        /// Path to the missing labels file.
        path: std::path::PathBuf,
    },

    /// Failed to read labels file.
    #[error("failed to read labels file '{path}'")]
    LabelsRead {
        /// Path to the labels file.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Labels file contents are unusable.
    #[error("invalid labels file '{path}': {reason}")]
    LabelsInvalid {
        /// Path to the labels file.
        path: std::path::PathBuf,
        /// Description of the problem.
        reason: String,
    },

    /// Failed to load an ONNX model.
    #[error("failed to load model '{path}'")]
    ModelLoad {
        /// Path to the model file.
        path: std::path::PathBuf,
        /// Underlying runtime error.
        #[source]
        source: ort::Error,
    },

    /// Inference failed.
    #[error("inference failed: {reason}")]
    Inference {
        /// Description of the inference failure.
        reason: String,
    },

    /// HTTP client for the taxonomy service could not be built.
    #[error("failed to build HTTP client")]
    HttpClient {
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// Server could not bind its listening socket.
    #[error("failed to bind {address}")]
    ServerBind {
        /// Address that failed.
        address: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Internal error (for unexpected failures).
    #[error("internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },
}

impl From<ort::Error> for Error {
    fn from(e: ort::Error) -> Self {
        Self::Inference {
            reason: e.to_string(),
        }
    }
}
