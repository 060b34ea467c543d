use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Model is not loaded: {0}")]
    ModelNotReady(String),

    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Invalid image dimensions {width}x{height}")]
    InvalidImage { width: u32, height: u32 },

    #[error("Inference failed: {context}: {source}")]
    Inference {
        context: String,
        #[source]
        source: BoxError,
    },

    #[error("Invalid model config: {0}")]
    ModelConfig(String),

    #[error("Download failed: {0}")]
    Download(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Message(String),
}

impl AppError {
    pub fn inference(context: impl Into<String>, source: impl Into<BoxError>) -> Self {
        AppError::Inference {
            context: context.into(),
            source: source.into(),
        }
    }

    /// Stable identifier for the failure class, used by callers that map errors to statuses.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::ModelNotReady(_) => "model_not_ready",
            AppError::Decode(_) => "decode",
            AppError::InvalidImage { .. } => "invalid_image",
            AppError::Inference { .. } => "inference",
            AppError::ModelConfig(_) => "model_config",
            AppError::Download(_) => "download",
            AppError::Io(_) => "io",
            AppError::Message(_) => "internal",
        }
    }

    pub fn is_input_error(&self) -> bool {
        matches!(self, AppError::Decode(_) | AppError::InvalidImage { .. })
    }
}

impl Serialize for AppError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("AppError", 2)?;
        state.serialize_field("kind", self.kind())?;
        state.serialize_field("error", &self.to_string())?;
        state.end()
    }
}

impl From<image::ImageError> for AppError {
    fn from(err: image::ImageError) -> Self {
        AppError::Decode(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Download(err.to_string())
    }
}

impl From<ort::Error> for AppError {
    fn from(err: ort::Error) -> Self {
        AppError::inference("ONNX Runtime error", err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::ModelConfig(err.to_string())
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Message(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Message(msg.to_string())
    }
}
