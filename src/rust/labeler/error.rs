use std::io;
use ort::Error as OrtError;

/// Errors raised by a label classifier backend.
#[derive(Debug, thiserror::Error)]
pub enum LabelerError {
    /// The uploaded bytes could not be decoded as an image
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    /// Error occurred while loading or running the ONNX model
    #[error("Model error: {0}")]
    Model(String),
    /// The class label file is missing entries or malformed
    #[error("Labels error: {0}")]
    Labels(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl From<OrtError> for LabelerError {
    fn from(err: OrtError) -> Self {
        LabelerError::Model(err.to_string())
    }
}
