//! Transport-agnostic upload handling.
//!
//! [`UploadHandler`] does what an HTTP upload route needs: check that the
//! upload declares an image type, stage it in a temporary file, classify it
//! and shape the JSON body and status code. The temporary file is removed when
//! the request finishes, whether classification succeeded or not. Wiring it to
//! a concrete HTTP framework is left to the embedding application.

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use log::{error, info, warn};
use serde::Serialize;
use serde_json::Value;
use tempfile::NamedTempFile;

use crate::recycling::{Category, Evidence, RecyclingClassifier, RecyclingError, Verdict};

pub const STATUS_OK: u16 = 200;
pub const STATUS_BAD_REQUEST: u16 = 400;
pub const STATUS_INTERNAL_ERROR: u16 = 500;

/// One uploaded file as received from a multipart form
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: Option<String>,
    /// Declared MIME type, e.g. `image/jpeg`
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(filename: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: Some(filename.into()),
            content_type: Some(content_type.into()),
            bytes,
        }
    }

    fn extension(&self) -> Option<&str> {
        self.filename
            .as_deref()
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("File must be an image, got content type '{0}'")]
    NotAnImage(String),
    #[error("Uploaded file is empty")]
    EmptyUpload,
    #[error("Failed to stage upload: {0}")]
    Staging(#[from] io::Error),
    #[error("Classification failed: {0}")]
    Classification(#[from] RecyclingError),
}

impl ServiceError {
    /// HTTP status the transport should answer with
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotAnImage(_) | Self::EmptyUpload => STATUS_BAD_REQUEST,
            Self::Staging(_) | Self::Classification(_) => STATUS_INTERNAL_ERROR,
        }
    }
}

/// Body of a successful prediction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictResponse {
    pub label: Category,
    pub confidence: f32,
    pub is_recyclable: bool,
    pub original_label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_confidence: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence_boosted: Option<bool>,
    pub predictions: Vec<Evidence>,
}

impl From<Verdict> for PredictResponse {
    fn from(verdict: Verdict) -> Self {
        Self {
            label: verdict.category,
            confidence: verdict.confidence,
            is_recyclable: verdict.is_recyclable(),
            original_label: verdict.top_label,
            original_confidence: verdict.original_confidence,
            confidence_boosted: verdict.confidence_boosted,
            predictions: verdict.evidence,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub message: &'static str,
}

/// Status code and JSON body ready to be written by the transport
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: u16,
    pub body: Value,
}

impl Reply {
    fn json<T: Serialize>(status: u16, body: &T) -> Self {
        match serde_json::to_value(body) {
            Ok(body) => Self { status, body },
            Err(e) => Self::error(STATUS_INTERNAL_ERROR, format!("Failed to serialize response: {}", e)),
        }
    }

    fn error(status: u16, detail: String) -> Self {
        Self {
            status,
            body: serde_json::json!({ "detail": detail }),
        }
    }
}

/// Handles image uploads against a shared classifier.
#[derive(Debug, Clone)]
pub struct UploadHandler {
    classifier: Arc<RecyclingClassifier>,
    staging_dir: Option<PathBuf>,
}

impl UploadHandler {
    pub fn new(classifier: Arc<RecyclingClassifier>) -> Self {
        Self {
            classifier,
            staging_dir: None,
        }
    }

    /// Stage uploads in `dir` instead of the system temp directory
    pub fn with_staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = Some(dir.into());
        self
    }

    pub fn health(&self) -> HealthResponse {
        HealthResponse {
            message: "Recyclable object detector API is running.",
        }
    }

    /// Validates, stages and classifies one upload.
    ///
    /// The staged file is deleted when this returns, on success or failure.
    pub fn predict(&self, upload: &Upload) -> Result<PredictResponse, ServiceError> {
        let content_type = upload.content_type.as_deref().unwrap_or_default();
        if !is_image_type(content_type) {
            warn!("Rejected upload {:?} with content type '{}'", upload.filename, content_type);
            return Err(ServiceError::NotAnImage(content_type.to_string()));
        }
        if upload.bytes.is_empty() {
            return Err(ServiceError::EmptyUpload);
        }
        info!("Received file {:?} ({} bytes)", upload.filename, upload.bytes.len());

        let staged = self.stage(upload)?;
        let verdict = self.classifier.classify_path(staged.path())?;
        info!(
            "Classified {:?} as {} ({:.3})",
            upload.filename, verdict.category, verdict.confidence
        );
        Ok(verdict.into())
    }

    /// Like [`predict`](Self::predict) but never fails: errors become a
    /// `{"detail": ...}` body with the matching status code.
    pub fn handle(&self, upload: &Upload) -> Reply {
        match self.predict(upload) {
            Ok(response) => Reply::json(STATUS_OK, &response),
            Err(e) => {
                let status = e.status_code();
                if status >= STATUS_INTERNAL_ERROR {
                    error!("Upload {:?} failed: {}", upload.filename, e);
                }
                Reply::json(status, &ErrorBody { detail: e.to_string() })
            }
        }
    }

    /// Runs [`handle`](Self::handle) on the blocking thread pool so inference
    /// does not stall the async runtime.
    pub async fn handle_async(&self, upload: Upload) -> Reply {
        let handler = self.clone();
        match tokio::task::spawn_blocking(move || handler.handle(&upload)).await {
            Ok(reply) => reply,
            Err(e) => {
                error!("Classification task failed: {}", e);
                Reply::error(STATUS_INTERNAL_ERROR, format!("Classification task failed: {}", e))
            }
        }
    }

    fn stage(&self, upload: &Upload) -> io::Result<NamedTempFile> {
        let suffix = upload.extension().map(|ext| format!(".{}", ext)).unwrap_or_default();
        let mut builder = tempfile::Builder::new();
        builder.prefix("upload-").suffix(&suffix);
        let mut file = match &self.staging_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        file.write_all(&upload.bytes)?;
        file.flush()?;
        Ok(file)
    }
}

fn is_image_type(content_type: &str) -> bool {
    let essence = content_type.split(';').next().unwrap_or_default().trim();
    essence.len() > "image/".len() && essence.to_ascii_lowercase().starts_with("image/")
}
