//! Label classifiers: the pretrained network that turns image bytes into
//! ranked ImageNet labels.
//!
//! The recyclability logic never looks at pixels. It only consumes the
//! [`Candidate`] list produced by a [`LabelClassifier`], so any backend that
//! can rank labels for an image plugs in here.

use serde::{Deserialize, Serialize};

mod error;
mod fixed;
pub mod labels;
mod onnx;
pub mod preprocess;

pub use error::LabelerError;
pub use fixed::StaticLabelClassifier;
pub use onnx::OnnxLabelClassifier;

/// One output of the label classifier: an object name and the classifier's
/// own score for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub label: String,
    pub score: f32,
}

impl Candidate {
    pub fn new(label: impl Into<String>, score: f32) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// A pretrained image classifier returning ranked labels.
///
/// Implementations must return candidates ordered highest score first and
/// must not return more than `top_k` of them. Scores are non-negative but
/// need not sum to 1.
pub trait LabelClassifier: Send + Sync {
    /// Ranks labels for the encoded image in `image`.
    fn top_labels(&self, image: &[u8], top_k: usize) -> Result<Vec<Candidate>, LabelerError>;

    /// Short name used in logs and reports
    fn name(&self) -> &str;
}

/// Returns the indices and values of the `k` largest scores, highest first.
pub(crate) fn top_k_indices(scores: &[f32], k: usize) -> Vec<(usize, f32)> {
    let mut ranked: Vec<(usize, f32)> = scores.iter().copied().enumerate().collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    ranked.truncate(k);
    ranked
}
