use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use log::{debug, info};
use ort::session::Session;
use ort::value::Tensor;

use super::labels::load_labels;
use super::preprocess::{decode_image, image_to_tensor};
use super::{top_k_indices, Candidate, LabelClassifier, LabelerError};
use crate::runtime::{create_session_builder, RuntimeConfig};
use crate::ModelCharacteristics;

/// An ImageNet classifier backed by an ONNX Runtime session.
///
/// The session is created once and shared read-only; `ort` sessions can run
/// concurrently from several threads, so a single instance can serve every
/// request of a process.
#[derive(Debug)]
pub struct OnnxLabelClassifier {
    session: Arc<Session>,
    labels: Arc<Vec<String>>,
    characteristics: ModelCharacteristics,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<OnnxLabelClassifier>();
    }
};

impl OnnxLabelClassifier {
    /// Loads the model and its label table.
    ///
    /// # Errors
    /// - `Io` / `Labels` if the label file cannot be read or parsed
    /// - `Model` if the session cannot be created, or its output width does
    ///   not match the number of labels
    pub fn load(
        model_path: &Path,
        labels_path: &Path,
        characteristics: ModelCharacteristics,
        runtime_config: &RuntimeConfig,
    ) -> Result<Self, LabelerError> {
        let labels = load_labels(labels_path)?;
        info!("Loaded {} class labels from {:?}", labels.len(), labels_path);

        if labels.len() != characteristics.num_classes {
            return Err(LabelerError::Labels(format!(
                "Expected {} labels, found {}",
                characteristics.num_classes,
                labels.len()
            )));
        }

        let session = create_session_builder(runtime_config)?.commit_from_file(model_path)?;
        Self::validate_model(&session)?;
        info!("Model loaded from {:?}", model_path);

        Ok(Self {
            session: Arc::new(session),
            labels: Arc::new(labels),
            characteristics,
        })
    }

    fn validate_model(session: &Session) -> Result<(), LabelerError> {
        if session.inputs.is_empty() {
            return Err(LabelerError::Model("Model must have an image input".to_string()));
        }
        if session.outputs.is_empty() {
            return Err(LabelerError::Model("Model must have at least 1 output for class scores".to_string()));
        }
        Ok(())
    }

    fn class_scores(&self, image: &[u8]) -> Result<Vec<f32>, LabelerError> {
        let decoded = decode_image(image)?;
        let input = image_to_tensor(&decoded, &self.characteristics);

        let input_name = self.session.inputs[0].name.as_str();
        let mut input_tensors = HashMap::new();
        input_tensors.insert(input_name, Tensor::from_array(input)
            .map_err(|e| LabelerError::Model(format!("Failed to create input tensor: {}", e)))?);

        let outputs = self.session.run(input_tensors)
            .map_err(|e| LabelerError::Model(format!("Failed to run model: {}", e)))?;
        let output = outputs[0].try_extract_tensor::<f32>()
            .map_err(|e| LabelerError::Model(format!("Failed to extract output tensor: {}", e)))?;

        let logits: Vec<f32> = output.iter().copied().collect();
        if logits.len() != self.labels.len() {
            return Err(LabelerError::Model(format!(
                "Model produced {} scores for {} labels",
                logits.len(),
                self.labels.len()
            )));
        }

        if self.characteristics.outputs_logits {
            Ok(softmax(&logits))
        } else {
            Ok(logits)
        }
    }
}

impl LabelClassifier for OnnxLabelClassifier {
    fn top_labels(&self, image: &[u8], top_k: usize) -> Result<Vec<Candidate>, LabelerError> {
        let scores = self.class_scores(image)?;
        let candidates: Vec<Candidate> = top_k_indices(&scores, top_k)
            .into_iter()
            .map(|(idx, score)| Candidate::new(self.labels[idx].clone(), score))
            .collect();
        debug!("Top {} labels: {:?}", top_k, candidates);
        Ok(candidates)
    }

    fn name(&self) -> &str {
        &self.characteristics.name
    }
}

fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&x| (x - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    if sum > 0.0 {
        exps.into_iter().map(|x| x / sum).collect()
    } else {
        vec![0.0; logits.len()]
    }
}
