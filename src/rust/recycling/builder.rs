use std::path::Path;
use std::sync::Arc;

use log::info;

use super::classifier::RecyclingClassifier;
use super::error::RecyclingError;
use super::rules::RuleSet;
use super::AggregationPolicy;
use crate::labeler::{LabelClassifier, OnnxLabelClassifier};
use crate::{BuiltinModel, ModelCharacteristics, ModelManager, RuntimeConfig};

/// Largest number of candidates a classifier may request per image
pub const MAX_TOP_K: usize = 20;

/// A builder for constructing a RecyclingClassifier with a fluent interface.
#[derive(Default)]
pub struct RecyclingClassifierBuilder {
    labeler: Option<Arc<dyn LabelClassifier>>,
    rules: Option<RuleSet>,
    policy: AggregationPolicy,
    top_k: Option<usize>,
    runtime_config: RuntimeConfig,
}

impl std::fmt::Debug for RecyclingClassifierBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecyclingClassifierBuilder")
            .field("labeler", &self.labeler.as_ref().map(|_| "<dyn LabelClassifier>"))
            .field("rules", &self.rules)
            .field("policy", &self.policy)
            .field("top_k", &self.top_k)
            .field("runtime_config", &self.runtime_config)
            .finish()
    }
}

impl RecyclingClassifierBuilder {
    /// Creates a builder with the standard rules and the single-top policy
    ///
    /// # Example
    /// ```
    /// use recyclens::RecyclingClassifierBuilder;
    ///
    /// let builder = RecyclingClassifierBuilder::new();
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the runtime configuration used when an ONNX model is loaded.
    /// Must be called before `with_model` / `with_custom_model` to take effect.
    pub fn with_runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.runtime_config = config;
        self
    }

    /// Loads a built-in model from the default cache.
    ///
    /// # Returns
    /// * `Result<Self, RecyclingError>` - The builder instance if successful, or an error if:
    ///   - A label classifier is already set
    ///   - The model is not downloaded
    ///   - The model or label file failed to load
    pub fn with_model(self, model: BuiltinModel) -> Result<Self, RecyclingError> {
        let manager = ModelManager::new_default()
            .map_err(|e| RecyclingError::Build(format!("Failed to create model manager: {}", e)))?;
        self.with_model_from(&manager, model)
    }

    /// Loads a built-in model from the cache managed by `manager`
    pub fn with_model_from(self, manager: &ModelManager, model: BuiltinModel) -> Result<Self, RecyclingError> {
        if !manager.is_model_downloaded(model) {
            return Err(RecyclingError::Build(format!(
                "Model '{:?}' is not downloaded. Please download it first using ModelManager::download_model()",
                model
            )));
        }
        let model_path = manager.get_model_path(model);
        let labels_path = manager.get_labels_path(model);
        self.with_custom_model(&model_path, &labels_path, model.characteristics())
    }

    /// Loads an arbitrary ONNX ImageNet model and its label file.
    ///
    /// # Arguments
    /// * `model_path` - Path to the ONNX model file
    /// * `labels_path` - One label per line, in class index order
    /// * `characteristics` - Input size, normalization and class count of the model
    pub fn with_custom_model(
        self,
        model_path: &Path,
        labels_path: &Path,
        characteristics: ModelCharacteristics,
    ) -> Result<Self, RecyclingError> {
        if self.labeler.is_some() {
            return Err(RecyclingError::Build("Label classifier already set".to_string()));
        }
        if !model_path.exists() {
            return Err(RecyclingError::Build(format!("Model file not found: {:?}", model_path)));
        }
        if !labels_path.exists() {
            return Err(RecyclingError::Build(format!("Labels file not found: {:?}", labels_path)));
        }

        let labeler = OnnxLabelClassifier::load(model_path, labels_path, characteristics, &self.runtime_config)?;
        info!("Label classifier '{}' ready", labeler.name());
        Ok(self.with_label_classifier(labeler))
    }

    /// Uses any label classifier implementation
    pub fn with_label_classifier<L: LabelClassifier + 'static>(self, labeler: L) -> Self {
        self.with_shared_label_classifier(Arc::new(labeler))
    }

    /// Shares an already-loaded label classifier between several classifiers
    pub fn with_shared_label_classifier(mut self, labeler: Arc<dyn LabelClassifier>) -> Self {
        self.labeler = Some(labeler);
        self
    }

    pub fn with_policy(mut self, policy: AggregationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.rules = Some(rules);
        self
    }

    /// Overrides the number of candidates requested per image, which
    /// otherwise follows the policy (1 for single-top, 5 for weighted).
    pub fn with_top_k(mut self, top_k: usize) -> Result<Self, RecyclingError> {
        if top_k == 0 || top_k > MAX_TOP_K {
            return Err(RecyclingError::Build(format!(
                "top_k must be between 1 and {}, got {}",
                MAX_TOP_K, top_k
            )));
        }
        self.top_k = Some(top_k);
        Ok(self)
    }

    pub fn build(self) -> Result<RecyclingClassifier, RecyclingError> {
        let labeler = self.labeler
            .ok_or_else(|| RecyclingError::Build("A label classifier must be set".to_string()))?;
        let top_k = self.top_k.unwrap_or_else(|| self.policy.default_top_k());
        let rules = self.rules.unwrap_or_default();

        info!("Building classifier with {:?}, top_k={}", self.policy, top_k);
        Ok(RecyclingClassifier {
            labeler,
            rules: Arc::new(rules),
            policy: self.policy,
            top_k,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StaticLabelClassifier;
    use tempfile::TempDir;

    #[test]
    fn test_build_requires_label_classifier() {
        let result = RecyclingClassifierBuilder::new().build();
        assert!(matches!(result, Err(RecyclingError::Build(_))));
    }

    #[test]
    fn test_top_k_validation() {
        assert!(RecyclingClassifierBuilder::new().with_top_k(0).is_err());
        assert!(RecyclingClassifierBuilder::new().with_top_k(MAX_TOP_K + 1).is_err());
        assert!(RecyclingClassifierBuilder::new().with_top_k(3).is_ok());
    }

    #[test]
    fn test_explicit_top_k_overrides_policy() -> Result<(), RecyclingError> {
        let classifier = RecyclingClassifierBuilder::new()
            .with_label_classifier(StaticLabelClassifier::single("jar", 0.5))
            .with_top_k(3)?
            .build()?;
        assert_eq!(classifier.info().top_k, 3);
        Ok(())
    }

    #[test]
    fn test_model_not_downloaded() -> Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new()?;
        let manager = ModelManager::new(dir.path())?;
        let result = RecyclingClassifierBuilder::new().with_model_from(&manager, BuiltinModel::MobileNetV2);
        assert!(matches!(result, Err(RecyclingError::Build(_))));
        Ok(())
    }

    #[test]
    fn test_custom_model_missing_file() {
        let result = RecyclingClassifierBuilder::new().with_custom_model(
            Path::new("/nonexistent/model.onnx"),
            Path::new("/nonexistent/labels.txt"),
            BuiltinModel::MobileNetV2.characteristics(),
        );
        assert!(matches!(result, Err(RecyclingError::Build(_))));
    }
}
