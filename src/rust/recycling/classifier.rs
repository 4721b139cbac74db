use std::fs;
use std::path::Path;
use std::sync::Arc;

use log::{debug, error};

use super::error::RecyclingError;
use super::rules::RuleSet;
use super::{AggregationPolicy, ClassifierInfo, Verdict};
use crate::labeler::{Candidate, LabelClassifier, LabelerError};

/// A thread-safe recyclability classifier.
///
/// Wraps a label classifier, a rule set and an aggregation policy chosen at
/// build time. Everything is immutable after construction, so one instance
/// can be shared across threads with `Arc`:
///
/// ```
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use recyclens::{AggregationPolicy, RecyclingClassifier, StaticLabelClassifier};
/// use std::sync::Arc;
/// use std::thread;
///
/// let classifier = Arc::new(RecyclingClassifier::builder()
///     .with_label_classifier(StaticLabelClassifier::single("beer bottle", 0.9))
///     .with_policy(AggregationPolicy::Weighted)
///     .build()?);
///
/// let shared = Arc::clone(&classifier);
/// let verdict = thread::spawn(move || shared.classify(b"image bytes"))
///     .join()
///     .unwrap()?;
/// assert!(verdict.is_recyclable());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RecyclingClassifier {
    pub(crate) labeler: Arc<dyn LabelClassifier>,
    pub(crate) rules: Arc<RuleSet>,
    pub(crate) policy: AggregationPolicy,
    pub(crate) top_k: usize,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<RecyclingClassifier>();
    }
};

impl std::fmt::Debug for RecyclingClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecyclingClassifier")
            .field("labeler", &self.labeler.name())
            .field("policy", &self.policy)
            .field("top_k", &self.top_k)
            .finish()
    }
}

impl RecyclingClassifier {
    /// Creates a new RecyclingClassifierBuilder for fluent construction
    pub fn builder() -> super::builder::RecyclingClassifierBuilder {
        super::builder::RecyclingClassifierBuilder::new()
    }

    pub fn info(&self) -> ClassifierInfo {
        ClassifierInfo {
            labeler: self.labeler.name().to_string(),
            policy: self.policy,
            top_k: self.top_k,
            num_special_cases: self.rules.special_cases().len(),
            num_recyclable_keywords: self.rules.recyclable_keywords().len(),
            num_non_recyclable_keywords: self.rules.non_recyclable_keywords().len(),
        }
    }

    pub fn policy(&self) -> AggregationPolicy {
        self.policy
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Runs the label classifier on an encoded image and aggregates its
    /// candidates into a verdict.
    ///
    /// # Errors
    /// - `Labeler` if the image cannot be decoded or the model fails
    /// - `EmptyInput` if the model returned no candidates
    /// - `InvalidLabel` / `Classification` for malformed candidates
    pub fn classify(&self, image: &[u8]) -> Result<Verdict, RecyclingError> {
        let candidates = self.labeler.top_labels(image, self.top_k).map_err(|e| {
            error!("Label classifier '{}' failed: {}", self.labeler.name(), e);
            e
        })?;
        debug!("{} candidates from '{}'", candidates.len(), self.labeler.name());
        self.classify_candidates(&candidates)
    }

    /// Reads an image file and classifies it
    pub fn classify_path<P: AsRef<Path>>(&self, path: P) -> Result<Verdict, RecyclingError> {
        let bytes = fs::read(path.as_ref()).map_err(LabelerError::from)?;
        self.classify(&bytes)
    }

    /// Aggregates already-computed candidates with this classifier's rules
    /// and policy.
    pub fn classify_candidates(&self, candidates: &[Candidate]) -> Result<Verdict, RecyclingError> {
        self.policy.aggregate(candidates, &self.rules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Category, ConfidenceAdjustment, StaticLabelClassifier};

    #[test]
    fn test_info_reflects_configuration() -> Result<(), RecyclingError> {
        let classifier = RecyclingClassifier::builder()
            .with_label_classifier(StaticLabelClassifier::single("jar", 0.4))
            .with_policy(AggregationPolicy::Weighted)
            .build()?;
        let info = classifier.info();
        assert_eq!(info.labeler, "static");
        assert_eq!(info.top_k, 5);
        assert_eq!(info.num_special_cases, 2);
        Ok(())
    }

    #[test]
    fn test_top_k_limits_candidates() -> Result<(), RecyclingError> {
        let labeler = StaticLabelClassifier::new(vec![
            Candidate::new("banana", 0.5),
            Candidate::new("pop bottle", 0.3),
            Candidate::new("beer bottle", 0.2),
        ]);
        let classifier = RecyclingClassifier::builder()
            .with_label_classifier(labeler)
            .with_policy(AggregationPolicy::SingleTop { adjustment: ConfidenceAdjustment::None })
            .build()?;
        let verdict = classifier.classify(&[])?;
        assert_eq!(verdict.category, Category::NonRecyclable);
        assert_eq!(verdict.evidence.len(), 1);
        Ok(())
    }

    #[test]
    fn test_missing_file_is_labeler_error() -> Result<(), RecyclingError> {
        let classifier = RecyclingClassifier::builder()
            .with_label_classifier(StaticLabelClassifier::single("jar", 0.4))
            .build()?;
        let result = classifier.classify_path("/nonexistent/recyclens/image.jpg");
        assert!(matches!(result, Err(RecyclingError::Labeler(LabelerError::Io(_)))));
        Ok(())
    }
}
