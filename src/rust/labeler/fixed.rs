use super::{Candidate, LabelClassifier, LabelerError};

/// A label classifier that ignores the image and always answers with the same
/// ranked candidates.
///
/// Useful for exercising the recyclability mapping without a model on disk.
#[derive(Debug, Clone)]
pub struct StaticLabelClassifier {
    candidates: Vec<Candidate>,
}

impl StaticLabelClassifier {
    /// Candidates are re-sorted highest score first.
    pub fn new(mut candidates: Vec<Candidate>) -> Self {
        candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        Self { candidates }
    }

    pub fn single(label: impl Into<String>, score: f32) -> Self {
        Self::new(vec![Candidate::new(label, score)])
    }
}

impl LabelClassifier for StaticLabelClassifier {
    fn top_labels(&self, _image: &[u8], top_k: usize) -> Result<Vec<Candidate>, LabelerError> {
        Ok(self.candidates.iter().take(top_k).cloned().collect())
    }

    fn name(&self) -> &str {
        "static"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_respects_top_k_and_order() {
        let labeler = StaticLabelClassifier::new(vec![
            Candidate::new("apple", 0.2),
            Candidate::new("pop bottle", 0.7),
            Candidate::new("banana", 0.1),
        ]);
        let top = labeler.top_labels(&[], 2).unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].label, "pop bottle");
        assert_eq!(top[1].label, "apple");
    }
}
