use crate::labeler::LabelerError;

/// Errors raised while turning classifier output into a recyclability verdict.
///
/// An unrecognized label is not an error: it yields a definite
/// non-recyclable verdict flagged as uncertain.
#[derive(Debug, thiserror::Error)]
pub enum RecyclingError {
    /// The label classifier returned no candidates
    #[error("Classifier returned no candidates")]
    EmptyInput,
    /// A candidate label was empty or blank
    #[error("Invalid label: {0}")]
    InvalidLabel(String),
    /// A keyword table or special case was malformed
    #[error("Invalid rule: {0}")]
    InvalidRule(String),
    /// Unexpected failure while scoring candidates, e.g. a negative score
    #[error("Classification error: {0}")]
    Classification(String),
    /// Error occurred during the build phase
    #[error("Build error: {0}")]
    Build(String),
    /// The label classifier itself failed
    #[error(transparent)]
    Labeler(#[from] LabelerError),
}
