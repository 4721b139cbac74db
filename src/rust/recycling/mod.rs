use std::fmt;
use serde::{Deserialize, Serialize};

mod aggregate;
pub mod builder;
mod classifier;
mod confidence;
mod error;
mod rules;

pub use aggregate::{aggregate_single, aggregate_weighted, AggregationPolicy, SINGLE_TOP_K, WEIGHTED_TOP_K};
pub use builder::RecyclingClassifierBuilder;
pub use classifier::RecyclingClassifier;
pub use confidence::{adjust_confidence, ConfidenceAdjustment, BOOST_THRESHOLD};
pub use error::RecyclingError;
pub use rules::{LabelMatch, MatchedRule, RuleSet, RuleSetBuilder, SpecialCase};

/// Recyclability of an object. There is no third state: labels the rules do
/// not recognize are non-recyclable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "recyclable")]
    Recyclable,
    #[serde(rename = "non-recyclable")]
    NonRecyclable,
}

impl Category {
    pub fn is_recyclable(self) -> bool {
        self == Category::Recyclable
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Recyclable => "recyclable",
            Self::NonRecyclable => "non-recyclable",
        }
    }
}

impl From<bool> for Category {
    fn from(recyclable: bool) -> Self {
        if recyclable {
            Self::Recyclable
        } else {
            Self::NonRecyclable
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One candidate as seen by the aggregator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub label: String,
    pub score: f32,
    pub category: Category,
}

/// Final recyclability decision for one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub category: Category,
    /// Reported confidence, always within [0, 1]
    pub confidence: f32,
    /// No rule recognized the deciding label(s); category fell back to
    /// non-recyclable
    pub uncertain: bool,
    /// Highest-ranked classifier label, untouched
    pub top_label: String,
    /// Raw classifier score of `top_label` (single-top policy only)
    pub original_confidence: Option<f32>,
    /// Whether `confidence` was inflated (single-top policy only)
    pub confidence_boosted: Option<bool>,
    pub evidence: Vec<Evidence>,
}

impl Verdict {
    pub fn is_recyclable(&self) -> bool {
        self.category.is_recyclable()
    }
}

/// Information about a classifier's configuration
#[derive(Debug, Clone, Serialize)]
pub struct ClassifierInfo {
    /// Name of the label classifier backend
    pub labeler: String,
    pub policy: AggregationPolicy,
    /// Candidates requested per image
    pub top_k: usize,
    pub num_special_cases: usize,
    pub num_recyclable_keywords: usize,
    pub num_non_recyclable_keywords: usize,
}
