//! Aggregation policies turning ranked candidates into one verdict.

use log::debug;
use serde::{Deserialize, Serialize};

use super::confidence::ConfidenceAdjustment;
use super::error::RecyclingError;
use super::rules::RuleSet;
use super::{Category, Evidence, Verdict};
use crate::labeler::Candidate;

/// Number of candidates requested from the label classifier per policy.
pub const SINGLE_TOP_K: usize = 1;
pub const WEIGHTED_TOP_K: usize = 5;

/// How candidates are combined. Selected once when the classifier is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum AggregationPolicy {
    /// Only the highest-ranked label counts
    SingleTop { adjustment: ConfidenceAdjustment },
    /// Every candidate's score is evidence for its label's category
    Weighted,
}

impl Default for AggregationPolicy {
    fn default() -> Self {
        Self::SingleTop {
            adjustment: ConfidenceAdjustment::None,
        }
    }
}

impl AggregationPolicy {
    pub fn default_top_k(&self) -> usize {
        match self {
            Self::SingleTop { .. } => SINGLE_TOP_K,
            Self::Weighted => WEIGHTED_TOP_K,
        }
    }

    pub fn aggregate(&self, candidates: &[Candidate], rules: &RuleSet) -> Result<Verdict, RecyclingError> {
        match *self {
            Self::SingleTop { adjustment } => aggregate_single(candidates, rules, adjustment),
            Self::Weighted => aggregate_weighted(candidates, rules),
        }
    }
}

fn validate_score(candidate: &Candidate) -> Result<(), RecyclingError> {
    if !candidate.score.is_finite() || candidate.score < 0.0 {
        return Err(RecyclingError::Classification(format!(
            "Invalid score {} for label '{}'",
            candidate.score, candidate.label
        )));
    }
    Ok(())
}

/// Verdict from the top-ranked candidate alone.
///
/// The reported confidence is the candidate's raw score, passed through
/// `adjustment`. The raw score is kept in `original_confidence`.
///
/// # Errors
/// - `EmptyInput` if `candidates` is empty
/// - `InvalidLabel` if the top label is blank
/// - `Classification` if the top score is negative or not finite
pub fn aggregate_single(
    candidates: &[Candidate],
    rules: &RuleSet,
    adjustment: ConfidenceAdjustment,
) -> Result<Verdict, RecyclingError> {
    let top = candidates.first().ok_or(RecyclingError::EmptyInput)?;
    validate_score(top)?;

    let matched = rules.classify_label(&top.label)?;
    let (confidence, boosted) = adjustment.apply(top.score);
    debug!("Top label '{}' ({:.3}) -> {:?} via {:?}", top.label, top.score, matched.category, matched.rule);

    Ok(Verdict {
        category: matched.category,
        confidence: confidence.clamp(0.0, 1.0),
        uncertain: matched.is_uncertain(),
        top_label: top.label.clone(),
        original_confidence: Some(top.score),
        confidence_boosted: Some(boosted),
        evidence: vec![Evidence {
            label: top.label.clone(),
            score: top.score,
            category: matched.category,
        }],
    })
}

/// Verdict from the score mass of every candidate.
///
/// Scores are summed per category (uncertain labels count as
/// non-recyclable) and normalized into a pair summing to 1. Recyclable wins
/// ties. When every score is zero the verdict is non-recyclable with
/// confidence 0.
///
/// # Errors
/// Same as [`aggregate_single`], checked for every candidate.
pub fn aggregate_weighted(candidates: &[Candidate], rules: &RuleSet) -> Result<Verdict, RecyclingError> {
    let top = candidates.first().ok_or(RecyclingError::EmptyInput)?;

    // Summed in f64: no count of finite f32 scores can overflow it
    let mut recyclable_mass = 0.0f64;
    let mut non_recyclable_mass = 0.0f64;
    let mut all_uncertain = true;
    let mut evidence = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        validate_score(candidate)?;
        let matched = rules.classify_label(&candidate.label)?;
        match matched.category {
            Category::Recyclable => recyclable_mass += f64::from(candidate.score),
            Category::NonRecyclable => non_recyclable_mass += f64::from(candidate.score),
        }
        all_uncertain &= matched.is_uncertain();
        evidence.push(Evidence {
            label: candidate.label.clone(),
            score: candidate.score,
            category: matched.category,
        });
    }

    let total = recyclable_mass + non_recyclable_mass;
    if !total.is_finite() {
        return Err(RecyclingError::Classification(format!(
            "Candidate score mass is not finite: {}",
            total
        )));
    }
    let (category, confidence) = if total > 0.0 {
        recyclable_mass /= total;
        non_recyclable_mass /= total;
        if recyclable_mass >= non_recyclable_mass {
            (Category::Recyclable, recyclable_mass)
        } else {
            (Category::NonRecyclable, non_recyclable_mass)
        }
    } else {
        (Category::NonRecyclable, 0.0)
    };
    debug!(
        "Weighted masses over {} candidates: recyclable {:.3}, non-recyclable {:.3}",
        candidates.len(),
        recyclable_mass,
        non_recyclable_mass
    );

    Ok(Verdict {
        category,
        confidence: (confidence as f32).clamp(0.0, 1.0),
        uncertain: all_uncertain,
        top_label: top.label.clone(),
        original_confidence: None,
        confidence_boosted: None,
        evidence,
    })
}
