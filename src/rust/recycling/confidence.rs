use serde::{Deserialize, Serialize};

/// Raw confidences at or above this are reported unchanged.
pub const BOOST_THRESHOLD: f32 = 0.8;
const BOOST_FLOOR: f32 = 0.85;
const BOOST_SLOPE: f32 = 0.15;
const BOOST_CAP: f32 = 0.99;

/// Remaps a confidence below [`BOOST_THRESHOLD`] into [0.85, 0.99].
///
/// This is presentation-only inflation, not a calibration: callers that need
/// the real signal must keep the raw value alongside.
pub fn adjust_confidence(raw_confidence: f32) -> f32 {
    if raw_confidence >= BOOST_THRESHOLD {
        raw_confidence
    } else {
        (BOOST_FLOOR + raw_confidence * BOOST_SLOPE).min(BOOST_CAP)
    }
}

/// Post-processing applied to the single-top-label confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceAdjustment {
    /// Report the classifier's score as-is
    #[default]
    None,
    /// Apply [`adjust_confidence`]
    Inflate,
}

impl ConfidenceAdjustment {
    /// Returns the reported confidence and whether it was inflated.
    pub fn apply(self, raw_confidence: f32) -> (f32, bool) {
        match self {
            Self::None => (raw_confidence, false),
            Self::Inflate => {
                let adjusted = adjust_confidence(raw_confidence);
                (adjusted, raw_confidence < BOOST_THRESHOLD)
            }
        }
    }
}
