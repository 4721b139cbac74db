//! Recyclable / non-recyclable image classification on top of a pretrained
//! ImageNet classifier.
//!
//! An image is run through a general-purpose label classifier (MobileNetV2 by
//! default). Its ranked labels are mapped to a recyclability category by an
//! ordered keyword [`RuleSet`], and an [`AggregationPolicy`] turns them into a
//! single [`Verdict`].
//!
//! # Basic Usage
//!
//! ```no_run
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use recyclens::{BuiltinModel, ModelManager, RecyclingClassifier, AggregationPolicy};
//!
//! let manager = ModelManager::new_default()?;
//! manager.ensure_model_downloaded(BuiltinModel::MobileNetV2).await?;
//!
//! let classifier = RecyclingClassifier::builder()
//!     .with_model(BuiltinModel::MobileNetV2)?
//!     .with_policy(AggregationPolicy::Weighted)
//!     .build()?;
//!
//! let verdict = classifier.classify_path("bottle.jpg")?;
//! println!("{} ({:.1}%)", verdict.category, verdict.confidence * 100.0);
//! # Ok(())
//! # }
//! ```
//!
//! # Without a model
//!
//! The mapping logic can be driven by any [`LabelClassifier`]:
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use recyclens::{AggregationPolicy, ConfidenceAdjustment, RecyclingClassifier, StaticLabelClassifier};
//!
//! let classifier = RecyclingClassifier::builder()
//!     .with_label_classifier(StaticLabelClassifier::single("tin can", 0.42))
//!     .with_policy(AggregationPolicy::SingleTop { adjustment: ConfidenceAdjustment::Inflate })
//!     .build()?;
//!
//! let verdict = classifier.classify(&[])?;
//! assert!(verdict.is_recyclable());
//! assert_eq!(verdict.confidence_boosted, Some(true));
//! # Ok(())
//! # }
//! ```

pub mod evaluation;
pub mod labeler;
pub mod model_manager;
pub mod models;
pub mod recycling;
mod runtime;
pub mod service;

pub use labeler::{Candidate, LabelClassifier, LabelerError, OnnxLabelClassifier, StaticLabelClassifier};
pub use model_manager::{ModelError, ModelManager};
pub use models::{BuiltinModel, ModelCharacteristics, ModelInfo};
pub use recycling::{
    adjust_confidence, aggregate_single, aggregate_weighted, AggregationPolicy, Category, ClassifierInfo,
    ConfidenceAdjustment, Evidence, LabelMatch, MatchedRule, RecyclingClassifier, RecyclingClassifierBuilder,
    RecyclingError, RuleSet, RuleSetBuilder, SpecialCase, Verdict,
};
pub use runtime::{create_session_builder, OptimizationLevel, RuntimeConfig};
pub use service::{PredictResponse, ServiceError, Upload, UploadHandler};

pub fn init_logger() {
    env_logger::init();
}
