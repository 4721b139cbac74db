use std::sync::OnceLock;

use ort::session::builder::{GraphOptimizationLevel, SessionBuilder};
use ort::session::Session;
use ort::Result as OrtResult;
use serde::{Deserialize, Serialize};

static ENVIRONMENT: OnceLock<Result<(), String>> = OnceLock::new();

/// Graph optimization applied by ONNX Runtime when the session is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizationLevel {
    Disable,
    Basic,
    Extended,
    #[default]
    All,
}

impl From<OptimizationLevel> for GraphOptimizationLevel {
    fn from(level: OptimizationLevel) -> Self {
        match level {
            OptimizationLevel::Disable => GraphOptimizationLevel::Disable,
            OptimizationLevel::Basic => GraphOptimizationLevel::Level1,
            OptimizationLevel::Extended => GraphOptimizationLevel::Level2,
            OptimizationLevel::All => GraphOptimizationLevel::Level3,
        }
    }
}

/// Settings for ONNX Runtime execution of the label classifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// 0 lets ONNX Runtime decide
    pub inter_threads: usize,
    /// 0 lets ONNX Runtime decide
    pub intra_threads: usize,
    pub optimization_level: OptimizationLevel,
}

/// Commits the process-wide ONNX Runtime environment exactly once.
///
/// A failed first attempt is remembered; later calls report the same error
/// instead of retrying.
pub fn ensure_initialized() -> Result<(), String> {
    ENVIRONMENT
        .get_or_init(|| {
            ort::init()
                .with_name("recyclens")
                .commit()
                .map(|_| ())
                .map_err(|e| format!("Failed to initialize ONNX Runtime environment: {}", e))
        })
        .clone()
}

pub fn create_session_builder(config: &RuntimeConfig) -> OrtResult<SessionBuilder> {
    if let Err(msg) = ensure_initialized() {
        log::warn!("{}; continuing with the default environment", msg);
    }
    let mut builder = Session::builder()?;

    if config.inter_threads > 0 {
        builder = builder.with_inter_threads(config.inter_threads)?;
    }
    if config.intra_threads > 0 {
        builder = builder.with_intra_threads(config.intra_threads)?;
    }

    builder = builder.with_optimization_level(config.optimization_level.into())?;

    Ok(builder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_lets_runtime_decide() {
        let config = RuntimeConfig::default();
        assert_eq!(config.inter_threads, 0);
        assert_eq!(config.intra_threads, 0);
        assert_eq!(config.optimization_level, OptimizationLevel::All);
    }

    #[test]
    fn test_optimization_level_mapping() {
        assert!(matches!(
            GraphOptimizationLevel::from(OptimizationLevel::Basic),
            GraphOptimizationLevel::Level1
        ));
        assert!(matches!(
            GraphOptimizationLevel::from(OptimizationLevel::Disable),
            GraphOptimizationLevel::Disable
        ));
    }
}
