//! Pretrained ImageNet networks the crate knows how to fetch and run.

use serde::{Deserialize, Serialize};

const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

const IMAGENET_SYNSET_URL: &str =
    "https://raw.githubusercontent.com/onnx/models/main/validated/vision/classification/synset.txt";

/// Represents the available built-in models in the library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuiltinModel {
    /// MobileNetV2 from the ONNX model zoo (opset 12)
    ///
    /// Characteristics:
    /// - Input: 1x3x224x224, ImageNet mean/std normalization
    /// - Output: 1000 ImageNet logits
    /// - Size: ~14MB
    MobileNetV2,
}

/// Input contract and output shape of a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelCharacteristics {
    pub name: String,
    /// Side of the square input image in pixels
    pub input_size: u32,
    pub num_classes: usize,
    /// Per-channel RGB mean subtracted after scaling to [0, 1]
    pub mean: [f32; 3],
    /// Per-channel RGB standard deviation divided after mean subtraction
    pub std: [f32; 3],
    /// Whether the output is raw logits that still need a softmax
    pub outputs_logits: bool,
    /// Approximate size of the model in memory
    pub model_size_mb: usize,
}

/// Download locations of a model and its label table.
///
/// Hashes are optional: when present the downloaded file must match, when
/// absent the file is accepted as-is and only its digest is logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInfo {
    pub name: String,
    pub model_url: String,
    pub labels_url: String,
    pub model_hash: Option<String>,
    pub labels_hash: Option<String>,
}

impl BuiltinModel {
    pub fn characteristics(&self) -> ModelCharacteristics {
        match self {
            Self::MobileNetV2 => ModelCharacteristics {
                name: "mobilenetv2".to_string(),
                input_size: 224,
                num_classes: 1000,
                mean: IMAGENET_MEAN,
                std: IMAGENET_STD,
                outputs_logits: true,
                model_size_mb: 14,
            },
        }
    }

    pub fn get_model_info(&self) -> ModelInfo {
        match self {
            Self::MobileNetV2 => ModelInfo {
                name: "mobilenetv2-12".to_string(),
                model_url: "https://github.com/onnx/models/raw/main/validated/vision/classification/mobilenet/model/mobilenetv2-12.onnx".to_string(),
                labels_url: IMAGENET_SYNSET_URL.to_string(),
                model_hash: None,
                labels_hash: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mobilenet_characteristics() {
        let characteristics = BuiltinModel::MobileNetV2.characteristics();
        assert_eq!(characteristics.input_size, 224);
        assert_eq!(characteristics.num_classes, 1000);
        assert!(characteristics.outputs_logits);
    }

    #[test]
    fn test_model_info_urls() {
        let info = BuiltinModel::MobileNetV2.get_model_info();
        assert!(info.model_url.ends_with(".onnx"));
        assert!(info.labels_url.ends_with("synset.txt"));
    }
}
