use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Pixel value range the model was trained on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueRange {
    /// Pixels divided by 255 into `[0, 1]`.
    Unit,
    /// Raw `[0, 255]` floats, as MobileNet-style graphs with built-in preprocessing expect.
    Raw,
}

impl ValueRange {
    pub fn apply(self, value: u8) -> f32 {
        match self {
            ValueRange::Unit => value as f32 / 255.0,
            ValueRange::Raw => value as f32,
        }
    }
}

/// What the model's final layer emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    Logits,
    Probabilities,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreprocessConfig {
    pub image_size: u32,
    pub value_range: ValueRange,
}

/// Metadata shipped next to the ONNX weights. The label order and the
/// preprocessing parameters belong to the artifact and are never guessed.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelArtifactConfig {
    pub id2label: BTreeMap<String, String>,
    pub image_size: u32,
    pub value_range: ValueRange,
    pub output_kind: OutputKind,
    #[serde(default)]
    pub input_name: Option<String>,
}

impl ModelArtifactConfig {
    pub fn from_json(content: &str) -> Result<Self, AppError> {
        let config: Self = serde_json::from_str(content)
            .map_err(|e| AppError::ModelConfig(format!("Failed to parse config JSON: {}", e)))?;

        if config.image_size == 0 {
            return Err(AppError::ModelConfig("image_size must be positive".to_string()));
        }

        Ok(config)
    }

    pub fn preprocess(&self) -> PreprocessConfig {
        PreprocessConfig {
            image_size: self.image_size,
            value_range: self.value_range,
        }
    }

    /// Labels ordered by output index. Keys must be exactly `0..n`.
    pub fn labels(&self) -> Result<Vec<String>, AppError> {
        if self.id2label.is_empty() {
            return Err(AppError::ModelConfig("Config has an empty id2label field".to_string()));
        }

        let mut labels: Vec<(usize, String)> = self
            .id2label
            .iter()
            .map(|(k, v)| {
                k.trim()
                    .parse::<usize>()
                    .map(|idx| (idx, v.clone()))
                    .map_err(|_| AppError::ModelConfig(format!("Non-numeric id2label key {:?}", k)))
            })
            .collect::<Result<_, _>>()?;
        labels.sort_by_key(|(idx, _)| *idx);

        for (expected, (idx, _)) in labels.iter().enumerate() {
            if *idx != expected {
                return Err(AppError::ModelConfig(format!(
                    "id2label indices must be contiguous from 0, found {} at position {}",
                    idx, expected
                )));
            }
        }

        Ok(labels.into_iter().map(|(_, label)| label).collect())
    }
}
