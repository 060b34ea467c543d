use serde::Serialize;

use crate::models::model_types::{OutputKind, ValueRange};
use crate::services::classifier::severity::Severity;

#[derive(Debug, Serialize, Clone)]
pub struct ModelStatus {
    pub downloaded: bool,
    pub loading: bool,
    pub ready: bool,
    pub error: Option<String>,
    pub model: Option<LoadedModelInfo>,
}

#[derive(Debug, Serialize, Clone)]
pub struct LoadedModelInfo {
    pub labels: Vec<String>,
    pub image_size: u32,
    pub value_range: ValueRange,
    pub output_kind: OutputKind,
    pub input_name: String,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Prediction {
    #[serde(rename = "class")]
    pub class_name: String,
    pub probability: f32,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct DiseaseInfo {
    pub disease: String,
    pub severity: String,
    pub description: String,
    pub symptoms: Vec<String>,
    pub treatment: Vec<String>,
    pub prevention: Vec<String>,
}

#[derive(Debug, Serialize, Clone)]
pub struct PredictResponse {
    pub predictions: Vec<Prediction>,
    pub top_class: String,
    pub top_probability: f32,
    pub severity: Severity,
    pub disease_info: DiseaseInfo,
    pub inference_time_ms: f64,
}
