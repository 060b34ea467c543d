use crate::error::AppError;
use crate::models::classify_types::{PredictResponse, Prediction};
use crate::models::model_types::{OutputKind, PreprocessConfig};
use crate::services::classifier::preprocess::{NormalizedImage, Normalizer};
use crate::services::classifier::severity::severity_of;
use crate::services::disease_info::lookup_disease;
use ort::session::Session;
use ort::value::Value;
use std::sync::Mutex;
use std::time::Instant;
use tracing::{debug, instrument, warn};

const PROBABILITY_SUM_TOLERANCE: f32 = 1e-3;

/// A forward pass over one normalized image, returning the raw output row.
pub trait InferenceBackend: Send + Sync {
    fn forward(&self, input: NormalizedImage) -> Result<Vec<f32>, AppError>;

    fn input_name(&self) -> &str {
        "input"
    }
}

/// ONNX Runtime backend. `Session::run` needs `&mut`, so passes are serialized.
pub struct OrtBackend {
    session: Mutex<Session>,
    input_name: String,
}

impl OrtBackend {
    pub fn new(session: Session, input_name: Option<String>) -> Result<Self, AppError> {
        let input_name = match input_name {
            Some(name) => name,
            None => session
                .inputs()
                .first()
                .map(|input| input.name().to_string())
                .ok_or_else(|| AppError::ModelConfig("Model declares no inputs".to_string()))?,
        };

        Ok(Self {
            session: Mutex::new(session),
            input_name,
        })
    }
}

impl InferenceBackend for OrtBackend {
    fn forward(&self, input: NormalizedImage) -> Result<Vec<f32>, AppError> {
        let input_tensor = Value::from_array(input)
            .map_err(|e| AppError::inference("Failed to create tensor value", e.to_string()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| AppError::inference("Session lock poisoned", "a previous inference panicked"))?;

        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input_tensor])
            .map_err(|e| AppError::inference("Forward pass failed", e.to_string()))?;

        let output_value = outputs
            .values()
            .next()
            .ok_or_else(|| AppError::inference("Model produced no outputs", "empty output map"))?;

        let (_, data) = output_value
            .try_extract_tensor::<f32>()
            .map_err(|e| AppError::inference("Failed to extract output tensor", e.to_string()))?;

        Ok(data.to_vec())
    }

    fn input_name(&self) -> &str {
        &self.input_name
    }
}

/// Numerically stable softmax; the max is subtracted before exponentiation.
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max_logit = logits.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b));

    let exps: Vec<f32> = logits.iter().map(|&x| (x - max_logit).exp()).collect();
    let exp_sum: f32 = exps.iter().sum();
    exps.iter().map(|&e| e / exp_sum).collect()
}

pub fn to_probabilities(raw: &[f32], kind: OutputKind) -> Vec<f32> {
    let probabilities = match kind {
        OutputKind::Probabilities => raw.to_vec(),
        OutputKind::Logits => softmax(raw),
    };

    let sum: f32 = probabilities.iter().sum();
    if (sum - 1.0).abs() > PROBABILITY_SUM_TOLERANCE {
        warn!(sum, ?kind, "Probability vector does not sum to 1");
    }

    probabilities
}

/// Top-k `(label index, probability)` pairs, highest first. Equal
/// probabilities keep ascending index order.
pub fn rank(probabilities: &[f32], k: usize) -> Vec<(usize, f32)> {
    let mut indexed: Vec<(usize, f32)> = probabilities.iter().copied().enumerate().collect();
    // sort_by is stable, so ties stay in index order
    indexed.sort_by(|a, b| b.1.total_cmp(&a.1));
    indexed.truncate(k.max(1));
    indexed
}

pub struct Classifier {
    backend: Box<dyn InferenceBackend>,
    labels: Vec<String>,
    normalizer: Normalizer,
    output_kind: OutputKind,
}

impl Classifier {
    pub fn new(
        backend: Box<dyn InferenceBackend>,
        labels: Vec<String>,
        preprocess: PreprocessConfig,
        output_kind: OutputKind,
    ) -> Result<Self, AppError> {
        if labels.is_empty() {
            return Err(AppError::ModelConfig("Model has no class labels".to_string()));
        }

        Ok(Self {
            backend,
            labels,
            normalizer: Normalizer::new(preprocess),
            output_kind,
        })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn preprocess_config(&self) -> PreprocessConfig {
        self.normalizer.config()
    }

    pub fn output_kind(&self) -> OutputKind {
        self.output_kind
    }

    pub fn input_name(&self) -> &str {
        self.backend.input_name()
    }

    /// Runs a blank canvas through the model and checks the output width
    /// against the label count.
    pub fn probe(&self) -> Result<(), AppError> {
        let size = self.normalizer.config().image_size as usize;
        let (raw, _) = self.infer(NormalizedImage::zeros((1, size, size, 3)))?;
        debug!(width = raw.len(), "Model output probed");
        Ok(())
    }

    pub fn normalize(&self, bytes: &[u8]) -> Result<NormalizedImage, AppError> {
        self.normalizer.normalize(bytes)
    }

    /// Forward pass plus its wall-clock duration in milliseconds.
    pub fn infer(&self, image: NormalizedImage) -> Result<(Vec<f32>, f64), AppError> {
        let start = Instant::now();
        let raw = self.backend.forward(image)?;
        let duration_ms = start.elapsed().as_secs_f64() * 1000.0;

        if raw.len() != self.labels.len() {
            return Err(AppError::inference(
                "Output shape mismatch",
                format!("model emitted {} scores for {} labels", raw.len(), self.labels.len()),
            ));
        }

        Ok((raw, duration_ms))
    }

    pub fn classify_tensor(&self, image: NormalizedImage, top_k: usize) -> Result<Vec<Prediction>, AppError> {
        let (raw, _) = self.infer(image)?;
        let probabilities = to_probabilities(&raw, self.output_kind);

        Ok(rank(&probabilities, top_k)
            .into_iter()
            .map(|(idx, probability)| Prediction {
                class_name: self.labels[idx].clone(),
                probability,
            })
            .collect())
    }

    #[instrument(skip(self, image_bytes), fields(len = image_bytes.len()))]
    pub fn predict(&self, image_bytes: &[u8], top_k: usize) -> Result<PredictResponse, AppError> {
        let start = Instant::now();

        let tensor = self.normalize(image_bytes)?;
        let predictions = self.classify_tensor(tensor, top_k)?;

        let top = predictions
            .first()
            .cloned()
            .ok_or_else(|| AppError::inference("Ranking produced no predictions", "empty label set"))?;

        let inference_time_ms = (start.elapsed().as_secs_f64() * 1000.0 * 100.0).round() / 100.0;
        debug!(class = %top.class_name, probability = top.probability, inference_time_ms, "Prediction ready");

        Ok(PredictResponse {
            severity: severity_of(top.probability),
            disease_info: lookup_disease(&top.class_name),
            top_class: top.class_name,
            top_probability: top.probability,
            predictions,
            inference_time_ms,
        })
    }
}
