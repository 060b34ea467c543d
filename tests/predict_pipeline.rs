use image::{DynamicImage, ImageFormat, RgbImage};
use plant_vision_lib::commands::classifier::predict;
use plant_vision_lib::config::Config;
use plant_vision_lib::models::model_types::{OutputKind, PreprocessConfig, ValueRange};
use plant_vision_lib::services::classifier::model_manager::ModelManager;
use plant_vision_lib::services::classifier::preprocess::NormalizedImage;
use plant_vision_lib::services::classifier::severity::Severity;
use plant_vision_lib::services::disease_info::CITRUS_CLASSES;
use plant_vision_lib::{AppError, Classifier, InferenceBackend};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Stub model that records the tensor shape it was given and returns fixed scores.
struct StubModel {
    scores: Vec<f32>,
    calls: Arc<AtomicUsize>,
}

impl InferenceBackend for StubModel {
    fn forward(&self, input: NormalizedImage) -> Result<Vec<f32>, AppError> {
        assert_eq!(input.shape(), &[1, 224, 224, 3]);
        assert!(input.iter().all(|&v| v == 0.0), "black pixel must letterbox onto black");
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.scores.clone())
    }
}

fn black_pixel_png() -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(RgbImage::new(1, 1))
        .write_to(&mut buf, ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

fn citrus_classifier(scores: Vec<f32>, kind: OutputKind, calls: Arc<AtomicUsize>) -> Classifier {
    Classifier::new(
        Box::new(StubModel { scores, calls }),
        CITRUS_CLASSES.iter().map(|s| s.to_string()).collect(),
        PreprocessConfig { image_size: 224, value_range: ValueRange::Unit },
        kind,
    )
    .unwrap()
}

fn manager() -> (tempfile::TempDir, ModelManager) {
    let tmp = tempfile::tempdir().unwrap();
    let config = Config::from_lookup(|_| None)
        .unwrap()
        .with_model_dir(Some(tmp.path().to_path_buf()));
    (tmp, ModelManager::new(config))
}

#[tokio::test]
async fn uniform_logits_pick_first_class() {
    let (_tmp, manager) = manager();
    let calls = Arc::new(AtomicUsize::new(0));
    manager
        .install(citrus_classifier(vec![0.0; 5], OutputKind::Logits, calls.clone()))
        .unwrap();

    let response = predict(&manager, black_pixel_png(), Some(1)).await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(response.top_class, "Black spot");
    assert!((response.top_probability - 0.2).abs() < 1e-6);
    assert_eq!(response.severity, Severity::Rendah);
    assert_eq!(response.predictions.len(), 1);
    assert_eq!(response.disease_info.disease, "Black Spot (Bercak Hitam)");
}

#[tokio::test]
async fn top_three_from_probability_head() {
    let (_tmp, manager) = manager();
    manager
        .install(citrus_classifier(
            vec![0.1, 0.05, 0.05, 0.6, 0.2],
            OutputKind::Probabilities,
            Arc::new(AtomicUsize::new(0)),
        ))
        .unwrap();

    let response = predict(&manager, black_pixel_png(), Some(3)).await.unwrap();

    let ranked: Vec<(&str, f32)> = response
        .predictions
        .iter()
        .map(|p| (p.class_name.as_str(), p.probability))
        .collect();
    assert_eq!(ranked, vec![("Healthy", 0.6), ("Melanose", 0.2), ("Black spot", 0.1)]);
    assert_eq!(response.severity, Severity::Rendah);
}

#[tokio::test]
async fn response_serializes_to_the_documented_shape() {
    let (_tmp, manager) = manager();
    manager
        .install(citrus_classifier(
            vec![0.0, 9.0, 0.0, 0.0, 0.0],
            OutputKind::Logits,
            Arc::new(AtomicUsize::new(0)),
        ))
        .unwrap();

    let response = predict(&manager, black_pixel_png(), None).await.unwrap();
    let json = serde_json::to_value(&response).unwrap();

    assert_eq!(json["top_class"], "Canker");
    assert_eq!(json["severity"], "tinggi");
    assert_eq!(json["predictions"][0]["class"], "Canker");
    assert_eq!(json["disease_info"]["severity"], "tinggi");
    assert!(json["disease_info"]["treatment"].as_array().unwrap().len() > 1);
    assert!(json["inference_time_ms"].is_number());
}

#[tokio::test]
async fn bad_bytes_never_reach_the_model() {
    let (_tmp, manager) = manager();
    let calls = Arc::new(AtomicUsize::new(0));
    manager
        .install(citrus_classifier(vec![0.0; 5], OutputKind::Logits, calls.clone()))
        .unwrap();

    let err = predict(&manager, b"GIF89a-but-not-really".to_vec(), Some(1)).await.unwrap_err();

    assert!(err.is_input_error());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn status_describes_installed_model() {
    let (_tmp, manager) = manager();
    manager
        .install(citrus_classifier(vec![0.0; 5], OutputKind::Logits, Arc::new(AtomicUsize::new(0))))
        .unwrap();

    let status = manager.status().await;
    let model = status.model.unwrap();

    assert!(status.ready);
    assert_eq!(model.labels, CITRUS_CLASSES);
    assert_eq!(model.image_size, 224);
    assert_eq!(model.output_kind, OutputKind::Logits);
}
