use crate::commands::classifier::load_model;
use crate::error::AppError;
use crate::models::dataset_types::{ClassOrderReport, EvaluationReport};
use crate::services::class_order;
use crate::services::classifier::model_manager::ModelManager;
use crate::services::disease_info::CITRUS_CLASSES;
use crate::services::evaluation;
use std::path::PathBuf;

pub async fn evaluate_dataset(
    model_manager: &ModelManager,
    dataset_dir: PathBuf,
    per_class: usize,
) -> Result<EvaluationReport, AppError> {
    load_model(model_manager).await?;
    let classifier = model_manager.classifier()?;

    tokio::task::spawn_blocking(move || evaluation::evaluate(&classifier, &dataset_dir, per_class))
        .await
        .map_err(|e| AppError::Message(format!("Task join failed: {}", e)))?
}

/// Compares training class folders with the labels the server would use:
/// the artifact's `id2label` when `from_model` is set, the citrus reference order otherwise.
pub async fn verify_class_order(
    model_manager: &ModelManager,
    dataset_dir: PathBuf,
    from_model: bool,
) -> Result<ClassOrderReport, AppError> {
    let serving: Vec<String> = if from_model {
        model_manager.read_artifact_config().await?.labels()?
    } else {
        CITRUS_CLASSES.iter().map(|s| s.to_string()).collect()
    };

    class_order::verify_class_order(&dataset_dir, &serving)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[tokio::test]
    async fn verifies_against_artifact_labels() {
        let models = tempfile::tempdir().unwrap();
        std::fs::write(
            models.path().join("model_config.json"),
            r#"{"id2label": {"0": "Canker", "1": "Black spot"}, "image_size": 224, "value_range": "unit", "output_kind": "logits"}"#,
        )
        .unwrap();
        let dataset = tempfile::tempdir().unwrap();
        for name in ["Black spot", "Canker"] {
            std::fs::create_dir(dataset.path().join(name)).unwrap();
        }

        let config = Config::from_lookup(|_| None).unwrap().with_model_dir(Some(models.path().to_path_buf()));
        let manager = ModelManager::new(config);

        let report = verify_class_order(&manager, dataset.path().to_path_buf(), true).await.unwrap();
        assert!(!report.matches);
        assert_eq!(report.mismatches.len(), 2);

        let report = verify_class_order(&manager, dataset.path().to_path_buf(), false).await.unwrap();
        assert!(!report.matches);
        assert_eq!(report.mismatches[0].index, 2);
    }
}
