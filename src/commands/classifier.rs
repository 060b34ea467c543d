use crate::error::AppError;
use crate::models::classify_types::{ModelStatus, PredictResponse};
use crate::services::classifier::model_manager::ModelManager;
use std::path::Path;

pub async fn get_model_status(model_manager: &ModelManager) -> Result<ModelStatus, AppError> {
    Ok(model_manager.status().await)
}

pub async fn download_model(model_manager: &ModelManager) -> Result<ModelStatus, AppError> {
    model_manager.download_model().await?;
    Ok(model_manager.status().await)
}

pub async fn load_model(model_manager: &ModelManager) -> Result<(), AppError> {
    if !model_manager.is_downloaded() {
        return Err(AppError::ModelNotReady(format!(
            "model artifact not found in {}, run download first",
            model_manager.config().model_dir.display()
        )));
    }
    model_manager.load_model().await
}

/// Diagnoses one uploaded image. The model must already be loaded.
pub async fn predict(
    model_manager: &ModelManager,
    image_bytes: Vec<u8>,
    top_k: Option<usize>,
) -> Result<PredictResponse, AppError> {
    let classifier = model_manager.classifier()?;
    let top_k = top_k.unwrap_or(model_manager.config().default_top_k);

    tokio::task::spawn_blocking(move || classifier.predict(&image_bytes, top_k))
        .await
        .map_err(|e| AppError::Message(format!("Task join failed: {}", e)))?
}

pub async fn predict_file(
    model_manager: &ModelManager,
    image_path: &Path,
    top_k: Option<usize>,
) -> Result<PredictResponse, AppError> {
    load_model(model_manager).await?;

    let bytes = tokio::fs::read(image_path).await.map_err(|e| {
        AppError::Decode(format!("Failed to read image {}: {}", image_path.display(), e))
    })?;
    predict(model_manager, bytes, top_k).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[tokio::test]
    async fn predict_refuses_without_model() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config::from_lookup(|_| None).unwrap().with_model_dir(Some(tmp.path().to_path_buf()));
        let manager = ModelManager::new(config);

        let err = predict(&manager, vec![1, 2, 3], Some(1)).await.unwrap_err();
        assert!(matches!(err, AppError::ModelNotReady(_)));

        let err = predict_file(&manager, &tmp.path().join("leaf.png"), None).await.unwrap_err();
        assert!(matches!(err, AppError::ModelNotReady(_)));
    }
}
