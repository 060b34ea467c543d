use crate::config::Config;
use crate::error::AppError;
use crate::models::classify_types::{LoadedModelInfo, ModelStatus};
use crate::models::model_types::ModelArtifactConfig;
use crate::services::classifier::inference::{Classifier, OrtBackend};
use futures::StreamExt;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Owns the single classifier for the process. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct ModelManager {
    config: Config,
    classifier: Arc<RwLock<Option<Arc<Classifier>>>>,
    loading: Arc<Mutex<bool>>,
    error: Arc<Mutex<Option<String>>>,
}

impl ModelManager {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            classifier: Arc::new(RwLock::new(None)),
            loading: Arc::new(Mutex::new(false)),
            error: Arc::new(Mutex::new(None)),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn model_path(&self) -> PathBuf {
        self.config.model_path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.config.config_path()
    }

    pub fn is_downloaded(&self) -> bool {
        self.model_path().exists() && self.config_path().exists()
    }

    pub fn is_ready(&self) -> bool {
        self.classifier
            .read()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }

    pub async fn is_loading(&self) -> bool {
        *self.loading.lock().await
    }

    pub async fn get_error(&self) -> Option<String> {
        self.error.lock().await.clone()
    }

    /// The loaded classifier. Checked on every call; there is no cached ready flag.
    pub fn classifier(&self) -> Result<Arc<Classifier>, AppError> {
        self.classifier
            .read()
            .map_err(|_| AppError::ModelNotReady("classifier lock poisoned".to_string()))?
            .clone()
            .ok_or_else(|| AppError::ModelNotReady("call load_model first".to_string()))
    }

    /// Installs an already constructed classifier, e.g. one backed by a non-ONNX runtime.
    pub fn install(&self, classifier: Classifier) -> Result<(), AppError> {
        let mut guard = self
            .classifier
            .write()
            .map_err(|_| AppError::Message("classifier lock poisoned".to_string()))?;
        *guard = Some(Arc::new(classifier));
        Ok(())
    }

    pub async fn status(&self) -> ModelStatus {
        let model = self.classifier().ok().map(|c| {
            let preprocess = c.preprocess_config();
            LoadedModelInfo {
                labels: c.labels().to_vec(),
                image_size: preprocess.image_size,
                value_range: preprocess.value_range,
                output_kind: c.output_kind(),
                input_name: c.input_name().to_string(),
            }
        });

        ModelStatus {
            downloaded: self.is_downloaded(),
            loading: self.is_loading().await,
            ready: model.is_some(),
            error: self.get_error().await,
            model,
        }
    }

    /// Reads only the artifact metadata, without building a session.
    pub async fn read_artifact_config(&self) -> Result<ModelArtifactConfig, AppError> {
        let config_path = self.config_path();
        let content = tokio::fs::read_to_string(&config_path).await.map_err(|e| {
            AppError::ModelConfig(format!("Failed to read config file {}: {}", config_path.display(), e))
        })?;
        ModelArtifactConfig::from_json(&content)
    }

    pub async fn download_model(&self) -> Result<(), AppError> {
        if self.is_downloaded() {
            return Ok(());
        }

        tokio::fs::create_dir_all(&self.config.model_dir)
            .await
            .map_err(|e| AppError::Download(format!("Failed to create model directory: {}", e)))?;

        let downloads = [
            (self.config.config_url.as_deref(), self.config_path()),
            (self.config.model_url.as_deref(), self.model_path()),
        ];

        for (url, dest) in downloads {
            if dest.exists() {
                continue;
            }
            let url = url.ok_or_else(|| {
                AppError::Download(format!("{} is missing and no download URL is configured", dest.display()))
            })?;
            download_file(url, &dest).await?;
        }

        Ok(())
    }

    pub async fn load_model(&self) -> Result<(), AppError> {
        if self.is_ready() {
            return Ok(());
        }

        {
            let mut loading = self.loading.lock().await;
            if *loading {
                return Err("Model is already loading".into());
            }
            *loading = true;
        }

        *self.error.lock().await = None;

        let result = self.do_load_model().await;

        *self.loading.lock().await = false;

        match result {
            Ok(classifier) => {
                info!(
                    labels = ?classifier.labels(),
                    image_size = classifier.preprocess_config().image_size,
                    output_kind = ?classifier.output_kind(),
                    "Model loaded"
                );
                self.install(classifier)
            }
            Err(e) => {
                warn!(error = %e, "Model failed to load");
                *self.error.lock().await = Some(e.to_string());
                Err(e)
            }
        }
    }

    async fn do_load_model(&self) -> Result<Classifier, AppError> {
        let artifact = self.read_artifact_config().await?;
        let labels = artifact.labels()?;

        let model_path = self.model_path();
        if !model_path.exists() {
            return Err(AppError::ModelNotReady(format!("model file not found at {}", model_path.display())));
        }

        let use_gpu = self.config.use_gpu;
        let intra_threads = self.config.intra_threads;

        tokio::task::spawn_blocking(move || -> Result<Classifier, AppError> {
            let session = build_session(&model_path, use_gpu, intra_threads)?;
            let backend = OrtBackend::new(session, artifact.input_name.clone())?;
            let classifier = Classifier::new(Box::new(backend), labels, artifact.preprocess(), artifact.output_kind)?;

            // Fail startup if the label list does not match the output width.
            classifier.probe().map_err(|e| {
                AppError::ModelConfig(format!("Model output does not match id2label: {}", e))
            })?;

            Ok(classifier)
        })
        .await
        .map_err(|e| AppError::Message(format!("Failed to spawn model loading task: {}", e)))?
    }
}

fn build_session(model_path: &Path, use_gpu: bool, intra_threads: usize) -> Result<Session, AppError> {
    let _ = ort::init().with_name("plant-vision").commit();

    let mut builder = Session::builder()
        .map_err(|e| AppError::ModelConfig(format!("Failed to create session builder: {}", e)))?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(|e| AppError::ModelConfig(format!("Failed to set optimization level: {}", e)))?
        .with_intra_threads(intra_threads)
        .map_err(|e| AppError::ModelConfig(format!("Failed to set intra threads: {}", e)))?;

    if use_gpu {
        builder = builder
            .with_execution_providers([
                ort::execution_providers::CUDAExecutionProvider::default().build(),
                ort::execution_providers::CPUExecutionProvider::default().build(),
            ])
            .map_err(|e| AppError::ModelConfig(format!("Failed to register GPU execution providers: {}", e)))?;
    } else {
        builder = builder
            .with_execution_providers([ort::execution_providers::CPUExecutionProvider::default().build()])
            .map_err(|e| AppError::ModelConfig(format!("Failed to register CPU execution provider: {}", e)))?;
    }

    builder
        .commit_from_file(model_path)
        .map_err(|e| AppError::ModelConfig(format!("Failed to load ONNX model: {}", e)))
}

async fn download_file(url: &str, dest: &Path) -> Result<(), AppError> {
    info!(url, dest = %dest.display(), "Downloading model artifact");

    let response = reqwest::Client::new().get(url).send().await?;
    if !response.status().is_success() {
        return Err(AppError::Download(format!("Failed to download {}: HTTP {}", url, response.status())));
    }

    let result = write_stream(response, dest).await;
    if result.is_err() {
        let _ = tokio::fs::remove_file(dest).await;
    }
    result
}

async fn write_stream(response: reqwest::Response, dest: &Path) -> Result<(), AppError> {
    let total_size = response.content_length().unwrap_or(0);
    let mut downloaded: u64 = 0;
    let mut last_logged = 0;

    let mut file = tokio::fs::File::create(dest)
        .await
        .map_err(|e| AppError::Download(format!("Failed to create file {}: {}", dest.display(), e)))?;

    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        downloaded += chunk.len() as u64;
        file.write_all(&chunk)
            .await
            .map_err(|e| AppError::Download(format!("Failed to write to file: {}", e)))?;

        if total_size > 0 {
            let progress = (downloaded * 100) / total_size;
            if progress >= last_logged + 10 {
                info!(progress, "Download progress");
                last_logged = progress;
            }
        }
    }
    file.flush().await?;

    info!(bytes = downloaded, dest = %dest.display(), "Download complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::model_types::{OutputKind, PreprocessConfig, ValueRange};
    use crate::services::classifier::inference::InferenceBackend;
    use crate::services::classifier::preprocess::NormalizedImage;

    struct Uniform;

    impl InferenceBackend for Uniform {
        fn forward(&self, _input: NormalizedImage) -> Result<Vec<f32>, AppError> {
            Ok(vec![0.0; 5])
        }
    }

    fn config_in(dir: &Path) -> Config {
        Config::from_lookup(|_| None).unwrap().with_model_dir(Some(dir.to_path_buf()))
    }

    #[test]
    fn not_ready_until_a_classifier_is_installed() {
        let tmp = tempfile::tempdir().unwrap();
        let manager = ModelManager::new(config_in(tmp.path()));

        assert!(!manager.is_ready());
        assert!(matches!(manager.classifier(), Err(AppError::ModelNotReady(_))));

        let classifier = Classifier::new(
            Box::new(Uniform),
            crate::services::disease_info::CITRUS_CLASSES.iter().map(|s| s.to_string()).collect(),
            PreprocessConfig { image_size: 224, value_range: ValueRange::Unit },
            OutputKind::Logits,
        )
        .unwrap();
        manager.install(classifier).unwrap();

        assert!(manager.is_ready());
        assert!(manager.clone().classifier().is_ok());
    }

    #[tokio::test]
    async fn status_reports_missing_artifact() {
        let tmp = tempfile::tempdir().unwrap();
        let manager = ModelManager::new(config_in(tmp.path()));

        let status = manager.status().await;
        assert!(!status.downloaded);
        assert!(!status.ready);
        assert!(status.model.is_none());
    }

    #[tokio::test]
    async fn load_without_artifact_records_error() {
        let tmp = tempfile::tempdir().unwrap();
        let manager = ModelManager::new(config_in(tmp.path()));

        let err = manager.load_model().await.unwrap_err();
        assert!(matches!(err, AppError::ModelConfig(_)));
        assert!(manager.get_error().await.is_some());
        assert!(!manager.is_loading().await);
        assert!(!manager.is_ready());
    }

    #[tokio::test]
    async fn load_rejects_config_without_labels() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join("model_config.json"),
            r#"{"id2label": {}, "image_size": 224, "value_range": "unit", "output_kind": "logits"}"#,
        )
        .unwrap();
        std::fs::write(tmp.path().join("model.onnx"), b"not a model").unwrap();
        let manager = ModelManager::new(config_in(tmp.path()));

        let err = manager.load_model().await.unwrap_err();
        assert!(err.to_string().contains("id2label"));
    }

    #[tokio::test]
    async fn download_without_urls_fails_cleanly() {
        let tmp = tempfile::tempdir().unwrap();
        let manager = ModelManager::new(config_in(&tmp.path().join("models")));

        let err = manager.download_model().await.unwrap_err();
        assert!(matches!(err, AppError::Download(_)));
    }

    #[tokio::test]
    async fn download_is_a_noop_when_present() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("model_config.json"), b"{}").unwrap();
        std::fs::write(tmp.path().join("model.onnx"), b"weights").unwrap();
        let manager = ModelManager::new(config_in(tmp.path()));

        manager.download_model().await.unwrap();
        assert!(manager.is_downloaded());
    }
}
