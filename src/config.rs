use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use tracing::{debug, warn};

use crate::error::AppError;

pub const DEFAULT_MODEL_FILE: &str = "model.onnx";
pub const DEFAULT_CONFIG_FILE: &str = "model_config.json";

#[derive(Debug, Clone)]
pub struct Config {
    pub model_dir: PathBuf,
    pub model_file: String,
    pub config_file: String,
    pub model_url: Option<String>,
    pub config_url: Option<String>,
    pub use_gpu: bool,
    pub intra_threads: usize,
    pub default_top_k: usize,
}

impl Config {
    pub fn load() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup so tests don't touch the process env.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            model_dir: try_load(&lookup, "PLANTVISION_MODEL_DIR", "models")?,
            model_file: try_load(&lookup, "PLANTVISION_MODEL_FILE", DEFAULT_MODEL_FILE)?,
            config_file: try_load(&lookup, "PLANTVISION_CONFIG_FILE", DEFAULT_CONFIG_FILE)?,
            model_url: optional(&lookup, "PLANTVISION_MODEL_URL"),
            config_url: optional(&lookup, "PLANTVISION_CONFIG_URL"),
            use_gpu: try_load(&lookup, "PLANTVISION_USE_GPU", "false")?,
            intra_threads: try_load(&lookup, "PLANTVISION_INTRA_THREADS", "4")?,
            default_top_k: try_load(&lookup, "PLANTVISION_TOP_K", "1")?,
        })
    }

    pub fn with_model_dir(mut self, model_dir: Option<PathBuf>) -> Self {
        if let Some(dir) = model_dir {
            self.model_dir = dir;
        }
        self
    }

    pub fn model_path(&self) -> PathBuf {
        self.model_dir.join(&self.model_file)
    }

    pub fn config_path(&self) -> PathBuf {
        self.model_dir.join(&self.config_file)
    }
}

fn optional<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).filter(|v| !v.trim().is_empty())
}

fn try_load<F, T>(lookup: &F, key: &str, default: &str) -> Result<T, AppError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    let raw = lookup(key).unwrap_or_else(|| {
        debug!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.trim().parse().map_err(|e| {
        warn!("Invalid {key} value: {e}");
        AppError::Message(format!("Invalid value for {key}: {raw:?} ({e})"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(config.model_path(), PathBuf::from("models").join("model.onnx"));
        assert_eq!(config.config_path(), PathBuf::from("models").join("model_config.json"));
        assert!(config.model_url.is_none());
        assert!(!config.use_gpu);
        assert_eq!(config.intra_threads, 4);
        assert_eq!(config.default_top_k, 1);
    }

    #[test]
    fn reads_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("PLANTVISION_MODEL_DIR", "/srv/models"),
            ("PLANTVISION_USE_GPU", "true"),
            ("PLANTVISION_TOP_K", "3"),
            ("PLANTVISION_MODEL_URL", "https://example.com/model.onnx"),
            ("PLANTVISION_CONFIG_URL", "  "),
        ]))
        .unwrap();

        assert_eq!(config.model_dir, PathBuf::from("/srv/models"));
        assert!(config.use_gpu);
        assert_eq!(config.default_top_k, 3);
        assert_eq!(config.model_url.as_deref(), Some("https://example.com/model.onnx"));
        assert!(config.config_url.is_none());
    }

    #[test]
    fn rejects_malformed_numbers() {
        let err = Config::from_lookup(lookup_from(&[("PLANTVISION_INTRA_THREADS", "four")]))
            .unwrap_err();

        assert!(err.to_string().contains("PLANTVISION_INTRA_THREADS"));
    }

    #[test]
    fn cli_model_dir_wins() {
        let config = Config::from_lookup(lookup_from(&[("PLANTVISION_MODEL_DIR", "/a")]))
            .unwrap()
            .with_model_dir(Some(PathBuf::from("/b")));

        assert_eq!(config.model_dir, PathBuf::from("/b"));
    }
}
