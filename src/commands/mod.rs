pub mod classifier;
pub mod dataset;

use crate::error::AppError;
use crate::services::classifier::model_manager::ModelManager;
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "plant-vision", version, about = "Citrus leaf disease diagnosis")]
pub struct Cli {
    /// Directory holding model.onnx and model_config.json (overrides PLANTVISION_MODEL_DIR)
    #[arg(long, global = true)]
    pub model_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show whether the model artifact is present and loadable
    Status {
        /// Load the model before reporting
        #[arg(long)]
        load: bool,
    },
    /// Fetch missing model artifact files from the configured URLs
    Download,
    /// Diagnose a single leaf image
    Predict {
        image: PathBuf,
        #[arg(long)]
        top_k: Option<usize>,
    },
    /// Score the model against a dataset laid out as <dir>/<class>/<image>
    Evaluate {
        dataset: PathBuf,
        #[arg(long, default_value_t = 10)]
        per_class: usize,
    },
    /// Check that training class folders sort into the serving label order
    VerifyClassOrder {
        dataset: PathBuf,
        /// Compare against the model artifact's labels instead of the citrus reference order
        #[arg(long)]
        labels_from_model: bool,
    },
}

/// Result of a command: the JSON document to print and whether the process should exit cleanly.
pub struct Outcome {
    pub body: Value,
    pub success: bool,
}

impl Outcome {
    fn ok<T: serde::Serialize>(body: &T) -> Result<Self, AppError> {
        Self::new(body, true)
    }

    fn new<T: serde::Serialize>(body: &T, success: bool) -> Result<Self, AppError> {
        let body = serde_json::to_value(body)
            .map_err(|e| AppError::Message(format!("Failed to serialize output: {}", e)))?;
        Ok(Self { body, success })
    }
}

pub async fn execute(model_manager: &ModelManager, command: Command) -> Result<Outcome, AppError> {
    match command {
        Command::Status { load } => {
            if load {
                // A failed load is still reported through the status error field.
                let _ = model_manager.load_model().await;
            }
            Outcome::ok(&classifier::get_model_status(model_manager).await?)
        }
        Command::Download => Outcome::ok(&classifier::download_model(model_manager).await?),
        Command::Predict { image, top_k } => {
            Outcome::ok(&classifier::predict_file(model_manager, &image, top_k).await?)
        }
        Command::Evaluate { dataset, per_class } => {
            Outcome::ok(&dataset::evaluate_dataset(model_manager, dataset, per_class).await?)
        }
        Command::VerifyClassOrder { dataset, labels_from_model } => {
            let report = dataset::verify_class_order(model_manager, dataset, labels_from_model).await?;
            Outcome::new(&report, report.matches)
        }
    }
}
