pub mod commands;
pub mod config;
pub mod error;
pub mod models;
pub mod services;

use clap::Parser;
use commands::Cli;
use config::Config;
use services::classifier::model_manager::ModelManager;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

pub use error::AppError;
pub use services::classifier::inference::{Classifier, InferenceBackend};

pub fn run() -> ExitCode {
    // stdout carries the JSON result, logs go to stderr
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    runtime.block_on(async move {
        let config = match Config::load() {
            Ok(config) => config.with_model_dir(cli.model_dir),
            Err(e) => return report_error(e),
        };
        info!(model_dir = %config.model_dir.display(), "Starting plant-vision");

        let model_manager = ModelManager::new(config);
        match commands::execute(&model_manager, cli.command).await {
            Ok(outcome) => {
                print_json(&outcome.body);
                if outcome.success {
                    ExitCode::SUCCESS
                } else {
                    ExitCode::FAILURE
                }
            }
            Err(e) => report_error(e),
        }
    })
}

fn report_error(err: AppError) -> ExitCode {
    error!(kind = err.kind(), "{}", err);
    match serde_json::to_value(&err) {
        Ok(body) => print_json(&body),
        Err(_) => println!("{{\"error\": {:?}}}", err.to_string()),
    }
    ExitCode::FAILURE
}

fn print_json(body: &serde_json::Value) {
    match serde_json::to_string_pretty(body) {
        Ok(text) => println!("{}", text),
        Err(e) => error!("Failed to serialize output: {}", e),
    }
}
