//! Offline check that the serving label order matches the order the model was
//! trained with. A mismatch produces wrong diagnoses without any runtime error,
//! so this runs as a deployment precondition rather than a request-time guard.

use crate::error::AppError;
use crate::models::dataset_types::{ClassOrderMismatch, ClassOrderReport};
use crate::services::fs_service;
use std::path::Path;
use tracing::{info, warn};

pub fn compare_class_order(dataset: &[String], serving: &[String]) -> ClassOrderReport {
    let mismatches: Vec<ClassOrderMismatch> = (0..dataset.len().max(serving.len()))
        .filter_map(|index| {
            let expected = dataset.get(index);
            let actual = serving.get(index);
            (expected != actual).then(|| ClassOrderMismatch {
                index,
                dataset: expected.cloned(),
                serving: actual.cloned(),
            })
        })
        .collect();

    ClassOrderReport {
        dataset_classes: dataset.to_vec(),
        serving_classes: serving.to_vec(),
        matches: mismatches.is_empty(),
        mismatches,
    }
}

/// Compares the sorted class directories under `dataset_dir` with `serving`.
pub fn verify_class_order(dataset_dir: &Path, serving: &[String]) -> Result<ClassOrderReport, AppError> {
    let dataset = fs_service::list_subdirectories(dataset_dir)?;
    if dataset.is_empty() {
        return Err(format!("No class directories found in {}", dataset_dir.display()).into());
    }

    let report = compare_class_order(&dataset, serving);
    if report.matches {
        info!(classes = ?report.dataset_classes, "Class order matches");
    } else {
        warn!(
            dataset = ?report.dataset_classes,
            serving = ?report.serving_classes,
            "Class order mismatch"
        );
    }

    Ok(report)
}
