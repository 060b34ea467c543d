use crate::error::AppError;
use crate::models::dataset_types::{ClassAccuracy, EvaluationReport, Misclassification};
use crate::services::classifier::inference::Classifier;
use crate::services::fs_service;
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Runs the first `per_class` images of every `dataset_dir/<label>/` folder
/// through the classifier and tallies top-1 accuracy.
///
/// Decoding and letterboxing run on the rayon pool; forward passes are
/// serialized by the backend. Images that fail are logged and counted in
/// `failed`, never scored.
pub fn evaluate(classifier: &Classifier, dataset_dir: &Path, per_class: usize) -> Result<EvaluationReport, AppError> {
    if !dataset_dir.is_dir() {
        return Err(format!("Dataset directory does not exist: {}", dataset_dir.display()).into());
    }

    let labels = classifier.labels();
    let mut jobs: Vec<(usize, PathBuf)> = Vec::new();

    for (class_idx, label) in labels.iter().enumerate() {
        let class_dir = dataset_dir.join(label);
        if !class_dir.is_dir() {
            warn!(class = %label, dir = %class_dir.display(), "Class directory not found");
            continue;
        }

        let images = fs_service::list_image_files(&class_dir)?;
        info!(class = %label, images = images.len().min(per_class), "Queued class");
        jobs.extend(images.into_iter().take(per_class).map(|p| (class_idx, p)));
    }

    let outcomes: Vec<(usize, Option<String>)> = jobs
        .par_iter()
        .map(|(class_idx, path)| {
            let predicted = std::fs::read(path)
                .map_err(AppError::from)
                .and_then(|bytes| classifier.predict(&bytes, 1))
                .map(|response| response.top_class);

            match predicted {
                Ok(class_name) => (*class_idx, Some(class_name)),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping image");
                    (*class_idx, None)
                }
            }
        })
        .collect();

    Ok(tally(labels, &outcomes))
}

fn tally(labels: &[String], outcomes: &[(usize, Option<String>)]) -> EvaluationReport {
    let mut correct = vec![0usize; labels.len()];
    let mut total = vec![0usize; labels.len()];
    let mut confusion: HashMap<(usize, String), usize> = HashMap::new();
    let mut failed = 0;

    for (class_idx, predicted) in outcomes {
        let Some(predicted) = predicted else {
            failed += 1;
            continue;
        };

        total[*class_idx] += 1;
        if *predicted == labels[*class_idx] {
            correct[*class_idx] += 1;
        } else {
            *confusion.entry((*class_idx, predicted.clone())).or_insert(0) += 1;
        }
    }

    let per_class: Vec<ClassAccuracy> = labels
        .iter()
        .enumerate()
        .filter(|(idx, _)| total[*idx] > 0)
        .map(|(idx, label)| ClassAccuracy {
            class_name: label.clone(),
            correct: correct[idx],
            total: total[idx],
            accuracy: correct[idx] as f64 / total[idx] as f64,
        })
        .collect();

    let mut confusion: Vec<((usize, String), usize)> = confusion.into_iter().collect();
    // Group by true class, most frequent confusion first.
    confusion.sort_by(|((a_idx, a_pred), a_count), ((b_idx, b_pred), b_count)| {
        a_idx
            .cmp(b_idx)
            .then(b_count.cmp(a_count))
            .then(a_pred.cmp(b_pred))
    });

    let correct_sum: usize = correct.iter().sum();
    let total_sum: usize = total.iter().sum();

    EvaluationReport {
        per_class,
        correct: correct_sum,
        total: total_sum,
        overall_accuracy: if total_sum > 0 {
            correct_sum as f64 / total_sum as f64
        } else {
            0.0
        },
        failed,
        misclassifications: confusion
            .into_iter()
            .map(|((idx, predicted), count)| Misclassification {
                true_class: labels[idx].clone(),
                predicted,
                count,
            })
            .collect(),
    }
}
