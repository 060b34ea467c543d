use serde::Serialize;

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ClassOrderMismatch {
    pub index: usize,
    pub dataset: Option<String>,
    pub serving: Option<String>,
}

#[derive(Debug, Serialize, Clone)]
pub struct ClassOrderReport {
    pub dataset_classes: Vec<String>,
    pub serving_classes: Vec<String>,
    pub matches: bool,
    pub mismatches: Vec<ClassOrderMismatch>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ClassAccuracy {
    pub class_name: String,
    pub correct: usize,
    pub total: usize,
    pub accuracy: f64,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Misclassification {
    pub true_class: String,
    pub predicted: String,
    pub count: usize,
}

#[derive(Debug, Serialize, Clone)]
pub struct EvaluationReport {
    pub per_class: Vec<ClassAccuracy>,
    pub correct: usize,
    pub total: usize,
    pub overall_accuracy: f64,
    pub failed: usize,
    pub misclassifications: Vec<Misclassification>,
}
