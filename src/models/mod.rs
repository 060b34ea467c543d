pub mod classify_types;
pub mod dataset_types;
pub mod model_types;
