pub mod class_order;
pub mod classifier;
pub mod disease_info;
pub mod evaluation;
pub mod fs_service;
