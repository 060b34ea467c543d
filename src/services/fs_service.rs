use crate::error::AppError;
use std::path::{Path, PathBuf};

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp", "tiff", "tif"];

pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn read_dir(dir_path: &Path) -> Result<std::fs::ReadDir, AppError> {
    if !dir_path.exists() {
        return Err(format!("Path does not exist: {}", dir_path.display()).into());
    }

    std::fs::read_dir(dir_path)
        .map_err(|e| AppError::Message(format!("Cannot read directory {}: {}", dir_path.display(), e)))
}

/// Names of the visible subdirectories, sorted by byte order. This is the
/// order the training pipeline assigns class indices in.
pub fn list_subdirectories(path: &Path) -> Result<Vec<String>, AppError> {
    let mut names = Vec::new();

    for entry in read_dir(path)? {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };

        let is_dir = entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false);
        let name = entry.file_name().to_string_lossy().to_string();

        // Skip hidden folders
        if !is_dir || name.starts_with('.') {
            continue;
        }
        names.push(name);
    }

    names.sort();
    Ok(names)
}

/// Image files directly under `path`, sorted case-insensitively by file name.
pub fn list_image_files(path: &Path) -> Result<Vec<PathBuf>, AppError> {
    let mut images = Vec::new();

    for entry in read_dir(path)? {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };

        let is_file = entry.file_type().map(|ft| ft.is_file()).unwrap_or(false);
        let path = entry.path();
        if is_file && is_image_file(&path) {
            images.push(path);
        }
    }

    images.sort_by_key(|p| {
        p.file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_lowercase()
    });

    Ok(images)
}
