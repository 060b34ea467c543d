use crate::error::AppError;
use crate::models::model_types::{PreprocessConfig, ValueRange};
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageReader, RgbImage};
use ndarray::Array4;
use std::io::Cursor;
use tracing::instrument;

/// `(1, size, size, 3)` NHWC tensor fed to the classifier.
pub type NormalizedImage = Array4<f32>;

/// Letterboxes arbitrary uploads onto the square canvas the model was trained on.
#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    config: PreprocessConfig,
}

impl Normalizer {
    pub fn new(config: PreprocessConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> PreprocessConfig {
        self.config
    }

    #[instrument(skip(self, bytes), fields(len = bytes.len(), size = self.config.image_size))]
    pub fn normalize(&self, bytes: &[u8]) -> Result<NormalizedImage, AppError> {
        let img = decode_image(bytes)?;
        let canvas = letterbox(&img, self.config.image_size)?;
        to_tensor(&canvas, self.config.value_range)
    }
}

pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, AppError> {
    if bytes.is_empty() {
        return Err(AppError::Decode("image is empty".to_string()));
    }

    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| AppError::Decode(e.to_string()))?
        .decode()
        .map_err(|e| AppError::Decode(e.to_string()))
}

/// Scales the longer side onto `size`, then pastes the result centered on a
/// black `size x size` canvas. Odd padding leaves the extra pixel at the
/// bottom/right.
pub fn letterbox(img: &DynamicImage, size: u32) -> Result<RgbImage, AppError> {
    let (w, h) = (img.width(), img.height());
    if w == 0 || h == 0 || size == 0 {
        return Err(AppError::InvalidImage { width: w, height: h });
    }

    let rgb = img.to_rgb8();
    if w == size && h == size {
        return Ok(rgb);
    }

    let scale = size as f64 / w.max(h) as f64;
    let new_w = scaled_dim(w, scale, size);
    let new_h = scaled_dim(h, scale, size);
    let resized = imageops::resize(&rgb, new_w, new_h, FilterType::Lanczos3);

    let mut canvas = RgbImage::new(size, size);
    let x = (size - new_w) / 2;
    let y = (size - new_h) / 2;
    imageops::replace(&mut canvas, &resized, x as i64, y as i64);

    Ok(canvas)
}

fn scaled_dim(dim: u32, scale: f64, size: u32) -> u32 {
    ((dim as f64 * scale).round() as u32).clamp(1, size)
}

pub fn to_tensor(rgb: &RgbImage, range: ValueRange) -> Result<NormalizedImage, AppError> {
    let (w, h) = rgb.dimensions();
    // RgbImage is already row-major HWC, so the raw buffer maps straight onto NHWC.
    let data: Vec<f32> = rgb.as_raw().iter().map(|&v| range.apply(v)).collect();

    Array4::from_shape_vec((1, h as usize, w as usize, 3), data)
        .map_err(|e| AppError::Message(format!("Failed to create tensor: {}", e)))
}
