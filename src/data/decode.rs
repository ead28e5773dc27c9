//! Mel spectrogram image decoding.
//!
//! Spectrograms are stored as grayscale images with mel bins along the
//! vertical axis and time frames along the horizontal axis.

use std::path::Path;

use crate::error::{MelError, Result};
use crate::math::feature_map::FeatureMap;

/// Decodes an image file, converts it to grayscale, resizes it to
/// `height × width` and normalizes pixels to [0, 1].
pub fn load_mel_image(path: &Path, height: usize, width: usize) -> Result<FeatureMap> {
    let img = image::open(path).map_err(|source| MelError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(mel_from_image(&img, height, width))
}

/// Same as [`load_mel_image`] for an already decoded image.
pub fn mel_from_image(img: &image::DynamicImage, height: usize, width: usize) -> FeatureMap {
    let resized = img.resize_exact(width as u32, height as u32, image::imageops::FilterType::Triangle);
    let gray = resized.to_luma8();
    let data = gray.pixels().map(|p| p.0[0] as f64 / 255.0).collect();
    FeatureMap::from_vec(1, height, width, data)
}

/// Returns `true` for file extensions the decoder is built with.
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| matches!(e.to_ascii_lowercase().as_str(), "png" | "jpg" | "jpeg" | "bmp" | "gif"))
        .unwrap_or(false)
}
