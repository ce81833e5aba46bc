//! Image preparation for OCR.

use image::imageops;
use image::{DynamicImage, GrayImage, Luma};
use tracing::debug;

use crate::models::config::PreprocessConfig;

/// 3x3 sharpen kernel, already normalized to sum to 1.
const SHARPEN_KERNEL: [f32; 9] = [
    -2.0 / 16.0, -2.0 / 16.0, -2.0 / 16.0,
    -2.0 / 16.0, 32.0 / 16.0, -2.0 / 16.0,
    -2.0 / 16.0, -2.0 / 16.0, -2.0 / 16.0,
];

/// Normalizes a raw page image before OCR.
#[derive(Debug, Clone)]
pub struct ImagePreparer {
    /// Contrast gain (1.0 leaves the image unchanged).
    contrast_gain: f32,
    /// Apply the sharpen convolution.
    sharpen: bool,
    /// Luminance cutoff for binarization, if enabled.
    threshold: Option<u8>,
}

impl ImagePreparer {
    /// Create a preparer with default settings (gain 2.0, sharpen, no binarization).
    pub fn new() -> Self {
        Self {
            contrast_gain: 2.0,
            sharpen: true,
            threshold: None,
        }
    }

    pub fn from_config(config: &PreprocessConfig) -> Self {
        Self {
            contrast_gain: config.contrast_gain,
            sharpen: config.sharpen,
            threshold: config.binarize.then_some(config.binarize_threshold),
        }
    }

    /// Set contrast gain.
    pub fn with_contrast_gain(mut self, gain: f32) -> Self {
        self.contrast_gain = gain;
        self
    }

    /// Enable or disable sharpening.
    pub fn with_sharpen(mut self, sharpen: bool) -> Self {
        self.sharpen = sharpen;
        self
    }

    /// Enable fixed-threshold binarization.
    pub fn with_binarization(mut self, threshold: Option<u8>) -> Self {
        self.threshold = threshold;
        self
    }

    /// Grayscale, contrast, sharpen and optionally binarize.
    pub fn prepare(&self, image: &DynamicImage) -> DynamicImage {
        let gray = image.to_luma8();
        let mut gray = enhance_contrast(&gray, self.contrast_gain);

        if self.sharpen {
            gray = imageops::filter3x3(&gray, &SHARPEN_KERNEL);
        }

        if let Some(threshold) = self.threshold {
            gray = binarize(&gray, threshold);
        }

        debug!(
            "Prepared {}x{} image (gain={}, sharpen={}, threshold={:?})",
            gray.width(),
            gray.height(),
            self.contrast_gain,
            self.sharpen,
            self.threshold
        );

        DynamicImage::ImageLuma8(gray)
    }
}

impl Default for ImagePreparer {
    fn default() -> Self {
        Self::new()
    }
}

/// Push every pixel away from the mean luminance by `gain`.
fn enhance_contrast(image: &GrayImage, gain: f32) -> GrayImage {
    let pixel_count = (image.width() as u64 * image.height() as u64).max(1);
    let sum: u64 = image.pixels().map(|p| p[0] as u64).sum();
    let mean = (sum as f32 / pixel_count as f32).round();

    let mut result = image.clone();
    for pixel in result.pixels_mut() {
        let value = mean + gain * (pixel[0] as f32 - mean);
        *pixel = Luma([value.round().clamp(0.0, 255.0) as u8]);
    }
    result
}

/// Pixels below `threshold` become black, the rest white.
fn binarize(image: &GrayImage, threshold: u8) -> GrayImage {
    let mut result = image.clone();
    for pixel in result.pixels_mut() {
        pixel[0] = if pixel[0] < threshold { 0 } else { 255 };
    }
    result
}
