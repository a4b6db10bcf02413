//! Final decision layer: mask binarization and classification readout.

use crate::classes::{argmax, softmax, TumorClass, NUM_CLASSES};
use image::{GrayImage, Luma};
use ndarray::Array4;

/// Pixels strictly above this probability are tumor in the binary mask.
pub const MASK_THRESHOLD: f32 = 0.5;

/// Final per-image diagnosis.
///
/// Constructed once per inference and consumed by output writing and report
/// rendering; not persisted beyond its artifacts.
#[derive(Debug, Clone)]
pub struct DiagnosisResult {
    /// Predicted class.
    pub label: TumorClass,
    /// Confidence for `label`, in percent.
    pub confidence: f32,
    /// Per-class probabilities in class-index order. Sums to 1.
    pub probabilities: [f32; NUM_CLASSES],
    /// Binarized tumor mask; pixel values are 0 or 255.
    pub mask: GrayImage,
    /// Continuous tumor probability map quantized to 8 bits.
    pub probability_map: GrayImage,
}

impl DiagnosisResult {
    /// Number of mask pixels classified as tumor.
    pub fn tumor_pixels(&self) -> u32 {
        self.mask.pixels().filter(|p| p[0] == 255).count() as u32
    }
}

/// Threshold a refined probability map into an 8-bit binary mask.
///
/// The threshold is strict: a pixel exactly at 0.5 maps to 0.
pub fn binarize_mask(refined: &Array4<f32>) -> GrayImage {
    let height = refined.shape()[2] as u32;
    let width = refined.shape()[3] as u32;
    GrayImage::from_fn(width, height, |x, y| {
        let p = refined[[0, 0, y as usize, x as usize]];
        Luma([if p > MASK_THRESHOLD { 255 } else { 0 }])
    })
}

/// Quantize a refined probability map to an 8-bit grayscale image.
pub fn probability_map(refined: &Array4<f32>) -> GrayImage {
    let height = refined.shape()[2] as u32;
    let width = refined.shape()[3] as u32;
    GrayImage::from_fn(width, height, |x, y| {
        let p = refined[[0, 0, y as usize, x as usize]].clamp(0.0, 1.0);
        Luma([(p * 255.0).round() as u8])
    })
}

/// Turn the refined mask and raw logits into a reportable decision.
pub fn decide(refined: &Array4<f32>, logits: &[f32; NUM_CLASSES]) -> DiagnosisResult {
    let probabilities = softmax(logits);
    let index = argmax(&probabilities);
    DiagnosisResult {
        label: TumorClass::ALL[index],
        confidence: probabilities[index] * 100.0,
        probabilities,
        mask: binarize_mask(refined),
        probability_map: probability_map(refined),
    }
}
