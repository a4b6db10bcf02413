//! Confidence-weighted suppression applied after the model's forward pass.

use crate::classes::{softmax, TumorClass, NUM_CLASSES};
use ndarray::Array4;

/// Attenuate a probability map by the classifier's Normal probability.
///
/// `refined = mask * (1 - softmax(logits)[Normal])`. This is a second,
/// continuous suppression independent of the hard gate inside the forward
/// pass; the two compose (a gated all-zero map stays all-zero) and are kept
/// as separate functions on purpose, since they are not equivalent for all
/// inputs. Returns a new array.
pub fn refine_predictions(seg: &Array4<f32>, logits: &[f32; NUM_CLASSES]) -> Array4<f32> {
    let normal_prob = softmax(logits)[TumorClass::Normal.index()];
    seg.mapv(|p| p * (1.0 - normal_prob))
}
