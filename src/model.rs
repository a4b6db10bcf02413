//! Multi-task inference model: a single forward pass producing a tumor
//! probability map and 3-way class logits, with the classifier-driven gate
//! applied as part of the pass.

use crate::classes::{argmax, TumorClass, NUM_CLASSES};
use crate::error::{Error, Result};
use ndarray::Array4;

/// Expected shape of both the input tensor and the segmentation output.
pub const SEG_SHAPE: [usize; 4] = [1, 1, 256, 256];

/// Raw per-image network outputs, before gating.
#[derive(Debug, Clone)]
pub struct RawPrediction {
    /// Per-pixel tumor probabilities in `[0, 1]`, shaped `[1, 1, 256, 256]`.
    pub seg: Array4<f32>,
    /// Unnormalized classification scores in class-index order.
    pub logits: [f32; NUM_CLASSES],
}

/// Backend producing raw predictions from a normalized input tensor.
///
/// The ONNX-backed implementation lives in [`crate::onnx_session`]; tests
/// inject deterministic stubs through this seam.
pub trait InferenceBackend {
    /// Run one forward computation. No gradient tracking, no retries.
    fn infer(&mut self, input: &Array4<f32>) -> Result<RawPrediction>;
}

/// The process-wide model instance.
///
/// Constructed once at startup around an injected backend and reused for
/// every image. Inference never mutates model parameters; each call allocates
/// its own output tensors.
pub struct MultiTaskModel {
    backend: Box<dyn InferenceBackend>,
}

impl MultiTaskModel {
    /// Wrap an inference backend.
    pub fn new(backend: Box<dyn InferenceBackend>) -> Self {
        Self { backend }
    }

    /// Forward pass: gated segmentation probabilities plus raw class logits.
    ///
    /// The gate is part of the pass, not post-processing: when the
    /// classifier's own top class is Normal, the whole probability map is
    /// zeroed before anything downstream sees it.
    pub fn forward(&mut self, input: &Array4<f32>) -> Result<(Array4<f32>, [f32; NUM_CLASSES])> {
        check_shape("input tensor", input)?;
        let RawPrediction { seg, logits } = self.backend.infer(input)?;
        check_shape("segmentation output", &seg)?;
        Ok((apply_normal_gate(&seg, &logits), logits))
    }
}

/// Hard gate: multiply the whole probability map by zero when the top class
/// is Normal, by one otherwise. Returns a new array.
pub fn apply_normal_gate(
    seg: &Array4<f32>,
    logits: &[f32; NUM_CLASSES],
) -> Array4<f32> {
    let gate = if argmax(logits) == TumorClass::Normal.index() {
        0.0
    } else {
        1.0
    };
    seg.mapv(|p| p * gate)
}

fn check_shape(what: &'static str, tensor: &Array4<f32>) -> Result<()> {
    if tensor.shape() != SEG_SHAPE.as_slice() {
        return Err(Error::ShapeMismatch {
            what,
            expected: format!("{SEG_SHAPE:?}"),
            actual: format!("{:?}", tensor.shape()),
        });
    }
    Ok(())
}
