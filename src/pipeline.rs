//! End-to-end analysis pipeline.

use crate::decision::{decide, DiagnosisResult};
use crate::error::Result;
use crate::model::MultiTaskModel;
use crate::preprocessing::preprocess_image;
use crate::refinement::refine_predictions;
use image::DynamicImage;

/// Analysis engine holding the process-wide model instance.
///
/// Create once with an injected model and reuse for every image; each call
/// allocates its own tensors, so nothing is shared between requests beyond
/// the read-only model parameters.
pub struct Analyzer {
    model: MultiTaskModel,
}

impl Analyzer {
    /// Wrap a constructed model.
    pub fn new(model: MultiTaskModel) -> Self {
        Self { model }
    }

    /// Run the full pipeline on one decoded image:
    /// normalize, forward pass (with gate), refine, decide.
    pub fn analyze(&mut self, image: &DynamicImage) -> Result<DiagnosisResult> {
        let input = preprocess_image(image)?;
        let (gated, logits) = self.model.forward(&input)?;
        let refined = refine_predictions(&gated, &logits);
        Ok(decide(&refined, &logits))
    }
}
