//! Breast ultrasound tumor segmentation and classification.
//!
//! A pretrained multi-task network classifies an ultrasound image as Normal,
//! Benign, or Malignant and produces a per-pixel tumor probability map. The
//! pipeline normalizes the upload, runs one forward pass (which gates the map
//! on the classifier's own decision), attenuates the map a second time by the
//! Normal probability, and binarizes the result into a reviewable mask.
//!
//! # Quick start
//!
//! ```no_run
//! use sonodx::{Analyzer, MultiTaskModel, OnnxBackend};
//! use std::path::Path;
//!
//! # fn main() -> sonodx::Result<()> {
//! let backend = OnnxBackend::from_file(Path::new("BestModel.onnx"), None)?;
//! let mut analyzer = Analyzer::new(MultiTaskModel::new(Box::new(backend)));
//!
//! let image = image::open("scan.png").map_err(sonodx::Error::InvalidImageFormat)?;
//! let diagnosis = analyzer.analyze(&image)?;
//! println!("{} ({:.2}% confidence)", diagnosis.label, diagnosis.confidence);
//! # Ok(())
//! # }
//! ```

pub mod classes;
pub mod config;
pub mod decision;
pub mod error;
pub mod image_input;
pub mod metadata;
pub mod model;
pub mod onnx_session;
pub mod output_manager;
pub mod pipeline;
pub mod preprocessing;
pub mod processing;
pub mod refinement;
pub mod report;

pub use classes::TumorClass;
pub use decision::DiagnosisResult;
pub use error::{Error, Result};
pub use model::{InferenceBackend, MultiTaskModel, RawPrediction};
pub use onnx_session::OnnxBackend;
pub use pipeline::Analyzer;
pub use report::PatientDetails;
