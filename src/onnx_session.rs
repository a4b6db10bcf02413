//! ONNX Runtime session management and the ONNX-backed inference backend.

use crate::error::{Error, Result};
use crate::model::{InferenceBackend, RawPrediction, SEG_SHAPE};
use log::Level;
use ndarray::Array4;
#[allow(unused_imports)]
use ort::execution_providers::ExecutionProvider;
use ort::{
    execution_providers::CPUExecutionProvider, logging::LogLevel, session::Session, value::Value,
};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable overriding the model weights path.
pub const MODEL_PATH_ENV: &str = "SONODX_MODEL_PATH";

/// Environment variable providing the expected weights MD5 checksum.
pub const MODEL_CHECKSUM_ENV: &str = "SONODX_MODEL_CHECKSUM";

/// Expected shape of the classification output.
const CLS_SHAPE: [usize; 2] = [1, 3];

/// Device selection result.
#[derive(Debug, Clone)]
pub struct DeviceSelection {
    pub device: String,
    pub reason: String,
}

/// Resolve the requested device to one the build supports.
///
/// Only the CPU execution provider is compiled in; `auto` resolves to it and
/// unknown device names fall back to it with a warning.
pub fn determine_device(requested: &str) -> DeviceSelection {
    match requested {
        "auto" => DeviceSelection {
            device: "cpu".to_string(),
            reason: "Auto-selected CPU".to_string(),
        },
        "cpu" => DeviceSelection {
            device: "cpu".to_string(),
            reason: "User explicitly chose cpu".to_string(),
        },
        other => {
            log::warn!("⚠️  Unknown device '{other}', using CPU");
            DeviceSelection {
                device: "cpu".to_string(),
                reason: format!("Unknown device '{other}', fell back to CPU"),
            }
        }
    }
}

/// Resolve the weights path: CLI argument first, then the environment.
pub fn resolve_model_path(cli_path: Option<&str>) -> Result<PathBuf> {
    let raw = match cli_path {
        Some(path) => path.to_string(),
        None => std::env::var(MODEL_PATH_ENV).map_err(|_| {
            Error::ModelLoad(format!(
                "no model configured; pass --model-path or set {MODEL_PATH_ENV}"
            ))
        })?,
    };

    let path = PathBuf::from(raw);
    if !path.is_file() {
        return Err(Error::ModelLoad(format!(
            "model file does not exist: {}",
            path.display()
        )));
    }
    Ok(path)
}

/// Resolve the expected checksum: CLI argument first, then the environment.
pub fn resolve_model_checksum(cli_checksum: Option<&str>) -> Option<String> {
    cli_checksum
        .map(str::to_string)
        .or_else(|| std::env::var(MODEL_CHECKSUM_ENV).ok())
}

fn log_level_from_ort(level: LogLevel) -> Level {
    match level {
        LogLevel::Verbose => Level::Trace,
        LogLevel::Info => Level::Trace,
        LogLevel::Warning => Level::Debug,
        LogLevel::Error => Level::Info,
        LogLevel::Fatal => Level::Error,
    }
}

fn ort_level_from_log(level: Level) -> LogLevel {
    match level {
        // ONNX Runtime's info level is verbose enough to be trace for us.
        Level::Trace => LogLevel::Verbose,
        Level::Debug => LogLevel::Warning,
        Level::Info => LogLevel::Error,
        Level::Warn => LogLevel::Error,
        Level::Error => LogLevel::Fatal,
    }
}

fn build_session(bytes: &[u8]) -> Result<Session> {
    // Choose the ORT log level based on what is enabled for us.
    let ort_log_level = [
        Level::Trace,
        Level::Debug,
        Level::Info,
        Level::Warn,
        Level::Error,
    ]
    .into_iter()
    .find(|&lvl| log::log_enabled!(lvl))
    .map(ort_level_from_log)
    .unwrap_or(LogLevel::Fatal);

    Session::builder()
        .map_err(|e| Error::ModelLoad(format!("failed to create session builder: {e}")))?
        .with_logger(Box::new(|level, _, _, _, msg| {
            let log_level = log_level_from_ort(level);
            log::log!(log_level, "[onnx] {msg}");
        }))
        .map_err(|e| Error::ModelLoad(format!("failed to set logger: {e}")))?
        .with_log_level(ort_log_level)
        .map_err(|e| Error::ModelLoad(format!("failed to set log level: {e}")))?
        .with_execution_providers([CPUExecutionProvider::default().build()])
        .map_err(|e| Error::ModelLoad(format!("failed to set execution providers: {e}")))?
        .commit_from_memory(bytes)
        .map_err(|e| Error::ModelLoad(format!("failed to load model: {e}")))
}

/// ONNX-backed inference backend.
///
/// Holds the process-wide session plus the graph's tensor names. The graph
/// contract is positional: output 0 is the segmentation probability map,
/// output 1 the class logits.
#[derive(Debug)]
pub struct OnnxBackend {
    session: Session,
    input_name: String,
    seg_name: String,
    cls_name: String,
}

impl OnnxBackend {
    /// Load the weights file and build a session.
    ///
    /// Fatal at startup on a missing/empty/corrupt file, a checksum mismatch,
    /// or a graph without exactly one input and two outputs.
    pub fn from_file(path: &Path, expected_checksum: Option<&str>) -> Result<Self> {
        let bytes = fs::read(path).map_err(|e| {
            Error::ModelLoad(format!("cannot read model file {}: {e}", path.display()))
        })?;

        if bytes.is_empty() {
            return Err(Error::ModelLoad(format!(
                "model file is empty (0 bytes): {}",
                path.display()
            )));
        }

        let checksum = format!("{:x}", md5::compute(&bytes));
        if let Some(expected) = expected_checksum {
            if !checksum.eq_ignore_ascii_case(expected) {
                return Err(Error::ModelLoad(format!(
                    "model checksum mismatch for {}: expected {expected}, got {checksum}",
                    path.display()
                )));
            }
            log::debug!("✓ Model checksum verified: {checksum}");
        }

        log::debug!(
            "✓ Model file size: {:.2} MB",
            bytes.len() as f64 / (1024.0 * 1024.0)
        );

        let session = build_session(&bytes)?;

        if session.inputs.len() != 1 {
            return Err(Error::ModelLoad(format!(
                "expected 1 graph input, found {}",
                session.inputs.len()
            )));
        }
        if session.outputs.len() != 2 {
            return Err(Error::ModelLoad(format!(
                "expected 2 graph outputs (segmentation map and class logits), found {}",
                session.outputs.len()
            )));
        }

        let input_name = session.inputs[0].name.clone();
        let seg_name = session.outputs[0].name.clone();
        let cls_name = session.outputs[1].name.clone();
        log::debug!("🧠 Model graph: {input_name} -> ({seg_name}, {cls_name})");

        Ok(Self {
            session,
            input_name,
            seg_name,
            cls_name,
        })
    }
}

impl InferenceBackend for OnnxBackend {
    fn infer(&mut self, input: &Array4<f32>) -> Result<RawPrediction> {
        let input_value = Value::from_array(input.clone())
            .map_err(|e| Error::Inference(format!("failed to create input value: {e}")))?;

        let outputs = self
            .session
            .run(ort::inputs![self.input_name.as_str() => &input_value])
            .map_err(|e| Error::Inference(format!("failed to run inference: {e}")))?;

        let seg_view = outputs[self.seg_name.as_str()]
            .try_extract_array::<f32>()
            .map_err(|e| Error::Inference(format!("failed to extract segmentation output: {e}")))?;
        if seg_view.shape() != SEG_SHAPE.as_slice() {
            return Err(Error::ShapeMismatch {
                what: "segmentation output",
                expected: format!("{SEG_SHAPE:?}"),
                actual: format!("{:?}", seg_view.shape()),
            });
        }
        let seg = seg_view
            .to_owned()
            .into_dimensionality::<ndarray::Ix4>()
            .map_err(|e| Error::Inference(format!("segmentation output dims: {e}")))?;

        let cls_view = outputs[self.cls_name.as_str()]
            .try_extract_array::<f32>()
            .map_err(|e| Error::Inference(format!("failed to extract class output: {e}")))?;
        if cls_view.shape() != CLS_SHAPE.as_slice() {
            return Err(Error::ShapeMismatch {
                what: "classification output",
                expected: format!("{CLS_SHAPE:?}"),
                actual: format!("{:?}", cls_view.shape()),
            });
        }
        let cls = cls_view
            .into_dimensionality::<ndarray::Ix2>()
            .map_err(|e| Error::Inference(format!("classification output dims: {e}")))?;
        let logits = [cls[[0, 0]], cls[[0, 1]], cls[[0, 2]]];

        Ok(RawPrediction { seg, logits })
    }
}
