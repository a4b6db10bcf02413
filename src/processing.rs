//! CLI drivers: batch analysis and single-image report generation.

use crate::config::{AnalyzeConfig, ReportConfig};
use crate::error::Error;
use crate::image_input::collect_images_from_sources;
use crate::metadata::{
    load_or_create_metadata, save_metadata, AnalysisSections, ExecutionContext, SonodxMetadata,
    SystemInfo,
};
use crate::model::MultiTaskModel;
use crate::onnx_session::{
    determine_device, resolve_model_checksum, resolve_model_path, DeviceSelection, OnnxBackend,
};
use crate::output_manager::OutputManager;
use crate::pipeline::Analyzer;
use crate::report::render_report;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Serializable per-image results for the metadata core section.
#[derive(Serialize)]
pub struct AnalysisRecord {
    pub label: String,
    /// Confidence in percent.
    pub confidence: f32,
    /// Per-class probabilities in class-index order.
    pub probabilities: Vec<f32>,
    pub tumor_pixels: u32,
    pub mask_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probability_map_path: Option<String>,
    #[serde(skip_serializing)]
    pub processing_time_ms: f64,
}

/// Everything loaded once per process and reused across images.
struct LoadedPipeline {
    analyzer: Analyzer,
    device: DeviceSelection,
    model_path: PathBuf,
    model_checksum: Option<String>,
    load_time_ms: f64,
}

fn load_pipeline(
    device_requested: &str,
    model_path: Option<&str>,
    model_checksum: Option<&str>,
) -> Result<LoadedPipeline> {
    let device = determine_device(device_requested);
    debug!("🖥️  {}", device.reason);

    let path = resolve_model_path(model_path)?;
    let checksum = resolve_model_checksum(model_checksum);

    let load_start = Instant::now();
    let backend = OnnxBackend::from_file(&path, checksum.as_deref())?;
    let load_time_ms = load_start.elapsed().as_secs_f64() * 1000.0;
    debug!(
        "🧠 Model loaded in {load_time_ms:.1}ms from {}",
        path.display()
    );

    Ok(LoadedPipeline {
        analyzer: Analyzer::new(MultiTaskModel::new(Box::new(backend))),
        device,
        model_path: path,
        model_checksum: checksum,
        load_time_ms,
    })
}

/// Analyze every collected image sequentially. Returns the success count.
pub fn run_analysis(config: &AnalyzeConfig) -> Result<usize> {
    let framework_start = Instant::now();
    let start_timestamp = Utc::now();
    let command_line: Vec<String> = std::env::args().collect();

    let images = collect_images_from_sources(&config.base.sources, config.base.strict)?;
    if images.is_empty() {
        warn!("No valid images found to process");
        return Ok(0);
    }
    info!("🎯 Found {} image(s) to process", images.len());

    let mut pipeline = load_pipeline(
        &config.base.device,
        config.model_path.as_deref(),
        config.model_checksum.as_deref(),
    )?;

    let mut successful = 0usize;
    let mut failed = 0usize;

    for (index, image_path) in images.iter().enumerate() {
        match analyze_one(&mut pipeline.analyzer, image_path, config) {
            Ok(record) => {
                successful += 1;
                info!(
                    "✅ {} ({}/{}): {} ({:.2}% confidence) in {:.1}ms",
                    image_path.display(),
                    index + 1,
                    images.len(),
                    record.label,
                    record.confidence,
                    record.processing_time_ms
                );
                if !config.base.skip_metadata {
                    save_metadata_for(
                        &record,
                        config,
                        image_path,
                        &command_line,
                        &pipeline,
                        start_timestamp,
                    )?;
                }
            }
            Err(e) => {
                failed += 1;
                if config.base.strict {
                    return Err(e);
                }
                warn!(
                    "⚠️  Failed to process {} ({}/{}): {e}",
                    image_path.display(),
                    index + 1,
                    images.len()
                );
            }
        }
    }

    if successful > 0 {
        info!(
            "✅ Processed {} image(s) in {:.1}s",
            successful,
            framework_start.elapsed().as_secs_f64()
        );
    }
    if failed > 0 {
        warn!("⚠️  {} of {} images failed to process", failed, images.len());
    }

    Ok(successful)
}

fn analyze_one(
    analyzer: &mut Analyzer,
    image_path: &Path,
    config: &AnalyzeConfig,
) -> Result<AnalysisRecord> {
    let start = Instant::now();
    debug!("🖼️  Processing: {}", image_path.display());

    let img = image::open(image_path).map_err(Error::InvalidImageFormat)?;
    let diagnosis = analyzer.analyze(&img)?;

    let manager = OutputManager::new(config.base.output_dir.as_deref(), image_path);

    let mask_path = manager.main_output("mask", "png")?;
    ensure_writable(&mask_path, config.base.force)?;
    diagnosis.mask.save(&mask_path)?;
    debug!("💾 Mask saved to: {}", mask_path.display());

    let probability_map_path = if config.save_probability_map {
        let path = manager.auxiliary_output("prob", "png")?;
        ensure_writable(&path, config.base.force)?;
        diagnosis.probability_map.save(&path)?;
        debug!("💾 Probability map saved to: {}", path.display());
        Some(path.to_string_lossy().to_string())
    } else {
        None
    };

    Ok(AnalysisRecord {
        label: diagnosis.label.to_string(),
        confidence: diagnosis.confidence,
        probabilities: diagnosis.probabilities.to_vec(),
        tumor_pixels: diagnosis.tumor_pixels(),
        mask_path: mask_path.to_string_lossy().to_string(),
        probability_map_path,
        processing_time_ms: start.elapsed().as_secs_f64() * 1000.0,
    })
}

fn ensure_writable(path: &Path, force: bool) -> crate::error::Result<()> {
    if path.exists() && !force {
        return Err(Error::OutputExists(path.to_path_buf()));
    }
    Ok(())
}

fn save_metadata_for(
    record: &AnalysisRecord,
    config: &AnalyzeConfig,
    image_path: &Path,
    command_line: &[String],
    pipeline: &LoadedPipeline,
    start_timestamp: DateTime<Utc>,
) -> Result<()> {
    let manager = OutputManager::new(config.base.output_dir.as_deref(), image_path);
    let metadata_path = manager.metadata_path()?;

    let mut metadata: SonodxMetadata = load_or_create_metadata(&metadata_path);
    metadata.analysis = Some(AnalysisSections {
        core: Some(toml::Value::try_from(record).context("serialize analysis results")?),
        config: Some(toml::Value::try_from(config).context("serialize analysis config")?),
        execution: Some(ExecutionContext {
            timestamp: Some(start_timestamp),
            sonodx_version: Some(env!("CARGO_PKG_VERSION").to_string()),
            command_line: Some(command_line.to_vec()),
            processing_time_ms: Some(record.processing_time_ms),
        }),
        system: Some(SystemInfo {
            device_requested: Some(config.base.device.clone()),
            device_selected: Some(pipeline.device.device.clone()),
            device_selection_reason: Some(pipeline.device.reason.clone()),
            model_path: Some(pipeline.model_path.display().to_string()),
            model_checksum: pipeline.model_checksum.clone(),
            model_load_time_ms: Some(pipeline.load_time_ms),
        }),
    });

    save_metadata(&metadata_path, &metadata)?;
    debug!("📄 Metadata saved to: {}", metadata_path.display());
    Ok(())
}

/// Analyze one image and render the PDF diagnostic report.
/// Returns the report path.
pub fn run_report(config: &ReportConfig) -> Result<PathBuf> {
    // Reject bad patient input before any model work happens.
    config.patient.validate()?;

    let mut pipeline = load_pipeline(
        &config.base.device,
        config.model_path.as_deref(),
        config.model_checksum.as_deref(),
    )?;

    let image_path = Path::new(&config.image);
    let img = image::open(image_path).map_err(Error::InvalidImageFormat)?;
    let diagnosis = pipeline.analyzer.analyze(&img)?;
    info!(
        "✅ {}: {} ({:.2}% confidence)",
        image_path.display(),
        diagnosis.label,
        diagnosis.confidence
    );

    let manager = OutputManager::new(config.base.output_dir.as_deref(), image_path);

    // Keep the mask beside the report so the finding can be reviewed.
    let mask_path = manager.main_output("mask", "png")?;
    ensure_writable(&mask_path, config.base.force)?;
    diagnosis.mask.save(&mask_path)?;
    debug!("💾 Mask saved to: {}", mask_path.display());

    let report_path = match &config.output {
        Some(path) => PathBuf::from(path),
        None => manager.named_output(&config.patient.default_report_filename())?,
    };
    ensure_writable(&report_path, config.base.force)?;
    render_report(&config.patient, &diagnosis, &report_path)?;
    info!("📄 Report saved to: {}", report_path.display());

    Ok(report_path)
}
