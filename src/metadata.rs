//! Per-image analysis metadata written beside outputs.

use anyhow::Result;
use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Top-level metadata document (`<stem>.sonodx.toml`).
#[derive(Serialize, Deserialize, Default, Debug)]
pub struct SonodxMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<AnalysisSections>,
}

/// All sections recorded for one analysis run.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct AnalysisSections {
    /// Core results, flattened into the section root.
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub core: Option<toml::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<toml::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution: Option<ExecutionContext>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<SystemInfo>,
}

/// Execution context for reproducibility.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ExecutionContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sonodx_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_line: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time_ms: Option<f64>,
}

/// Model and device information.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct SystemInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_requested: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_selected: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_selection_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_checksum: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_load_time_ms: Option<f64>,
}

/// Load an existing metadata file, or start fresh when absent or unreadable.
pub fn load_or_create_metadata(path: &Path) -> SonodxMetadata {
    if !path.exists() {
        return SonodxMetadata::default();
    }
    match fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!(
                    "⚠️  Could not parse existing metadata {} ({e}), starting fresh",
                    path.display()
                );
                SonodxMetadata::default()
            }
        },
        Err(e) => {
            warn!(
                "⚠️  Could not read existing metadata {} ({e}), starting fresh",
                path.display()
            );
            SonodxMetadata::default()
        }
    }
}

/// Serialize and write the metadata document.
pub fn save_metadata(path: &Path, metadata: &SonodxMetadata) -> Result<()> {
    let content = toml::to_string_pretty(metadata)?;
    fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn metadata_round_trips() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("scan.sonodx.toml");

        let metadata = SonodxMetadata {
            analysis: Some(AnalysisSections {
                core: None,
                config: None,
                execution: Some(ExecutionContext {
                    timestamp: Some(Utc::now()),
                    sonodx_version: Some("0.1.0".to_string()),
                    command_line: Some(vec!["sonodx".to_string(), "analyze".to_string()]),
                    processing_time_ms: Some(12.5),
                }),
                system: Some(SystemInfo {
                    device_requested: Some("auto".to_string()),
                    device_selected: Some("cpu".to_string()),
                    ..SystemInfo::default()
                }),
            }),
        };

        save_metadata(&path, &metadata).unwrap();
        let loaded = load_or_create_metadata(&path);

        let sections = loaded.analysis.unwrap();
        let execution = sections.execution.unwrap();
        assert_eq!(execution.sonodx_version.as_deref(), Some("0.1.0"));
        assert_eq!(execution.processing_time_ms, Some(12.5));
        assert_eq!(
            sections.system.unwrap().device_selected.as_deref(),
            Some("cpu")
        );
    }

    #[test]
    fn unreadable_metadata_starts_fresh() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("scan.sonodx.toml");
        fs::write(&path, "not [ valid toml").unwrap();

        let loaded = load_or_create_metadata(&path);
        assert!(loaded.analysis.is_none());
    }

    #[test]
    fn missing_metadata_starts_fresh() {
        let loaded = load_or_create_metadata(Path::new("/nowhere/scan.sonodx.toml"));
        assert!(loaded.analysis.is_none());
    }
}
