//! Output path management for analysis artifacts.

use crate::error::Result;
use std::path::{Path, PathBuf};

/// Places outputs either next to the input (with a suffix) or inside a
/// dedicated output directory (with a clean name).
pub struct OutputManager<'a> {
    output_dir: Option<&'a str>,
    input_path: &'a Path,
}

impl<'a> OutputManager<'a> {
    pub fn new(output_dir: Option<&'a str>, input_path: &'a Path) -> Self {
        Self {
            output_dir,
            input_path,
        }
    }

    /// Input file stem (filename without extension).
    fn input_stem(&self) -> &str {
        self.input_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("output")
    }

    fn place(&self, filename: &str) -> Result<PathBuf> {
        if let Some(output_dir) = self.output_dir {
            let output_dir = Path::new(output_dir);
            std::fs::create_dir_all(output_dir)?;
            Ok(output_dir.join(filename))
        } else {
            Ok(self
                .input_path
                .parent()
                .unwrap_or(Path::new("."))
                .join(filename))
        }
    }

    /// Primary output path. Clean name inside `--output-dir`, suffixed when
    /// placed next to the input.
    pub fn main_output(&self, suffix: &str, extension: &str) -> Result<PathBuf> {
        let stem = self.input_stem();
        let filename = if self.output_dir.is_some() {
            format!("{stem}.{extension}")
        } else {
            format!("{stem}_{suffix}.{extension}")
        };
        self.place(&filename)
    }

    /// Auxiliary output path; always suffixed.
    pub fn auxiliary_output(&self, suffix: &str, extension: &str) -> Result<PathBuf> {
        let stem = self.input_stem();
        self.place(&format!("{stem}_{suffix}.{extension}"))
    }

    /// Path of the per-image metadata file.
    pub fn metadata_path(&self) -> Result<PathBuf> {
        let stem = self.input_stem();
        self.place(&format!("{stem}.sonodx.toml"))
    }

    /// Path for a fully named file, placed by the same directory rules.
    pub fn named_output(&self, filename: &str) -> Result<PathBuf> {
        self.place(filename)
    }
}
