//! Input collection: files, directories, and glob patterns.

use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Check if a file is a supported image format.
/// Supports: jpg, jpeg, png, webp, bmp, tiff, tif
pub fn is_supported_image_file(path: &Path) -> bool {
    if let Some(ext) = path.extension() {
        let ext_lower = ext.to_string_lossy().to_lowercase();
        matches!(
            ext_lower.as_str(),
            "jpg" | "jpeg" | "png" | "webp" | "bmp" | "tiff" | "tif"
        )
    } else {
        false
    }
}

/// Find all image files in a directory (non-recursive), sorted.
pub fn find_images_in_directory(dir_path: &Path) -> Result<Vec<PathBuf>> {
    let mut image_files = Vec::new();

    for entry in fs::read_dir(dir_path)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() && is_supported_image_file(&path) {
            image_files.push(path);
        }
    }

    image_files.sort();
    Ok(image_files)
}

/// Collect image files from multiple sources (files, directories, or glob
/// patterns).
///
/// In strict mode, missing or unsupported inputs are errors; otherwise they
/// are logged and skipped. The result is sorted and deduplicated.
pub fn collect_images_from_sources(sources: &[String], strict: bool) -> Result<Vec<PathBuf>> {
    let mut all_image_files = Vec::new();

    for source in sources {
        let source_path = Path::new(source);

        if source_path.is_file() {
            if is_supported_image_file(source_path) {
                all_image_files.push(source_path.to_path_buf());
            } else if strict {
                return Err(Error::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!(
                        "file is not a supported image format: {}",
                        source_path.display()
                    ),
                )));
            }
        } else if source_path.is_dir() {
            all_image_files.extend(find_images_in_directory(source_path)?);
        } else if !source.contains('*') && !source.contains('?') && !source.contains('[') {
            // A plain path that does not exist.
            if strict {
                return Err(Error::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("file does not exist: {source}"),
                )));
            }
            log::warn!("⚠️  File does not exist: {source}");
        } else {
            match glob::glob(source) {
                Ok(paths) => {
                    let mut found_any = false;
                    for path_result in paths {
                        match path_result {
                            Ok(path) => {
                                if path.is_file() && is_supported_image_file(&path) {
                                    all_image_files.push(path);
                                    found_any = true;
                                }
                            }
                            Err(e) => {
                                log::warn!("⚠️  Error reading path in glob {source}: {e}");
                            }
                        }
                    }
                    if !found_any && strict {
                        return Err(Error::Io(std::io::Error::new(
                            std::io::ErrorKind::NotFound,
                            format!("no image files found matching pattern: {source}"),
                        )));
                    }
                }
                Err(_) => {
                    if strict {
                        return Err(Error::Io(std::io::Error::new(
                            std::io::ErrorKind::NotFound,
                            format!("source path does not exist and is not a valid glob pattern: {source}"),
                        )));
                    }
                    log::warn!("⚠️  Source path does not exist: {source}");
                }
            }
        }
    }

    all_image_files.sort();
    all_image_files.dedup();

    if all_image_files.is_empty() && strict {
        return Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "no image files found in the specified sources",
        )));
    }

    Ok(all_image_files)
}
