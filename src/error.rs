//! Error types for the sonodx crate.

use std::path::PathBuf;

/// Errors that can occur while analyzing an image or rendering a report.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The uploaded file could not be decoded as an image.
    #[error("failed to decode image: {0}")]
    InvalidImageFormat(image::ImageError),

    /// The decoded image cannot be reduced to a single grayscale channel.
    #[error("cannot reduce a {0}-channel image to grayscale")]
    InvalidChannelCount(u8),

    /// The model weights could not be loaded. Fatal at startup.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// A tensor crossing the normalizer/model boundary had the wrong shape.
    /// Indicates a programming error, not a bad input.
    #[error("wrong {what} shape: expected {expected}, got {actual}")]
    ShapeMismatch {
        /// Which tensor was malformed.
        what: &'static str,
        /// Expected dimensions.
        expected: String,
        /// Observed dimensions.
        actual: String,
    },

    /// The inference runtime failed while executing the forward pass.
    #[error("inference failed: {0}")]
    Inference(String),

    /// A patient-form field failed validation; the report is not generated.
    #[error("invalid {field}: {reason}")]
    Validation {
        /// Name of the offending field.
        field: &'static str,
        /// User-facing explanation.
        reason: String,
    },

    /// An output file already exists and overwriting was not allowed.
    #[error("output already exists: {0} (pass --force to overwrite)")]
    OutputExists(PathBuf),

    /// The report document could not be rendered or written.
    #[error("report rendering error: {0}")]
    Report(String),

    /// An error occurred while reading or writing image files.
    #[error("image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let io_err = Error::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert!(io_err.to_string().contains("gone"));

        let channels = Error::InvalidChannelCount(5);
        assert!(channels.to_string().contains("5-channel"));

        let shape = Error::ShapeMismatch {
            what: "segmentation output",
            expected: "[1, 1, 256, 256]".to_string(),
            actual: "[1, 1, 128, 128]".to_string(),
        };
        let msg = shape.to_string();
        assert!(msg.contains("segmentation output"));
        assert!(msg.contains("[1, 1, 128, 128]"));

        let validation = Error::Validation {
            field: "mobile",
            reason: "mobile number must be exactly 10 digits".to_string(),
        };
        assert!(validation.to_string().contains("invalid mobile"));
    }
}
