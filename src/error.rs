//! Custom error types for opvnn.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the opvnn library.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to load an image file.
    #[error("failed to load image from {path}: {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Failed to save an image file.
    #[error("failed to save image to {path}: {source}")]
    ImageSave {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Failed to list an input folder.
    #[error("failed to read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create an output folder.
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The model graph file does not exist.
    #[error("model file not found: {path}")]
    ModelNotFound { path: PathBuf },

    /// Failed to load an ONNX model.
    #[error("failed to load ONNX model {name}: {source}")]
    ModelLoad {
        name: String,
        #[source]
        source: ort::Error,
    },

    /// The model loaded but its interface is not usable by the drivers.
    #[error("unsupported model: {reason}")]
    InvalidModel { reason: String },

    /// Model inference failed.
    #[error("model inference failed: {source}")]
    Inference {
        #[source]
        source: ort::Error,
    },

    /// Invalid parameter value.
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Shape mismatch between an image and a tensor, or between two tensors.
    #[error("tensor shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },
}

impl Error {
    /// Shorthand for a channel-count contract violation.
    pub(crate) fn channels(expected: usize, actual: usize) -> Self {
        Self::ShapeMismatch {
            expected: format!("{expected} channel(s)"),
            actual: format!("{actual} channel(s)"),
        }
    }
}

/// Result type alias for opvnn operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channels_message() {
        let err = Error::channels(1, 3);
        assert_eq!(
            err.to_string(),
            "tensor shape mismatch: expected 1 channel(s), got 3 channel(s)"
        );
    }
}
