use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the segmentation pipeline.
///
/// Startup problems (bad flags, unreadable or malformed label files) surface as `Config` or
/// `ColorParse`. A model whose class dimension disagrees with the label file is a
/// `ClassCountMismatch`, and a frame whose size differs from the one the encoder was opened
/// with is a `FrameSizeMismatch`. End of stream is not an error.
#[derive(Error, Debug)]
pub enum SegError {
    #[error("configuration error: {message}")]
    Config { message: String },

    #[error("invalid color in {path:?} at line {line}: {content:?} (expected `R,G,B` with values 0-255)")]
    ColorParse {
        path: PathBuf,
        line: usize,
        content: String,
    },

    #[error("class count mismatch: {source_name} has {actual} classes but the label file has {expected}")]
    ClassCountMismatch {
        source_name: String,
        expected: usize,
        actual: usize,
    },

    #[error("frame size mismatch: expected {}x{}, got {}x{}", expected.0, expected.1, actual.0, actual.1)]
    FrameSizeMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("failed to read {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("video error: {operation} failed")]
    Video {
        operation: String,
        #[source]
        source: opencv::Error,
    },

    #[error("model error: {operation} failed: {message}")]
    Model { operation: String, message: String },

    #[error("tensor shape error")]
    Shape(#[from] ndarray::ShapeError),

    #[error("image error: {message}")]
    Image { message: String },
}

pub type Result<T> = std::result::Result<T, SegError>;

impl SegError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub(crate) fn video(operation: impl Into<String>, source: opencv::Error) -> Self {
        Self::Video {
            operation: operation.into(),
            source,
        }
    }

    pub(crate) fn model(operation: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Model {
            operation: operation.into(),
            message: err.to_string(),
        }
    }
}
