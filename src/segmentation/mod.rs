mod onnx;
mod preprocess;
pub mod types;

pub use onnx::OnnxSegmenter;
pub use preprocess::{resize_to_width, Preprocessor, NETWORK_INPUT_SIZE};
pub use types::{ScoreVolume, SegmentationModel};

use crate::error::Result;
use std::path::Path;

/// Load the default segmentation backend (ONNX Runtime)
pub fn create_default_model<P: AsRef<Path>>(model_path: P) -> Result<Box<dyn SegmentationModel>> {
    let model = OnnxSegmenter::new(model_path)?;
    Ok(Box::new(model))
}
