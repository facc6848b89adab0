use crate::error::Result;
use image::RgbImage;
use ndarray::Array4;

/// Per-class scores with shape `[1, classes, height, width]`.
///
/// Height and width are whatever the network produces and need not match the frame.
pub type ScoreVolume = Array4<f32>;

/// Trait for segmentation models
/// Allows swapping the ONNX backend for an in-memory model in tests
pub trait SegmentationModel {
    /// Run one forward pass on a working-width frame
    ///
    /// # Arguments
    /// * `frame` - RGB frame already resized to the working width
    ///
    /// # Returns
    /// * Class score volume `[1, classes, out_height, out_width]`
    fn segment(&mut self, frame: &RgbImage) -> Result<ScoreVolume>;

    /// Number of output classes when the model declares it statically
    fn class_count(&self) -> Option<usize> {
        None
    }
}
