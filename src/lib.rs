//! Semantic segmentation overlay for video files.
//!
//! Each frame is decoded, resized to a working width, run through a pretrained segmentation
//! network, and blended with a color-coded class mask before being written to the output video.

pub mod capture;
pub mod compositor;
pub mod config;
pub mod convert;
pub mod error;
pub mod labels;
pub mod legend;
pub mod output;
pub mod pipeline;
pub mod segmentation;

pub use config::{Args, Settings};
pub use error::{Result, SegError};
pub use labels::{ClassTable, Palette};
pub use pipeline::{run_pipeline, RunSummary, StopReason};
