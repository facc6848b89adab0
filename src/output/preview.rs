use super::{Viewer, ViewerAction};
use crate::convert::rgb_to_mat;
use crate::error::{Result, SegError};
use image::RgbImage;
use opencv::{core::Mat, highgui};

pub const QUIT_KEY: char = 'q';

const FRAME_WINDOW: &str = "Frame";
const LEGEND_WINDOW: &str = "Legend";

/// OpenCV HighGUI windows for the legend and the composited frames.
///
/// All windows are destroyed on drop.
pub struct HighGuiViewer {
    poll_ms: i32,
}

impl Default for HighGuiViewer {
    fn default() -> Self {
        Self::new()
    }
}

impl HighGuiViewer {
    pub fn new() -> Self {
        Self { poll_ms: 1 }
    }

    pub fn show_legend(&mut self, legend: &Mat) -> Result<()> {
        highgui::imshow(LEGEND_WINDOW, legend).map_err(|e| SegError::video("legend display", e))
    }
}

impl Viewer for HighGuiViewer {
    fn show(&mut self, frame: &RgbImage) -> Result<ViewerAction> {
        let mat = rgb_to_mat(frame)?;
        highgui::imshow(FRAME_WINDOW, &mat).map_err(|e| SegError::video("frame display", e))?;
        let key = highgui::wait_key(self.poll_ms).map_err(|e| SegError::video("key poll", e))?;
        Ok(action_for_key(key))
    }
}

impl Drop for HighGuiViewer {
    fn drop(&mut self) {
        if let Err(e) = highgui::destroy_all_windows() {
            tracing::warn!("Failed to close preview windows: {}", e);
        }
    }
}

/// Map a `wait_key` result (-1 when no key was pressed) to an action.
fn action_for_key(key: i32) -> ViewerAction {
    if key >= 0 && (key & 0xff) == QUIT_KEY as i32 {
        ViewerAction::Quit
    } else {
        ViewerAction::Continue
    }
}
