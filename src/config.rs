//! Capture configuration.
//!
//! Everything except the image count is fixed for a calibration run; the
//! values live here so the camera, store and preview agree on them.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Name of the directory created under the working directory.
pub const OUTPUT_DIR_NAME: &str = "calib_pics";

/// Number of images collected when `--images` is not given.
pub const DEFAULT_IMAGE_COUNT: i64 = 40;

/// Configuration for one calibration capture run.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Images to collect before the session finishes.
    pub target_images: i64,
    /// Directory the numbered PNG files are written to.
    pub output_dir: PathBuf,
    /// Camera index passed to the capture backend.
    pub camera_index: u32,
    /// Requested frame width.
    pub frame_width: u32,
    /// Requested frame height.
    pub frame_height: u32,
    /// Delay after opening the stream before the first frame is read.
    pub warmup: Duration,
    /// Preview window title.
    pub window_title: String,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            target_images: DEFAULT_IMAGE_COUNT,
            output_dir: PathBuf::from(OUTPUT_DIR_NAME),
            camera_index: 0,
            frame_width: 640,
            frame_height: 480,
            warmup: Duration::from_secs(2),
            window_title: "Calibration".to_string(),
        }
    }
}

impl CaptureConfig {
    /// Build a configuration collecting `target_images` into
    /// `<working_dir>/calib_pics`.
    pub fn new(target_images: i64, working_dir: &Path) -> Self {
        Self {
            target_images,
            output_dir: working_dir.join(OUTPUT_DIR_NAME),
            ..Default::default()
        }
    }
}
