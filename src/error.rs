//! Error types for the capture session.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while collecting calibration images.
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Failed to open camera {index}: {reason}")]
    CameraOpen { index: u32, reason: String },
    #[error("Failed to capture frame: {0}")]
    CameraFrame(String),
    #[error("Frame size mismatch: expected {expected_width}x{expected_height}, got {width}x{height}")]
    FrameSize {
        expected_width: u32,
        expected_height: u32,
        width: u32,
        height: u32,
    },
    #[error("Failed to create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write image {path}: {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("Display error: {0}")]
    Display(String),
}

pub type Result<T> = std::result::Result<T, CaptureError>;
