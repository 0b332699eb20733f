//! Calib Capture - camera calibration image collector
//!
//! Shows a live camera preview, saves a numbered PNG each time the operator
//! presses Enter, and stops once the requested number of images is on disk.

pub mod app;
pub mod camera;
pub mod cli;
pub mod config;
pub mod error;
pub mod frame;
pub mod input;
pub mod preview;
pub mod session;
pub mod store;

pub use app::CaptureApp;
pub use config::CaptureConfig;
pub use error::CaptureError;
pub use session::Session;
