//! Live preview output
//!
//! [`FrameSink`] is what the session renders into; [`PreviewWindow`] is the
//! on-screen implementation drawing through wgpu with an egui status bar.

mod window;

pub use window::PreviewWindow;

use crate::error::Result;
use crate::frame::Frame;
use crate::session::Progress;

/// Receives the current frame once per loop iteration.
pub trait FrameSink {
    /// Show `frame`. Blocks until the display has accepted it.
    fn present(&mut self, frame: &Frame, progress: Progress) -> Result<()>;
}

/// Status line shown under the preview.
pub fn status_text(progress: Progress) -> String {
    format!("Collected {} / {}", progress.collected, progress.target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_text() {
        let text = status_text(Progress {
            collected: 3,
            target: 40,
        });
        assert_eq!(text, "Collected 3 / 40");
    }
}
