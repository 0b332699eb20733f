//! Persistence of captured frames.

use std::path::{Path, PathBuf};

use crate::error::{CaptureError, Result};
use crate::frame::Frame;

/// Destination for captured frames.
pub trait FrameStore {
    /// Persist `frame` as capture number `index` and return where it went.
    fn save(&mut self, frame: &Frame, index: u32) -> Result<PathBuf>;

    /// Location shown to the operator when the run finishes.
    fn location(&self) -> &Path;
}

/// File name for capture number `index`.
pub fn capture_file_name(index: u32) -> String {
    format!("calib_{}.png", index)
}

/// Writes numbered PNG files into a directory.
///
/// Numbering always starts from the index the session passes in, so a second
/// run into the same directory writes `calib_0.png` again and replaces the
/// earlier file of that name. Other files are left untouched.
#[derive(Debug, Clone)]
pub struct PngDirectory {
    dir: PathBuf,
}

impl PngDirectory {
    /// Use `dir`, creating it (and any parents) if it does not exist.
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|source| CaptureError::OutputDir {
            path: dir.clone(),
            source,
        })?;
        log::debug!("Output directory ready: {}", dir.display());
        Ok(Self { dir })
    }

    pub fn path_for(&self, index: u32) -> PathBuf {
        self.dir.join(capture_file_name(index))
    }
}

impl FrameStore for PngDirectory {
    fn save(&mut self, frame: &Frame, index: u32) -> Result<PathBuf> {
        let path = self.path_for(index);
        frame
            .to_rgb_image()
            .save_with_format(&path, image::ImageFormat::Png)
            .map_err(|source| CaptureError::Save {
                path: path.clone(),
                source,
            })?;
        log::debug!("Wrote {}", path.display());
        Ok(path)
    }

    fn location(&self) -> &Path {
        &self.dir
    }
}
