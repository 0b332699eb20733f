//! Camera capture module
//!
//! Opens a camera through nokhwa and copies decoded frames into the
//! session's [`Frame`] buffer. Reads are synchronous: [`FrameSource::acquire`]
//! blocks until the driver hands over the next frame.

use image::imageops::{self, FilterType};
use image::RgbImage;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    ApiBackend, CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType,
    Resolution,
};
use nokhwa::Camera;

use crate::config::CaptureConfig;
use crate::error::{CaptureError, Result};
use crate::frame::Frame;

/// Something that can fill a frame buffer with the latest image.
pub trait FrameSource {
    /// Overwrite `frame` with the most recent image from the source.
    fn acquire(&mut self, frame: &mut Frame) -> Result<()>;
}

/// Information about an available camera
#[derive(Clone, Debug)]
pub struct CameraInfo {
    /// Camera index
    pub index: u32,
    /// Camera name
    pub name: String,
}

/// A nokhwa camera configured for calibration capture.
pub struct CameraSource {
    camera: Camera,
    width: u32,
    height: u32,
}

impl CameraSource {
    /// List available cameras
    pub fn list_cameras() -> Vec<CameraInfo> {
        match nokhwa::query(ApiBackend::Auto) {
            Ok(camera_list) => camera_list
                .iter()
                .enumerate()
                .map(|(idx, info)| CameraInfo {
                    index: idx as u32,
                    name: info.human_name(),
                })
                .collect(),
            Err(e) => {
                log::warn!("Failed to enumerate cameras: {:?}", e);
                Vec::new()
            }
        }
    }

    /// Open the configured camera, start streaming and wait out the warm-up.
    pub fn open(config: &CaptureConfig) -> Result<Self> {
        let index = CameraIndex::Index(config.camera_index);
        let resolution = Resolution::new(config.frame_width, config.frame_height);

        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(
            CameraFormat::new(resolution, FrameFormat::MJPEG, 30),
        ));

        let mut camera = match Camera::new(index.clone(), requested) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("Failed to open camera with {}x{}: {:?}", config.frame_width, config.frame_height, e);

                let requested2 = RequestedFormat::new::<RgbFormat>(
                    RequestedFormatType::HighestResolution(resolution),
                );

                match Camera::new(index.clone(), requested2) {
                    Ok(c) => c,
                    Err(e2) => {
                        log::warn!("Failed with HighestResolution: {:?}", e2);

                        let requested3 = RequestedFormat::new::<RgbFormat>(RequestedFormatType::None);
                        Camera::new(index, requested3).map_err(|e3| CaptureError::CameraOpen {
                            index: config.camera_index,
                            reason: e3.to_string(),
                        })?
                    }
                }
            }
        };

        camera.open_stream().map_err(|e| CaptureError::CameraOpen {
            index: config.camera_index,
            reason: e.to_string(),
        })?;

        log::info!(
            "Camera opened: {} ({}x{})",
            camera.info().human_name(),
            camera.resolution().width(),
            camera.resolution().height()
        );

        // Let exposure and white balance settle
        std::thread::sleep(config.warmup);

        Ok(Self {
            camera,
            width: config.frame_width,
            height: config.frame_height,
        })
    }
}

impl FrameSource for CameraSource {
    fn acquire(&mut self, frame: &mut Frame) -> Result<()> {
        let buffer = self
            .camera
            .frame()
            .map_err(|e| CaptureError::CameraFrame(e.to_string()))?;
        let decoded = buffer
            .decode_image::<RgbFormat>()
            .map_err(|e| CaptureError::CameraFrame(e.to_string()))?;

        let (width, height) = (decoded.width(), decoded.height());
        let image = RgbImage::from_raw(width, height, decoded.into_raw()).ok_or_else(|| {
            CaptureError::CameraFrame(format!("decoded buffer does not match {}x{}", width, height))
        })?;

        if width == self.width && height == self.height {
            frame.fill_from_rgb(&image)
        } else {
            log::trace!("Resizing {}x{} frame to {}x{}", width, height, self.width, self.height);
            let resized = imageops::resize(&image, self.width, self.height, FilterType::Triangle);
            frame.fill_from_rgb(&resized)
        }
    }
}

impl Drop for CameraSource {
    fn drop(&mut self) {
        if let Err(e) = self.camera.stop_stream() {
            log::warn!("Failed to stop camera stream: {:?}", e);
        }
        log::info!("Camera stream stopped");
    }
}
