//! Frame buffer shared by acquisition, saving and preview.

use image::{imageops, Rgb, RgbImage, Rgba, RgbaImage};

use crate::error::{CaptureError, Result};

/// Byte order of the three color channels in a frame buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelOrder {
    Rgb,
    Bgr,
}

/// A fixed-size 8-bit, 3-channel pixel buffer.
///
/// The buffer is row-major and is overwritten in place on every acquisition;
/// its dimensions never change after creation.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    order: ChannelOrder,
    /// Number of frames acquired into this buffer so far
    frame_number: u64,
}

impl Frame {
    /// Create a black frame.
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            data: vec![0u8; (width * height * 3) as usize],
            width,
            height,
            order: ChannelOrder::Rgb,
            frame_number: 0,
        }
    }

    /// Wrap an existing buffer, checking that its length matches the dimensions.
    pub fn from_raw(width: u32, height: u32, order: ChannelOrder, data: Vec<u8>) -> Result<Self> {
        let expected = (width * height * 3) as usize;
        if data.len() != expected {
            return Err(CaptureError::FrameSize {
                expected_width: width,
                expected_height: height,
                width,
                height: (data.len() / (width.max(1) as usize * 3)) as u32,
            });
        }
        Ok(Self {
            data,
            width,
            height,
            order,
            frame_number: 0,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn order(&self) -> ChannelOrder {
        self.order
    }

    pub fn frame_number(&self) -> u64 {
        self.frame_number
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Overwrite the buffer with a decoded RGB image of the same size.
    pub fn fill_from_rgb(&mut self, image: &RgbImage) -> Result<()> {
        if image.width() != self.width || image.height() != self.height {
            return Err(CaptureError::FrameSize {
                expected_width: self.width,
                expected_height: self.height,
                width: image.width(),
                height: image.height(),
            });
        }
        self.data.copy_from_slice(image.as_raw());
        self.order = ChannelOrder::Rgb;
        self.frame_number += 1;
        Ok(())
    }

    /// Pixel at column `x`, row `y`, always returned in RGB order.
    pub fn rgb_pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let idx = ((y * self.width + x) * 3) as usize;
        let p = &self.data[idx..idx + 3];
        match self.order {
            ChannelOrder::Rgb => [p[0], p[1], p[2]],
            ChannelOrder::Bgr => [p[2], p[1], p[0]],
        }
    }

    /// Convert to the RGB layout the PNG encoder expects.
    pub fn to_rgb_image(&self) -> RgbImage {
        match self.order {
            ChannelOrder::Rgb => RgbImage::from_raw(self.width, self.height, self.data.clone())
                .unwrap_or_else(|| RgbImage::new(self.width, self.height)),
            ChannelOrder::Bgr => RgbImage::from_fn(self.width, self.height, |x, y| {
                Rgb(self.rgb_pixel(x, y))
            }),
        }
    }

    /// Produce the RGBA image shown in the preview window.
    ///
    /// The display surface indexes pixels column-major, so the raw buffer
    /// lands transposed on it. Mirroring horizontally and then rotating 90°
    /// counter-clockwise brings it back upright.
    pub fn oriented_for_display(&self) -> RgbaImage {
        let surface = RgbaImage::from_fn(self.height, self.width, |x, y| {
            let [r, g, b] = self.rgb_pixel(y, x);
            Rgba([r, g, b, 255])
        });
        let mirrored = imageops::flip_horizontal(&surface);
        imageops::rotate270(&mirrored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| Rgb([x as u8, y as u8, (x + y) as u8]))
    }

    #[test]
    fn test_blank_frame_is_black() {
        let frame = Frame::blank(640, 480);
        assert_eq!(frame.as_bytes().len(), 640 * 480 * 3);
        assert!(frame.as_bytes().iter().all(|&b| b == 0));
        assert_eq!(frame.frame_number(), 0);
    }

    #[test]
    fn test_fill_rejects_wrong_size() {
        let mut frame = Frame::blank(8, 6);
        let err = frame.fill_from_rgb(&gradient(6, 8)).unwrap_err();
        assert!(matches!(err, CaptureError::FrameSize { width: 6, height: 8, .. }));
        assert_eq!(frame.frame_number(), 0);
    }

    #[test]
    fn test_fill_overwrites_and_counts() {
        let mut frame = Frame::blank(8, 6);
        frame.fill_from_rgb(&gradient(8, 6)).unwrap();
        frame.fill_from_rgb(&gradient(8, 6)).unwrap();
        assert_eq!(frame.rgb_pixel(3, 2), [3, 2, 5]);
        assert_eq!(frame.frame_number(), 2);
    }

    #[test]
    fn test_bgr_frame_is_swapped_for_encoder() {
        let frame = Frame::from_raw(2, 1, ChannelOrder::Bgr, vec![1, 2, 3, 4, 5, 6]).unwrap();
        let rgb = frame.to_rgb_image();
        assert_eq!(rgb.get_pixel(0, 0), &Rgb([3, 2, 1]));
        assert_eq!(rgb.get_pixel(1, 0), &Rgb([6, 5, 4]));
    }

    #[test]
    fn test_from_raw_rejects_short_buffer() {
        assert!(Frame::from_raw(4, 4, ChannelOrder::Rgb, vec![0; 10]).is_err());
    }

    #[test]
    fn test_display_orientation_is_upright() {
        let mut frame = Frame::blank(8, 6);
        frame.fill_from_rgb(&gradient(8, 6)).unwrap();

        let shown = frame.oriented_for_display();
        assert_eq!(shown.dimensions(), (8, 6));
        for y in 0..6 {
            for x in 0..8 {
                let [r, g, b] = frame.rgb_pixel(x, y);
                assert_eq!(shown.get_pixel(x, y), &Rgba([r, g, b, 255]));
            }
        }
    }
}
