use clap::Parser;

use crate::config::DEFAULT_IMAGE_COUNT;

/// Command line configuration for the calibration image collector.
#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about = "Collect camera calibration images. Press ENTER in the preview window to capture."
)]
pub struct Args {
    /// Number of images to collect.
    #[arg(long, default_value_t = DEFAULT_IMAGE_COUNT, value_parser = clap::value_parser!(i64).range(1..))]
    pub images: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_image_count() {
        let args = Args::try_parse_from(["calib-capture"]).unwrap();
        assert_eq!(args.images, 40);
    }

    #[test]
    fn test_images_flag() {
        let args = Args::try_parse_from(["calib-capture", "--images", "3"]).unwrap();
        assert_eq!(args.images, 3);
    }

    #[test]
    fn test_rejects_non_positive_and_garbage() {
        assert!(Args::try_parse_from(["calib-capture", "--images", "0"]).is_err());
        assert!(Args::try_parse_from(["calib-capture", "--images", "-2"]).is_err());
        assert!(Args::try_parse_from(["calib-capture", "--images", "ten"]).is_err());
        assert!(Args::try_parse_from(["calib-capture", "--frames", "3"]).is_err());
    }
}
