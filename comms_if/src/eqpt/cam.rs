//! # Camera Equipment Communications Module

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::{DateTime, Utc};
use image::{DynamicImage, GenericImageView, RgbImage};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A single frame acquired from the downward facing camera.
#[derive(Clone)]
pub struct CamImage {
    /// UTC timestamp at which the frame was acquired
    pub timestamp: DateTime<Utc>,

    /// The image itself
    pub image: DynamicImage,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl CamImage {
    /// Wrap an already acquired image, stamping it with the current time.
    pub fn new(image: DynamicImage) -> Self {
        Self {
            timestamp: Utc::now(),
            image,
        }
    }

    /// Create a black frame of the given size.
    pub fn blank(width: u32, height: u32) -> Self {
        Self::new(DynamicImage::ImageRgb8(RgbImage::new(width, height)))
    }

    /// Width of the frame in pixels
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Height of the frame in pixels
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Pixel coordinates of the frame centre, the reference point for all tracking errors.
    pub fn centre_px(&self) -> (f64, f64) {
        (self.width() as f64 / 2.0, self.height() as f64 / 2.0)
    }

    /// Total number of pixels in the frame.
    pub fn area_px(&self) -> f64 {
        self.width() as f64 * self.height() as f64
    }
}

impl std::fmt::Debug for CamImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CamImage")
            .field("timestamp", &self.timestamp)
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_blank_geometry() {
        let img = CamImage::blank(320, 240);

        assert_eq!(img.width(), 320);
        assert_eq!(img.height(), 240);
        assert_eq!(img.centre_px(), (160.0, 120.0));
        assert_eq!(img.area_px(), 76800.0);
    }
}
