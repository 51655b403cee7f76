//! Decoded source images as numeric arrays

use crate::io::configuration::DEFAULT_MAX_INTENSITY;
use crate::io::error::{Result, invalid_image, invalid_parameter};
use image::DynamicImage;
use ndarray::{Array2, Array3, ArrayView3, Axis};

/// Raw pixel intensities laid out as (height, width, channels)
#[derive(Debug, Clone, PartialEq)]
pub struct SourceImage {
    pixels: Array3<f32>,
    max_intensity: f32,
}

impl SourceImage {
    /// Wrap a (height, width, channels) array
    ///
    /// # Errors
    ///
    /// Returns an error if the maximum intensity is not a positive finite
    /// number
    pub fn from_array(pixels: Array3<f32>, max_intensity: f32) -> Result<Self> {
        if !(max_intensity.is_finite() && max_intensity > 0.0) {
            return Err(invalid_parameter(
                "max_intensity",
                &max_intensity,
                &"must be positive and finite",
            ));
        }
        Ok(Self {
            pixels,
            max_intensity,
        })
    }

    /// Wrap a single-channel grid
    ///
    /// # Errors
    ///
    /// Returns an error if the maximum intensity is invalid
    pub fn from_gray(pixels: Array2<f32>, max_intensity: f32) -> Result<Self> {
        Self::from_array(pixels.insert_axis(Axis(2)), max_intensity)
    }

    /// Convert a decoded image, keeping its channel count
    ///
    /// Every format is brought to 8 bits per channel so intensities share the
    /// `DEFAULT_MAX_INTENSITY` reference.
    ///
    /// # Errors
    ///
    /// Returns an error if the image has no pixels
    pub fn from_dynamic(image: &DynamicImage) -> Result<Self> {
        let (width, height) = (image.width() as usize, image.height() as usize);
        if width == 0 || height == 0 {
            return Err(invalid_image(&"image has no pixels"));
        }

        let (channels, raw) = match image.color().channel_count() {
            1 => (1, image.to_luma8().into_raw()),
            2 => (2, image.to_luma_alpha8().into_raw()),
            3 => (3, image.to_rgb8().into_raw()),
            _ => (4, image.to_rgba8().into_raw()),
        };

        let values: Vec<f32> = raw.into_iter().map(f32::from).collect();
        let pixels = Array3::from_shape_vec((height, width, channels), values)
            .map_err(|e| invalid_image(&e))?;

        Self::from_array(pixels, DEFAULT_MAX_INTENSITY)
    }

    /// Borrow the pixel array
    pub fn pixels(&self) -> ArrayView3<'_, f32> {
        self.pixels.view()
    }

    /// Reference intensity mapped to the top of the normalized range
    pub const fn max_intensity(&self) -> f32 {
        self.max_intensity
    }

    /// (height, width)
    pub fn dimensions(&self) -> (usize, usize) {
        let (h, w, _) = self.pixels.dim();
        (h, w)
    }

    /// Number of channels per pixel
    pub fn channels(&self) -> usize {
        self.pixels.dim().2
    }

    /// Whether any axis has zero length
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }
}
