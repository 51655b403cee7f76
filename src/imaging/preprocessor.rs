//! Source image to network tensor conversion

use crate::imaging::source::SourceImage;
use crate::imaging::tensor::NormalizedTensor;
use crate::io::configuration::{NORMALIZED_INTENSITY_RANGE, TARGET_RESOLUTION};
use crate::io::error::{Result, invalid_image, invalid_parameter};
use crate::math::interpolation::{Boundary, resize_bilinear};
use ndarray::Axis;

/// Normalizes, collapses and resizes source images for the network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preprocessor {
    resolution: usize,
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self {
            resolution: TARGET_RESOLUTION,
        }
    }
}

impl Preprocessor {
    /// Create a preprocessor producing `resolution`×`resolution` tensors
    ///
    /// # Errors
    ///
    /// Returns an error if the resolution is zero
    pub fn new(resolution: usize) -> Result<Self> {
        if resolution == 0 {
            return Err(invalid_parameter(
                "resolution",
                &resolution,
                &"must be positive",
            ));
        }
        Ok(Self { resolution })
    }

    /// Side length of produced tensors
    pub const fn resolution(&self) -> usize {
        self.resolution
    }

    /// Convert a source image into a normalized network tensor
    ///
    /// Channels are averaged into one (alpha included), intensities are
    /// mapped by `(2 * v / max_intensity - 1) * 1024`, and the result is
    /// resized with center-aligned bilinear interpolation. Shrinking axes are
    /// Gaussian smoothed first, and samples falling outside the source read
    /// 0. The image is never cropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the image has no pixels, holds non-finite
    /// values, or cannot be resized
    pub fn preprocess(&self, image: &SourceImage) -> Result<NormalizedTensor> {
        if image.is_empty() {
            return Err(invalid_image(&"image has no pixels"));
        }

        let collapsed = image
            .pixels()
            .mean_axis(Axis(2))
            .ok_or_else(|| invalid_image(&"image has no channels"))?;

        let scale = 2.0 / image.max_intensity();
        let normalized =
            collapsed.mapv(|v| scale.mul_add(v, -1.0) * NORMALIZED_INTENSITY_RANGE);
        if normalized.iter().any(|v| !v.is_finite()) {
            return Err(invalid_image(&"image contains non-finite intensities"));
        }

        let resized = resize_bilinear(
            normalized.view(),
            (self.resolution, self.resolution),
            Boundary::Constant(0.0),
        )
        .map_err(|e| invalid_image(&e))?;

        log::debug!(
            "Preprocessed {}x{}x{} image into {}x{} tensor",
            image.dimensions().0,
            image.dimensions().1,
            image.channels(),
            self.resolution,
            self.resolution
        );

        NormalizedTensor::from_array(resized)
    }
}
