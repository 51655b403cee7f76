//! Probability-weighted fusion of saliency maps into heat overlays

use crate::io::configuration::HEAT_BLEND_ALPHA;
use crate::io::error::{Result, fusion_error, invalid_parameter};
use crate::math::colormap::{blend, jet};
use crate::math::interpolation::{Boundary, resize_bilinear};
use crate::math::normalization::min_max_normalize;
use crate::model::scores::PathologyScores;
use crate::saliency::map::SaliencyMap;
use image::RgbImage;
use ndarray::{Array2, ArrayView2};
use std::collections::BTreeMap;

/// Renders saliency maps as jet heat layers blended over the original image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatmapFuser {
    blend_alpha: f32,
}

impl Default for HeatmapFuser {
    fn default() -> Self {
        Self {
            blend_alpha: HEAT_BLEND_ALPHA,
        }
    }
}

impl HeatmapFuser {
    /// Fuser with a custom heat share
    ///
    /// # Errors
    ///
    /// Returns an error if `blend_alpha` is outside [0, 1]
    pub fn new(blend_alpha: f32) -> Result<Self> {
        if !(0.0..=1.0).contains(&blend_alpha) {
            return Err(invalid_parameter(
                "blend_alpha",
                &blend_alpha,
                &"must be within [0, 1]",
            ));
        }
        Ok(Self { blend_alpha })
    }

    /// Share of the heat layer in composites
    pub const fn blend_alpha(&self) -> f32 {
        self.blend_alpha
    }

    /// Composite of all maps, each weighted by its pathology's probability
    ///
    /// Maps are min-max normalized individually, summed with their raw
    /// probabilities as weights, and the sum is normalized again before
    /// coloring. When every weight is zero the original is returned
    /// untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if `maps` is empty, the maps differ in size, a map's
    /// pathology has no score, or the original image is empty
    pub fn fuse(
        &self,
        original: &RgbImage,
        maps: &BTreeMap<String, SaliencyMap>,
        scores: &PathologyScores,
    ) -> Result<RgbImage> {
        check_original(original)?;

        let mut entries = maps.values();
        let first = entries
            .next()
            .ok_or_else(|| fusion_error(&"no saliency maps to fuse"))?;
        let dim = first.dim();
        if let Some(odd) = entries.find(|m| m.dim() != dim) {
            return Err(fusion_error(&format!(
                "map for '{}' is {:?} but '{}' is {dim:?}",
                odd.pathology(),
                odd.dim(),
                first.pathology()
            )));
        }

        let weighted = maps
            .values()
            .map(|map| {
                scores
                    .get(map.pathology())
                    .map(|p| (map, p.max(0.0)))
                    .ok_or_else(|| {
                        fusion_error(&format!("no score for '{}'", map.pathology()))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        if weighted.iter().all(|&(_, weight)| weight == 0.0) {
            log::debug!("All fusion weights are zero, returning the original image");
            return Ok(original.clone());
        }

        let mut sum = Array2::zeros(dim);
        for (map, weight) in weighted {
            if weight > 0.0 {
                sum.scaled_add(weight, &map.normalized().values());
            }
        }

        self.render(original, min_max_normalize(sum.view()).view())
    }

    /// Heat overlay of a single pathology's map
    ///
    /// # Errors
    ///
    /// Returns an error if the original image or the map is empty
    pub fn overlay_single(&self, original: &RgbImage, map: &SaliencyMap) -> Result<RgbImage> {
        check_original(original)?;
        self.render(original, map.normalized().values())
    }

    fn render(&self, original: &RgbImage, heat: ArrayView2<'_, f32>) -> Result<RgbImage> {
        let (width, height) = original.dimensions();
        let upsampled = resize_bilinear(heat, (height as usize, width as usize), Boundary::Edge)
            .map_err(|e| fusion_error(&e))?
            .mapv(|v| v.clamp(0.0, 1.0));

        let mut overlay = original.clone();
        for (x, y, pixel) in overlay.enumerate_pixels_mut() {
            let level = upsampled
                .get((y as usize, x as usize))
                .copied()
                .unwrap_or(0.0);
            *pixel = blend(jet(level), *pixel, self.blend_alpha);
        }
        Ok(overlay)
    }
}

fn check_original(original: &RgbImage) -> Result<()> {
    if original.width() == 0 || original.height() == 0 {
        return Err(fusion_error(&"original image has no pixels"));
    }
    Ok(())
}
