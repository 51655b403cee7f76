//! Attribution maps for single pathologies

use crate::math::normalization::min_max_normalize;
use ndarray::{Array2, ArrayView2};

/// Raw attribution magnitudes for one pathology at tensor resolution
#[derive(Debug, Clone, PartialEq)]
pub struct SaliencyMap {
    pathology: String,
    values: Array2<f32>,
}

impl SaliencyMap {
    /// Associate a grid of attribution values with a pathology
    pub fn new(pathology: impl Into<String>, values: Array2<f32>) -> Self {
        Self {
            pathology: pathology.into(),
            values,
        }
    }

    /// Pathology this map attributes
    pub fn pathology(&self) -> &str {
        &self.pathology
    }

    /// Raw attribution values
    pub fn values(&self) -> ArrayView2<'_, f32> {
        self.values.view()
    }

    /// (rows, cols)
    pub fn dim(&self) -> (usize, usize) {
        self.values.dim()
    }

    /// Mean attribution over the map, zero for an empty map
    pub fn mean(&self) -> f32 {
        self.values.mean().unwrap_or(0.0)
    }

    /// Rescale this map alone to [0, 1]
    pub fn normalized(&self) -> NormalizedSaliencyMap {
        NormalizedSaliencyMap {
            pathology: self.pathology.clone(),
            values: min_max_normalize(self.values.view()),
        }
    }
}

/// Saliency map rescaled to [0, 1] for display
///
/// Minimum 0 and maximum 1, or all zeros when the raw map was constant.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedSaliencyMap {
    pathology: String,
    values: Array2<f32>,
}

impl NormalizedSaliencyMap {
    /// Pathology this map attributes
    pub fn pathology(&self) -> &str {
        &self.pathology
    }

    /// Values in [0, 1]
    pub fn values(&self) -> ArrayView2<'_, f32> {
        self.values.view()
    }

    /// (rows, cols)
    pub fn dim(&self) -> (usize, usize) {
        self.values.dim()
    }
}
