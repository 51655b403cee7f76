//! Aggregate output of one analysis

use crate::model::scores::PathologyScores;
use crate::saliency::map::SaliencyMap;
use image::RgbImage;
use std::collections::BTreeMap;

/// Everything produced by analyzing one image
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    /// Probability per pathology in vocabulary order
    pub scores: PathologyScores,
    /// Every pathology ordered by descending probability
    pub sorted_diseases: Vec<String>,
    /// Raw attribution map per pathology that received one
    pub saliency: BTreeMap<String, SaliencyMap>,
    /// Individual heat overlay per pathology that received a map
    pub overlays: BTreeMap<String, RgbImage>,
    /// Probability-weighted composite overlay at original resolution
    pub fused: RgbImage,
    /// Original image as decoded, in RGB
    pub original: RgbImage,
}

impl AnalysisResult {
    /// Pathologies at or above `threshold`, strongest first
    pub fn findings(&self, threshold: f32) -> Vec<(&str, f32)> {
        self.scores.findings(threshold)
    }

    /// Overlays in descending probability order
    pub fn ordered_overlays(&self) -> impl Iterator<Item = (&str, &RgbImage)> + '_ {
        self.sorted_diseases
            .iter()
            .filter_map(|name| self.overlays.get(name).map(|o| (name.as_str(), o)))
    }
}
