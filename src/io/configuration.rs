//! Pipeline constants and runtime configuration defaults

use crate::io::error::{Result, invalid_parameter};

// Network input contract
/// Side length of the square tensor fed to the network
pub const TARGET_RESOLUTION: usize = 224;
/// Maximum raw intensity of 8-bit source images
pub const DEFAULT_MAX_INTENSITY: f32 = 255.0;
/// Half-width of the normalized intensity range, values land in [-1024, 1024]
pub const NORMALIZED_INTENSITY_RANGE: f32 = 1024.0;

// Fusion settings
/// Share of the heat layer in the composite, the original keeps the rest
pub const HEAT_BLEND_ALPHA: f32 = 0.4;

// Reporting thresholds
/// Minimum probability for a pathology to count as a finding
pub const DEFAULT_REPORT_THRESHOLD: f32 = 0.5;
/// Probability above which a finding is flagged as urgent in reports
pub const URGENT_FINDING_THRESHOLD: f32 = 0.8;

// Default network layout used when no weight file is supplied
/// Channel count of each convolution block
pub const DEFAULT_BLOCK_CHANNELS: [usize; 4] = [8, 16, 16, 32];
/// Fixed seed for reproducible synthetic weights
pub const DEFAULT_SEED: u64 = 42;

// Output settings
/// Suffix added to the fused overlay filename
pub const FUSED_SUFFIX: &str = "_fused";
/// Suffix added before the pathology name of individual overlays
pub const OVERLAY_SUFFIX: &str = "_overlay";

/// Layer whose activations are attributed when computing saliency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaliencyTarget {
    /// Gradient magnitude with respect to the network input
    Input,
    /// Grad-CAM on the output of the given convolution block
    Layer(usize),
    /// Grad-CAM on the output of the last convolution block
    #[default]
    LastLayer,
}

/// Runtime options for a single analysis
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    /// Compute saliency for every pathology instead of only findings
    pub report_all: bool,
    /// Score at or above which a pathology is treated as a finding
    ///
    /// The threshold is inclusive: a score exactly equal to it counts.
    pub report_threshold: f32,
    /// Activation the saliency generator attributes against
    pub saliency_target: SaliencyTarget,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            report_all: true,
            report_threshold: DEFAULT_REPORT_THRESHOLD,
            saliency_target: SaliencyTarget::default(),
        }
    }
}

impl AnalysisConfig {
    /// Check that all options are within their valid ranges
    ///
    /// # Errors
    ///
    /// Returns an error if the report threshold is not a probability
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.report_threshold) {
            return Err(invalid_parameter(
                "report_threshold",
                &self.report_threshold,
                &"must be within [0, 1]",
            ));
        }
        Ok(())
    }

    /// Whether a pathology with this score should receive a saliency map,
    /// scores equal to the threshold included
    pub fn wants_saliency(&self, score: f32) -> bool {
        self.report_all || score >= self.report_threshold
    }
}
