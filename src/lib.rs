//! Multi-label chest X-ray pathology scoring with fused saliency overlays
//!
//! An image is normalized into a fixed-size single-channel tensor, scored by
//! a frozen convolutional classifier, attributed per pathology with
//! Grad-CAM, and the per-pathology maps are fused into one probability
//! weighted heat overlay.

/// Preprocessing, tensors and overlay fusion
pub mod imaging;
/// Input/output operations, configuration and error handling
pub mod io;
/// Numerical utilities for resampling, normalization and coloring
pub mod math;
/// Classifier, weights and inference engine
pub mod model;
/// Pipeline orchestration, results and reports
pub mod pipeline;
/// Per-pathology attribution maps
pub mod saliency;

pub use io::configuration::{AnalysisConfig, SaliencyTarget};
pub use io::error::{DiagnosticError, Result};
pub use pipeline::{AnalysisResult, Pipeline, PipelineStage};
