//! Numerical utilities shared by the imaging and saliency stages

/// Jet color mapping for heat layers
pub mod colormap;
/// Bilinear resampling of 2D grids
pub mod interpolation;
/// Min-max rescaling of attribution maps
pub mod normalization;
/// Logistic activation and probability ordering
pub mod probability;
