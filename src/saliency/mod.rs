//! Per-pathology attribution maps

/// Gradient based saliency generation
pub mod generator;
/// Raw and normalized attribution maps
pub mod map;
/// Scoped gradient tracking
pub mod scope;

pub use generator::SaliencyGenerator;
pub use map::{NormalizedSaliencyMap, SaliencyMap};
