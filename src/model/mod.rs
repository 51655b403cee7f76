//! Pretrained classifier, its weights and the inference context

/// Inference context owning the classifier
pub mod engine;
/// Convolution block kernels and their backward passes
pub mod layers;
/// Frozen convolutional classifier with an explicit gradient tape
pub mod network;
/// Per-pathology probabilities
pub mod scores;
/// Pathology label vocabulary
pub mod vocabulary;
/// JSON weight files
pub mod weights;

pub use engine::InferenceEngine;
pub use network::{Network, NetworkShape};
pub use scores::PathologyScores;
