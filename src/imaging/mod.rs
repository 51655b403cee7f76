//! Image conversion at both ends of the network

/// Saliency fusion and heat overlays
pub mod fusion;
/// Source image to tensor conversion
pub mod preprocessor;
/// Decoded source images
pub mod source;
/// Network input tensors
pub mod tensor;

pub use fusion::HeatmapFuser;
pub use preprocessor::Preprocessor;
pub use source::SourceImage;
pub use tensor::NormalizedTensor;
