//! Input/output, configuration and error handling

/// Command-line front end
pub mod cli;
/// Constants and runtime options
pub mod configuration;
/// Error taxonomy
pub mod error;
/// Image decoding and overlay export
pub mod image;
/// Terminal progress display
pub mod progress;
