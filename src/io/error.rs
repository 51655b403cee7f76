//! Error types and context management for diagnostic pipeline operations

use std::fmt;
use std::path::PathBuf;

/// Main error type for all pipeline operations
#[derive(Debug)]
pub enum DiagnosticError {
    /// Source image is unreadable, corrupt or has no pixels
    InvalidImage {
        /// Path to the image file, if the image came from disk
        path: Option<PathBuf>,
        /// Description of what's wrong with the image
        reason: String,
        /// Underlying decoder error
        source: Option<image::ImageError>,
    },

    /// Inference was requested before a network was loaded
    ModelNotLoaded,

    /// Tensor does not satisfy the network's input contract
    Inference {
        /// Description of the contract violation
        reason: String,
    },

    /// Gradient based attribution could not be computed
    SaliencyComputation {
        /// Pathology whose attribution failed
        pathology: String,
        /// Description of the failure
        reason: String,
    },

    /// Saliency maps cannot be fused onto the target image
    Fusion {
        /// Description of the mismatch
        reason: String,
    },

    /// Configuration parameter validation failed
    InvalidParameter {
        /// Name of the invalid parameter
        parameter: &'static str,
        /// Provided value that failed validation
        value: String,
        /// Explanation of why the value is invalid
        reason: String,
    },

    /// Network weight file could not be parsed
    WeightsFormat {
        /// Path of the weight file
        path: PathBuf,
        /// Underlying parse error
        source: serde_json::Error,
    },

    /// Failed to save an overlay to disk
    ImageExport {
        /// Path where export was attempted
        path: PathBuf,
        /// Underlying image export error
        source: image::ImageError,
    },

    /// General file system operation failure
    FileSystem {
        /// Path involved in the operation
        path: PathBuf,
        /// Description of the operation that failed
        operation: &'static str,
        /// Underlying I/O error
        source: std::io::Error,
    },
}

impl fmt::Display for DiagnosticError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidImage {
                path,
                reason,
                source,
            } => {
                write!(f, "Invalid image")?;
                if let Some(path) = path {
                    write!(f, " '{}'", path.display())?;
                }
                write!(f, ": {reason}")?;
                if let Some(source) = source {
                    write!(f, " ({source})")?;
                }
                Ok(())
            }
            Self::ModelNotLoaded => {
                write!(f, "Inference requested before a network was loaded")
            }
            Self::Inference { reason } => write!(f, "Inference error: {reason}"),
            Self::SaliencyComputation { pathology, reason } => {
                write!(f, "Saliency computation failed for '{pathology}': {reason}")
            }
            Self::Fusion { reason } => write!(f, "Heatmap fusion error: {reason}"),
            Self::InvalidParameter {
                parameter,
                value,
                reason,
            } => {
                write!(f, "Invalid parameter '{parameter}' = '{value}': {reason}")
            }
            Self::WeightsFormat { path, source } => {
                write!(
                    f,
                    "Failed to parse network weights '{}': {source}",
                    path.display()
                )
            }
            Self::ImageExport { path, source } => {
                write!(
                    f,
                    "Failed to export image to '{}': {source}",
                    path.display()
                )
            }
            Self::FileSystem {
                path,
                operation,
                source,
            } => {
                write!(
                    f,
                    "File system error during {operation} on '{}': {source}",
                    path.display()
                )
            }
        }
    }
}

impl std::error::Error for DiagnosticError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidImage {
                source: Some(source),
                ..
            }
            | Self::ImageExport { source, .. } => Some(source),
            Self::WeightsFormat { source, .. } => Some(source),
            Self::FileSystem { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Convenience type alias for pipeline results
pub type Result<T> = std::result::Result<T, DiagnosticError>;

/// Additional context to enrich error log lines
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Pipeline stage active when the error occurred
    pub stage: Option<&'static str>,
    /// Pathology being processed, if any
    pub pathology: Option<String>,
}

/// Logs pipeline state alongside an error without altering the error itself
pub trait WithContext<T> {
    /// Log the error together with the supplied context, then propagate it
    ///
    /// # Errors
    ///
    /// Propagates the original error unchanged
    fn with_context(self, context: ErrorContext) -> Result<T>;

    /// Log the error with just the stage name
    ///
    /// # Errors
    ///
    /// Propagates the original error unchanged
    fn with_stage(self, stage: &'static str) -> Result<T>;
}

impl<T, E> WithContext<T> for std::result::Result<T, E>
where
    E: Into<DiagnosticError>,
{
    fn with_context(self, context: ErrorContext) -> Result<T> {
        self.map_err(|e| {
            let error = e.into();
            match (&context.stage, &context.pathology) {
                (Some(stage), Some(pathology)) => {
                    log::error!("{stage} failed for {pathology}: {error}");
                }
                (Some(stage), None) => log::error!("{stage} failed: {error}"),
                (None, _) => log::error!("{error}"),
            }
            error
        })
    }

    fn with_stage(self, stage: &'static str) -> Result<T> {
        self.with_context(ErrorContext {
            stage: Some(stage),
            ..Default::default()
        })
    }
}

/// Create an invalid parameter error
pub fn invalid_parameter(
    parameter: &'static str,
    value: &impl ToString,
    reason: &impl ToString,
) -> DiagnosticError {
    DiagnosticError::InvalidParameter {
        parameter,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Create an invalid image error without a backing file or decoder error
pub fn invalid_image(reason: &impl ToString) -> DiagnosticError {
    DiagnosticError::InvalidImage {
        path: None,
        reason: reason.to_string(),
        source: None,
    }
}

/// Create an inference contract error
pub fn inference_error(reason: &impl ToString) -> DiagnosticError {
    DiagnosticError::Inference {
        reason: reason.to_string(),
    }
}

/// Create a saliency computation error for one pathology
pub fn saliency_error(pathology: &str, reason: &impl ToString) -> DiagnosticError {
    DiagnosticError::SaliencyComputation {
        pathology: pathology.to_string(),
        reason: reason.to_string(),
    }
}

/// Create a fusion error
pub fn fusion_error(reason: &impl ToString) -> DiagnosticError {
    DiagnosticError::Fusion {
        reason: reason.to_string(),
    }
}
