//! Image decoding and overlay export

use crate::io::error::{DiagnosticError, Result};
use image::{DynamicImage, RgbImage};
use std::path::Path;

/// Decode a raster image from disk
///
/// # Errors
///
/// Returns an error if the file cannot be read or decoded, or decodes to an
/// image without pixels
pub fn load_image(path: &Path) -> Result<DynamicImage> {
    let image = image::open(path).map_err(|e| DiagnosticError::InvalidImage {
        path: Some(path.to_path_buf()),
        reason: "cannot decode image".to_string(),
        source: Some(e),
    })?;

    if image.width() == 0 || image.height() == 0 {
        return Err(DiagnosticError::InvalidImage {
            path: Some(path.to_path_buf()),
            reason: "image has no pixels".to_string(),
            source: None,
        });
    }

    log::debug!(
        "Decoded {} ({}x{}, {:?})",
        path.display(),
        image.width(),
        image.height(),
        image.color()
    );
    Ok(image)
}

/// Save an overlay, creating parent directories as needed
///
/// # Errors
///
/// Returns an error if:
/// - The parent directory cannot be created
/// - The image cannot be encoded or written to the specified path
pub fn save_overlay(overlay: &RgbImage, output_path: &Path) -> Result<()> {
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| DiagnosticError::FileSystem {
                path: parent.to_path_buf(),
                operation: "create directory",
                source: e,
            })?;
        }
    }

    overlay
        .save(output_path)
        .map_err(|e| DiagnosticError::ImageExport {
            path: output_path.to_path_buf(),
            source: e,
        })
}
