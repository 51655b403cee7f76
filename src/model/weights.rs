//! JSON weight files for the classifier

use crate::io::error::{DiagnosticError, Result};
use ndarray::{Array1, Array2, Array4};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// One convolution block's parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockWeights {
    /// Kernel of shape (out, in, k, k)
    pub kernel: Array4<f32>,
    /// Per-output-channel bias
    pub bias: Array1<f32>,
    /// Whether the block ends with 2x2 average pooling
    pub pool: bool,
}

/// Linear classification head
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadWeights {
    /// Weight of shape (classes, channels)
    pub weight: Array2<f32>,
    /// Per-class bias
    pub bias: Array1<f32>,
}

/// Complete serialized network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkWeights {
    /// Pathology names in output order
    pub pathologies: Vec<String>,
    /// Input side length
    pub resolution: usize,
    /// Factor applied to normalized tensors before the first block
    pub input_scale: f32,
    /// Convolution blocks, input first
    pub blocks: Vec<BlockWeights>,
    /// Classification head
    pub head: HeadWeights,
}

impl NetworkWeights {
    /// Read weights from a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or is not valid JSON
    /// for this layout
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| DiagnosticError::FileSystem {
            path: path.to_path_buf(),
            operation: "open weights",
            source: e,
        })?;

        let weights = serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            DiagnosticError::WeightsFormat {
                path: path.to_path_buf(),
                source: e,
            }
        })?;

        log::info!("Loaded network weights from {}", path.display());
        Ok(weights)
    }

    /// Write weights to a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|e| DiagnosticError::FileSystem {
            path: path.to_path_buf(),
            operation: "create weights",
            source: e,
        })?;

        serde_json::to_writer(BufWriter::new(file), self).map_err(|e| {
            DiagnosticError::WeightsFormat {
                path: path.to_path_buf(),
                source: e,
            }
        })
    }
}
