//! Square single-channel network input

use crate::io::error::{Result, invalid_image};
use ndarray::{Array2, ArrayView2};

/// Preprocessed single-channel tensor at the network's input resolution
///
/// Values follow the network's training normalization, nominally
/// [-1024, 1024].
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTensor {
    data: Array2<f32>,
}

impl NormalizedTensor {
    /// Wrap an already normalized square grid
    ///
    /// # Errors
    ///
    /// Returns an error if the grid is empty, not square, or holds
    /// non-finite values
    pub fn from_array(data: Array2<f32>) -> Result<Self> {
        let (rows, cols) = data.dim();
        if rows == 0 || rows != cols {
            return Err(invalid_image(&format!(
                "tensor must be square and non-empty, got {rows}x{cols}"
            )));
        }
        if data.iter().any(|v| !v.is_finite()) {
            return Err(invalid_image(&"tensor contains non-finite values"));
        }
        Ok(Self { data })
    }

    /// Side length of the square grid
    pub fn resolution(&self) -> usize {
        self.data.nrows()
    }

    /// Borrow the underlying grid
    pub fn view(&self) -> ArrayView2<'_, f32> {
        self.data.view()
    }

    /// Consume the tensor, returning its grid
    pub fn into_inner(self) -> Array2<f32> {
        self.data
    }
}
