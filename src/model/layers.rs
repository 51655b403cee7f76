//! Convolution block kernels with input-gradient backpropagation
//!
//! Weights are frozen: the backward passes here only propagate gradients
//! towards the input and never accumulate weight gradients.

use crate::io::error::{Result, invalid_parameter};
use ndarray::{Array1, Array3, Array4, ArrayView3, s};

/// Activations recorded while running one block forward
#[derive(Debug, Clone)]
pub struct BlockTrace {
    /// Convolution output before rectification, shape (channels, h, w)
    pub pre_activation: Array3<f32>,
    /// Block output after rectification and optional pooling
    pub output: Array3<f32>,
}

/// Same-padded convolution followed by ReLU and optional 2x2 average pooling
#[derive(Debug, Clone, PartialEq)]
pub struct ConvBlock {
    kernel: Array4<f32>,
    bias: Array1<f32>,
    pool: bool,
}

impl ConvBlock {
    /// Create a block from a (out, in, k, k) kernel and per-output bias
    ///
    /// # Errors
    ///
    /// Returns an error if the kernel is not square with an odd side, or if
    /// the bias length differs from the output channel count
    pub fn new(kernel: Array4<f32>, bias: Array1<f32>, pool: bool) -> Result<Self> {
        let (out_channels, in_channels, kh, kw) = kernel.dim();
        if out_channels == 0 || in_channels == 0 {
            return Err(invalid_parameter(
                "kernel",
                &format!("{:?}", kernel.dim()),
                &"channel counts must be positive",
            ));
        }
        if kh != kw || kh % 2 == 0 {
            return Err(invalid_parameter(
                "kernel",
                &format!("{kh}x{kw}"),
                &"kernel must be square with an odd side",
            ));
        }
        if bias.len() != out_channels {
            return Err(invalid_parameter(
                "bias",
                &bias.len(),
                &format!("expected {out_channels} entries"),
            ));
        }
        Ok(Self { kernel, bias, pool })
    }

    /// Number of channels consumed
    pub fn in_channels(&self) -> usize {
        self.kernel.dim().1
    }

    /// Number of channels produced
    pub fn out_channels(&self) -> usize {
        self.kernel.dim().0
    }

    /// Whether the block halves its spatial resolution
    pub const fn pools(&self) -> bool {
        self.pool
    }

    /// Convolution kernel, shape (out, in, k, k)
    pub const fn kernel(&self) -> &Array4<f32> {
        &self.kernel
    }

    /// Per-output-channel bias
    pub const fn bias(&self) -> &Array1<f32> {
        &self.bias
    }

    /// Spatial side length produced from an input of side `side`
    pub const fn output_side(&self, side: usize) -> usize {
        if self.pool { side / 2 } else { side }
    }

    /// Run the block forward, keeping what the backward pass needs
    pub fn forward(&self, input: ArrayView3<'_, f32>) -> BlockTrace {
        let pre_activation = self.convolve(input);
        let rectified = pre_activation.mapv(|v| v.max(0.0));
        let output = if self.pool {
            average_pool(&rectified)
        } else {
            rectified
        };
        BlockTrace {
            pre_activation,
            output,
        }
    }

    /// Map a gradient at the block output to a gradient at the block input
    pub fn backward(&self, trace: &BlockTrace, grad_output: &Array3<f32>) -> Array3<f32> {
        let mut grad = if self.pool {
            average_pool_backward(grad_output, trace.pre_activation.dim())
        } else {
            grad_output.clone()
        };

        ndarray::Zip::from(&mut grad)
            .and(&trace.pre_activation)
            .for_each(|g, &pre| {
                if pre <= 0.0 {
                    *g = 0.0;
                }
            });

        self.convolve_transpose(&grad)
    }

    fn padding(&self) -> usize {
        self.kernel.dim().2 / 2
    }

    fn convolve(&self, input: ArrayView3<'_, f32>) -> Array3<f32> {
        let (channels, h, w) = input.dim();
        let pad = self.padding();

        let mut padded = Array3::zeros((channels, h + 2 * pad, w + 2 * pad));
        padded
            .slice_mut(s![.., pad..pad + h, pad..pad + w])
            .assign(&input);

        let mut output = Array3::zeros((self.out_channels(), h, w));
        for (mut plane, (filters, &b)) in output
            .outer_iter_mut()
            .zip(self.kernel.outer_iter().zip(self.bias.iter()))
        {
            plane.fill(b);
            for (source, taps) in padded.outer_iter().zip(filters.outer_iter()) {
                for ((ky, kx), &tap) in taps.indexed_iter() {
                    if tap != 0.0 {
                        plane.scaled_add(tap, &source.slice(s![ky..ky + h, kx..kx + w]));
                    }
                }
            }
        }
        output
    }

    fn convolve_transpose(&self, grad_output: &Array3<f32>) -> Array3<f32> {
        let (_, h, w) = grad_output.dim();
        let pad = self.padding();

        let mut grad_padded = Array3::zeros((self.in_channels(), h + 2 * pad, w + 2 * pad));
        for (grad_plane, filters) in grad_output.outer_iter().zip(self.kernel.outer_iter()) {
            for (mut target, taps) in grad_padded.outer_iter_mut().zip(filters.outer_iter()) {
                for ((ky, kx), &tap) in taps.indexed_iter() {
                    if tap != 0.0 {
                        target
                            .slice_mut(s![ky..ky + h, kx..kx + w])
                            .scaled_add(tap, &grad_plane);
                    }
                }
            }
        }

        grad_padded
            .slice(s![.., pad..pad + h, pad..pad + w])
            .to_owned()
    }
}

/// 2x2 average pooling with stride 2, trailing odd rows and columns are dropped
pub fn average_pool(input: &Array3<f32>) -> Array3<f32> {
    let (channels, h, w) = input.dim();
    let (ph, pw) = (h / 2, w / 2);

    let mut output = Array3::zeros((channels, ph, pw));
    for dy in 0..2 {
        for dx in 0..2 {
            output.scaled_add(
                0.25,
                &input.slice(s![.., dy..2 * ph;2, dx..2 * pw;2]),
            );
        }
    }
    output
}

/// Spread a pooled gradient back over the 2x2 windows it averaged
pub fn average_pool_backward(
    grad_output: &Array3<f32>,
    input_dim: (usize, usize, usize),
) -> Array3<f32> {
    let (_, ph, pw) = grad_output.dim();

    let mut grad_input = Array3::zeros(input_dim);
    for dy in 0..2 {
        for dx in 0..2 {
            grad_input
                .slice_mut(s![.., dy..2 * ph;2, dx..2 * pw;2])
                .scaled_add(0.25, grad_output);
        }
    }
    grad_input
}
