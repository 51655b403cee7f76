//! Frozen convolutional multi-label classifier
//!
//! The network is a stack of [`ConvBlock`]s followed by global average
//! pooling and a linear head. Each class probability is an independent
//! sigmoid of its logit.
//!
//! Gradient tracking is modelled explicitly: while tracking is enabled,
//! [`Network::record`] stores the activations of one forward pass on a
//! tape, and [`Network::backward`] propagates the gradient of a single
//! class logit through that tape. The tape is transient state attached to
//! the network, so it must be cleared before another class is attributed.

use crate::imaging::tensor::NormalizedTensor;
use crate::io::configuration::NORMALIZED_INTENSITY_RANGE;
use crate::io::error::{Result, inference_error, invalid_parameter};
use crate::math::probability::sigmoid;
use crate::model::layers::{BlockTrace, ConvBlock};
use crate::model::weights::{BlockWeights, HeadWeights, NetworkWeights};
use ndarray::{Array1, Array2, Array3, Array4, Axis};
use rand::{Rng, SeedableRng, rngs::StdRng};

/// Layer sizes for a randomly initialised network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkShape {
    /// Input side length
    pub resolution: usize,
    /// Output channels of each block, every block pools
    pub block_channels: Vec<usize>,
}

/// Where a backward pass stops
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradientSite {
    /// Network input tensor
    Input,
    /// Output of the block at this index
    Block(usize),
}

/// Result of propagating one class logit backwards
#[derive(Debug, Clone)]
pub enum Attribution {
    /// Gradient with respect to the input tensor, shape (h, w)
    Input {
        /// d logit / d input
        gradient: Array2<f32>,
    },
    /// Activation of a block together with the gradient at that block
    Block {
        /// Block output, shape (channels, h, w)
        activation: Array3<f32>,
        /// d logit / d activation, same shape
        gradient: Array3<f32>,
    },
}

#[derive(Debug, Clone)]
struct Tape {
    traces: Vec<BlockTrace>,
}

/// Frozen convolutional classifier with an explicit gradient tape
#[derive(Debug, Clone)]
pub struct Network {
    vocabulary: Vec<String>,
    resolution: usize,
    input_scale: f32,
    blocks: Vec<ConvBlock>,
    head_weight: Array2<f32>,
    head_bias: Array1<f32>,
    gradient_tracking: bool,
    tape: Option<Tape>,
}

impl Network {
    /// Build a network from validated parts
    ///
    /// # Errors
    ///
    /// Returns an error if the vocabulary is empty, no blocks are given,
    /// channel counts do not chain, the head does not match the last block
    /// and vocabulary, or pooling would shrink the input to nothing
    pub fn new(
        vocabulary: Vec<String>,
        resolution: usize,
        input_scale: f32,
        blocks: Vec<ConvBlock>,
        head_weight: Array2<f32>,
        head_bias: Array1<f32>,
    ) -> Result<Self> {
        if vocabulary.is_empty() {
            return Err(invalid_parameter(
                "vocabulary",
                &0,
                &"at least one pathology is required",
            ));
        }
        for (i, name) in vocabulary.iter().enumerate() {
            if vocabulary.iter().skip(i + 1).any(|other| other == name) {
                return Err(invalid_parameter(
                    "vocabulary",
                    name,
                    &"pathology names must be unique",
                ));
            }
        }
        if !(input_scale.is_finite() && input_scale > 0.0) {
            return Err(invalid_parameter(
                "input_scale",
                &input_scale,
                &"must be positive and finite",
            ));
        }
        if blocks.is_empty() {
            return Err(invalid_parameter(
                "blocks",
                &0,
                &"at least one convolution block is required",
            ));
        }

        let mut channels = 1;
        let mut side = resolution;
        for (index, block) in blocks.iter().enumerate() {
            if block.in_channels() != channels {
                return Err(invalid_parameter(
                    "blocks",
                    &index,
                    &format!(
                        "block expects {} input channels but receives {channels}",
                        block.in_channels()
                    ),
                ));
            }
            channels = block.out_channels();
            side = block.output_side(side);
        }
        if side == 0 {
            return Err(invalid_parameter(
                "resolution",
                &resolution,
                &"pooling reduces the input to an empty feature map",
            ));
        }

        if head_weight.dim() != (vocabulary.len(), channels) {
            return Err(invalid_parameter(
                "head_weight",
                &format!("{:?}", head_weight.dim()),
                &format!("expected ({}, {channels})", vocabulary.len()),
            ));
        }
        if head_bias.len() != vocabulary.len() {
            return Err(invalid_parameter(
                "head_bias",
                &head_bias.len(),
                &format!("expected {} entries", vocabulary.len()),
            ));
        }

        Ok(Self {
            vocabulary,
            resolution,
            input_scale,
            blocks,
            head_weight,
            head_bias,
            gradient_tracking: true,
            tape: None,
        })
    }

    /// Deterministic randomly initialised network
    ///
    /// Kernels use He-uniform initialisation and the head a small uniform
    /// spread, so scores start near 0.5.
    ///
    /// # Errors
    ///
    /// Returns an error if the shape is invalid
    pub fn seeded(vocabulary: Vec<String>, shape: &NetworkShape, seed: u64) -> Result<Self> {
        let mut rng = StdRng::seed_from_u64(seed);

        let mut blocks = Vec::with_capacity(shape.block_channels.len());
        let mut in_channels = 1;
        for &out_channels in &shape.block_channels {
            let limit = (6.0 / (in_channels * 9) as f32).sqrt();
            let kernel = Array4::from_shape_fn((out_channels, in_channels, 3, 3), |_| {
                rng.random_range(-limit..limit)
            });
            blocks.push(ConvBlock::new(kernel, Array1::zeros(out_channels), true)?);
            in_channels = out_channels;
        }

        let head_limit = 1.0 / (in_channels as f32).sqrt();
        let head_weight = Array2::from_shape_fn((vocabulary.len(), in_channels), |_| {
            rng.random_range(-head_limit..head_limit)
        });
        let head_bias = Array1::zeros(vocabulary.len());

        Self::new(
            vocabulary,
            shape.resolution,
            1.0 / NORMALIZED_INTENSITY_RANGE,
            blocks,
            head_weight,
            head_bias,
        )
    }

    /// Build a network from deserialized weights
    ///
    /// # Errors
    ///
    /// Returns an error if the weights describe an invalid network
    pub fn from_weights(weights: NetworkWeights) -> Result<Self> {
        let blocks = weights
            .blocks
            .into_iter()
            .map(|b| ConvBlock::new(b.kernel, b.bias, b.pool))
            .collect::<Result<Vec<_>>>()?;

        Self::new(
            weights.pathologies,
            weights.resolution,
            weights.input_scale,
            blocks,
            weights.head.weight,
            weights.head.bias,
        )
    }

    /// Serializable copy of the network's weights
    pub fn to_weights(&self) -> NetworkWeights {
        NetworkWeights {
            pathologies: self.vocabulary.clone(),
            resolution: self.resolution,
            input_scale: self.input_scale,
            blocks: self
                .blocks
                .iter()
                .map(|b| BlockWeights {
                    kernel: b.kernel().clone(),
                    bias: b.bias().clone(),
                    pool: b.pools(),
                })
                .collect(),
            head: HeadWeights {
                weight: self.head_weight.clone(),
                bias: self.head_bias.clone(),
            },
        }
    }

    /// Pathology names in output order
    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    /// Expected input side length
    pub const fn resolution(&self) -> usize {
        self.resolution
    }

    /// Number of convolution blocks
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Whether backward passes are permitted
    pub const fn gradient_tracking(&self) -> bool {
        self.gradient_tracking
    }

    /// Permit or block backward passes, clearing any recorded tape
    pub fn set_gradient_tracking(&mut self, enabled: bool) {
        self.gradient_tracking = enabled;
        self.tape = None;
    }

    /// Whether a forward pass is currently recorded
    pub const fn has_tape(&self) -> bool {
        self.tape.is_some()
    }

    /// Drop the recorded forward pass
    pub fn clear_tape(&mut self) {
        self.tape = None;
    }

    /// Class logits for one tensor, without touching the tape
    ///
    /// # Errors
    ///
    /// Returns an error if the tensor resolution differs from the network's
    pub fn logits(&self, tensor: &NormalizedTensor) -> Result<Array1<f32>> {
        let traces = self.run_blocks(tensor)?;
        self.head(&traces)
    }

    /// Independent sigmoid probability per class
    ///
    /// # Errors
    ///
    /// Returns an error if the tensor resolution differs from the network's
    pub fn probabilities(&self, tensor: &NormalizedTensor) -> Result<Vec<f32>> {
        Ok(self.logits(tensor)?.iter().map(|&l| sigmoid(l)).collect())
    }

    /// Run forward and keep every block's activations on the tape
    ///
    /// Returns the class logits of the recorded pass.
    ///
    /// # Errors
    ///
    /// Returns an error if gradient tracking is disabled or the tensor
    /// resolution differs from the network's
    pub fn record(&mut self, tensor: &NormalizedTensor) -> Result<Array1<f32>> {
        if !self.gradient_tracking {
            return Err(inference_error(&"gradient tracking is disabled"));
        }
        let traces = self.run_blocks(tensor)?;
        let logits = self.head(&traces)?;
        self.tape = Some(Tape { traces });
        Ok(logits)
    }

    /// Propagate the gradient of one class logit back to `site`
    ///
    /// # Errors
    ///
    /// Returns an error if no forward pass is recorded, tracking is
    /// disabled, or the class or block index is out of range
    pub fn backward(&self, class: usize, site: GradientSite) -> Result<Attribution> {
        if !self.gradient_tracking {
            return Err(inference_error(&"gradient tracking is disabled"));
        }
        let tape = self
            .tape
            .as_ref()
            .ok_or_else(|| inference_error(&"no forward pass recorded"))?;
        if class >= self.vocabulary.len() {
            return Err(inference_error(&format!(
                "class index {class} outside vocabulary of {}",
                self.vocabulary.len()
            )));
        }
        let class_weights = self.head_weight.index_axis(Axis(0), class);

        let stop = match site {
            GradientSite::Input => 0,
            GradientSite::Block(index) if index < self.blocks.len() => index + 1,
            GradientSite::Block(index) => {
                return Err(inference_error(&format!(
                    "block index {index} outside network of {} blocks",
                    self.blocks.len()
                )));
            }
        };

        let last = tape
            .traces
            .last()
            .ok_or_else(|| inference_error(&"recorded pass has no blocks"))?;
        let (channels, h, w) = last.output.dim();
        let area = (h * w) as f32;
        let mut gradient = Array3::from_shape_fn((channels, h, w), |(c, _, _)| {
            class_weights.get(c).copied().unwrap_or(0.0) / area
        });

        for index in (stop..self.blocks.len()).rev() {
            let (Some(block), Some(trace)) = (self.blocks.get(index), tape.traces.get(index))
            else {
                return Err(inference_error(&"tape does not match network"));
            };
            gradient = block.backward(trace, &gradient);
        }

        match site {
            GradientSite::Input => {
                let plane = gradient
                    .index_axis_move(Axis(0), 0)
                    .mapv(|g| g * self.input_scale);
                Ok(Attribution::Input { gradient: plane })
            }
            GradientSite::Block(index) => {
                let activation = tape
                    .traces
                    .get(index)
                    .map(|t| t.output.clone())
                    .ok_or_else(|| inference_error(&"tape does not match network"))?;
                Ok(Attribution::Block {
                    activation,
                    gradient,
                })
            }
        }
    }

    fn run_blocks(&self, tensor: &NormalizedTensor) -> Result<Vec<BlockTrace>> {
        if tensor.resolution() != self.resolution {
            return Err(inference_error(&format!(
                "tensor is {0}x{0} but the network expects {1}x{1}",
                tensor.resolution(),
                self.resolution
            )));
        }

        let mut traces: Vec<BlockTrace> = Vec::with_capacity(self.blocks.len());
        let input = tensor
            .view()
            .mapv(|v| v * self.input_scale)
            .insert_axis(Axis(0));

        for block in &self.blocks {
            let trace = match traces.last() {
                Some(previous) => block.forward(previous.output.view()),
                None => block.forward(input.view()),
            };
            traces.push(trace);
        }
        Ok(traces)
    }

    fn head(&self, traces: &[BlockTrace]) -> Result<Array1<f32>> {
        let features = traces
            .last()
            .and_then(|t| {
                let (channels, h, w) = t.output.dim();
                t.output
                    .to_shape((channels, h * w))
                    .ok()
                    .and_then(|flat| flat.mean_axis(Axis(1)))
            })
            .ok_or_else(|| inference_error(&"empty feature map"))?;

        Ok(self.head_weight.dot(&features) + &self.head_bias)
    }
}
