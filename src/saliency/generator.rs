//! Gradient based saliency maps per pathology

use crate::imaging::tensor::NormalizedTensor;
use crate::io::configuration::{AnalysisConfig, SaliencyTarget};
use crate::io::error::{ErrorContext, Result, WithContext, saliency_error};
use crate::math::interpolation::{Boundary, resize_bilinear};
use crate::math::probability::descending_order;
use crate::model::engine::InferenceEngine;
use crate::model::network::{Attribution, GradientSite};
use crate::model::scores::PathologyScores;
use crate::saliency::map::SaliencyMap;
use crate::saliency::scope::GradientScope;
use ndarray::{Array2, Array3, Axis, Zip};
use std::collections::BTreeMap;

/// Computes one attribution map per requested pathology
///
/// With a layer target the map is Grad-CAM: each channel of the block's
/// activation is weighted by the spatial mean of the logit gradient over
/// that channel, channels are summed, negatives are clipped, and the result
/// is upsampled to tensor resolution. With the input target the map is the
/// absolute logit gradient at every input pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct SaliencyGenerator {
    config: AnalysisConfig,
}

impl Default for SaliencyGenerator {
    fn default() -> Self {
        Self::from_config(&AnalysisConfig::default())
    }
}

impl SaliencyGenerator {
    /// Generator following the saliency options of `config`
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Activation attributed against
    pub const fn target(&self) -> SaliencyTarget {
        self.config.saliency_target
    }

    /// Attribution map of one pathology for `tensor`
    ///
    /// # Errors
    ///
    /// Returns an error if no network is loaded, gradient tracking is
    /// disabled, the pathology is unknown, the target layer does not exist,
    /// the tensor does not fit the network, or gradients are not finite
    pub fn generate(
        &self,
        engine: &mut InferenceEngine,
        tensor: &NormalizedTensor,
        pathology: &str,
    ) -> Result<SaliencyMap> {
        let network = engine.network_mut()?;
        let resolution = tensor.resolution();

        let scope = GradientScope::open(network, tensor, pathology)?;
        let site = match self.target() {
            SaliencyTarget::Input => GradientSite::Input,
            SaliencyTarget::Layer(index) => GradientSite::Block(index),
            SaliencyTarget::LastLayer => {
                GradientSite::Block(scope.block_count().saturating_sub(1))
            }
        };

        let values = match scope.attribute(site)? {
            Attribution::Input { gradient } => gradient.mapv(f32::abs),
            Attribution::Block {
                activation,
                gradient,
            } => {
                let cam = grad_cam(&activation, &gradient);
                resize_bilinear(cam.view(), (resolution, resolution), Boundary::Edge)
                    .map_err(|e| saliency_error(pathology, &e))?
                    .mapv(|v| v.max(0.0))
            }
        };
        drop(scope);

        if values.iter().any(|v| !v.is_finite()) {
            return Err(saliency_error(pathology, &"gradients are not finite"));
        }

        log::debug!(
            "Saliency for {pathology}: max {:.4e}",
            values.iter().copied().fold(0.0f32, f32::max)
        );
        Ok(SaliencyMap::new(pathology, values))
    }

    /// Attribution maps for every qualifying pathology plus the score ordering
    ///
    /// The returned name list contains every pathology of `pathologies`
    /// sorted by descending score, ties keeping their order in
    /// `pathologies`. Maps are computed for all of them when `report_all`
    /// is set, otherwise only for those scoring at or above the report
    /// threshold. Each map comes from its own gradient scope.
    ///
    /// # Errors
    ///
    /// Returns an error if a pathology has no score or any single
    /// attribution fails
    pub fn generate_all(
        &self,
        engine: &mut InferenceEngine,
        tensor: &NormalizedTensor,
        scores: &PathologyScores,
        pathologies: &[String],
    ) -> Result<(BTreeMap<String, SaliencyMap>, Vec<String>)> {
        let probabilities = pathologies
            .iter()
            .map(|name| {
                scores
                    .get(name)
                    .ok_or_else(|| saliency_error(name, &"pathology has no score"))
            })
            .collect::<Result<Vec<f32>>>()?;

        let sorted: Vec<String> = descending_order(&probabilities)
            .into_iter()
            .filter_map(|i| pathologies.get(i).cloned())
            .collect();

        let mut maps = BTreeMap::new();
        for name in &sorted {
            let score = scores.get(name).unwrap_or(0.0);
            if !self.config.wants_saliency(score) {
                continue;
            }
            let map = self
                .generate(engine, tensor, name)
                .with_context(ErrorContext {
                    stage: Some("saliency"),
                    pathology: Some(name.clone()),
                })?;
            maps.insert(name.clone(), map);
        }

        log::info!(
            "Computed {} of {} saliency maps",
            maps.len(),
            pathologies.len()
        );
        Ok((maps, sorted))
    }
}

/// Gradient-weighted class activation map at the activation's resolution
pub fn grad_cam(activation: &Array3<f32>, gradient: &Array3<f32>) -> Array2<f32> {
    let (_, h, w) = activation.dim();
    let mut cam = Array2::zeros((h, w));

    for (channel, channel_grad) in activation.axis_iter(Axis(0)).zip(gradient.axis_iter(Axis(0)))
    {
        let alpha = channel_grad.mean().unwrap_or(0.0);
        if alpha != 0.0 {
            cam.scaled_add(alpha, &channel);
        }
    }

    Zip::from(&mut cam).for_each(|v| *v = v.max(0.0));
    cam
}
