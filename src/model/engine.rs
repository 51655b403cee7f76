//! Inference context owning the classifier

use crate::imaging::tensor::NormalizedTensor;
use crate::io::error::{DiagnosticError, Result, inference_error};
use crate::model::network::Network;
use crate::model::scores::PathologyScores;
use crate::model::weights::NetworkWeights;
use std::path::Path;

/// Owns the classifier and maps tensors to pathology scores
///
/// The engine is passed explicitly to every stage that needs the network.
/// Saliency computation borrows it mutably, so exclusive access during a
/// backward pass is enforced by the borrow checker. Callers that analyze
/// images in parallel create one engine per thread.
#[derive(Debug, Clone, Default)]
pub struct InferenceEngine {
    network: Option<Network>,
}

impl InferenceEngine {
    /// Engine with a loaded network
    pub const fn new(network: Network) -> Self {
        Self {
            network: Some(network),
        }
    }

    /// Engine without a network, every call fails until [`Self::load`]
    pub const fn unloaded() -> Self {
        Self { network: None }
    }

    /// Engine reading its network from a JSON weight file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or describes an invalid
    /// network
    pub fn from_weights_file(path: &Path) -> Result<Self> {
        let weights = NetworkWeights::load(path)?;
        Ok(Self::new(Network::from_weights(weights)?))
    }

    /// Install a network, replacing any previous one
    pub fn load(&mut self, network: Network) {
        log::debug!(
            "Loading network with {} pathologies at {}x{}",
            network.vocabulary().len(),
            network.resolution(),
            network.resolution()
        );
        self.network = Some(network);
    }

    /// Whether a network is installed
    pub const fn is_loaded(&self) -> bool {
        self.network.is_some()
    }

    /// Borrow the network
    ///
    /// # Errors
    ///
    /// Returns an error if no network is loaded
    pub fn network(&self) -> Result<&Network> {
        self.network.as_ref().ok_or(DiagnosticError::ModelNotLoaded)
    }

    /// Borrow the network mutably, for gradient computation
    ///
    /// # Errors
    ///
    /// Returns an error if no network is loaded
    pub fn network_mut(&mut self) -> Result<&mut Network> {
        self.network.as_mut().ok_or(DiagnosticError::ModelNotLoaded)
    }

    /// Pathology vocabulary of the loaded network
    ///
    /// # Errors
    ///
    /// Returns an error if no network is loaded
    pub fn vocabulary(&self) -> Result<&[String]> {
        Ok(self.network()?.vocabulary())
    }

    /// Score every pathology for one tensor
    ///
    /// Pure given a loaded network: nothing is cached and the gradient tape
    /// is not touched.
    ///
    /// # Errors
    ///
    /// Returns an error if no network is loaded or the tensor resolution
    /// does not match the network input
    pub fn predict(&self, tensor: &NormalizedTensor) -> Result<PathologyScores> {
        let network = self.network()?;
        let probabilities = network.probabilities(tensor)?;
        if probabilities.iter().any(|p| !p.is_finite()) {
            return Err(inference_error(&"network produced non-finite scores"));
        }

        PathologyScores::new(network.vocabulary().to_vec(), probabilities)
            .map_err(|e| inference_error(&e))
    }
}
