//! Scoped gradient tracking for one attribution

use crate::imaging::tensor::NormalizedTensor;
use crate::io::error::{Result, saliency_error};
use crate::model::network::{Attribution, GradientSite, Network};

/// Exclusive, self-cleaning access to the network's gradient tape
///
/// Opening a scope records a fresh forward pass; dropping it clears the
/// tape on every exit path, so nothing recorded for one pathology can leak
/// into the attribution of another.
pub struct GradientScope<'a> {
    network: &'a mut Network,
    pathology: &'a str,
}

impl<'a> GradientScope<'a> {
    /// Record a forward pass of `tensor` for attributing `pathology`
    ///
    /// # Errors
    ///
    /// Returns an error if gradient tracking is disabled on the network or
    /// the forward pass fails
    pub fn open(
        network: &'a mut Network,
        tensor: &NormalizedTensor,
        pathology: &'a str,
    ) -> Result<Self> {
        if !network.gradient_tracking() {
            return Err(saliency_error(
                pathology,
                &"gradient tracking is disabled on the network",
            ));
        }

        network.clear_tape();
        network
            .record(tensor)
            .map_err(|e| saliency_error(pathology, &e))?;

        Ok(Self { network, pathology })
    }

    /// Propagate the pathology's logit gradient back to `site`
    ///
    /// # Errors
    ///
    /// Returns an error if the pathology is not in the vocabulary or the
    /// backward pass fails
    pub fn attribute(&self, site: GradientSite) -> Result<Attribution> {
        let class = self
            .network
            .vocabulary()
            .iter()
            .position(|name| name == self.pathology)
            .ok_or_else(|| saliency_error(self.pathology, &"pathology not in vocabulary"))?;

        self.network
            .backward(class, site)
            .map_err(|e| saliency_error(self.pathology, &e))
    }

    /// Number of blocks in the scoped network
    pub fn block_count(&self) -> usize {
        self.network.block_count()
    }
}

impl Drop for GradientScope<'_> {
    fn drop(&mut self) {
        self.network.clear_tape();
    }
}
