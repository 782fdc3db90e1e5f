//! Loss composition for the two training objectives
//!
//! The reconstruction objective drives the Encoder and Decoder jointly; the
//! discrimination objective drives the Adversary alone. The two are never
//! mixed: the adversary sees a detached encoded image, so its loss cannot
//! push gradients into encoder or decoder parameters.

use tch::{Reduction, Tensor};

use crate::model::FeatureExtractor;
use super::ssim::{structural_distance, DEFAULT_SSIM_WINDOW};

/// Weighting coefficients for the reconstruction objective
#[derive(Debug, Clone, Copy)]
pub struct LossWeights {
    /// Weight of the perceptual (feature-space) term
    pub perceptual: f64,
    /// Weight of the structural similarity term
    pub structural: f64,
}

impl Default for LossWeights {
    fn default() -> Self {
        Self {
            perceptual: 0.5,
            structural: 0.5,
        }
    }
}

/// Reconstruction loss with per-term breakdown
///
/// `total` is the differentiable sum used for the backward pass; the `f64`
/// fields are detached per-term values for bookkeeping.
pub struct ReconstructionLoss {
    /// Differentiable composite loss
    pub total: Tensor,
    /// MSE between recovered and original payload
    pub payload_mse: f64,
    /// Weighted perceptual term
    pub perceptual: f64,
    /// Weighted structural term
    pub structural: f64,
}

/// Composes the reconstruction and discrimination objectives
///
/// Owns the frozen feature extractor as a read-only dependency.
pub struct LossComposer {
    features: FeatureExtractor,
    weights: LossWeights,
    ssim_window: i64,
}

impl LossComposer {
    /// Create a new loss composer
    pub fn new(features: FeatureExtractor, weights: LossWeights) -> Self {
        Self {
            features,
            weights,
            ssim_window: DEFAULT_SSIM_WINDOW,
        }
    }

    /// Override the SSIM window size
    pub fn with_ssim_window(mut self, window: i64) -> Self {
        self.ssim_window = window;
        self
    }

    /// Perceptual similarity: MSE in the frozen feature space
    pub fn perceptual(&self, a: &Tensor, b: &Tensor) -> Tensor {
        self.features
            .extract(a)
            .mse_loss(&self.features.extract(b), Reduction::Mean)
    }

    /// Reconstruction objective (drives Encoder and Decoder jointly)
    ///
    /// `MSE(recovered, payload) + w_p * perceptual(cover, encoded)
    ///  + w_s * structural_distance(cover, encoded)`
    pub fn reconstruction(
        &self,
        recovered: &Tensor,
        payload: &Tensor,
        cover: &Tensor,
        encoded: &Tensor,
    ) -> ReconstructionLoss {
        let payload_mse = recovered.mse_loss(payload, Reduction::Mean);
        let perceptual = self.perceptual(cover, encoded) * self.weights.perceptual;
        let structural =
            structural_distance(cover, encoded, self.ssim_window) * self.weights.structural;

        let payload_mse_value = payload_mse.double_value(&[]);
        let perceptual_value = perceptual.double_value(&[]);
        let structural_value = structural.double_value(&[]);

        ReconstructionLoss {
            total: payload_mse + perceptual + structural,
            payload_mse: payload_mse_value,
            perceptual: perceptual_value,
            structural: structural_value,
        }
    }

    /// Discrimination objective (drives the Adversary only)
    ///
    /// `0.5 * (BCE(real_map, 1) + BCE(fake_map, 0))`. Both maps are
    /// probabilities in [0, 1]; the caller must pass the fake map computed
    /// from a detached encoded image.
    pub fn discrimination(&self, real_map: &Tensor, fake_map: &Tensor) -> Tensor {
        let real_targets = Tensor::ones_like(real_map);
        let real_loss =
            real_map.binary_cross_entropy::<Tensor>(&real_targets, None, Reduction::Mean);

        let fake_targets = Tensor::zeros_like(fake_map);
        let fake_loss =
            fake_map.binary_cross_entropy::<Tensor>(&fake_targets, None, Reduction::Mean);

        (real_loss + fake_loss) * 0.5
    }

    /// Loss weights in effect
    pub fn weights(&self) -> LossWeights {
        self.weights
    }

    /// SSIM window in effect
    pub fn ssim_window(&self) -> i64 {
        self.ssim_window
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tch::{Device, Kind};

    fn composer() -> LossComposer {
        LossComposer::new(FeatureExtractor::untrained(Device::Cpu), LossWeights::default())
    }

    #[test]
    fn test_perceptual_identical_is_zero() {
        let composer = composer();
        let x = Tensor::rand([1, 3, 16, 16], (Kind::Float, Device::Cpu));

        let loss: f64 = composer.perceptual(&x, &x).double_value(&[]);
        assert_eq!(loss, 0.0);
    }

    #[test]
    fn test_reconstruction_non_negative() {
        let composer = composer();
        let cover = Tensor::rand([2, 3, 16, 16], (Kind::Float, Device::Cpu)) * 2.0 - 1.0;
        let encoded = Tensor::rand([2, 3, 16, 16], (Kind::Float, Device::Cpu)) * 2.0 - 1.0;
        let payload = Tensor::rand([2, 3, 16, 16], (Kind::Float, Device::Cpu));
        let recovered = Tensor::rand([2, 3, 16, 16], (Kind::Float, Device::Cpu));

        let loss = composer.reconstruction(&recovered, &payload, &cover, &encoded);
        assert!(loss.total.double_value(&[]) >= 0.0);
        assert!(loss.payload_mse >= 0.0);
        assert!(loss.perceptual >= 0.0);
        assert!(loss.structural >= 0.0);
    }

    #[test]
    fn test_reconstruction_terms_sum_to_total() {
        let composer = composer();
        let cover = Tensor::rand([1, 3, 16, 16], (Kind::Float, Device::Cpu)) * 2.0 - 1.0;
        let encoded = Tensor::rand([1, 3, 16, 16], (Kind::Float, Device::Cpu)) * 2.0 - 1.0;
        let payload = Tensor::rand([1, 3, 16, 16], (Kind::Float, Device::Cpu));
        let recovered = Tensor::rand([1, 3, 16, 16], (Kind::Float, Device::Cpu));

        let loss = composer.reconstruction(&recovered, &payload, &cover, &encoded);
        let total: f64 = loss.total.double_value(&[]);
        let sum = loss.payload_mse + loss.perceptual + loss.structural;

        assert!((total - sum).abs() < 1e-6);
    }

    #[test]
    fn test_discrimination_non_negative() {
        let composer = composer();
        let real_map = Tensor::rand([2, 1, 16, 16], (Kind::Float, Device::Cpu));
        let fake_map = Tensor::rand([2, 1, 16, 16], (Kind::Float, Device::Cpu));

        let loss: f64 = composer.discrimination(&real_map, &fake_map).double_value(&[]);
        assert!(loss >= 0.0);
    }

    #[test]
    fn test_perfect_adversary_small_loss() {
        let composer = composer();
        // Confident correct scores on both populations
        let real_map = Tensor::full([2, 1, 8, 8], 0.999, (Kind::Float, Device::Cpu));
        let fake_map = Tensor::full([2, 1, 8, 8], 0.001, (Kind::Float, Device::Cpu));

        let loss: f64 = composer.discrimination(&real_map, &fake_map).double_value(&[]);
        assert!(loss < 0.01);
    }
}
