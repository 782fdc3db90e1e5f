//! Adversary network
//!
//! The Adversary scores image regions for authenticity: given either a cover
//! image or an encoded image, it outputs a single-channel map where each
//! spatial location holds the estimated probability that the region comes
//! from the real (cover) population.

use tch::{nn, nn::Module, Tensor};

/// Adversary network configuration
#[derive(Debug, Clone)]
pub struct AdversaryConfig {
    /// Number of image channels (equals the cover's channel count)
    pub cover_channels: i64,
    /// Base number of filters
    pub base_filters: i64,
}

impl Default for AdversaryConfig {
    fn default() -> Self {
        Self {
            cover_channels: 3,
            base_filters: 16,
        }
    }
}

/// Adversary network
///
/// Architecture:
/// 1. Series of 3x3 stride-1 Conv2d layers with LeakyReLU
/// 2. Final 3x3 Conv2d to one channel with Sigmoid per spatial location
#[derive(Debug)]
pub struct Adversary {
    config: AdversaryConfig,
    conv1: nn::Conv2D,
    conv2: nn::Conv2D,
    conv3: nn::Conv2D,
}

impl Adversary {
    /// Create a new Adversary network
    pub fn new(vs: &nn::Path, config: AdversaryConfig) -> Self {
        let base = config.base_filters;

        let conv_config = nn::ConvConfig {
            padding: 1,
            ..Default::default()
        };

        let conv1 = nn::conv2d(vs / "conv1", config.cover_channels, base, 3, conv_config);
        let conv2 = nn::conv2d(vs / "conv2", base, base * 2, 3, conv_config);
        let conv3 = nn::conv2d(vs / "conv3", base * 2, 1, 3, conv_config);

        Self {
            config,
            conv1,
            conv2,
            conv3,
        }
    }

    /// Score an image for authenticity
    ///
    /// # Arguments
    ///
    /// * `image` - Tensor of shape (batch, cover_channels, H, W)
    ///
    /// # Returns
    ///
    /// Authenticity map of shape (batch, 1, H, W) with values in [0, 1]
    pub fn discriminate(&self, image: &Tensor) -> Tensor {
        let x = self.conv1.forward(image).leaky_relu();
        let x = self.conv2.forward(&x).leaky_relu();

        self.conv3.forward(&x).sigmoid()
    }

    /// Get configuration
    pub fn config(&self) -> &AdversaryConfig {
        &self.config
    }
}
