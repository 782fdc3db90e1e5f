//! Decoder network
//!
//! The Decoder recovers the hidden payload from an encoded image. Like the
//! Encoder it uses only stride-1 convolutions, so the recovered payload has
//! the same spatial resolution as its input. The final sigmoid bounds the
//! output to the payload's [0, 1] range.

use tch::{nn, nn::Module, Tensor};

/// Decoder network configuration
#[derive(Debug, Clone)]
pub struct DecoderConfig {
    /// Number of input channels (equals the cover's channel count)
    pub cover_channels: i64,
    /// Number of payload channels to recover
    pub payload_channels: i64,
    /// Base number of filters
    pub base_filters: i64,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            cover_channels: 3,
            payload_channels: 3,
            base_filters: 32,
        }
    }
}

/// Decoder network
///
/// Architecture:
/// 1. Series of 3x3 stride-1 Conv2d layers with ReLU
/// 2. Final 3x3 Conv2d with Sigmoid activation to payload channels
#[derive(Debug)]
pub struct Decoder {
    config: DecoderConfig,
    conv1: nn::Conv2D,
    conv2: nn::Conv2D,
    conv3: nn::Conv2D,
    conv4: nn::Conv2D,
}

impl Decoder {
    /// Create a new Decoder network
    pub fn new(vs: &nn::Path, config: DecoderConfig) -> Self {
        let base = config.base_filters;

        let conv_config = nn::ConvConfig {
            padding: 1,
            ..Default::default()
        };

        let conv1 = nn::conv2d(vs / "conv1", config.cover_channels, base, 3, conv_config);
        let conv2 = nn::conv2d(vs / "conv2", base, base * 2, 3, conv_config);
        let conv3 = nn::conv2d(vs / "conv3", base * 2, base, 3, conv_config);
        let conv4 = nn::conv2d(vs / "conv4", base, config.payload_channels, 3, conv_config);

        Self {
            config,
            conv1,
            conv2,
            conv3,
            conv4,
        }
    }

    /// Recover the payload from an encoded image
    ///
    /// # Arguments
    ///
    /// * `encoded` - Tensor of shape (batch, cover_channels, H, W)
    ///
    /// # Returns
    ///
    /// Recovered payload of shape (batch, payload_channels, H, W) in [0, 1]
    pub fn decode(&self, encoded: &Tensor) -> Tensor {
        let x = self.conv1.forward(encoded).relu();
        let x = self.conv2.forward(&x).relu();
        let x = self.conv3.forward(&x).relu();

        self.conv4.forward(&x).sigmoid()
    }

    /// Get configuration
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tch::{nn::VarStore, Device};

    #[test]
    fn test_decoder_output_shape() {
        let vs = VarStore::new(Device::Cpu);
        let decoder = Decoder::new(&vs.root(), DecoderConfig::default());

        let encoded = Tensor::randn([4, 3, 32, 32], (tch::Kind::Float, Device::Cpu));
        let recovered = decoder.decode(&encoded);

        assert_eq!(recovered.size(), vec![4, 3, 32, 32]);
    }

    #[test]
    fn test_decoder_output_range() {
        let vs = VarStore::new(Device::Cpu);
        let decoder = Decoder::new(&vs.root(), DecoderConfig::default());

        let encoded = Tensor::randn([2, 3, 16, 16], (tch::Kind::Float, Device::Cpu));
        let recovered = decoder.decode(&encoded);

        let min_val: f64 = recovered.min().double_value(&[]);
        let max_val: f64 = recovered.max().double_value(&[]);
        assert!(min_val >= 0.0 && max_val <= 1.0);
    }
}
