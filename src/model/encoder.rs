//! Encoder network
//!
//! The Encoder embeds a payload tensor into a cover image. Cover and payload
//! are concatenated along the channel axis and pushed through a stack of
//! stride-1 convolutions, so the spatial resolution of the cover is preserved
//! exactly. The final tanh bounds the output to the cover's [-1, 1] range.

use tch::{nn, nn::Module, Tensor};

/// Encoder network configuration
#[derive(Debug, Clone)]
pub struct EncoderConfig {
    /// Number of cover image channels (3 for RGB)
    pub cover_channels: i64,
    /// Number of payload channels
    pub payload_channels: i64,
    /// Base number of filters
    pub base_filters: i64,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            cover_channels: 3,
            payload_channels: 3,
            base_filters: 32,
        }
    }
}

/// Encoder network
///
/// Architecture:
/// 1. Channel-wise concatenation of cover and payload
/// 2. Series of 3x3 stride-1 Conv2d layers with ReLU
/// 3. Final 3x3 Conv2d with Tanh activation back to cover channels
#[derive(Debug)]
pub struct Encoder {
    config: EncoderConfig,
    conv1: nn::Conv2D,
    conv2: nn::Conv2D,
    conv3: nn::Conv2D,
    conv4: nn::Conv2D,
}

impl Encoder {
    /// Create a new Encoder network
    pub fn new(vs: &nn::Path, config: EncoderConfig) -> Self {
        let base = config.base_filters;
        let in_channels = config.cover_channels + config.payload_channels;

        // 3x3 kernel with padding 1 keeps H and W unchanged at every stage
        let conv_config = nn::ConvConfig {
            padding: 1,
            ..Default::default()
        };

        let conv1 = nn::conv2d(vs / "conv1", in_channels, base, 3, conv_config);
        let conv2 = nn::conv2d(vs / "conv2", base, base * 2, 3, conv_config);
        let conv3 = nn::conv2d(vs / "conv3", base * 2, base, 3, conv_config);
        let conv4 = nn::conv2d(vs / "conv4", base, config.cover_channels, 3, conv_config);

        Self {
            config,
            conv1,
            conv2,
            conv3,
            conv4,
        }
    }

    /// Embed a payload into a cover image
    ///
    /// # Arguments
    ///
    /// * `cover` - Tensor of shape (batch, cover_channels, H, W) in [-1, 1]
    /// * `payload` - Tensor of shape (batch, payload_channels, H, W) in [0, 1)
    ///
    /// # Returns
    ///
    /// Encoded image of shape (batch, cover_channels, H, W) in [-1, 1]
    pub fn encode(&self, cover: &Tensor, payload: &Tensor) -> Tensor {
        let x = Tensor::cat(&[cover, payload], 1);

        let x = self.conv1.forward(&x).relu();
        let x = self.conv2.forward(&x).relu();
        let x = self.conv3.forward(&x).relu();

        self.conv4.forward(&x).tanh()
    }

    /// Get configuration
    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }
}
