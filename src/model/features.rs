//! Frozen feature extractor for perceptual loss
//!
//! A VGG-style convolutional projector truncated after its second block.
//! The weights are loaded once at startup and frozen for the lifetime of the
//! process: no optimizer ever updates them, but gradients still flow through
//! `extract` to its input, so the perceptual loss can reach the Encoder.

use anyhow::{Context, Result};
use tch::{nn, nn::Module, nn::VarStore, Device, Tensor};

/// Frozen pretrained feature projector
///
/// Owns its own `VarStore`, which is frozen immediately after construction.
/// Treat instances as a read-only dependency.
pub struct FeatureExtractor {
    vs: VarStore,
    conv1_1: nn::Conv2D,
    conv1_2: nn::Conv2D,
    conv2_1: nn::Conv2D,
    conv2_2: nn::Conv2D,
}

impl FeatureExtractor {
    /// Load the extractor from a weights file
    ///
    /// The file must contain variables named `conv1_1` .. `conv2_2` as saved
    /// by [`FeatureExtractor::save`]. A missing or malformed file is a fatal
    /// initialization error: training must not start without the pretrained
    /// projector.
    pub fn load(path: &str, device: Device) -> Result<Self> {
        let mut extractor = Self::untrained(device);
        extractor
            .vs
            .load(path)
            .with_context(|| format!("failed to load feature weights from {}", path))?;
        Ok(extractor)
    }

    /// Build the same frozen stack with random initialization
    ///
    /// Used by tests and smoke runs that do not need pretrained weights.
    /// The parameters are still frozen, so the extractor stays deterministic
    /// for the lifetime of the process.
    pub fn untrained(device: Device) -> Self {
        let mut vs = VarStore::new(device);

        let conv_config = nn::ConvConfig {
            padding: 1,
            ..Default::default()
        };

        let conv1_1 = nn::conv2d(&vs.root() / "conv1_1", 3, 64, 3, conv_config);
        let conv1_2 = nn::conv2d(&vs.root() / "conv1_2", 64, 64, 3, conv_config);
        let conv2_1 = nn::conv2d(&vs.root() / "conv2_1", 64, 128, 3, conv_config);
        let conv2_2 = nn::conv2d(&vs.root() / "conv2_2", 128, 128, 3, conv_config);

        vs.freeze();

        Self {
            vs,
            conv1_1,
            conv1_2,
            conv2_1,
            conv2_2,
        }
    }

    /// Project an image into the frozen feature space
    ///
    /// # Arguments
    ///
    /// * `image` - Tensor of shape (batch, 3, H, W)
    ///
    /// # Returns
    ///
    /// Feature tensor of shape (batch, 128, H/2, W/2)
    pub fn extract(&self, image: &Tensor) -> Tensor {
        let x = self.conv1_1.forward(image).relu();
        let x = self.conv1_2.forward(&x).relu();
        let x = x.max_pool2d_default(2);
        let x = self.conv2_1.forward(&x).relu();

        self.conv2_2.forward(&x).relu()
    }

    /// Save the extractor weights (used to prepare a weights file)
    pub fn save(&self, path: &str) -> Result<()> {
        self.vs
            .save(path)
            .with_context(|| format!("failed to save feature weights to {}", path))?;
        Ok(())
    }

    /// Device the extractor lives on
    pub fn device(&self) -> Device {
        self.vs.device()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_shape() {
        let extractor = FeatureExtractor::untrained(Device::Cpu);

        let image = Tensor::randn([2, 3, 32, 32], (tch::Kind::Float, Device::Cpu));
        let features = extractor.extract(&image);

        assert_eq!(features.size(), vec![2, 128, 16, 16]);
    }

    #[test]
    fn test_extract_deterministic() {
        let extractor = FeatureExtractor::untrained(Device::Cpu);

        let image = Tensor::randn([1, 3, 16, 16], (tch::Kind::Float, Device::Cpu));
        let a = extractor.extract(&image);
        let b = extractor.extract(&image);

        assert!(a.equal(&b));
    }

    #[test]
    fn test_parameters_frozen() {
        let extractor = FeatureExtractor::untrained(Device::Cpu);
        assert!(extractor.vs.trainable_variables().is_empty());
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("features.pt");
        let path = path.to_str().unwrap();

        let extractor = FeatureExtractor::untrained(Device::Cpu);
        extractor.save(path).unwrap();

        let loaded = FeatureExtractor::load(path, Device::Cpu).unwrap();
        let image = Tensor::randn([1, 3, 16, 16], (tch::Kind::Float, Device::Cpu));

        assert!(extractor.extract(&image).equal(&loaded.extract(&image)));
    }

    #[test]
    fn test_load_missing_file_fails() {
        let result = FeatureExtractor::load("does/not/exist.pt", Device::Cpu);
        assert!(result.is_err());
    }
}
