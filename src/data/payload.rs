//! PayloadGenerator for drawing random payload batches
//!
//! A payload is the secret data hidden inside a cover image. It is drawn
//! fresh for every batch as i.i.d. uniform values in [0, 1), matching the
//! cover batch in batch size and spatial dimensions. Nothing about a payload
//! survives the batch it was drawn for.

use tch::{Device, Kind, Tensor};

/// Generator for per-batch random payloads
#[derive(Debug, Clone)]
pub struct PayloadGenerator {
    /// Number of payload channels
    channels: i64,
    /// Device to create payloads on
    device: Device,
}

impl PayloadGenerator {
    /// Create a new payload generator
    pub fn new(channels: i64, device: Device) -> Self {
        Self { channels, device }
    }

    /// Draw a payload of the given shape
    ///
    /// # Arguments
    ///
    /// * `shape` - Full payload shape (batch, channels, H, W)
    pub fn generate(&self, shape: &[i64]) -> Tensor {
        Tensor::rand(shape, (Kind::Float, self.device))
    }

    /// Draw a payload matching a cover batch
    ///
    /// The payload copies the cover's batch size and spatial dimensions but
    /// uses the generator's own channel count. Values lie in [0, 1), which
    /// intentionally differs from the cover's [-1, 1] range.
    pub fn generate_like(&self, cover: &Tensor) -> Tensor {
        let size = cover.size();
        self.generate(&[size[0], self.channels, size[2], size[3]])
    }

    /// Number of payload channels
    pub fn channels(&self) -> i64 {
        self.channels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_like_shape() {
        let generator = PayloadGenerator::new(3, Device::Cpu);
        let cover = Tensor::zeros([4, 3, 16, 16], (Kind::Float, Device::Cpu));

        let payload = generator.generate_like(&cover);
        assert_eq!(payload.size(), vec![4, 3, 16, 16]);
    }

    #[test]
    fn test_generate_like_channel_override() {
        let generator = PayloadGenerator::new(1, Device::Cpu);
        let cover = Tensor::zeros([2, 3, 8, 8], (Kind::Float, Device::Cpu));

        let payload = generator.generate_like(&cover);
        assert_eq!(payload.size(), vec![2, 1, 8, 8]);
    }

    #[test]
    fn test_payload_range() {
        let generator = PayloadGenerator::new(3, Device::Cpu);
        let payload = generator.generate(&[2, 3, 16, 16]);

        let min_val: f64 = payload.min().double_value(&[]);
        let max_val: f64 = payload.max().double_value(&[]);
        assert!(min_val >= 0.0 && max_val < 1.0);
    }

    #[test]
    fn test_payloads_are_fresh() {
        let generator = PayloadGenerator::new(3, Device::Cpu);
        let a = generator.generate(&[1, 3, 8, 8]);
        let b = generator.generate(&[1, 3, 8, 8]);

        assert!(!a.equal(&b));
    }
}
