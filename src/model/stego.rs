//! StegoModel wrapper combining Encoder, Decoder and Adversary
//!
//! Encoder and Decoder live in one shared `VarStore`, so a single optimizer
//! updates both parameter sets from the same backward pass. The Adversary
//! has its own `VarStore` and its own optimizer; the two stores never share
//! parameters.

use tch::{nn, nn::OptimizerConfig, nn::VarStore, Device, Tensor};

use super::adversary::{Adversary, AdversaryConfig};
use super::decoder::{Decoder, DecoderConfig};
use super::encoder::{Encoder, EncoderConfig};

/// Complete steganographic model
pub struct StegoModel {
    /// Encoder network
    pub encoder: Encoder,
    /// Decoder network
    pub decoder: Decoder,
    /// Adversary network
    pub adversary: Adversary,
    /// Shared variable store for encoder and decoder
    pub enc_dec_vs: VarStore,
    /// Variable store for the adversary
    pub adv_vs: VarStore,
    /// Device (CPU/GPU)
    pub device: Device,
}

impl StegoModel {
    /// Create a new model
    ///
    /// # Arguments
    ///
    /// * `enc_config` - Encoder configuration
    /// * `dec_config` - Decoder configuration
    /// * `adv_config` - Adversary configuration
    /// * `device` - Device to create the model on
    pub fn new(
        enc_config: EncoderConfig,
        dec_config: DecoderConfig,
        adv_config: AdversaryConfig,
        device: Device,
    ) -> Self {
        let enc_dec_vs = VarStore::new(device);
        let adv_vs = VarStore::new(device);

        let encoder = Encoder::new(&(&enc_dec_vs.root() / "encoder"), enc_config);
        let decoder = Decoder::new(&(&enc_dec_vs.root() / "decoder"), dec_config);
        let adversary = Adversary::new(&adv_vs.root(), adv_config);

        Self {
            encoder,
            decoder,
            adversary,
            enc_dec_vs,
            adv_vs,
            device,
        }
    }

    /// Create a model with default configuration for a given payload depth
    ///
    /// # Arguments
    ///
    /// * `payload_channels` - Number of payload channels
    /// * `device` - Device to create the model on
    pub fn with_defaults(payload_channels: i64, device: Device) -> Self {
        let enc_config = EncoderConfig {
            payload_channels,
            ..Default::default()
        };
        let dec_config = DecoderConfig {
            payload_channels,
            ..Default::default()
        };

        Self::new(enc_config, dec_config, AdversaryConfig::default(), device)
    }

    /// Embed a payload into a cover image
    pub fn encode(&self, cover: &Tensor, payload: &Tensor) -> Tensor {
        self.encoder.encode(cover, payload)
    }

    /// Recover the payload from an encoded image
    pub fn decode(&self, encoded: &Tensor) -> Tensor {
        self.decoder.decode(encoded)
    }

    /// Score an image for authenticity
    pub fn discriminate(&self, image: &Tensor) -> Tensor {
        self.adversary.discriminate(image)
    }

    /// Joint optimizer over encoder and decoder parameters
    pub fn encoder_decoder_optimizer(&self, lr: f64) -> nn::Optimizer {
        nn::Adam::default()
            .build(&self.enc_dec_vs, lr)
            .expect("Failed to create encoder/decoder optimizer")
    }

    /// Optimizer over adversary parameters only
    pub fn adversary_optimizer(&self, lr: f64) -> nn::Optimizer {
        nn::Adam::default()
            .build(&self.adv_vs, lr)
            .expect("Failed to create adversary optimizer")
    }

    /// Number of cover image channels
    pub fn cover_channels(&self) -> i64 {
        self.encoder.config().cover_channels
    }

    /// Number of payload channels
    pub fn payload_channels(&self) -> i64 {
        self.encoder.config().payload_channels
    }

    /// Save model checkpoints
    pub fn save(&self, enc_dec_path: &str, adv_path: &str) -> anyhow::Result<()> {
        self.enc_dec_vs.save(enc_dec_path)?;
        self.adv_vs.save(adv_path)?;
        Ok(())
    }

    /// Load model checkpoints
    pub fn load(&mut self, enc_dec_path: &str, adv_path: &str) -> anyhow::Result<()> {
        self.enc_dec_vs.load(enc_dec_path)?;
        self.adv_vs.load(adv_path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_creation() {
        let model = StegoModel::with_defaults(3, Device::Cpu);

        assert_eq!(model.cover_channels(), 3);
        assert_eq!(model.payload_channels(), 3);
    }

    #[test]
    fn test_encode_decode_shapes() {
        let model = StegoModel::with_defaults(3, Device::Cpu);

        let cover = Tensor::randn([2, 3, 16, 16], (tch::Kind::Float, Device::Cpu));
        let payload = Tensor::rand([2, 3, 16, 16], (tch::Kind::Float, Device::Cpu));

        let encoded = model.encode(&cover, &payload);
        let recovered = model.decode(&encoded);
        let map = model.discriminate(&encoded);

        assert_eq!(encoded.size(), cover.size());
        assert_eq!(recovered.size(), payload.size());
        assert_eq!(map.size(), vec![2, 1, 16, 16]);
    }

    #[test]
    fn test_forward_passes_deterministic() {
        // No dropout or batch norm anywhere, so repeated forwards over the
        // same inputs must be bit-identical.
        let model = StegoModel::with_defaults(3, Device::Cpu);

        let cover = Tensor::randn([2, 3, 16, 16], (tch::Kind::Float, Device::Cpu));
        let payload = Tensor::rand([2, 3, 16, 16], (tch::Kind::Float, Device::Cpu));

        let encoded_a = model.encode(&cover, &payload);
        let encoded_b = model.encode(&cover, &payload);
        assert!(encoded_a.equal(&encoded_b));

        let recovered_a = model.decode(&encoded_a);
        let recovered_b = model.decode(&encoded_b);
        assert!(recovered_a.equal(&recovered_b));

        let map_a = model.discriminate(&encoded_a);
        let map_b = model.discriminate(&encoded_b);
        assert!(map_a.equal(&map_b));
    }

    #[test]
    fn test_separate_parameter_stores() {
        let model = StegoModel::with_defaults(3, Device::Cpu);

        // Encoder and decoder share one store; the adversary owns another.
        assert!(!model.enc_dec_vs.trainable_variables().is_empty());
        assert!(!model.adv_vs.trainable_variables().is_empty());

        let enc_dec_names: Vec<String> = model.enc_dec_vs.variables().keys().cloned().collect();
        assert!(enc_dec_names.iter().any(|n| n.starts_with("encoder")));
        assert!(enc_dec_names.iter().any(|n| n.starts_with("decoder")));
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let enc_dec_path = dir.path().join("enc_dec.pt");
        let adv_path = dir.path().join("adv.pt");

        let model = StegoModel::with_defaults(3, Device::Cpu);
        model
            .save(enc_dec_path.to_str().unwrap(), adv_path.to_str().unwrap())
            .unwrap();

        let mut other = StegoModel::with_defaults(3, Device::Cpu);
        other
            .load(enc_dec_path.to_str().unwrap(), adv_path.to_str().unwrap())
            .unwrap();

        let cover = Tensor::randn([1, 3, 16, 16], (tch::Kind::Float, Device::Cpu));
        let payload = Tensor::rand([1, 3, 16, 16], (tch::Kind::Float, Device::Cpu));

        assert!(model.encode(&cover, &payload).equal(&other.encode(&cover, &payload)));
    }
}
