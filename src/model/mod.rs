//! Model module containing the steganographic network components
//!
//! This module provides:
//! - Encoder network that embeds a payload into a cover image
//! - Decoder network that recovers the payload from an encoded image
//! - Adversary network that scores image regions for authenticity
//! - FeatureExtractor, a frozen pretrained projector for perceptual loss
//! - StegoModel wrapper combining the learnable networks

mod adversary;
mod decoder;
mod encoder;
mod features;
mod stego;

pub use adversary::{Adversary, AdversaryConfig};
pub use decoder::{Decoder, DecoderConfig};
pub use encoder::{Encoder, EncoderConfig};
pub use features::FeatureExtractor;
pub use stego::StegoModel;
